//! lane_runner — interactive entry point.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use lane_runner::app::{run, SourceKind};
use lane_runner::config::RunnerConfig;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum SourceArg {
    Sim,
    Replay,
    Leap,
}

#[derive(Parser, Debug)]
#[command(name = "lane_runner", about = "Hand-gesture lane runner")]
struct Cli {
    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where hand landmarks come from
    #[arg(short, long, value_enum, default_value_t = SourceArg::Sim)]
    source: SourceArg,

    /// Recording to play with `--source replay`
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Fix the obstacle layout
    #[arg(long)]
    seed: Option<u64>,

    /// Skip the post-game name prompt
    #[arg(long)]
    quick: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lane_runner=info,lane_sim=info,hand_signal=info".into()),
        )
        .init();

    let cli = Cli::parse();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║        Lane Runner — steer with your hand, dodge traffic      ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let mut cfg = match &cli.config {
        Some(path) => RunnerConfig::load(path)?,
        None       => RunnerConfig::default(),
    };
    if cli.seed.is_some() {
        cfg.sim.seed = cli.seed;
    }

    let source = match (cli.source, cli.replay) {
        (SourceArg::Sim, _)             => SourceKind::Sim,
        (SourceArg::Leap, _)            => SourceKind::Leap,
        (SourceArg::Replay, Some(path)) => SourceKind::Replay(path),
        (SourceArg::Replay, None)       => bail!("--source replay needs --replay <file>"),
    };

    match &source {
        SourceKind::Sim       => println!("  Mode: Keyboard hand  (↑/↓ tilt, B brush, H hand, N/F depth)"),
        SourceKind::Replay(p) => println!("  Mode: Replay of {}", p.display()),
        SourceKind::Leap      => println!("  Mode: LeapMotion hardware"),
    }
    #[cfg(not(feature = "leap"))]
    if source == SourceKind::Leap {
        println!("  (this build has no LeapMotion support, use --features leap)");
    }
    println!("  Enter = start   Esc = camera off, end game   R = restart   Q = quit");
    if !cli.quick {
        println!("  Scores are saved to {}", cfg.scores.path.display());
    }
    println!();
    println!("  Opening game window…");
    println!();

    run(cfg, source, cli.quick)
}
