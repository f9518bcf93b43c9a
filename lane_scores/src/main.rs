//! Command-line access to the lane runner leaderboard.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use lane_scores::{format_board, JsonFileStore, ScoreStore, DEFAULT_LIMIT};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "lane_scores", about = "Inspect or extend the lane runner leaderboard")]
struct Cli {
    /// Score file
    #[arg(long, default_value = "scores.json")]
    file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the best scores
    List {
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
    },
    /// Record a score by hand
    Submit {
        #[arg(long)]
        name: String,
        #[arg(long)]
        score: u32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lane_scores=info".into()),
        )
        .init();

    let mut store = JsonFileStore::open(&cli.file)?;

    match cli.command {
        Command::List { limit } => {
            let top = store.top_scores(limit)?;
            println!();
            println!("  Leaderboard ({})", store.path().display());
            println!();
            print!("{}", format_board(&top, None));
            println!();
        }
        Command::Submit { name, score } => {
            let record = store.submit_score(&name, score, chrono::Local::now().naive_local())?;
            info!(id = record.id, "submitted");
            let top = store.top_scores(lane_scores::BOARD_SIZE)?;
            println!();
            print!("{}", format_board(&top, Some(record.id)));
            println!();
        }
    }
    Ok(())
}
