//! Top-level application state machine.
//!
//! `AppState` owns one session: the gesture pipeline and its bus, the
//! simulation engine, the detector (while the camera is on) and the cue
//! player.  The frame loop in [`run`] feeds it input, ticks it and draws it.
//!
//! ```text
//!          Enter                countdown ends or Esc
//!   Idle ─────────► Running ───────────────────────► Over
//!    ▲   camera ok     │  ▲                           │
//!    └─ camera error ──┘  └─────────── R / Enter ─────┘
//! ```

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use hand_signal::{GesturePipeline, Hand, HandFrame, Mailbox, SignalBus};
use lane_scores::{format_board, JsonFileStore, ScoreStore, BOARD_SIZE};
use lane_sim::{Engine, RenderSnapshot, SimEvent};

use crate::config::RunnerConfig;
use crate::gesture::{Detector, LandmarkSource, ReplaySource, SimHandSource, SimInput};
use crate::player::{Player, SoundCue};
use crate::visualizer::{Control, Hud, InputEvent, Visualizer};

// ════════════════════════════════════════════════════════════════════════════
// Source selection
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceKind {
    /// Keyboard-driven synthetic hand.
    Sim,
    /// JSON-lines recording of `HandFrame`s.
    Replay(PathBuf),
    /// LeapMotion hardware (needs the `leap` feature).
    Leap,
}

impl SourceKind {
    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::Sim       => "sim",
            SourceKind::Replay(_) => "replay",
            SourceKind::Leap      => "leap",
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Session phase
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase { Idle, Running, Over }

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    cfg:       RunnerConfig,
    source:    SourceKind,

    // ── gesture side ─────────────────────────────────────────────────────
    bus:       SignalBus,
    pipeline:  GesturePipeline,
    mailbox:   Mailbox<HandFrame>,
    detector:  Option<Detector>,
    /// Keyboard feed for the synthetic hand, present while it runs.
    sim_tx:    Option<Sender<SimInput>>,
    last_hand: Option<Hand>,

    // ── game side ────────────────────────────────────────────────────────
    engine:    Engine,
    phase:     Phase,
    player:    Player,

    pub status: String,
}

impl AppState {
    pub fn new(cfg: RunnerConfig, source: SourceKind, player: Player) -> Self {
        let bus = SignalBus::new();
        let pipeline = GesturePipeline::new(cfg.gesture, cfg.camera.frame_width, bus.clone());
        let engine = Engine::new(cfg.sim.clone());
        AppState {
            bus,
            pipeline,
            mailbox:   Mailbox::new(),
            detector:  None,
            sim_tx:    None,
            last_hand: None,
            engine,
            phase:     Phase::Idle,
            player,
            status:    format!("Ready ({} source), press Enter to start", source.name()),
            cfg,
            source,
        }
    }

    // ── camera ───────────────────────────────────────────────────────────

    /// Build a fresh landmark source for the configured kind.
    fn open_source(&mut self) -> Result<Box<dyn LandmarkSource>> {
        match &self.source {
            SourceKind::Sim => {
                let (tx, rx) = mpsc::channel();
                self.sim_tx = Some(tx);
                let period = Duration::from_millis(self.cfg.camera.sim_frame_ms);
                Ok(Box::new(SimHandSource::new(rx, period)))
            }
            SourceKind::Replay(path) => Ok(Box::new(ReplaySource::new(path))),
            #[cfg(feature = "leap")]
            SourceKind::Leap => Ok(Box::new(crate::gesture::LeapHandSource::new())),
            #[cfg(not(feature = "leap"))]
            SourceKind::Leap => bail!("built without LeapMotion support (rebuild with --features leap)"),
        }
    }

    /// Turn the camera on and start (or restart) the game.  On failure the
    /// session stays idle and the error is shown in the status line.
    pub fn start_camera(&mut self) {
        if self.detector.is_some() {
            return;
        }
        let started = self.open_source().and_then(|src| self.start_camera_with(src));
        if let Err(e) = started {
            self.sim_tx = None;
            tracing::error!(error = %format!("{:#}", e), "camera start failed");
            self.status = format!("Camera error: {:#}", e);
        }
    }

    /// Start the detector on an already-built source.
    pub fn start_camera_with(&mut self, source: Box<dyn LandmarkSource>) -> Result<()> {
        if self.detector.is_some() {
            bail!("camera already running");
        }
        let detector = Detector::start(source, self.mailbox.clone(), &self.cfg.camera)?;
        self.status = format!("Camera on ({})", detector.name());
        self.detector = Some(detector);
        self.pipeline.start();

        if self.phase != Phase::Running {
            if self.phase == Phase::Over {
                self.engine.restart();
            }
            self.phase = Phase::Running;
            self.player.cue(SoundCue::Start);
            tracing::info!("game started");
        }
        Ok(())
    }

    /// Release the device.  A running game ends on the spot, clock and
    /// world frozen.
    pub fn stop_camera(&mut self) {
        let Some(detector) = self.detector.take() else { return };
        detector.stop();
        self.sim_tx = None;
        self.last_hand = None;
        self.pipeline.stop();
        if self.phase == Phase::Running {
            self.engine.finish();
            self.phase = Phase::Over;
            self.player.cue(SoundCue::GameOver);
            self.status = format!("Camera off, game over with {} points", self.engine.state().score);
        } else {
            self.status = "Camera off".to_string();
        }
    }

    pub fn camera_on(&self) -> bool { self.detector.is_some() }

    // ── game ─────────────────────────────────────────────────────────────

    /// New game with a fresh world.  Only meaningful once a game has begun.
    pub fn restart(&mut self) {
        if self.phase == Phase::Idle {
            return;
        }
        self.engine.restart();
        self.phase = Phase::Running;
        self.player.cue(SoundCue::Start);
        self.status = "Restarted".to_string();
    }

    pub fn handle_control(&mut self, control: Control) {
        match control {
            Control::StartCamera => self.start_camera(),
            Control::StopCamera  => self.stop_camera(),
            Control::Restart     => self.restart(),
            Control::Quit        => { /* handled in run loop */ }
        }
    }

    /// Forward a key to the synthetic hand, if one is running.
    pub fn handle_sim(&mut self, input: SimInput) {
        if let Some(tx) = &self.sim_tx {
            let _ = tx.send(input);
        }
    }

    // ── per-frame tick ───────────────────────────────────────────────────

    /// Run the gesture pipeline once, then step the game if it is running.
    pub fn tick(&mut self, dt: Duration) -> Vec<SimEvent> {
        match &self.detector {
            Some(detector) if detector.is_healthy() => {
                self.pipeline.set_live(true);
                let frame = detector.take_frame();
                if let Some(frame) = &frame {
                    self.last_hand = frame.primary().cloned();
                }
                self.pipeline.process(frame.as_ref());
            }
            Some(_) => {
                self.pipeline.set_live(false);
                self.pipeline.idle();
            }
            None => {
                self.pipeline.idle();
            }
        }

        if self.phase != Phase::Running {
            return Vec::new();
        }
        let events = self.engine.step(&self.bus.snapshot(), dt);
        for event in &events {
            self.player.cue(SoundCue::for_event(event));
            match event {
                SimEvent::Pickup { score, .. } => self.status = format!("Score {}", score),
                SimEvent::Crash                => self.status = "Crash!".to_string(),
                SimEvent::Expired => {
                    self.phase = Phase::Over;
                    self.status = format!("Time's up, final score {}", self.engine.state().score);
                    tracing::info!(score = self.engine.state().score, "game over");
                }
            }
        }
        events
    }

    // ── accessors for the render loop ────────────────────────────────────

    pub fn phase(&self) -> Phase                { self.phase }
    pub fn score(&self) -> u32                  { self.engine.state().score }
    pub fn engine(&self) -> &Engine             { &self.engine }
    pub fn bus(&self) -> &SignalBus             { &self.bus }
    pub fn snapshot(&self) -> RenderSnapshot    { self.engine.snapshot() }

    pub fn hud(&self, fps: f32) -> Hud {
        let signal = self.bus.snapshot();
        Hud {
            time_label: self.engine.time_label(),
            fps,
            camera_on:  self.camera_on(),
            live:       signal.live,
            hands:      signal.hand_count,
            status:     self.status.clone(),
            banner:     (self.phase == Phase::Idle).then(|| "PRESS ENTER TO START".to_string()),
            preview:    self.last_hand.clone(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Leaderboard
// ════════════════════════════════════════════════════════════════════════════

/// Save a finished game and return the top-10 board with it highlighted.
pub fn record_score(store: &mut dyn ScoreStore, name: &str, score: u32) -> Result<String> {
    let record = store.submit_score(name, score, chrono::Local::now().naive_local())?;
    let top = store.top_scores(BOARD_SIZE)?;
    let mut board = format_board(&top, Some(record.id));
    if !top.iter().any(|r| r.id == record.id) {
        board.push_str(&format!("\n  (your score {} did not make the top {})\n", score, BOARD_SIZE));
    }
    Ok(board)
}

fn prompt_and_record(path: &Path, score: u32) {
    let name = read_line(&format!("\n  Final score {}. Your name (empty to skip): ", score));
    let name = name.trim();
    if name.is_empty() {
        println!("  Score not saved.");
        return;
    }
    let saved = JsonFileStore::open(path).and_then(|mut store| record_score(&mut store, name, score));
    match saved {
        Ok(board) => println!("\n{}", board),
        Err(e) => {
            tracing::warn!(error = %format!("{:#}", e), "score not saved");
            println!("  Could not save score: {:#}", e);
        }
    }
}

fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    io::stdout().flush().ok();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf
}

// ════════════════════════════════════════════════════════════════════════════
// run() — the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the game window until it is closed or Q is pressed.
///
/// With `quick` set the post-game name prompt is skipped.
pub fn run(cfg: RunnerConfig, source: SourceKind, quick: bool) -> Result<()> {
    let scores_path = cfg.scores.path.clone();
    let player = Player::spawn(&cfg.sound);
    let mut vis = Visualizer::new()?;
    let mut app = AppState::new(cfg, source, player);

    let mut last = Instant::now();
    let mut fps = 0.0f32;

    while vis.is_open() {
        let was_over = app.phase() == Phase::Over;

        // 1. Input
        for event in vis.poll_input() {
            match event {
                InputEvent::Control(Control::Quit) => return Ok(()),
                InputEvent::Control(c)             => app.handle_control(c),
                InputEvent::Sim(input)             => app.handle_sim(input),
            }
        }

        // 2. Gesture pipeline + simulation
        let now = Instant::now();
        let dt = now - last;
        last = now;
        let secs = dt.as_secs_f32();
        if secs > 0.0 {
            fps = if fps == 0.0 { 1.0 / secs } else { fps * 0.9 + 0.1 / secs };
        }
        app.tick(dt);

        // 3. Render
        vis.render(&app.snapshot(), &app.hud(fps));

        // 4. Leaderboard once the game ends, by clock or by Esc
        if !was_over && app.phase() == Phase::Over && !quick {
            prompt_and_record(&scores_path, app.score());
            last = Instant::now();
        }
    }

    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use hand_signal::Lane;
    use lane_scores::MemoryStore;

    fn quick_config() -> RunnerConfig {
        let mut cfg = RunnerConfig::default();
        cfg.sim.seed = Some(11);
        cfg.sim.duration_secs = 2;
        cfg.sound.enabled = false;
        cfg
    }

    fn make_app() -> AppState {
        AppState::new(quick_config(), SourceKind::Sim, Player::silent())
    }

    fn tilted_frames(n: u64, pitch: f32) -> Vec<HandFrame> {
        (1..=n)
            .map(|t| HandFrame::new(t * 10, vec![Hand::with_pitch(0.5, 0.5, -0.1, pitch)]))
            .collect()
    }

    fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if cond() { return true; }
            std::thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn starts_idle_and_does_not_step() {
        let mut app = make_app();
        assert_eq!(app.phase(), Phase::Idle);
        let before = app.engine().obstacles()[0].x;
        assert!(app.tick(Duration::from_millis(16)).is_empty());
        assert_eq!(app.engine().obstacles()[0].x, before);
        assert!(app.hud(60.0).banner.is_some());
    }

    #[test]
    fn camera_start_begins_game() {
        let mut app = make_app();
        app.start_camera_with(Box::new(ReplaySource::from_frames(tilted_frames(5, 60.0)))).unwrap();
        assert!(app.camera_on());
        assert_eq!(app.phase(), Phase::Running);
        assert!(app.bus().snapshot().live);
        assert!(app.hud(60.0).banner.is_none());
    }

    #[test]
    fn failed_camera_stays_idle() {
        let mut app = AppState::new(
            quick_config(),
            SourceKind::Replay(PathBuf::from("/definitely/not/here.jsonl")),
            Player::silent(),
        );
        app.start_camera();
        assert!(!app.camera_on());
        assert_eq!(app.phase(), Phase::Idle);
        assert!(app.status.starts_with("Camera error"));
        assert!(!app.bus().snapshot().live);
    }

    #[cfg(not(feature = "leap"))]
    #[test]
    fn leap_without_feature_is_a_camera_error() {
        let mut app = AppState::new(quick_config(), SourceKind::Leap, Player::silent());
        app.start_camera();
        assert_eq!(app.phase(), Phase::Idle);
        assert!(app.status.contains("leap"));
    }

    #[test]
    fn tilted_hand_moves_player_up() {
        let mut app = make_app();
        app.start_camera_with(Box::new(ReplaySource::from_frames(tilted_frames(40, 60.0)))).unwrap();
        let start_y = app.engine().state().player_y;
        assert!(wait_for(|| {
            app.tick(Duration::from_millis(16));
            app.bus().snapshot().lane == Lane::Up
        }));
        for _ in 0..10 {
            app.tick(Duration::from_millis(16));
        }
        assert!(app.engine().state().player_y < start_y);
        assert_eq!(app.hud(60.0).hands, 1);
        assert!(app.hud(60.0).preview.is_some());
    }

    #[test]
    fn stop_camera_ends_the_game() {
        let mut app = make_app();
        app.start_camera_with(Box::new(ReplaySource::from_frames(tilted_frames(3, 0.0)))).unwrap();
        app.tick(Duration::from_millis(500));
        assert_eq!(app.phase(), Phase::Running);
        app.stop_camera();
        assert!(!app.camera_on());
        assert_eq!(app.phase(), Phase::Over);
        assert!(app.snapshot().is_over);
        let signal = app.bus().snapshot();
        assert!(!signal.live);
        assert_eq!(signal.hand_count, 0);

        let obstacles = app.engine().obstacles().to_vec();
        let remaining = app.engine().state().time_remaining;
        for _ in 0..5 {
            assert!(app.tick(Duration::from_secs(1)).is_empty());
        }
        assert_eq!(app.engine().obstacles(), &obstacles[..]);
        assert_eq!(app.engine().state().time_remaining, remaining);

        app.start_camera_with(Box::new(ReplaySource::from_frames(tilted_frames(3, 0.0)))).unwrap();
        assert_eq!(app.phase(), Phase::Running);
        assert!(!app.snapshot().is_over);
        assert_eq!(app.engine().state().time_remaining, app.engine().config().duration_secs);
    }

    #[test]
    fn sim_keys_reach_the_synthetic_hand() {
        let mut app = make_app();
        app.start_camera();
        assert!(app.camera_on());
        app.handle_sim(SimInput::KeyDown(crate::gesture::SimKey::TiltUp));
        assert!(wait_for(|| {
            app.tick(Duration::from_millis(16));
            app.bus().snapshot().lane == Lane::Up
        }));
        app.stop_camera();
    }

    #[test]
    fn countdown_ends_the_game_and_restart_resets() {
        let mut app = make_app();
        app.start_camera_with(Box::new(ReplaySource::from_frames(tilted_frames(2, 0.0)))).unwrap();
        let mut expired = false;
        for _ in 0..10 {
            if app.tick(Duration::from_millis(500)).contains(&SimEvent::Expired) {
                expired = true;
                break;
            }
        }
        assert!(expired);
        assert_eq!(app.phase(), Phase::Over);
        assert!(app.snapshot().is_over);
        assert!(app.tick(Duration::from_millis(500)).is_empty());

        app.restart();
        assert_eq!(app.phase(), Phase::Running);
        assert!(!app.snapshot().is_over);
        assert_eq!(app.engine().state().time_remaining, 2);
        assert_eq!(app.score(), 0);
    }

    #[test]
    fn restart_ignored_before_first_game() {
        let mut app = make_app();
        app.restart();
        assert_eq!(app.phase(), Phase::Idle);
    }

    #[test]
    fn record_score_highlights_new_entry() {
        let mut store = MemoryStore::new();
        let ts = chrono::Local::now().naive_local();
        store.submit_score("ada", 9, ts).unwrap();
        let board = record_score(&mut store, "  bob ", 4).unwrap();
        assert!(board.contains("bob"));
        assert!(board.contains("ada"));
        assert!(board.contains('◀'));
        assert!(!board.contains("did not make"));
    }

    #[test]
    fn record_score_notes_missing_top_ten() {
        let mut store = MemoryStore::new();
        let ts = chrono::Local::now().naive_local();
        for i in 0..BOARD_SIZE {
            store.submit_score(&format!("p{}", i), 100 + i as u32, ts).unwrap();
        }
        let board = record_score(&mut store, "late", 1).unwrap();
        assert!(board.contains("did not make the top 10"));
    }

    #[test]
    fn record_score_rejects_blank_name() {
        let mut store = MemoryStore::new();
        assert!(record_score(&mut store, "   ", 3).is_err());
    }
}
