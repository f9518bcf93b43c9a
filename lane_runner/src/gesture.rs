//! Landmark sources and the detector thread.
//!
//! A [`LandmarkSource`] turns a device (or a keyboard, or a recording) into
//! [`HandFrame`]s.  [`Detector::start`] opens it on the caller's thread, so
//! a device failure surfaces immediately, then moves it onto its own
//! producer thread which posts every new frame into a single-slot
//! [`Mailbox`].  The frame loop takes the newest frame without blocking.
//!
//! ```text
//!   source.detect() ──► Mailbox (latest only) ──► GesturePipeline::process
//!        producer thread                              frame loop
//! ```

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use hand_signal::{Hand, HandFrame, Mailbox};

use crate::config::CameraConfig;

// ════════════════════════════════════════════════════════════════════════════
// LandmarkSource trait — unified interface for hw, sim and replay
// ════════════════════════════════════════════════════════════════════════════

pub trait LandmarkSource: Send + 'static {
    fn name(&self) -> &str;

    /// Acquire the device.  A failure here ends the session before it starts.
    fn open(&mut self) -> Result<()>;

    /// Next frame if one is ready; `Ok(None)` when nothing new yet.
    fn detect(&mut self) -> Result<Option<HandFrame>>;
}

// ════════════════════════════════════════════════════════════════════════════
// Detector — the producer thread
// ════════════════════════════════════════════════════════════════════════════

pub struct Detector {
    name:    String,
    stop:    Arc<AtomicBool>,
    healthy: Arc<AtomicBool>,
    mailbox: Mailbox<HandFrame>,
    handle:  Option<JoinHandle<()>>,
}

impl Detector {
    /// Open `source` and start producing into `mailbox` (re-armed if it was
    /// closed by an earlier stop).
    pub fn start(
        mut source: Box<dyn LandmarkSource>,
        mailbox: Mailbox<HandFrame>,
        cfg: &CameraConfig,
    ) -> Result<Self> {
        let name = source.name().to_string();
        source.open().with_context(|| format!("Failed to open {}", name))?;
        mailbox.reopen();

        let stop    = Arc::new(AtomicBool::new(false));
        let healthy = Arc::new(AtomicBool::new(true));
        let handle = {
            let stop         = Arc::clone(&stop);
            let healthy      = Arc::clone(&healthy);
            let mailbox      = mailbox.clone();
            let poll         = Duration::from_millis(cfg.poll_ms);
            let max_failures = cfg.max_failures.max(1);
            thread::Builder::new()
                .name("detector".into())
                .spawn(move || detector_loop(source, mailbox, stop, healthy, poll, max_failures))
                .context("Failed to spawn detector thread")?
        };

        tracing::info!(source = %name, "detector started");
        Ok(Detector { name, stop, healthy, mailbox, handle: Some(handle) })
    }

    pub fn name(&self) -> &str { &self.name }

    /// False after `max_failures` consecutive detector errors, until a
    /// detect call succeeds again.
    pub fn is_healthy(&self) -> bool { self.healthy.load(Ordering::Acquire) }

    pub fn take_frame(&self) -> Option<HandFrame> { self.mailbox.take() }

    /// Stop producing, drop pending frames, join the thread and release the
    /// device.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Release);
        self.mailbox.close();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!(source = %self.name, "detector thread panicked");
            }
            tracing::info!(source = %self.name, "detector stopped");
        }
    }
}

impl Drop for Detector {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn detector_loop(
    mut source:   Box<dyn LandmarkSource>,
    mailbox:      Mailbox<HandFrame>,
    stop:         Arc<AtomicBool>,
    healthy:      Arc<AtomicBool>,
    poll:         Duration,
    max_failures: u32,
) {
    let mut failures = 0u32;
    while !stop.load(Ordering::Acquire) {
        match source.detect() {
            Ok(Some(frame)) => {
                failures = 0;
                healthy.store(true, Ordering::Release);
                if !mailbox.post(frame) {
                    break;
                }
            }
            Ok(None) => {
                failures = 0;
                healthy.store(true, Ordering::Release);
                thread::sleep(poll);
            }
            Err(e) => {
                failures += 1;
                tracing::warn!(source = source.name(), error = %e, failures, "detect failed, frame skipped");
                if failures >= max_failures {
                    healthy.store(false, Ordering::Release);
                }
                thread::sleep(poll);
            }
        }
    }
    tracing::debug!(source = source.name(), "detector loop exiting");
}

// ════════════════════════════════════════════════════════════════════════════
// SimHandSource — keyboard-driven synthetic hand (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Raw input from the simulation window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimInput {
    KeyDown(SimKey),
    KeyUp(SimKey),
}

/// Simulated hand controls (mapped from minifb keys).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimKey {
    TiltUp,     // ↑ held
    TiltDown,   // ↓ held
    Brush,      // B held
    ToggleHand, // H
    Nearer,     // N
    Farther,    // F
}

const SIM_UP_PITCH:   f32 = 45.0;
const SIM_DOWN_PITCH: f32 = -75.0;
const SIM_BRUSH_DX:   f32 = 0.1;
const SIM_Z_NEAR:     f32 = -0.03;
const SIM_Z_FAR:      f32 = -0.4;

/// State of the synthetic hand.
#[derive(Clone, Debug, PartialEq)]
pub struct SimHand {
    pub tilt_up:   bool,
    pub tilt_down: bool,
    pub brushing:  bool,
    pub present:   bool,
    pub z:         f32,
    stroke:        u32,
}

impl Default for SimHand {
    fn default() -> Self {
        SimHand { tilt_up: false, tilt_down: false, brushing: false, present: true, z: -0.1, stroke: 0 }
    }
}

impl SimHand {
    pub fn apply(&mut self, input: SimInput) {
        match input {
            SimInput::KeyDown(SimKey::TiltUp)     => self.tilt_up = true,
            SimInput::KeyUp(SimKey::TiltUp)       => self.tilt_up = false,
            SimInput::KeyDown(SimKey::TiltDown)   => self.tilt_down = true,
            SimInput::KeyUp(SimKey::TiltDown)     => self.tilt_down = false,
            SimInput::KeyDown(SimKey::Brush)      => self.brushing = true,
            SimInput::KeyUp(SimKey::Brush)        => self.brushing = false,
            SimInput::KeyDown(SimKey::ToggleHand) => self.present = !self.present,
            SimInput::KeyDown(SimKey::Nearer)     => self.z = (self.z * 0.8).clamp(SIM_Z_FAR, SIM_Z_NEAR),
            SimInput::KeyDown(SimKey::Farther)    => self.z = (self.z * 1.25).clamp(SIM_Z_FAR, SIM_Z_NEAR),
            SimInput::KeyUp(_)                    => {}
        }
    }

    pub fn pitch(&self) -> f32 {
        match (self.tilt_up, self.tilt_down) {
            (true, false) => SIM_UP_PITCH,
            (false, true) => SIM_DOWN_PITCH,
            _             => 0.0,
        }
    }

    /// One frame; brushing alternates the wrist left and right each call.
    pub fn frame(&mut self, timestamp_ms: u64) -> HandFrame {
        if !self.present {
            return HandFrame::empty(timestamp_ms);
        }
        let x = if self.brushing {
            self.stroke = self.stroke.wrapping_add(1);
            if self.stroke % 2 == 0 { 0.5 - SIM_BRUSH_DX } else { 0.5 + SIM_BRUSH_DX }
        } else {
            0.5
        };
        HandFrame::new(timestamp_ms, vec![Hand::with_pitch(x, 0.5, self.z, self.pitch())])
    }
}

/// Emits a [`SimHand`] frame every `period`, updated from [`SimInput`]s sent
/// by the window.
pub struct SimHandSource {
    rx:        Receiver<SimInput>,
    hand:      SimHand,
    period:    Duration,
    epoch:     Instant,
    last_emit: Option<Instant>,
    last_ts:   u64,
}

impl SimHandSource {
    pub fn new(rx: Receiver<SimInput>, period: Duration) -> Self {
        SimHandSource {
            rx,
            hand: SimHand::default(),
            period,
            epoch: Instant::now(),
            last_emit: None,
            last_ts: 0,
        }
    }

    fn drain_input(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(input) => self.hand.apply(input),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
    }
}

impl LandmarkSource for SimHandSource {
    fn name(&self) -> &str { "keyboard hand" }

    fn open(&mut self) -> Result<()> {
        self.epoch = Instant::now();
        Ok(())
    }

    fn detect(&mut self) -> Result<Option<HandFrame>> {
        self.drain_input();
        if self.last_emit.is_some_and(|t| t.elapsed() < self.period) {
            return Ok(None);
        }
        self.last_emit = Some(Instant::now());
        // Strictly increasing even if two frames land in the same millisecond.
        let ts = (self.epoch.elapsed().as_millis() as u64).max(self.last_ts + 1);
        self.last_ts = ts;
        Ok(Some(self.hand.frame(ts)))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ReplaySource — JSON-lines recording
// ════════════════════════════════════════════════════════════════════════════

/// Plays back a recording of one [`HandFrame`] per line, paced by the
/// recorded timestamps.  Stays silent once the recording ends.
pub struct ReplaySource {
    path:   Option<PathBuf>,
    frames: VecDeque<HandFrame>,
    clock:  Option<(Instant, u64)>,
}

impl ReplaySource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        ReplaySource { path: Some(path.as_ref().to_path_buf()), frames: VecDeque::new(), clock: None }
    }

    pub fn from_frames(frames: Vec<HandFrame>) -> Self {
        ReplaySource { path: None, frames: frames.into(), clock: None }
    }

    pub fn remaining(&self) -> usize { self.frames.len() }
}

pub fn parse_recording(text: &str) -> Result<Vec<HandFrame>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str::<HandFrame>(line).with_context(|| format!("line {}: bad frame", i + 1))
        })
        .collect()
}

impl LandmarkSource for ReplaySource {
    fn name(&self) -> &str { "replay" }

    fn open(&mut self) -> Result<()> {
        if let Some(path) = &self.path {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read recording {}", path.display()))?;
            self.frames = parse_recording(&text)?.into();
        }
        if self.frames.is_empty() {
            bail!("recording has no frames");
        }
        self.clock = None;
        tracing::info!(frames = self.frames.len(), "replay loaded");
        Ok(())
    }

    fn detect(&mut self) -> Result<Option<HandFrame>> {
        let Some(next_ts) = self.frames.front().map(|f| f.timestamp_ms) else {
            return Ok(None);
        };
        let (start, first_ts) = *self.clock.get_or_insert((Instant::now(), next_ts));
        let due = next_ts.saturating_sub(first_ts);
        if (start.elapsed().as_millis() as u64) < due {
            return Ok(None);
        }
        Ok(self.frames.pop_front())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LeapHandSource — real hardware (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Hand tracking from a LeapMotion controller.
///
/// Bones are mapped onto the 21-point layout: per digit, the proximal,
/// intermediate and distal joints plus the tip; the wrist is the carpal end
/// of the middle metacarpal.  Millimetre positions are normalised into an image-like
/// frame (x right, y down, z toward the device) so the same pipeline
/// thresholds apply.
#[cfg(feature = "leap")]
pub struct LeapHandSource {
    connection: Option<leaprs::Connection>,
    epoch:      Instant,
}

#[cfg(feature = "leap")]
impl LeapHandSource {
    pub fn new() -> Self {
        LeapHandSource { connection: None, epoch: Instant::now() }
    }
}

#[cfg(feature = "leap")]
impl Default for LeapHandSource {
    fn default() -> Self { Self::new() }
}

#[cfg(feature = "leap")]
fn leap_point(x: f32, y: f32, z: f32) -> hand_signal::Landmark {
    // Interaction box roughly ±200 mm wide, 100–500 mm high.
    hand_signal::Landmark::new(0.5 + x / 400.0, 0.5 - (y - 300.0) / 400.0, z / 1000.0)
}

#[cfg(feature = "leap")]
fn leap_hand(hand: &leaprs::Hand) -> Option<Hand> {
    let digits: Vec<_> = hand.digits().collect();
    if digits.len() < 5 { return None; }

    let mut points = Vec::with_capacity(hand_signal::LANDMARK_COUNT);
    let w = digits[2].metacarpal().prev_joint();
    points.push(leap_point(w.x, w.y, w.z));
    for digit in &digits {
        for j in [
            digit.proximal().prev_joint(),
            digit.intermediate().prev_joint(),
            digit.distal().prev_joint(),
            digit.distal().next_joint(),
        ] {
            points.push(leap_point(j.x, j.y, j.z));
        }
    }
    Hand::from_slice(&points)
}

#[cfg(feature = "leap")]
impl LandmarkSource for LeapHandSource {
    fn name(&self) -> &str { "leap motion" }

    fn open(&mut self) -> Result<()> {
        use leaprs::{Connection, ConnectionConfig};
        let mut connection = Connection::create(ConnectionConfig::default())
            .map_err(|e| anyhow::anyhow!("Failed to create LeapC connection: {:?}", e))?;
        connection
            .open()
            .map_err(|e| anyhow::anyhow!("Failed to open LeapMotion device: {:?}", e))?;
        self.connection = Some(connection);
        self.epoch = Instant::now();
        Ok(())
    }

    fn detect(&mut self) -> Result<Option<HandFrame>> {
        use leaprs::Event;
        let Some(connection) = self.connection.as_mut() else {
            bail!("LeapMotion device not open");
        };
        let msg = match connection.poll(100) {
            Ok(m) => m,
            Err(e) => bail!("LeapC poll failed: {:?}", e),
        };
        let Event::Tracking(frame) = msg.event() else {
            return Ok(None);
        };
        let hands: Vec<Hand> = frame.hands().filter_map(|h| leap_hand(&h)).collect();
        let ts = self.epoch.elapsed().as_millis() as u64;
        Ok(Some(HandFrame::new(ts, hands)))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    /// Scripted source: yields the queued results in order, then `Ok(None)`.
    struct Scripted {
        script:    VecDeque<Result<Option<HandFrame>>>,
        fail_open: bool,
        dropped:   Arc<AtomicBool>,
    }

    impl Scripted {
        fn new(script: Vec<Result<Option<HandFrame>>>) -> (Self, Arc<AtomicBool>) {
            let dropped = Arc::new(AtomicBool::new(false));
            (Scripted { script: script.into(), fail_open: false, dropped: Arc::clone(&dropped) }, dropped)
        }
    }

    impl Drop for Scripted {
        fn drop(&mut self) { self.dropped.store(true, Ordering::SeqCst); }
    }

    impl LandmarkSource for Scripted {
        fn name(&self) -> &str { "scripted" }
        fn open(&mut self) -> Result<()> {
            if self.fail_open { bail!("no camera") } else { Ok(()) }
        }
        fn detect(&mut self) -> Result<Option<HandFrame>> {
            self.script.pop_front().unwrap_or(Ok(None))
        }
    }

    fn camera() -> CameraConfig {
        CameraConfig { poll_ms: 1, ..CameraConfig::default() }
    }

    fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if cond() { return true; }
            thread::sleep(Duration::from_millis(2));
        }
        false
    }

    #[test]
    fn failed_open_is_terminal() {
        let (mut src, _) = Scripted::new(vec![]);
        src.fail_open = true;
        let err = Detector::start(Box::new(src), Mailbox::new(), &camera()).err().expect("must fail");
        assert!(format!("{:#}", err).contains("no camera"));
    }

    #[test]
    fn mailbox_holds_only_the_newest_frame() {
        let frames = (1..=5).map(|ts| Ok(Some(HandFrame::empty(ts)))).collect();
        let (src, _) = Scripted::new(frames);
        let mailbox = Mailbox::new();
        let det = Detector::start(Box::new(src), mailbox.clone(), &camera()).unwrap();

        let mut last = None;
        assert!(wait_for(|| {
            if let Some(f) = det.take_frame() { last = Some(f.timestamp_ms); }
            last == Some(5)
        }));
        assert!(det.take_frame().is_none());
        det.stop();
    }

    /// Fails while the switch is on, otherwise has nothing new.
    struct Flaky(Arc<AtomicBool>);

    impl LandmarkSource for Flaky {
        fn name(&self) -> &str { "flaky" }
        fn open(&mut self) -> Result<()> { Ok(()) }
        fn detect(&mut self) -> Result<Option<HandFrame>> {
            if self.0.load(Ordering::SeqCst) { bail!("glitch") } else { Ok(None) }
        }
    }

    #[test]
    fn repeated_failures_mark_unhealthy_until_success() {
        let failing = Arc::new(AtomicBool::new(true));
        let det = Detector::start(Box::new(Flaky(Arc::clone(&failing))), Mailbox::new(), &camera()).unwrap();
        assert!(wait_for(|| !det.is_healthy()));
        failing.store(false, Ordering::SeqCst);
        assert!(wait_for(|| det.is_healthy()));
        det.stop();
    }

    #[test]
    fn stop_closes_mailbox_and_drops_source() {
        let (src, dropped) = Scripted::new(vec![Ok(Some(HandFrame::empty(1)))]);
        let mailbox = Mailbox::new();
        let det = Detector::start(Box::new(src), mailbox.clone(), &camera()).unwrap();
        det.stop();
        assert!(mailbox.is_closed());
        assert!(!mailbox.post(HandFrame::empty(2)));
        assert!(mailbox.take().is_none());
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[test]
    fn restart_reopens_the_mailbox() {
        let mailbox = Mailbox::new();
        let (a, _) = Scripted::new(vec![]);
        Detector::start(Box::new(a), mailbox.clone(), &camera()).unwrap().stop();
        assert!(mailbox.is_closed());
        let (b, _) = Scripted::new(vec![Ok(Some(HandFrame::empty(9)))]);
        let det = Detector::start(Box::new(b), mailbox.clone(), &camera()).unwrap();
        assert!(!mailbox.is_closed());
        assert!(wait_for(|| det.take_frame().is_some()));
    }

    #[test]
    fn sim_hand_keys() {
        let mut h = SimHand::default();
        assert_eq!(h.pitch(), 0.0);
        h.apply(SimInput::KeyDown(SimKey::TiltUp));
        assert_eq!(h.pitch(), SIM_UP_PITCH);
        h.apply(SimInput::KeyDown(SimKey::TiltDown));
        assert_eq!(h.pitch(), 0.0);
        h.apply(SimInput::KeyUp(SimKey::TiltUp));
        assert_eq!(h.pitch(), SIM_DOWN_PITCH);

        h.apply(SimInput::KeyDown(SimKey::ToggleHand));
        assert!(h.frame(1).hands.is_empty());
        h.apply(SimInput::KeyDown(SimKey::ToggleHand));
        assert_eq!(h.frame(2).hands.len(), 1);
    }

    #[test]
    fn sim_hand_depth_is_bounded() {
        let mut h = SimHand::default();
        for _ in 0..50 { h.apply(SimInput::KeyDown(SimKey::Nearer)); }
        assert_eq!(h.z, SIM_Z_NEAR);
        for _ in 0..50 { h.apply(SimInput::KeyDown(SimKey::Farther)); }
        assert_eq!(h.z, SIM_Z_FAR);
    }

    #[test]
    fn brushing_moves_the_wrist() {
        let mut h = SimHand::default();
        h.apply(SimInput::KeyDown(SimKey::Brush));
        let a = h.frame(1).hands[0].wrist().x;
        let b = h.frame(2).hands[0].wrist().x;
        assert!((a - b).abs() > 0.15);
        h.apply(SimInput::KeyUp(SimKey::Brush));
        assert_eq!(h.frame(3).hands[0].wrist().x, 0.5);
    }

    #[test]
    fn sim_source_applies_keys_and_paces_frames() {
        let (tx, rx) = mpsc::channel();
        let mut src = SimHandSource::new(rx, Duration::from_secs(60));
        src.open().unwrap();
        tx.send(SimInput::KeyDown(SimKey::TiltUp)).unwrap();
        let first = src.detect().unwrap().expect("first frame is immediate");
        let o = hand_signal::estimate_orientation(&first.hands[0]).unwrap();
        assert!((o.pitch - SIM_UP_PITCH).abs() < 0.05);
        assert!(src.detect().unwrap().is_none());
    }

    #[test]
    fn sim_source_timestamps_increase() {
        let (_tx, rx) = mpsc::channel();
        let mut src = SimHandSource::new(rx, Duration::ZERO);
        src.open().unwrap();
        let a = src.detect().unwrap().unwrap().timestamp_ms;
        let b = src.detect().unwrap().unwrap().timestamp_ms;
        assert!(b > a);
    }

    #[test]
    fn replay_plays_in_order_then_goes_quiet() {
        let mut src = ReplaySource::from_frames(vec![HandFrame::empty(100), HandFrame::empty(100)]);
        src.open().unwrap();
        assert_eq!(src.detect().unwrap().map(|f| f.timestamp_ms), Some(100));
        assert_eq!(src.detect().unwrap().map(|f| f.timestamp_ms), Some(100));
        assert!(src.detect().unwrap().is_none());
        assert_eq!(src.remaining(), 0);
    }

    #[test]
    fn replay_waits_for_recorded_time() {
        let mut src = ReplaySource::from_frames(vec![HandFrame::empty(0), HandFrame::empty(60_000)]);
        src.open().unwrap();
        assert!(src.detect().unwrap().is_some());
        assert!(src.detect().unwrap().is_none());
        assert_eq!(src.remaining(), 1);
    }

    #[test]
    fn empty_recording_fails_to_open() {
        assert!(ReplaySource::from_frames(vec![]).open().is_err());
    }

    #[test]
    fn recording_parse_reports_line() {
        let good = serde_json::to_string(&HandFrame::empty(5)).unwrap();
        let text = format!("{}\n\n{{oops}}\n", good);
        let err = parse_recording(&text).unwrap_err();
        assert!(err.to_string().contains("line 3"));
        assert_eq!(parse_recording(&good).unwrap().len(), 1);
    }

    #[test]
    fn replay_file_round_trip() {
        let path = std::env::temp_dir().join(format!("lane_runner_replay_{}.jsonl", std::process::id()));
        let lines: Vec<String> = [1u64, 2, 3]
            .iter()
            .map(|&ts| serde_json::to_string(&HandFrame::new(ts, vec![Hand::with_pitch(0.5, 0.5, -0.1, 10.0)])).unwrap())
            .collect();
        fs::write(&path, lines.join("\n")).unwrap();
        let mut src = ReplaySource::new(&path);
        src.open().unwrap();
        assert_eq!(src.remaining(), 3);
        let _ = fs::remove_file(&path);
    }
}
