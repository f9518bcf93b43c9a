//! One gesture session: classifier + activity estimator + bus writer.
//!
//! [`GesturePipeline::process`] is called once per frame-loop iteration with
//! whatever the detector mailbox held.  A missing or stale frame is never
//! reprocessed: lane and wrist history are kept, only the activity boost
//! keeps fading.

use serde::{Deserialize, Serialize};

use crate::activity::{ActivityConfig, ActivityEstimator, ActivitySignal};
use crate::bus::SignalBus;
use crate::lane::{Lane, LaneClassifier, LaneThresholds};
use crate::landmark::HandFrame;
use crate::orientation::{self, Orientation};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub lane:     LaneThresholds,
    pub activity: ActivityConfig,
}

/// What a call to [`GesturePipeline::process`] did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TickOutcome {
    /// No frame, or a frame not newer than the last one.  Lane and window
    /// kept, activity decayed.
    Stale,
    /// No hand in view: window cleared, activity decayed, lane kept.
    NoHand { activity: f32 },
    /// Hand present but its geometry was degenerate: lane kept.
    Degenerate { lane: Lane, activity: f32 },
    /// Hand present with a valid orientation.
    Tracked { lane: Lane, orientation: Orientation, activity: f32 },
}

pub struct GesturePipeline {
    classifier:     LaneClassifier,
    activity:       ActivityEstimator,
    bus:            SignalBus,
    /// Detector frame width in pixels; wrist X is tracked in this space.
    frame_width:    f32,
    last_timestamp: Option<u64>,
    last_orientation: Option<Orientation>,
}

impl GesturePipeline {
    pub fn new(cfg: PipelineConfig, frame_width: f32, bus: SignalBus) -> Self {
        GesturePipeline {
            classifier:       LaneClassifier::new(cfg.lane),
            activity:         ActivityEstimator::new(cfg.activity),
            bus,
            frame_width,
            last_timestamp:   None,
            last_orientation: None,
        }
    }

    pub fn bus(&self) -> &SignalBus                  { &self.bus }
    pub fn lane(&self) -> Lane                       { self.classifier.state() }
    pub fn activity_signal(&self) -> ActivitySignal  { self.activity.signal() }
    pub fn last_orientation(&self) -> Option<Orientation> { self.last_orientation }

    /// Fresh session: front lane, empty history, bus live.
    pub fn start(&mut self) {
        self.classifier.reset();
        self.activity.reset();
        self.last_timestamp   = None;
        self.last_orientation = None;
        self.bus.reset();
        self.bus.publish_live(true);
        tracing::info!("gesture pipeline live");
    }

    /// Camera stopped: not live, no hands.  Lane and activity stay as they
    /// were; [`idle`](Self::idle) lets activity fade out afterwards.
    pub fn stop(&mut self) {
        self.bus.publish_live(false);
        self.bus.publish_hand_count(0);
        tracing::info!("gesture pipeline stopped");
    }

    /// Mark the detector as temporarily unavailable (or available again).
    pub fn set_live(&self, live: bool) {
        self.bus.publish_live(live);
    }

    /// Process the newest detector result.
    pub fn process(&mut self, frame: Option<&HandFrame>) -> TickOutcome {
        let Some(frame) = frame.filter(|f| self.last_timestamp.map_or(true, |t| f.timestamp_ms > t)) else {
            let activity = self.activity.coast();
            self.bus.publish_activity(activity);
            return TickOutcome::Stale;
        };
        self.last_timestamp = Some(frame.timestamp_ms);
        self.bus.publish_hand_count(frame.hands.len());

        let Some(hand) = frame.primary() else {
            let activity = self.activity.tick(None);
            self.bus.publish_activity(activity);
            return TickOutcome::NoHand { activity };
        };

        let orientation = orientation::estimate(hand);
        self.last_orientation = orientation;
        let lane = match orientation {
            Some(o) => {
                let lane = self.classifier.classify(o.pitch);
                self.bus.publish_lane(lane);
                lane
            }
            None => {
                tracing::debug!(ts = frame.timestamp_ms, "degenerate hand geometry, lane kept");
                self.classifier.state()
            }
        };

        let wrist = hand.wrist();
        let activity = self.activity.tick(Some((wrist.x * self.frame_width, wrist.z)));
        self.bus.publish_activity(activity);

        match orientation {
            Some(orientation) => TickOutcome::Tracked { lane, orientation, activity },
            None              => TickOutcome::Degenerate { lane, activity },
        }
    }

    /// One frame with no detector at all (camera off or not ready):
    /// activity keeps decaying toward zero, lane is kept.
    pub fn idle(&mut self) -> f32 {
        let activity = self.activity.tick(None);
        self.bus.publish_activity(activity);
        activity
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::{Hand, Landmark, LANDMARK_COUNT};

    fn pipeline() -> GesturePipeline {
        let mut p = GesturePipeline::new(PipelineConfig::default(), 640.0, SignalBus::new());
        p.start();
        p
    }

    fn frame(ts: u64, pitch: f32, x: f32) -> HandFrame {
        HandFrame::new(ts, vec![Hand::with_pitch(x, 0.5, -0.1, pitch)])
    }

    #[test]
    fn tracked_frame_publishes_lane_and_count() {
        let mut p = pipeline();
        let out = p.process(Some(&frame(1, 45.0, 0.5)));
        assert!(matches!(out, TickOutcome::Tracked { lane: Lane::Up, .. }));
        let s = p.bus().snapshot();
        assert_eq!(s.lane, Lane::Up);
        assert_eq!(s.hand_count, 1);
        assert!(s.live);
    }

    #[test]
    fn stale_timestamp_is_ignored() {
        let mut p = pipeline();
        p.process(Some(&frame(10, 0.0, 0.5)));
        assert_eq!(p.process(Some(&frame(10, 45.0, 0.9))), TickOutcome::Stale);
        assert_eq!(p.process(Some(&frame(9, 45.0, 0.9))), TickOutcome::Stale);
        assert_eq!(p.process(None), TickOutcome::Stale);
        assert_eq!(p.lane(), Lane::Front);
        assert_eq!(p.bus().snapshot().hand_count, 1);
        // The stale frames' wrist positions never entered the window.
        assert!(matches!(p.process(Some(&frame(11, 0.0, 0.5))), TickOutcome::Tracked { .. }));
    }

    #[test]
    fn stalled_source_lets_boost_fade() {
        let mut p = pipeline();
        for ts in 1..=80 {
            let x = if ts % 2 == 0 { 0.3 } else { 0.6 };
            p.process(Some(&frame(ts, 45.0, x)));
        }
        let boosted = p.bus().snapshot().activity;
        assert!(boosted > 1.0);

        for _ in 0..600 {
            assert_eq!(p.process(None), TickOutcome::Stale);
        }
        let faded = p.bus().snapshot().activity;
        assert!(faded < 0.01, "boost stuck at {} (was {})", faded, boosted);
        assert!(faded >= 0.0);
        assert_eq!(p.lane(), Lane::Up);
    }

    #[test]
    fn no_hand_keeps_lane() {
        let mut p = pipeline();
        // Strictly past the 40° front→up threshold.
        for ts in 1..=5 { p.process(Some(&frame(ts, 41.0, 0.5))); }
        assert_eq!(p.lane(), Lane::Up);
        for ts in 6..=25 {
            let out = p.process(Some(&HandFrame::empty(ts)));
            assert!(matches!(out, TickOutcome::NoHand { .. }));
        }
        let s = p.bus().snapshot();
        assert_eq!(s.lane, Lane::Up);
        assert_eq!(s.hand_count, 0);
    }

    #[test]
    fn degenerate_hand_keeps_lane_but_tracks_wrist() {
        let mut p = pipeline();
        p.process(Some(&frame(1, -80.0, 0.5)));
        assert_eq!(p.lane(), Lane::Down);

        let flat = Hand::new([Landmark::new(0.5, 0.5, -0.1); LANDMARK_COUNT]);
        let out = p.process(Some(&HandFrame::new(2, vec![flat])));
        assert!(matches!(out, TickOutcome::Degenerate { lane: Lane::Down, .. }));
        assert_eq!(p.bus().snapshot().lane, Lane::Down);
        assert!(p.last_orientation().is_none());
    }

    #[test]
    fn brushing_raises_published_activity() {
        let mut p = pipeline();
        for ts in 1..=30 {
            let x = if ts % 2 == 0 { 0.3 } else { 0.6 };
            p.process(Some(&frame(ts, 0.0, x)));
        }
        assert!(p.bus().snapshot().activity > 1.0);
    }

    #[test]
    fn idle_decays_activity_after_stop() {
        let mut p = pipeline();
        for ts in 1..=80 {
            let x = if ts % 2 == 0 { 0.3 } else { 0.6 };
            p.process(Some(&frame(ts, 0.0, x)));
        }
        p.stop();
        let s = p.bus().snapshot();
        assert!(!s.live);
        assert_eq!(s.hand_count, 0);

        let mut prev = s.activity;
        for _ in 0..200 {
            let a = p.idle();
            assert!(a <= prev);
            prev = a;
        }
        assert!(prev < 0.01);
    }

    #[test]
    fn start_resets_session() {
        let mut p = pipeline();
        p.process(Some(&frame(100, 45.0, 0.5)));
        p.start();
        assert_eq!(p.lane(), Lane::Front);
        // Timestamps restart with the new camera session.
        assert!(matches!(p.process(Some(&frame(1, 0.0, 0.5))), TickOutcome::Tracked { .. }));
    }
}
