//! The gesture signal bus: latest `{live, hand_count, lane, activity}`.
//!
//! Every field is an independent atomic.  The gesture tick writes, the
//! simulation tick reads; last write wins and no cross-field consistency is
//! promised, since each field is meaningful on its own.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::lane::Lane;

/// Point-in-time copy of the bus.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureSignal {
    pub live:       bool,
    pub hand_count: usize,
    pub lane:       Lane,
    /// Always `≥ 0`.
    pub activity:   f32,
}

impl Default for GestureSignal {
    fn default() -> Self {
        GestureSignal { live: false, hand_count: 0, lane: Lane::Front, activity: 0.0 }
    }
}

#[derive(Debug, Default)]
struct Slots {
    live:       AtomicBool,
    hand_count: AtomicUsize,
    lane:       AtomicU8,
    activity:   AtomicU32,
}

/// Cheap-to-clone handle; all clones share the same slots.
#[derive(Clone, Debug)]
pub struct SignalBus {
    slots: Arc<Slots>,
}

impl Default for SignalBus {
    fn default() -> Self { SignalBus::new() }
}

impl SignalBus {
    pub fn new() -> Self {
        let bus = SignalBus { slots: Arc::new(Slots::default()) };
        bus.publish_lane(Lane::Front);
        bus
    }

    pub fn publish_live(&self, live: bool) {
        self.slots.live.store(live, Ordering::Release);
    }

    pub fn publish_hand_count(&self, n: usize) {
        self.slots.hand_count.store(n, Ordering::Release);
    }

    pub fn publish_lane(&self, lane: Lane) {
        self.slots.lane.store(lane.index() as u8, Ordering::Release);
    }

    /// Negative and NaN values are stored as 0.
    pub fn publish_activity(&self, activity: f32) {
        let v = if activity > 0.0 { activity } else { 0.0 };
        self.slots.activity.store(v.to_bits(), Ordering::Release);
    }

    /// Back to the power-on state: not live, no hands, front lane, no activity.
    pub fn reset(&self) {
        self.publish_live(false);
        self.publish_hand_count(0);
        self.publish_lane(Lane::Front);
        self.publish_activity(0.0);
    }

    pub fn snapshot(&self) -> GestureSignal {
        let lane = Lane::from_index(self.slots.lane.load(Ordering::Acquire) as usize)
            .unwrap_or(Lane::Front);
        GestureSignal {
            live:       self.slots.live.load(Ordering::Acquire),
            hand_count: self.slots.hand_count.load(Ordering::Acquire),
            lane,
            activity:   f32::from_bits(self.slots.activity.load(Ordering::Acquire)),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
