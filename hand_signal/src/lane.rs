//! Hysteretic pitch → lane classifier.
//!
//! Each state has a "comfort zone" wider than its entry zone, so a pitch
//! hovering near a boundary does not flicker between lanes.
//!
//! | current | up threshold | down threshold |
//! |---------|--------------|----------------|
//! | `Up`    | base + bias  | base           |
//! | `Down`  | base         | base − bias    |
//! | `Front` | base − bias  | base + bias    |
//!
//! `pitch < up` selects **`Down`** and `pitch > down` selects **`Up`**: the
//! camera view is mirrored, so a hand tilted up on screen steers down.

use std::fmt;

use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════
// Lane
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lane {
    Up,
    #[default]
    Front,
    Down,
}

impl Lane {
    pub const ALL: [Lane; 3] = [Lane::Up, Lane::Front, Lane::Down];

    /// Track index from the top of the screen.
    pub fn index(self) -> usize {
        match self {
            Lane::Up    => 0,
            Lane::Front => 1,
            Lane::Down  => 2,
        }
    }

    pub fn from_index(i: usize) -> Option<Lane> {
        Lane::ALL.get(i).copied()
    }

    /// Vertical centre of this lane for a given lane height.
    pub fn target_y(self, lane_height: f32) -> f32 {
        lane_height * (self.index() as f32 + 0.5)
    }

    pub fn name(self) -> &'static str {
        match self {
            Lane::Up    => "up",
            Lane::Front => "front",
            Lane::Down  => "down",
        }
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LaneThresholds
// ════════════════════════════════════════════════════════════════════════════

/// Base thresholds and hysteresis bias, all in degrees of pitch.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaneThresholds {
    pub base_up:   f32,
    pub base_down: f32,
    pub bias:      f32,
}

impl Default for LaneThresholds {
    fn default() -> Self {
        LaneThresholds { base_up: -60.0, base_down: 30.0, bias: 10.0 }
    }
}

impl LaneThresholds {
    /// Effective `(up, down)` thresholds while in `state`.
    pub fn effective(&self, state: Lane) -> (f32, f32) {
        match state {
            Lane::Up    => (self.base_up + self.bias, self.base_down),
            Lane::Down  => (self.base_up, self.base_down - self.bias),
            Lane::Front => (self.base_up - self.bias, self.base_down + self.bias),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LaneClassifier
// ════════════════════════════════════════════════════════════════════════════

/// Holds the current lane; the stored state *is* the hysteresis memory.
#[derive(Clone, Debug)]
pub struct LaneClassifier {
    thresholds: LaneThresholds,
    state:      Lane,
}

impl Default for LaneClassifier {
    fn default() -> Self { LaneClassifier::new(LaneThresholds::default()) }
}

impl LaneClassifier {
    pub fn new(thresholds: LaneThresholds) -> Self {
        LaneClassifier { thresholds, state: Lane::Front }
    }

    pub fn state(&self) -> Lane { self.state }

    pub fn reset(&mut self) { self.state = Lane::Front; }

    /// Feed one pitch reading; stores and returns the new lane.
    pub fn classify(&mut self, pitch: f32) -> Lane {
        let (up, down) = self.thresholds.effective(self.state);
        let next = if pitch < up {
            Lane::Down
        } else if pitch > down {
            Lane::Up
        } else {
            Lane::Front
        };
        if next != self.state {
            tracing::debug!(from = %self.state, to = %next, pitch, "lane change");
        }
        self.state = next;
        next
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
