//! Lateral-oscillation ("brushing") activity estimator.
//!
//! Keeps a short FIFO of wrist X positions.  Once the window is full, its
//! positional range and path length give an instantaneous activity reading,
//! scaled by how close the hand is to the camera.  The reading feeds a
//! peak-hold-with-decay value (`raw`), which feeds an exponential moving
//! average (`smoothed`).  What the game sees is `smoothed × impact_factor`.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════
// ActivityConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityConfig {
    /// Window length in samples.
    pub history:          usize,
    /// Per-tick multiplier applied to `raw` before a new reading.
    pub decay:            f32,
    /// EMA weight of the newest `raw` value.
    pub smoothing_alpha:  f32,
    /// Scales `smoothed` into obstacle-speed units.
    pub impact_factor:    f32,
    pub range_weight:     f32,
    pub movement_weight:  f32,
    /// Wrist depth at which no correction is applied.
    pub reference_z:      f32,
    pub depth_exponent:   f32,
    pub min_depth_scale:  f32,
    pub max_depth_scale:  f32,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        ActivityConfig {
            history:         10,
            decay:           0.9,
            smoothing_alpha: 0.1,
            impact_factor:   2.0,
            range_weight:    0.01,
            movement_weight: 0.005,
            reference_z:     -0.1,
            depth_exponent:  1.0,
            min_depth_scale: 0.5,
            max_depth_scale: 3.0,
        }
    }
}

impl ActivityConfig {
    /// `clamp((reference_z / wrist_z) ^ exponent, min, max)`.
    ///
    /// A NaN ratio (NaN depth) falls back to 1.0; ±∞ clamps like any other
    /// out-of-range value.
    pub fn depth_scale(&self, wrist_z: f32) -> f32 {
        let scale = (self.reference_z / wrist_z).powf(self.depth_exponent);
        if scale.is_nan() {
            return 1.0;
        }
        scale.clamp(self.min_depth_scale, self.max_depth_scale)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ActivitySignal
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ActivitySignal {
    /// Peak-held, decayed activity.
    pub raw:      f32,
    /// Exponential moving average of `raw`.
    pub smoothed: f32,
}

// ════════════════════════════════════════════════════════════════════════════
// ActivityEstimator
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct ActivityEstimator {
    cfg:     ActivityConfig,
    window:  VecDeque<f32>,
    signal:  ActivitySignal,
}

impl Default for ActivityEstimator {
    fn default() -> Self { ActivityEstimator::new(ActivityConfig::default()) }
}

impl ActivityEstimator {
    pub fn new(cfg: ActivityConfig) -> Self {
        let history = cfg.history.max(2);
        ActivityEstimator {
            cfg: ActivityConfig { history, ..cfg },
            window: VecDeque::with_capacity(history + 1),
            signal: ActivitySignal::default(),
        }
    }

    pub fn config(&self) -> &ActivityConfig { &self.cfg }
    pub fn signal(&self) -> ActivitySignal  { self.signal }
    pub fn window_len(&self) -> usize       { self.window.len() }

    /// The value published to the game: `smoothed × impact_factor`.
    pub fn published(&self) -> f32 {
        self.signal.smoothed * self.cfg.impact_factor
    }

    /// Advance one tick.
    ///
    /// `wrist` is `(x_px, z)` for the tracked hand, or `None` when no hand is
    /// present.  Returns the published value.
    pub fn tick(&mut self, wrist: Option<(f32, f32)>) -> f32 {
        self.signal.raw *= self.cfg.decay;

        match wrist {
            Some((x_px, z)) => {
                let depth_scale = self.cfg.depth_scale(z);
                self.window.push_back(x_px);
                while self.window.len() > self.cfg.history {
                    self.window.pop_front();
                }
                if let Some(reading) = self.instantaneous(depth_scale) {
                    if reading > self.signal.raw {
                        self.signal.raw = reading;
                    }
                }
            }
            None => self.window.clear(),
        }
        self.settle()
    }

    /// A tick with no new sample: decay and smooth, keep the window.
    pub fn coast(&mut self) -> f32 {
        self.signal.raw *= self.cfg.decay;
        self.settle()
    }

    fn settle(&mut self) -> f32 {
        let a = self.cfg.smoothing_alpha;
        self.signal.smoothed = self.signal.smoothed * (1.0 - a) + self.signal.raw * a;
        self.published()
    }

    /// Instantaneous reading; `None` until the window is full.
    fn instantaneous(&self, depth_scale: f32) -> Option<f32> {
        if self.window.len() < self.cfg.history {
            return None;
        }
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        for &x in &self.window {
            min = min.min(x);
            max = max.max(x);
        }
        let total: f32 = self.window.iter()
            .zip(self.window.iter().skip(1))
            .map(|(a, b)| (b - a).abs())
            .sum();
        let range = max - min;
        Some((range * self.cfg.range_weight + total * self.cfg.movement_weight) * depth_scale)
    }

    /// Drop all history and zero both signal values.
    pub fn reset(&mut self) {
        self.window.clear();
        self.signal = ActivitySignal::default();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    const REF_Z: f32 = -0.1;

    fn brush(est: &mut ActivityEstimator, ticks: usize, amplitude: f32) {
        for i in 0..ticks {
            let x = if i % 2 == 0 { 300.0 } else { 300.0 + amplitude };
            est.tick(Some((x, REF_Z)));
        }
    }

    #[test]
    fn coast_decays_but_keeps_window() {
        let mut est = ActivityEstimator::default();
        brush(&mut est, 12, 100.0);
        let before = est.signal();
        est.coast();
        assert_eq!(est.window_len(), 10);
        assert!(est.signal().raw < before.raw);
        // One more sample still yields a full-window reading.
        est.tick(Some((300.0, REF_Z)));
        assert!(est.signal().raw > 0.0);
    }

    #[test]
    fn window_is_bounded() {
        let mut est = ActivityEstimator::default();
        for i in 0..25 { est.tick(Some((i as f32, REF_Z))); }
        assert_eq!(est.window_len(), 10);
    }

    #[test]
    fn no_reading_until_window_full() {
        let mut est = ActivityEstimator::default();
        brush(&mut est, 9, 100.0);
        assert_eq!(est.signal().raw, 0.0);
        brush(&mut est, 1, 100.0);
        assert!(est.signal().raw > 0.0);
    }

    #[test]
    fn instantaneous_formula() {
        // Alternating 300 / 400 for 10 samples: range 100, path 9 × 100.
        let mut est = ActivityEstimator::default();
        brush(&mut est, 10, 100.0);
        let expected = 100.0 * 0.01 + 900.0 * 0.005;
        assert!((est.signal().raw - expected).abs() < 1e-4);
    }

    #[test]
    fn depth_scale_clamps() {
        let cfg = ActivityConfig::default();
        assert_eq!(cfg.depth_scale(-0.1), 1.0);
        assert_eq!(cfg.depth_scale(-0.2), 0.5);
        assert_eq!(cfg.depth_scale(-0.01), 3.0);
        assert_eq!(cfg.depth_scale(0.05), 0.5);   // wrong sign → floor
        assert_eq!(cfg.depth_scale(0.0), 0.5);    // −∞ → floor
        assert_eq!(cfg.depth_scale(-0.0), 3.0);   // +∞ → ceiling
        assert_eq!(cfg.depth_scale(f32::NAN), 1.0);
    }

    #[test]
    fn closer_hand_scores_higher_for_same_motion() {
        let mut near = ActivityEstimator::default();
        let mut far  = ActivityEstimator::default();
        for i in 0..10 {
            let x = if i % 2 == 0 { 300.0 } else { 350.0 };
            near.tick(Some((x, -0.05)));
            far.tick(Some((x, -0.15)));
        }
        assert!(near.signal().raw > far.signal().raw);
    }

    #[test]
    fn peak_hold_never_drops_below_decayed_previous() {
        let mut est = ActivityEstimator::default();
        brush(&mut est, 10, 200.0);
        let mut prev = est.signal().raw;
        // Much gentler motion afterwards.
        for i in 0..15 {
            let x = if i % 2 == 0 { 300.0 } else { 302.0 };
            est.tick(Some((x, REF_Z)));
            let raw = est.signal().raw;
            assert!(raw >= prev * 0.9 - 1e-6, "raw {} < {}", raw, prev * 0.9);
            prev = raw;
        }
    }

    #[test]
    fn decays_monotonically_to_zero_without_hand() {
        let mut est = ActivityEstimator::default();
        // Still hand for a while, then some motion to have something to decay.
        for _ in 0..12 { est.tick(Some((320.0, REF_Z))); }
        assert_eq!(est.signal().raw, 0.0);
        brush(&mut est, 10, 80.0);
        for _ in 0..40 { est.tick(Some((320.0, REF_Z))); }

        let mut prev = est.signal().smoothed;
        for _ in 0..300 {
            est.tick(None);
            let s = est.signal().smoothed;
            assert!(s <= prev);
            assert!(s >= 0.0);
            prev = s;
        }
        assert!(prev < 1e-3);
        assert_eq!(est.window_len(), 0);
    }

    #[test]
    fn smoothed_strictly_decreases_after_hand_leaves() {
        let mut est = ActivityEstimator::default();
        // Long enough for `smoothed` to settle above the first decayed `raw`.
        brush(&mut est, 80, 120.0);
        let mut prev = est.signal().smoothed;
        for _ in 0..20 {
            est.tick(None);
            let s = est.signal().smoothed;
            assert!(s < prev);
            prev = s;
        }
    }

    #[test]
    fn missing_hand_clears_window_and_restarts_fill() {
        let mut est = ActivityEstimator::default();
        brush(&mut est, 10, 50.0);
        est.tick(None);
        assert_eq!(est.window_len(), 0);
        let before = est.signal().raw;
        brush(&mut est, 5, 500.0);
        // Window not refilled yet → only decay.
        assert!(est.signal().raw < before);
    }

    #[test]
    fn published_uses_impact_factor() {
        let mut est = ActivityEstimator::new(ActivityConfig { impact_factor: 3.0, ..Default::default() });
        brush(&mut est, 12, 60.0);
        assert!((est.published() - est.signal().smoothed * 3.0).abs() < 1e-6);
    }
}
