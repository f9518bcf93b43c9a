//! Wall-clock driven counters: the session countdown and the walk cycle.

use std::time::Duration;

const SECOND: Duration = Duration::from_secs(1);

/// Whole-second countdown fed by frame deltas.
#[derive(Clone, Debug)]
pub struct Countdown {
    remaining: u32,
    carry:     Duration,
}

impl Countdown {
    pub fn new(secs: u32) -> Self {
        Countdown { remaining: secs, carry: Duration::ZERO }
    }

    pub fn remaining(&self) -> u32 { self.remaining }

    pub fn is_expired(&self) -> bool { self.remaining == 0 }

    /// Returns true on the call that reaches zero.
    pub fn advance(&mut self, dt: Duration) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.carry += dt;
        while self.carry >= SECOND && self.remaining > 0 {
            self.carry -= SECOND;
            self.remaining -= 1;
        }
        self.remaining == 0
    }

    /// `mm:ss`
    pub fn label(&self) -> String {
        format!("{:02}:{:02}", self.remaining / 60, self.remaining % 60)
    }
}

/// Two-frame walk animation toggled on a fixed period.
#[derive(Clone, Debug)]
pub struct WalkCycle {
    period: Duration,
    carry:  Duration,
    phase:  bool,
}

impl WalkCycle {
    pub fn new(period: Duration) -> Self {
        WalkCycle { period, carry: Duration::ZERO, phase: false }
    }

    pub fn phase(&self) -> bool { self.phase }

    pub fn advance(&mut self, dt: Duration) {
        if self.period.is_zero() {
            return;
        }
        self.carry += dt;
        while self.carry >= self.period {
            self.carry -= self.period;
            self.phase = !self.phase;
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_carries_fractions() {
        let mut c = Countdown::new(3);
        for _ in 0..59 {
            c.advance(Duration::from_millis(16));
        }
        assert_eq!(c.remaining(), 3); // 944 ms
        c.advance(Duration::from_millis(60));
        assert_eq!(c.remaining(), 2);
    }

    #[test]
    fn countdown_reports_expiry_once() {
        let mut c = Countdown::new(2);
        assert!(!c.advance(SECOND));
        assert!(c.advance(Duration::from_secs(5)));
        assert!(c.is_expired());
        assert!(!c.advance(SECOND));
        assert_eq!(c.remaining(), 0);
    }

    #[test]
    fn label_formats_minutes() {
        assert_eq!(Countdown::new(120).label(), "02:00");
        assert_eq!(Countdown::new(65).label(), "01:05");
        assert_eq!(Countdown::new(0).label(), "00:00");
    }

    #[test]
    fn walk_toggles_per_period() {
        let mut w = WalkCycle::new(Duration::from_millis(300));
        w.advance(Duration::from_millis(299));
        assert!(!w.phase());
        w.advance(Duration::from_millis(1));
        assert!(w.phase());
        w.advance(Duration::from_millis(600));
        assert!(w.phase());
    }
}
