//! Countdown timer backing stagger and invincibility windows.

use serde::{Deserialize, Serialize};

/// A countdown with a derived blink signal for the presentation layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusTimer {
    /// Seconds left before expiry.
    remaining: f32,
    /// Whether the countdown is running.
    active: bool,
}

impl StatusTimer {
    /// Create an idle timer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) the countdown. Negative durations count as zero.
    pub fn start(&mut self, duration: f32) {
        self.remaining = duration.max(0.0);
        self.active = true;
    }

    /// Stop the countdown without reporting expiry.
    pub fn stop(&mut self) {
        self.remaining = 0.0;
        self.active = false;
    }

    /// Advance the countdown by `dt` seconds.
    ///
    /// Returns `true` exactly once: on the call that leaves an active timer at
    /// zero. A timer started with a zero duration expires on its first tick.
    pub fn tick(&mut self, dt: f32) -> bool {
        if !self.active {
            return false;
        }

        self.remaining = (self.remaining - dt.max(0.0)).max(0.0);
        if self.remaining <= 0.0 {
            self.active = false;
            return true;
        }
        false
    }

    /// Check if the countdown is running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Seconds left before expiry.
    #[must_use]
    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    /// Opacity for a flashing-visibility effect: `|sin(elapsed * frequency)|`.
    #[must_use]
    pub fn blink_intensity(elapsed: f32, frequency: f32) -> f32 {
        (elapsed * frequency).sin().abs().clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_counts_down_and_expires_once() {
        let mut timer = StatusTimer::new();
        timer.start(1.0);
        assert!(timer.is_active());

        assert!(!timer.tick(0.4));
        assert!((timer.remaining() - 0.6).abs() < 1e-6);

        assert!(timer.tick(0.7));
        assert_eq!(timer.remaining(), 0.0);
        assert!(!timer.is_active());

        // Already expired
        assert!(!timer.tick(0.1));
    }

    #[test]
    fn test_negative_duration_is_zero() {
        let mut timer = StatusTimer::new();
        timer.start(-3.0);
        assert_eq!(timer.remaining(), 0.0);
        assert!(timer.tick(0.016));
    }

    #[test]
    fn test_restart_extends_window() {
        let mut timer = StatusTimer::new();
        timer.start(0.5);
        timer.tick(0.4);
        timer.start(0.5);
        assert!(!timer.tick(0.4));
        assert!(timer.tick(0.1));
    }

    #[test]
    fn test_idle_timer_never_expires() {
        let mut timer = StatusTimer::new();
        assert!(!timer.tick(10.0));
        timer.start(1.0);
        timer.stop();
        assert!(!timer.tick(10.0));
    }

    #[test]
    fn test_blink_intensity_range() {
        assert_eq!(StatusTimer::blink_intensity(0.0, 10.0), 0.0);
        let peak = StatusTimer::blink_intensity(std::f32::consts::FRAC_PI_2 / 10.0, 10.0);
        assert!((peak - 1.0).abs() < 1e-5);

        for step in 0..100 {
            let value = StatusTimer::blink_intensity(step as f32 * 0.037, 10.0);
            assert!((0.0..=1.0).contains(&value));
        }
    }
}
