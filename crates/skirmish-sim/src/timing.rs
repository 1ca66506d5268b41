//! Frame timing for the headless harness.
//!
//! Frames advance by a simulated delta derived from the target frame rate.
//! Fixed steps for movement integration are accumulated from those deltas.

use std::collections::VecDeque;

/// Upper bound on fixed steps run for a single frame.
const MAX_FIXED_STEPS: u32 = 10;

/// Frame timing manager.
#[derive(Debug)]
pub struct FrameTiming {
    /// Simulated delta per frame
    frame_dt: f32,
    /// Accumulator for fixed timestep
    accumulator: f32,
    /// Fixed timestep delta
    fixed_dt: f32,
    /// Maximum delta time to prevent spiral of death
    max_dt: f32,
    /// Recent frame times for averaging
    frame_times: VecDeque<f32>,
    /// Maximum samples for averaging
    max_samples: usize,
}

impl Default for FrameTiming {
    fn default() -> Self {
        Self::new(60, 50)
    }
}

impl FrameTiming {
    /// Create a frame timing manager.
    ///
    /// # Arguments
    /// * `target_fps` - Variable-rate frames per simulated second
    /// * `fixed_hz` - Fixed-rate steps per simulated second
    #[must_use]
    pub fn new(target_fps: u32, fixed_hz: u32) -> Self {
        Self {
            frame_dt: 1.0 / target_fps.max(1) as f32,
            accumulator: 0.0,
            fixed_dt: 1.0 / fixed_hz.max(1) as f32,
            max_dt: 0.25, // Max 250ms delta (prevents spiral of death)
            frame_times: VecDeque::with_capacity(120),
            max_samples: 120,
        }
    }

    /// Get the fixed timestep value.
    #[must_use]
    pub fn fixed_dt(&self) -> f32 {
        self.fixed_dt
    }

    /// Simulated delta for one frame at the target rate.
    #[must_use]
    pub fn frame_dt(&self) -> f32 {
        self.frame_dt
    }

    /// Record a frame delta. Returns the clamped delta to simulate with.
    pub fn record_frame(&mut self, dt: f32) -> f32 {
        let clamped_dt = dt.clamp(0.0, self.max_dt);

        self.frame_times.push_back(clamped_dt);
        if self.frame_times.len() > self.max_samples {
            self.frame_times.pop_front();
        }

        clamped_dt
    }

    /// Accumulate time for fixed timestep updates.
    /// Returns the number of fixed updates that should be performed.
    pub fn accumulate(&mut self, dt: f32) -> u32 {
        self.accumulator += dt;
        let mut count = 0;

        while self.accumulator >= self.fixed_dt && count < MAX_FIXED_STEPS {
            self.accumulator -= self.fixed_dt;
            count += 1;
        }

        // If we're still behind, reset accumulator
        if self.accumulator > self.fixed_dt * 2.0 {
            self.accumulator = 0.0;
        }

        count
    }

    /// Get the current FPS (averaged over recent frames).
    #[must_use]
    pub fn current_fps(&self) -> f32 {
        if self.frame_times.is_empty() {
            return 0.0;
        }

        let avg_frame_time: f32 =
            self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32;

        if avg_frame_time > 0.0 {
            1.0 / avg_frame_time
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulate_counts_fixed_steps() {
        let mut timing = FrameTiming::new(32, 64);
        assert_eq!(timing.accumulate(timing.frame_dt()), 2);

        let mut timing = FrameTiming::new(60, 10);
        assert_eq!(timing.accumulate(0.05), 0);
        // Remainder carries into the next frame
        assert_eq!(timing.accumulate(0.06), 1);
    }

    #[test]
    fn test_accumulate_caps_steps() {
        let mut timing = FrameTiming::new(60, 1000);
        assert_eq!(timing.accumulate(0.25), MAX_FIXED_STEPS);
        // Backlog dropped
        assert_eq!(timing.accumulate(0.0), 0);
    }

    #[test]
    fn test_record_frame_clamps() {
        let mut timing = FrameTiming::new(60, 50);
        assert_eq!(timing.record_frame(1.0), 0.25);
        assert_eq!(timing.record_frame(-1.0), 0.0);

        let mut timing = FrameTiming::new(60, 50);
        timing.record_frame(0.02);
        assert!((timing.current_fps() - 50.0).abs() < 0.01);
    }
}
