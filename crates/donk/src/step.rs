//! # Fixed Stepping
//!
//! Splits a frame into equal sub-steps no longer than `max_step`, so
//! collision response sees small, stable moves even when boosting or when a
//! frame runs long.

use crate::config::StepConfig;

/// Sub-steps of one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Substeps {
    /// Number of sub-steps.
    pub count: u32,
    /// Simulated seconds per sub-step.
    pub dt: f32,
}

impl Substeps {
    /// Simulated seconds over all sub-steps.
    #[inline]
    #[must_use]
    pub fn total(&self) -> f32 {
        self.count as f32 * self.dt
    }
}

/// Frame splitter.
#[derive(Clone, Debug)]
pub struct FixedStep {
    config: StepConfig,
}

impl FixedStep {
    /// Creates a stepper.
    #[must_use]
    pub fn new(config: StepConfig) -> Self {
        Self { config }
    }

    /// Splits a frame.
    ///
    /// Boosting dilates time by `time_dilation`. The dilated frame is split
    /// into `ceil(dt / max_step)` equal sub-steps, capped at `max_substeps`;
    /// once the cap is hit sub-steps grow past `max_step` instead of
    /// dropping time.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let step = FixedStep::new(StepConfig::default());
    /// // 50 ms frame, boosted: 400 ms simulated, 10 steps of 40 ms
    /// assert_eq!(step.substeps(0.05, true).count, 10);
    /// ```
    #[must_use]
    pub fn substeps(&self, frame_dt: f32, boost: bool) -> Substeps {
        if !(frame_dt.is_finite() && frame_dt > 0.0) {
            return Substeps { count: 0, dt: 0.0 };
        }
        let dt = if boost {
            frame_dt * self.config.time_dilation
        } else {
            frame_dt
        };
        let count = ((dt / self.config.max_step).ceil() as u32).clamp(1, self.config.max_substeps);
        Substeps {
            count,
            dt: dt / count as f32,
        }
    }

    /// Distance travelled in `dt` simulated seconds.
    #[inline]
    #[must_use]
    pub fn distance(&self, dt: f32) -> f32 {
        dt * self.config.speed
    }

    /// Stepping settings.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &StepConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step() -> FixedStep {
        FixedStep::new(StepConfig::default())
    }

    #[test]
    fn test_short_frame_single_step() {
        let s = step().substeps(0.016, false);
        assert_eq!(s.count, 1);
        assert!((s.dt - 0.016).abs() < 1e-6);
    }

    #[test]
    fn test_long_frame_split() {
        let s = step().substeps(0.05, false);
        assert_eq!(s.count, 3);
        assert!(s.dt <= 0.020);
        assert!((s.total() - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_boost_dilates() {
        let s = step().substeps(0.016, true);
        assert_eq!(s.count, 7);
        assert!((s.total() - 0.128).abs() < 1e-5);
        assert!(s.dt <= 0.020);
    }

    #[test]
    fn test_cap_grows_steps() {
        let s = step().substeps(0.1, true);
        assert_eq!(s.count, 10);
        assert!((s.dt - 0.08).abs() < 1e-6);
    }

    #[test]
    fn test_never_over_max_step_below_cap() {
        let stepper = step();
        for i in 1..500 {
            let frame = i as f32 * 0.001;
            for boost in [false, true] {
                let s = stepper.substeps(frame, boost);
                assert!(s.count == 10 || s.dt <= 0.020 + 1e-6, "{frame} {boost}: {s:?}");
            }
        }
    }

    #[test]
    fn test_zero_frame() {
        assert_eq!(step().substeps(0.0, true).count, 0);
        assert_eq!(step().substeps(f32::NAN, false).count, 0);
    }
}
