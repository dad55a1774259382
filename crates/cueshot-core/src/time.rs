/// Fixed timestep accumulator.
///
/// The physics integrates per step, not per second, so the host converts
/// variable frame deltas into a whole number of fixed steps here.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    dt: f32,
    accumulator: f32,
    max_steps: u32,
}

impl FixedTimestep {
    /// Default cap on catch-up steps per frame.
    pub const DEFAULT_MAX_STEPS: u32 = 10;

    pub fn new(dt: f32) -> Self {
        Self::with_max_steps(dt, Self::DEFAULT_MAX_STEPS)
    }

    pub fn with_max_steps(dt: f32, max_steps: u32) -> Self {
        // A non-positive dt would divide by zero below.
        let dt = if dt.is_finite() && dt > 0.0 {
            dt
        } else {
            1.0 / 60.0
        };
        Self {
            dt,
            accumulator: 0.0,
            max_steps: max_steps.max(1),
        }
    }

    /// Add frame time and return how many fixed steps to run.
    pub fn accumulate(&mut self, frame_dt: f32) -> u32 {
        if frame_dt.is_finite() && frame_dt > 0.0 {
            self.accumulator += frame_dt;
        }
        self.accumulator = self.accumulator.min(self.dt * self.max_steps as f32);
        // Small epsilon so exact multiples of dt are not lost to rounding.
        let steps = ((self.accumulator + self.dt * 1e-4) / self.dt) as u32;
        self.accumulator = (self.accumulator - steps as f32 * self.dt).max(0.0);
        steps
    }

    /// Interpolation alpha between ticks (0.0 to 1.0).
    pub fn alpha(&self) -> f32 {
        self.accumulator / self.dt
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    pub fn clear(&mut self) {
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_step_exact() {
        let mut ts = FixedTimestep::new(1.0 / 60.0);
        assert_eq!(ts.accumulate(1.0 / 60.0), 1);
    }

    #[test]
    fn accumulates_partial() {
        let mut ts = FixedTimestep::new(1.0 / 60.0);
        assert_eq!(ts.accumulate(0.008), 0);
        assert_eq!(ts.accumulate(0.010), 1);
    }

    #[test]
    fn caps_catch_up_steps() {
        let mut ts = FixedTimestep::new(1.0 / 60.0);
        assert_eq!(ts.accumulate(1.0), FixedTimestep::DEFAULT_MAX_STEPS);
    }

    #[test]
    fn ignores_negative_and_nan_frames() {
        let mut ts = FixedTimestep::new(1.0 / 60.0);
        assert_eq!(ts.accumulate(-1.0), 0);
        assert_eq!(ts.accumulate(f32::NAN), 0);
        assert_eq!(ts.alpha(), 0.0);
    }

    #[test]
    fn invalid_dt_falls_back() {
        let ts = FixedTimestep::new(0.0);
        assert!(ts.dt() > 0.0);
    }
}
