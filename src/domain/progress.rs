//! Engine progress to user-facing percentages.

/// Callback receiving whole percentages in `0..=100`.
pub type ProgressFn<'a> = &'a (dyn Fn(u8) + Send + Sync);

/// Turns engine fractions into percentages that never go backwards.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    last: Option<u8>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the percentage to report for `fraction`, or `None` when it
    /// would not move the needle forward.
    pub fn advance(&mut self, fraction: f64) -> Option<u8> {
        let percent = to_percent(fraction);
        match self.last {
            Some(last) if percent <= last => None,
            _ => {
                self.last = Some(percent);
                Some(percent)
            }
        }
    }
}

/// Clamps to `[0, 1]` and rounds to a whole percent. NaN counts as zero.
pub fn to_percent(fraction: f64) -> u8 {
    if fraction.is_nan() {
        return 0;
    }
    (fraction.clamp(0.0, 1.0) * 100.0).round() as u8
}
