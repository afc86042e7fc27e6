//! Configuration for count stream encoding, decoding and peak detection.
//!
//! Settings are carried in an explicit [`CountsConfig`] value handed to the
//! constructors that need it. There is no process-wide state: two readers in
//! the same process may use different settings.

/// Default number of transitions between two reposition checkpoints.
pub const DEFAULT_CHECKPOINT_INTERVAL: usize = 1024;

/// Settings shared by writers, readers, mergers and peak segmenters.
///
/// # Example
///
/// ```
/// use countrun::config::CountsConfig;
///
/// let config = CountsConfig::new()
///     .with_initial_count(45)
///     .with_peak_threshold(2);
/// assert_eq!(config.initial_count, 45);
/// assert_eq!(config.checkpoint_interval, 1024);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountsConfig {
    /// Count assumed before the first run; the first delta is taken against it.
    pub initial_count: i64,
    /// Peaks are runs whose count is strictly greater than this value.
    pub peak_threshold: i64,
    /// Transitions decoded between two checkpoints of the reposition index.
    pub checkpoint_interval: usize,
}

impl Default for CountsConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CountsConfig {
    pub fn new() -> Self {
        Self {
            initial_count: 0,
            peak_threshold: 0,
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
        }
    }

    /// Set the baseline count (builder pattern).
    pub fn with_initial_count(mut self, initial_count: i64) -> Self {
        self.initial_count = initial_count;
        self
    }

    /// Set the peak detection threshold (builder pattern).
    pub fn with_peak_threshold(mut self, peak_threshold: i64) -> Self {
        self.peak_threshold = peak_threshold;
        self
    }

    /// Set the checkpoint interval (builder pattern). Zero is raised to one.
    pub fn with_checkpoint_interval(mut self, checkpoint_interval: usize) -> Self {
        self.checkpoint_interval = checkpoint_interval.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CountsConfig::default();
        assert_eq!(config.initial_count, 0);
        assert_eq!(config.peak_threshold, 0);
        assert_eq!(config.checkpoint_interval, DEFAULT_CHECKPOINT_INTERVAL);
    }

    #[test]
    fn test_zero_checkpoint_interval_is_clamped() {
        let config = CountsConfig::new().with_checkpoint_interval(0);
        assert_eq!(config.checkpoint_interval, 1);
    }
}
