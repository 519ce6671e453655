//! Tuning knobs of an analysis run.

use crate::numeric::DEFAULT_MAX_DEPTH;
use crate::threshold::RationalThreshold;

/// Configuration options for the fixpoint driver and the numeric evaluator.
///
/// Use `AnalysisConfig::default()` for standard settings, and the `with_*`
/// methods to override single fields.
///
/// # Examples
///
/// ```
/// use absint_rs::config::AnalysisConfig;
/// use absint_rs::threshold::RationalThreshold;
///
/// let config = AnalysisConfig::default()
///     .with_widening_delay(5)
///     .with_thresholds(RationalThreshold::from_constants([10, 100]));
/// assert_eq!(config.widening_delay, 5);
/// assert_eq!(config.max_iterations, 1000);
/// ```
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Plain joins at a loop head before switching to widening (default: 3)
    pub widening_delay: usize,
    /// Total point visits before the driver gives up (default: 1000)
    pub max_iterations: usize,
    /// Widening landmarks for numeric domains (default: the `i32` catalog)
    pub thresholds: RationalThreshold,
    /// Unfolding depth of the numeric evaluator (default: 16)
    pub max_depth: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            widening_delay: 3,
            max_iterations: 1000,
            thresholds: RationalThreshold::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl AnalysisConfig {
    pub fn with_widening_delay(mut self, widening_delay: usize) -> Self {
        self.widening_delay = widening_delay;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_thresholds(mut self, thresholds: RationalThreshold) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides_single_fields() {
        let config = AnalysisConfig::default().with_max_iterations(10).with_max_depth(2);
        assert_eq!(config.max_iterations, 10);
        assert_eq!(config.max_depth, 2);
        assert_eq!(config.widening_delay, 3);
        assert_eq!(config.thresholds, RationalThreshold::default());
    }
}
