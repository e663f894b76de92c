//! Harness configuration

use std::time::Duration;

use crate::operation::OperationId;

/// Candidate samples shorter than this produce an undefined speedup.
pub const DEFAULT_DEGENERATE_THRESHOLD: Duration = Duration::from_micros(1);

/// Parameters of one benchmark run
#[derive(Debug, Clone, PartialEq)]
pub struct HarnessConfig {
    pub operation: OperationId,
    /// Problem size
    pub n: usize,
    /// Kernel invocations per timed phase
    pub loop_count: u64,
    /// Largest scratch footprint a single context may reserve. `None` leaves
    /// the allocator as the only limit.
    pub scratch_limit_bytes: Option<usize>,
    pub degenerate_threshold: Duration,
}

impl HarnessConfig {
    pub fn new(operation: OperationId, n: usize, loop_count: u64) -> Self {
        Self {
            operation,
            n,
            loop_count,
            scratch_limit_bytes: None,
            degenerate_threshold: DEFAULT_DEGENERATE_THRESHOLD,
        }
    }

    pub fn with_scratch_limit(mut self, limit: Option<usize>) -> Self {
        self.scratch_limit_bytes = limit;
        self
    }

    pub fn with_degenerate_threshold(mut self, threshold: Duration) -> Self {
        self.degenerate_threshold = threshold;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = HarnessConfig::new(OperationId::Factorial, 10, 1000);
        assert_eq!(config.scratch_limit_bytes, None);
        assert_eq!(config.degenerate_threshold, Duration::from_micros(1));
    }

    #[test]
    fn builders() {
        let config = HarnessConfig::new(OperationId::ArrayInit, 1, 1)
            .with_scratch_limit(Some(64))
            .with_degenerate_threshold(Duration::ZERO);
        assert_eq!(config.scratch_limit_bytes, Some(64));
        assert!(config.degenerate_threshold.is_zero());
    }
}
