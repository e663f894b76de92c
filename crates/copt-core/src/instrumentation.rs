//! Structured metrics for timed phases
//!
//! Metrics are computed after the probe has stopped its clock, so emitting
//! them never perturbs a measurement.
//!
//! ```text
//! let metrics = PhaseMetrics::from_sample(OperationId::ArrayInit, n, &sample);
//! metrics.log();
//! ```

use copt_tracing::performance::record_throughput;

use crate::kernels::Variant;
use crate::operation::OperationId;
use crate::probe::TimingSample;
use crate::report::Speedup;

/// Metrics for one timed repetition loop
#[derive(Debug, Clone)]
pub struct PhaseMetrics {
    pub operation: OperationId,
    pub variant: Variant,
    pub kernel: &'static str,
    pub n: usize,
    pub loop_count: u64,
    /// Whole-loop CPU time in microseconds
    pub elapsed_us: u64,
    /// Mean CPU time per invocation in nanoseconds
    pub per_iteration_ns: f64,
    /// Logical elements produced across the whole loop
    pub logical_elements: u64,
}

impl PhaseMetrics {
    pub fn from_sample(operation: OperationId, n: usize, sample: &TimingSample) -> Self {
        Self {
            operation,
            variant: sample.variant,
            kernel: sample.kernel,
            n,
            loop_count: sample.loop_count,
            elapsed_us: sample.elapsed.as_micros() as u64,
            per_iteration_ns: sample.per_iteration_ns(),
            logical_elements: operation.logical_elements(n).saturating_mul(sample.loop_count),
        }
    }

    /// Elements per second, 0 when the sample is too short to resolve.
    pub fn elements_per_second(&self) -> f64 {
        if self.elapsed_us == 0 {
            return 0.0;
        }
        (self.logical_elements as f64 / self.elapsed_us as f64) * 1_000_000.0
    }

    /// Log metrics via tracing
    pub fn log(&self) {
        tracing::debug!(
            operation = %self.operation,
            variant = self.variant.as_str(),
            kernel = self.kernel,
            n = self.n,
            loop_count = self.loop_count,
            elapsed_us = self.elapsed_us,
            per_iteration_ns = self.per_iteration_ns,
            elements_per_sec = self.elements_per_second(),
            "phase_timed"
        );
        record_throughput(self.kernel, self.logical_elements, self.elapsed_us);
    }
}

/// Both phases of a completed benchmark
#[derive(Debug, Clone)]
pub struct BenchmarkSummary {
    pub reference: PhaseMetrics,
    pub candidate: PhaseMetrics,
    pub speedup: Speedup,
}

impl BenchmarkSummary {
    pub fn new(reference: PhaseMetrics, candidate: PhaseMetrics, speedup: Speedup) -> Self {
        Self {
            reference,
            candidate,
            speedup,
        }
    }

    /// CPU microseconds saved per loop by the candidate; negative when it is slower.
    pub fn saved_us(&self) -> i128 {
        i128::from(self.reference.elapsed_us) - i128::from(self.candidate.elapsed_us)
    }

    /// Log aggregate results
    pub fn log(&self) {
        tracing::info!(
            operation = %self.reference.operation,
            n = self.reference.n,
            loop_count = self.reference.loop_count,
            reference_us = self.reference.elapsed_us,
            candidate_us = self.candidate.elapsed_us,
            saved_us = self.saved_us() as i64,
            speedup = ?self.speedup.ratio(),
            "benchmark_completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sample(variant: Variant, micros: u64, loop_count: u64) -> TimingSample {
        TimingSample {
            kernel: "kernel",
            variant,
            loop_count,
            elapsed: Duration::from_micros(micros),
        }
    }

    #[test]
    fn phase_metrics_throughput() {
        // 1000 elements x 10 loops in 100 us = 100M elements/sec
        let metrics = PhaseMetrics::from_sample(OperationId::ArrayInit, 1000, &sample(Variant::Reference, 100, 10));
        assert_eq!(metrics.logical_elements, 10_000);
        assert_eq!(metrics.elements_per_second(), 100_000_000.0);
        assert_eq!(metrics.per_iteration_ns, 10_000.0);
        metrics.log();
    }

    #[test]
    fn zero_duration_has_zero_throughput() {
        let metrics = PhaseMetrics::from_sample(OperationId::Factorial, 10, &sample(Variant::Candidate, 0, 0));
        assert_eq!(metrics.elements_per_second(), 0.0);
    }

    #[test]
    fn summary_savings() {
        let reference = PhaseMetrics::from_sample(OperationId::MatrixInit, 8, &sample(Variant::Reference, 300, 1));
        let candidate = PhaseMetrics::from_sample(OperationId::MatrixInit, 8, &sample(Variant::Candidate, 100, 1));
        let summary = BenchmarkSummary::new(reference, candidate, Speedup::Ratio(3.0));
        assert_eq!(summary.saved_us(), 200);
        summary.log();
    }
}
