//! Fixed-name events for work outside the timed region.
//!
//! ```rust
//! use copt_tracing::performance::{record_allocation, PerformanceSpan};
//!
//! let step = PerformanceSpan::new("prefill", Some(100));
//! // untimed setup work
//! drop(step); // logged only if it took at least 100µs
//!
//! record_allocation(4096, 2, 12);
//! ```

use std::time::Instant;

use tracing::Span;

/// Times a setup step on the wall clock and logs it when dropped.
///
/// Never feeds the benchmark report, which uses process CPU time only.
pub struct PerformanceSpan {
    step: &'static str,
    threshold_us: u64,
    started: Instant,
    span: Span,
}

impl PerformanceSpan {
    /// `threshold_us` suppresses the completion event for shorter steps.
    pub fn new(step: &'static str, threshold_us: Option<u64>) -> Self {
        Self {
            step,
            threshold_us: threshold_us.unwrap_or(0),
            started: Instant::now(),
            span: tracing::debug_span!("setup_step", step),
        }
    }

    pub fn step(&self) -> &'static str {
        self.step
    }

    pub fn elapsed_us(&self) -> u64 {
        self.started.elapsed().as_micros() as u64
    }
}

impl Drop for PerformanceSpan {
    fn drop(&mut self) {
        let elapsed_us = self.elapsed_us();
        if elapsed_us < self.threshold_us {
            return;
        }
        self.span.in_scope(|| {
            tracing::debug!(duration_us = elapsed_us, "performance_span_complete");
        });
    }
}

/// Scratch memory reserved for one benchmark context.
pub fn record_allocation(size_bytes: usize, buffers: usize, duration_us: u64) {
    tracing::debug!(size_bytes, buffers, duration_us, "scratch_allocation");
}

/// Logical elements produced by one timed loop of `kernel`.
pub fn record_throughput(kernel: &str, elements: u64, duration_us: u64) {
    tracing::debug!(
        kernel,
        elements,
        duration_us,
        melems_per_sec = melems_per_second(elements, duration_us),
        "operation_throughput"
    );
}

fn melems_per_second(elements: u64, duration_us: u64) -> f64 {
    match duration_us {
        0 => 0.0,
        us => elements as f64 / us as f64,
    }
}
