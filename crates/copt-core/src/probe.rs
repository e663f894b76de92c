//! Timing probe
//!
//! Measures process CPU time across a tight repetition loop of one kernel.
//! Only the loop is inside the measured interval: context allocation and
//! pre-fill happen in the registry before [`TimingProbe::measure`] is called.

use std::hint::black_box;
use std::time::Duration;

use crate::context::BenchmarkContext;
use crate::kernels::{Kernel, Variant};

/// Source of monotonic CPU time
pub trait CpuClock {
    /// CPU time consumed so far by the measured process, `None` if the
    /// clock could not be read.
    fn now(&self) -> Option<Duration>;
}

/// Process CPU-time clock.
///
/// Uses `CLOCK_PROCESS_CPUTIME_ID` on Unix. Other targets fall back to a
/// monotonic wall clock measured from construction.
#[derive(Debug, Clone)]
pub struct ProcessCpuClock {
    #[cfg(not(unix))]
    origin: std::time::Instant,
}

impl ProcessCpuClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(unix))]
            origin: std::time::Instant::now(),
        }
    }
}

impl Default for ProcessCpuClock {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuClock for ProcessCpuClock {
    #[cfg(unix)]
    fn now(&self) -> Option<Duration> {
        // SAFETY: timespec is plain old data; all-zero is a valid value.
        let mut ts: libc::timespec = unsafe { std::mem::zeroed() };
        // SAFETY: clock_gettime only writes into the timespec we own.
        let rc = unsafe { libc::clock_gettime(libc::CLOCK_PROCESS_CPUTIME_ID, &mut ts) };
        if rc != 0 {
            tracing::warn!(errno = ?std::io::Error::last_os_error(), "process_cpu_clock_unavailable");
            return None;
        }
        Some(Duration::new(ts.tv_sec as u64, ts.tv_nsec as u32))
    }

    #[cfg(not(unix))]
    fn now(&self) -> Option<Duration> {
        Some(self.origin.elapsed())
    }
}

/// Elapsed CPU time for one full repetition loop of one kernel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingSample {
    pub kernel: &'static str,
    pub variant: Variant,
    pub loop_count: u64,
    pub elapsed: Duration,
}

impl TimingSample {
    /// Elapsed time in milliseconds.
    pub fn millis(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }

    /// Mean time per kernel invocation in nanoseconds, 0 for an empty loop.
    pub fn per_iteration_ns(&self) -> f64 {
        if self.loop_count == 0 {
            return 0.0;
        }
        self.elapsed.as_nanos() as f64 / self.loop_count as f64
    }

    pub fn is_zero(&self) -> bool {
        self.elapsed.is_zero()
    }
}

/// Runs a kernel `loop_count` times against one context under a CPU clock
#[derive(Debug, Clone, Default)]
pub struct TimingProbe<C> {
    clock: C,
}

impl<C: CpuClock> TimingProbe<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Time `loop_count` back-to-back invocations of `kernel`.
    ///
    /// The context is not reset between repetitions. A zero loop count
    /// produces a zero-duration sample without reading the clock, and so
    /// does a failed read at either end of the loop.
    pub fn measure(
        &self,
        kernel: &Kernel,
        variant: Variant,
        context: &mut BenchmarkContext,
        loop_count: u64,
    ) -> TimingSample {
        let mut sample = TimingSample {
            kernel: kernel.name(),
            variant,
            loop_count,
            elapsed: Duration::ZERO,
        };
        if loop_count == 0 {
            return sample;
        }

        let start = self.clock.now();
        for _ in 0..loop_count {
            kernel.invoke(black_box(&mut *context));
        }
        let end = self.clock.now();

        if let (Some(start), Some(end)) = (start, end) {
            sample.elapsed = end.saturating_sub(start);
        }
        sample
    }
}
