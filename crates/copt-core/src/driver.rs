//! Benchmark driver
//!
//! Sequences one run through a fixed set of phases:
//!
//! ```text
//! Init -> ReferenceTiming -> Capture -> CandidateSetup -> CandidateTiming -> Verify -> Report
//!   \__________________________ any phase may fail into Fault ___________________________/
//! ```
//!
//! The reference and candidate each run against their own freshly built
//! context. The reference timing line is written once the candidate context
//! exists and before the candidate runs: an allocation failure leaves only
//! the banner on the output stream, while a wrong candidate still leaves the
//! reference measurement.

use std::io::Write;

use crate::config::HarnessConfig;
use crate::error::Result;
use crate::instrumentation::{BenchmarkSummary, PhaseMetrics};
use crate::kernels::{self, KernelPair, Variant};
use crate::operation::OperationId;
use crate::oracle;
use crate::probe::{CpuClock, ProcessCpuClock, TimingProbe, TimingSample};
use crate::registry::OperationRegistry;
use crate::report::{Reporter, Speedup};

/// Driver lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Init,
    ReferenceTiming,
    Capture,
    CandidateSetup,
    CandidateTiming,
    Verify,
    Report,
    Fault,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Init => "init",
            Phase::ReferenceTiming => "reference_timing",
            Phase::Capture => "capture",
            Phase::CandidateSetup => "candidate_setup",
            Phase::CandidateTiming => "candidate_timing",
            Phase::Verify => "verify",
            Phase::Report => "report",
            Phase::Fault => "fault",
        }
    }

    /// Whether the driver may move from `self` to `next`.
    pub fn can_transition_to(self, next: Phase) -> bool {
        use Phase::*;

        match (self, next) {
            (Fault, _) => false,
            (_, Fault) => true,
            (Report, _) => false,
            (Init, ReferenceTiming)
            | (ReferenceTiming, Capture)
            | (Capture, CandidateSetup)
            | (CandidateSetup, CandidateTiming)
            | (CandidateTiming, Verify)
            | (Verify, Report) => true,
            _ => false,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Report | Phase::Fault)
    }
}

/// Result of a completed run
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkOutcome {
    pub operation: OperationId,
    pub n: usize,
    pub loop_count: u64,
    pub reference: TimingSample,
    pub candidate: TimingSample,
    pub speedup: Speedup,
}

/// Runs one reference/candidate comparison
#[derive(Debug)]
pub struct BenchmarkDriver<C = ProcessCpuClock> {
    config: HarnessConfig,
    registry: OperationRegistry,
    probe: TimingProbe<C>,
    phase: Phase,
    failed_phase: Option<Phase>,
}

impl BenchmarkDriver<ProcessCpuClock> {
    pub fn new(config: HarnessConfig) -> Self {
        Self::with_clock(config, ProcessCpuClock::new())
    }
}

impl<C: CpuClock> BenchmarkDriver<C> {
    pub fn with_clock(config: HarnessConfig, clock: C) -> Self {
        let registry = OperationRegistry::with_scratch_limit(config.scratch_limit_bytes);
        Self {
            config,
            registry,
            probe: TimingProbe::new(clock),
            phase: Phase::Init,
            failed_phase: None,
        }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Stack size for the thread that runs this benchmark.
    ///
    /// Sizes whose recursion exceeds [`kernels::MAX_STACK_BYTES`] are
    /// refused before any kernel runs, so they get the base stack.
    pub fn stack_bytes(&self) -> usize {
        kernels::stack_bytes(self.config.operation, self.config.n)
            .filter(|&bytes| bytes <= kernels::MAX_STACK_BYTES)
            .unwrap_or(kernels::BASE_STACK_BYTES)
    }

    /// The phase that was active when the run faulted.
    pub fn failed_phase(&self) -> Option<Phase> {
        self.failed_phase
    }

    /// Run the built-in kernel pair for the configured operation.
    pub fn run<W: Write>(&mut self, reporter: &mut Reporter<W>) -> Result<BenchmarkOutcome> {
        let pair = self.registry.kernel_pair(self.config.operation);
        self.run_pair(pair, reporter)
    }

    /// Run an explicit kernel pair.
    ///
    /// The pair must implement the configured operation: its outputs are
    /// verified against that operation's output slots.
    pub fn run_pair<W: Write>(&mut self, pair: KernelPair, reporter: &mut Reporter<W>) -> Result<BenchmarkOutcome> {
        self.phase = Phase::Init;
        self.failed_phase = None;

        match self.execute(pair, reporter) {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                let failed = self.phase;
                self.failed_phase = Some(failed);
                self.transition(Phase::Fault);
                tracing::error!(
                    operation = %self.config.operation,
                    phase = failed.as_str(),
                    exit_code = err.exit_code(),
                    error = %err,
                    "benchmark_fault"
                );
                Err(err)
            }
        }
    }

    fn execute<W: Write>(&mut self, pair: KernelPair, reporter: &mut Reporter<W>) -> Result<BenchmarkOutcome> {
        let HarnessConfig {
            operation,
            n,
            loop_count,
            degenerate_threshold,
            ..
        } = self.config;

        reporter.banner(operation, n, loop_count)?;
        let mut context = self.registry.build_context(operation, n)?;

        self.transition(Phase::ReferenceTiming);
        let reference = self
            .probe
            .measure(&pair.reference, Variant::Reference, &mut context, loop_count);
        let reference_metrics = PhaseMetrics::from_sample(operation, n, &reference);
        reference_metrics.log();

        self.transition(Phase::Capture);
        let captured = self.registry.capture(&context)?;
        drop(context);

        self.transition(Phase::CandidateSetup);
        let mut context = self
            .registry
            .build_context_alongside(operation, n, captured.scratch_bytes())?;
        reporter.timing(&reference)?;

        self.transition(Phase::CandidateTiming);
        let candidate = self
            .probe
            .measure(&pair.candidate, Variant::Candidate, &mut context, loop_count);
        let candidate_metrics = PhaseMetrics::from_sample(operation, n, &candidate);
        candidate_metrics.log();

        self.transition(Phase::Verify);
        oracle::verify(&context, captured)?;

        self.transition(Phase::Report);
        reporter.timing(&candidate)?;
        let speedup = Speedup::compute(&reference, &candidate, degenerate_threshold);
        reporter.speedup(speedup)?;
        BenchmarkSummary::new(reference_metrics, candidate_metrics, speedup).log();

        Ok(BenchmarkOutcome {
            operation,
            n,
            loop_count,
            reference,
            candidate,
            speedup,
        })
    }

    fn transition(&mut self, next: Phase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "illegal phase transition {} -> {}",
            self.phase.as_str(),
            next.as_str()
        );
        tracing::debug!(from = self.phase.as_str(), to = next.as_str(), "phase_transition");
        self.phase = next;
    }
}
