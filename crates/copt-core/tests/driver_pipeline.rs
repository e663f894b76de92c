//! End-to-end runs of the benchmark driver against in-memory reports

use std::time::Duration;

use copt_core::{
    BenchmarkContext, BenchmarkDriver, CpuClock, Error, HarnessConfig, Kernel, KernelPair, OperationId,
    OperationRegistry, Phase, Reporter, Speedup,
};

/// A clock that never advances.
struct FrozenClock;

impl CpuClock for FrozenClock {
    fn now(&self) -> Option<Duration> {
        Some(Duration::from_millis(42))
    }
}

fn report_lines(reporter: Reporter<Vec<u8>>) -> Vec<String> {
    String::from_utf8(reporter.into_inner())
        .expect("report is utf-8")
        .lines()
        .map(str::to_owned)
        .collect()
}

/// Accumulates into the product without clearing it first. Correct only on
/// a freshly zeroed context.
fn accumulating_multiply(context: &mut BenchmarkContext) {
    let parts = context.parts_mut();
    let n = parts.n;
    for i in 0..n {
        for k in 0..n {
            let a = parts.lhs[i * n + k];
            for j in 0..n {
                let product = &mut parts.product[i * n + j];
                *product = product.wrapping_add(a.wrapping_mul(parts.rhs[k * n + j]));
            }
        }
    }
}

fn factorial_plus_one(context: &mut BenchmarkContext) {
    OperationRegistry::new()
        .kernel_pair(OperationId::Factorial)
        .candidate
        .invoke(context);
    *context.parts_mut().scalar += 1;
}

#[test]
fn factorial_run_produces_full_report() {
    let config = HarnessConfig::new(OperationId::Factorial, 10, 1000);
    let mut reporter = Reporter::new(Vec::new());

    let outcome = BenchmarkDriver::new(config).run(&mut reporter).expect("factorial run");

    assert_eq!(outcome.loop_count, 1000);
    let lines = report_lines(reporter);
    assert_eq!(lines[0], "Running FACTORIAL with n = 10 loop = 1000");
    assert!(lines[2].starts_with("UNOPTIMIZED(ms):"));
    assert!(lines[3].starts_with("OPTIMIZED(ms):"));
    assert!(lines[4].starts_with("SPEEDUP:"));
}

#[test]
fn every_operation_passes_the_oracle() {
    for op in OperationId::ALL {
        let config = HarnessConfig::new(op, 9, 2);
        let mut reporter = Reporter::new(Vec::new());
        let mut driver = BenchmarkDriver::new(config);

        driver.run(&mut reporter).unwrap_or_else(|err| panic!("{op}: {err}"));
        assert_eq!(driver.phase(), Phase::Report);
    }
}

#[test]
fn frozen_clock_reports_undefined_speedup() {
    let config = HarnessConfig::new(OperationId::ArrayInit, 32, 10);
    let mut reporter = Reporter::new(Vec::new());

    let outcome = BenchmarkDriver::with_clock(config, FrozenClock)
        .run(&mut reporter)
        .expect("run succeeds");

    assert_eq!(outcome.speedup, Speedup::Undefined);
    let lines = report_lines(reporter);
    assert_eq!(lines[2], "UNOPTIMIZED(ms):           0.0");
    assert_eq!(lines[3], "OPTIMIZED(ms):             0.0");
    assert_eq!(lines[4], "SPEEDUP:             undefined");
}

#[test]
fn broken_candidate_is_refused() {
    let config = HarnessConfig::new(OperationId::Factorial, 12, 3);
    let mut reporter = Reporter::new(Vec::new());
    let mut driver = BenchmarkDriver::with_clock(config, FrozenClock);
    let reference = OperationRegistry::new().kernel_pair(OperationId::Factorial).reference;
    let pair = KernelPair::new(reference, Kernel::new("factorial_plus_one", factorial_plus_one));

    let err = driver.run_pair(pair, &mut reporter).unwrap_err();

    assert_eq!(err.exit_code(), 1);
    assert!(err
        .to_string()
        .starts_with("result of optimized operation did not match result of unoptimized operation"));
    match err {
        Error::CorrectnessMismatch { expected, actual, .. } => {
            assert_eq!(expected, "479001600");
            assert_eq!(actual, "479001601");
        }
        other => panic!("unexpected error {other}"),
    }
    assert_eq!(driver.phase(), Phase::Fault);

    let lines = report_lines(reporter);
    assert_eq!(lines.len(), 3);
    assert!(lines[2].starts_with("UNOPTIMIZED(ms):"));
}

#[test]
fn scratch_limit_stops_before_any_timing() {
    let config = HarnessConfig::new(OperationId::MatrixInit, 100, 1).with_scratch_limit(Some(1024));
    let mut reporter = Reporter::new(Vec::new());

    let err = BenchmarkDriver::with_clock(config, FrozenClock)
        .run(&mut reporter)
        .unwrap_err();

    assert!(matches!(err, Error::ScratchLimitExceeded { limit: 1024, .. }));
    assert_eq!(err.exit_code(), 12);
    let lines = report_lines(reporter);
    assert_eq!(lines, vec!["Running MATRIX_INIT with n = 100 loop = 1".to_owned(), String::new()]);
}

#[test]
fn size_overflow_is_resource_exhaustion() {
    let config = HarnessConfig::new(OperationId::MatrixMultiply, usize::MAX / 2, 1);
    let mut reporter = Reporter::new(Vec::new());

    let err = BenchmarkDriver::with_clock(config, FrozenClock)
        .run(&mut reporter)
        .unwrap_err();

    assert!(err.is_resource_exhaustion());
}

#[test]
fn candidate_runs_on_a_fresh_context() {
    // The reference leaves a fully computed product behind. An accumulating
    // candidate only agrees with it if it starts from zeroed scratch.
    let config = HarnessConfig::new(OperationId::MatrixMultiply, 6, 1);
    let mut reporter = Reporter::new(Vec::new());
    let reference = OperationRegistry::new().kernel_pair(OperationId::MatrixMultiply).reference;
    let pair = KernelPair::new(reference, Kernel::new("matrix_multiply_accumulate", accumulating_multiply));

    BenchmarkDriver::with_clock(config, FrozenClock)
        .run_pair(pair, &mut reporter)
        .expect("fresh context");
}

#[test]
fn repeated_candidate_state_is_what_gets_verified() {
    let config = HarnessConfig::new(OperationId::MatrixMultiply, 6, 2);
    let mut reporter = Reporter::new(Vec::new());
    let reference = OperationRegistry::new().kernel_pair(OperationId::MatrixMultiply).reference;
    let pair = KernelPair::new(reference, Kernel::new("matrix_multiply_accumulate", accumulating_multiply));

    let err = BenchmarkDriver::with_clock(config, FrozenClock)
        .run_pair(pair, &mut reporter)
        .unwrap_err();

    assert!(matches!(err, Error::CorrectnessMismatch { .. }));
}

#[test]
fn zero_loop_still_verifies_initial_state() {
    let config = HarnessConfig::new(OperationId::MatrixInit, 4, 0);
    let mut reporter = Reporter::new(Vec::new());

    let outcome = BenchmarkDriver::new(config).run(&mut reporter).expect("zero loop run");

    assert!(outcome.reference.is_zero());
    assert!(outcome.candidate.is_zero());
    assert_eq!(outcome.speedup, Speedup::Undefined);
    assert_eq!(report_lines(reporter).len(), 5);
}

#[test]
fn deep_factorial_runs_on_a_sized_thread() {
    let driver = BenchmarkDriver::new(HarnessConfig::new(OperationId::Factorial, 200_000, 1));
    let stack_bytes = driver.stack_bytes();

    let outcome = std::thread::Builder::new()
        .stack_size(stack_bytes)
        .spawn(move || {
            let mut driver = driver;
            driver.run(&mut Reporter::new(Vec::new()))
        })
        .expect("spawn benchmark thread")
        .join()
        .expect("benchmark thread")
        .expect("deep factorial run");

    assert_eq!(outcome.n, 200_000);
}

#[test]
fn failed_capture_prints_no_timing() {
    let config = HarnessConfig::new(OperationId::MatrixMultiply, 16, 1).with_scratch_limit(Some(3500));
    let mut reporter = Reporter::new(Vec::new());
    let mut driver = BenchmarkDriver::with_clock(config, FrozenClock);

    let err = driver.run(&mut reporter).unwrap_err();

    assert!(err.is_resource_exhaustion());
    assert_eq!(driver.failed_phase(), Some(Phase::Capture));
    assert_eq!(
        report_lines(reporter),
        vec!["Running MATRIX_MULTIPLY with n = 16 loop = 1".to_owned(), String::new()]
    );
}
