//! copt: compare an unoptimized kernel against its optimized counterpart
//!
//! ```bash
//! copt 2 10 1000            # factorial(10), 1000 repetitions per phase
//! copt -vv 3 256 5          # matrix multiply with debug logs on stderr
//! ```
//!
//! The report goes to stdout. Diagnostics and logs go to stderr.

mod cli;

use std::io;
use std::panic;
use std::process::ExitCode;
use std::thread;

use clap::Parser;
use copt_core::error::{EXIT_ARGUMENT, EXIT_RESOURCE};
use copt_core::{BenchmarkDriver, BenchmarkOutcome, Reporter};
use copt_tracing::{init_global_tracing, TracingConfig};

use crate::cli::Args;

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::from(EXIT_ARGUMENT)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let tracing = TracingConfig::for_cli()
        .with_verbosity(args.verbose)
        .with_env_overrides();
    if let Err(err) = init_global_tracing(&tracing) {
        eprintln!("copt: tracing disabled: {err}");
    }

    let config = args.harness_config();
    tracing::info!(
        operation = %config.operation,
        n = config.n,
        loop_count = config.loop_count,
        scratch_limit_bytes = ?config.scratch_limit_bytes,
        "copt_start"
    );

    let driver = BenchmarkDriver::new(config);
    let stack_bytes = driver.stack_bytes();
    let worker = thread::Builder::new()
        .name("copt-benchmark".to_owned())
        .stack_size(stack_bytes)
        .spawn(move || run(driver));

    // The main thread only waits: phases still run strictly one after another.
    let result = match worker {
        Ok(handle) => match handle.join() {
            Ok(result) => result,
            Err(payload) => panic::resume_unwind(payload),
        },
        Err(err) => {
            eprintln!("copt: cannot start benchmark thread with {stack_bytes} bytes of stack: {err}");
            return ExitCode::from(EXIT_RESOURCE);
        }
    };

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(mut driver: BenchmarkDriver) -> copt_core::Result<BenchmarkOutcome> {
    let mut reporter = Reporter::new(io::stdout().lock());
    driver.run(&mut reporter)
}
