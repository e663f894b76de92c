//! Command-line arguments

use std::fmt::Write;

use clap::{ArgAction, Parser};
use copt_core::{HarnessConfig, OperationId};

const LONG_ABOUT: &str = "\
copt measures the execution time impact of source level optimizations. \
copt runs and times an unoptimized and optimized version of a given \
operation and input size, and only reports a speedup when both versions \
produced identical results.";

const LOOP_HELP: &str = "\
LOOP is the number of times to run the given operation with the given
argument. Timing starts before the first operation begins and ends when
the last operation has completed.";

/// Operation table and LOOP description shown after the argument list.
fn operations_help() -> String {
    let mut help = String::from("OP is the operation to run. Each takes exactly one argument N:\n");
    for op in OperationId::ALL {
        // Writing to a String cannot fail
        let _ = writeln!(help, "  {}: {}", op.code(), op.describe_n());
    }
    help.push('\n');
    help.push_str(LOOP_HELP);
    help
}

#[derive(Parser, Debug)]
#[command(name = "copt")]
#[command(version)]
#[command(about = "Time an unoptimized and an optimized kernel and report the speedup")]
#[command(long_about = LONG_ABOUT, after_help = operations_help())]
pub struct Args {
    /// Operation code (0-3)
    #[arg(value_name = "OP", value_parser = parse_operation)]
    pub operation: OperationId,

    /// Problem size
    #[arg(value_name = "N")]
    pub n: usize,

    /// Repetitions per timed phase
    #[arg(value_name = "LOOP")]
    pub loop_count: u64,

    /// Refuse any scratch allocation larger than this many bytes
    #[arg(long, value_name = "BYTES", env = "COPT_MAX_SCRATCH_BYTES")]
    pub max_scratch_bytes: Option<usize>,

    /// Log to stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn harness_config(&self) -> HarnessConfig {
        HarnessConfig::new(self.operation, self.n, self.loop_count).with_scratch_limit(self.max_scratch_bytes)
    }
}

fn parse_operation(value: &str) -> Result<OperationId, String> {
    let code: u32 = value
        .parse()
        .map_err(|_| format!("`{value}` is not an operation code"))?;
    OperationId::from_code(code).map_err(|err| err.to_string())
}
