//! Error types for the benchmark harness

use crate::operation::OperationId;

/// Result type for copt-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Process status for argument errors.
pub const EXIT_ARGUMENT: u8 = 2;
/// Process status when the candidate output differs from the reference.
pub const EXIT_MISMATCH: u8 = 1;
/// Process status for scratch allocation failures (ENOMEM).
pub const EXIT_RESOURCE: u8 = 12;
/// Process status when the report cannot be written (EX_IOERR).
pub const EXIT_REPORT_IO: u8 = 74;

/// Faults that terminate a benchmark run
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Operation code outside the registry
    #[error("Invalid operation: {0} (expected 0, 1, 2 or 3)")]
    InvalidOperation(u32),

    /// Scratch size does not fit in the address space
    #[error("Out of memory: scratch size for n = {n} overflows ({buffers} buffer(s))")]
    SizeOverflow { n: usize, buffers: usize },

    /// The allocator refused a scratch reservation
    #[error("Out of memory: requested {requested} bytes")]
    OutOfMemory { requested: usize },

    /// Scratch reservation larger than the configured budget
    #[error("Out of memory: requested {requested} bytes exceeds scratch limit of {limit} bytes")]
    ScratchLimitExceeded { requested: usize, limit: usize },

    /// Kernel recursion for this size would not fit in any benchmark thread
    #[error("Out of memory: n = {n} needs {required} bytes of stack, limit is {limit} bytes")]
    StackLimitExceeded { n: usize, required: usize, limit: usize },

    /// Candidate output differs from the captured reference output
    #[error(
        "result of optimized operation did not match result of unoptimized operation \
         ({operation}: {output}[{index}] expected {expected}, got {actual})"
    )]
    CorrectnessMismatch {
        operation: OperationId,
        output: &'static str,
        index: usize,
        expected: String,
        actual: String,
    },

    /// Writing the stdout report failed
    #[error("Failed to write report: {0}")]
    Report(#[from] std::io::Error),
}

impl Error {
    /// Whether this fault belongs to the resource-exhaustion class.
    pub fn is_resource_exhaustion(&self) -> bool {
        matches!(
            self,
            Error::SizeOverflow { .. }
                | Error::OutOfMemory { .. }
                | Error::ScratchLimitExceeded { .. }
                | Error::StackLimitExceeded { .. }
        )
    }

    /// Stable non-zero process status for this fault.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::InvalidOperation(_) => EXIT_ARGUMENT,
            Error::SizeOverflow { .. }
            | Error::OutOfMemory { .. }
            | Error::ScratchLimitExceeded { .. }
            | Error::StackLimitExceeded { .. } => EXIT_RESOURCE,
            Error::CorrectnessMismatch { .. } => EXIT_MISMATCH,
            Error::Report(_) => EXIT_REPORT_IO,
        }
    }
}
