//! Operation identifiers
//!
//! The set of benchmarkable operations is closed. Everything downstream
//! (scratch layout, kernel pair, oracle outputs) is selected by matching on
//! [`OperationId`].

use std::fmt;

use crate::error::{Error, Result};

/// Operation selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationId {
    /// Fill two N×N matrices from their row index
    MatrixInit,
    /// Fill a length-N array from its index
    ArrayInit,
    /// Compute N! in wrapping 64-bit arithmetic
    Factorial,
    /// Dense N×N integer matrix product
    MatrixMultiply,
}

/// Scratch buffer owned by a benchmark context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferId {
    Lhs,
    Rhs,
    Product,
}

/// Output compared by the result oracle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputSlot {
    Buffer(BufferId, &'static str),
    Scalar(&'static str),
}

impl OutputSlot {
    pub fn name(self) -> &'static str {
        match self {
            OutputSlot::Buffer(_, name) | OutputSlot::Scalar(name) => name,
        }
    }
}

impl OperationId {
    /// Every operation, in command-line code order.
    pub const ALL: [OperationId; 4] = [
        OperationId::MatrixInit,
        OperationId::ArrayInit,
        OperationId::Factorial,
        OperationId::MatrixMultiply,
    ];

    /// Resolve a command-line operation code.
    pub fn from_code(code: u32) -> Result<Self> {
        match code {
            0 => Ok(OperationId::MatrixInit),
            1 => Ok(OperationId::ArrayInit),
            2 => Ok(OperationId::Factorial),
            3 => Ok(OperationId::MatrixMultiply),
            other => Err(Error::InvalidOperation(other)),
        }
    }

    pub fn code(self) -> u32 {
        match self {
            OperationId::MatrixInit => 0,
            OperationId::ArrayInit => 1,
            OperationId::Factorial => 2,
            OperationId::MatrixMultiply => 3,
        }
    }

    /// Name printed in the report banner.
    pub fn display_name(self) -> &'static str {
        match self {
            OperationId::MatrixInit => "MATRIX_INIT",
            OperationId::ArrayInit => "ARRAY_INIT",
            OperationId::Factorial => "FACTORIAL",
            OperationId::MatrixMultiply => "MATRIX_MULTIPLY",
        }
    }

    /// One-line meaning of N for this operation.
    pub fn describe_n(self) -> &'static str {
        match self {
            OperationId::MatrixInit => "initialize a pair of square integer matrices; N is the size of the matrices",
            OperationId::ArrayInit => "initialize an integer array; N is the length of the array",
            OperationId::Factorial => "compute factorial with a recursive routine; N is the factorial argument",
            OperationId::MatrixMultiply => "multiply two square integer matrices; N is the size of the matrices",
        }
    }

    /// Outputs captured after the reference run and checked after the candidate run.
    pub fn outputs(self) -> &'static [OutputSlot] {
        match self {
            OperationId::MatrixInit => &[
                OutputSlot::Buffer(BufferId::Lhs, "matrix_a"),
                OutputSlot::Buffer(BufferId::Rhs, "matrix_b"),
            ],
            OperationId::ArrayInit => &[OutputSlot::Buffer(BufferId::Lhs, "array")],
            OperationId::Factorial => &[OutputSlot::Scalar("factorial")],
            OperationId::MatrixMultiply => &[OutputSlot::Buffer(BufferId::Product, "product")],
        }
    }

    /// Logical elements produced by one kernel invocation, for throughput logs.
    pub fn logical_elements(self, n: usize) -> u64 {
        let n = n as u64;
        match self {
            OperationId::MatrixInit => n.saturating_mul(n).saturating_mul(2),
            OperationId::ArrayInit | OperationId::Factorial => n,
            OperationId::MatrixMultiply => n.saturating_mul(n).saturating_mul(n),
        }
    }
}

impl TryFrom<u32> for OperationId {
    type Error = Error;

    fn try_from(code: u32) -> Result<Self> {
        OperationId::from_code(code)
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
