//! Kernel pairs
//!
//! Each operation has a reference kernel (deliberately unoptimized, treated
//! as ground truth) and a candidate kernel (hand-optimized). Both are plain
//! functions over a [`BenchmarkContext`]:
//!
//! - they read `n` and any input buffers, and write the operation's outputs
//! - they never allocate
//! - they can be invoked repeatedly on the same context without
//!   reinitialization
//!
//! Equivalence is never assumed here. The result oracle checks it at run time.

pub mod array_init;
pub mod factorial;
pub mod matrix_init;
pub mod matrix_multiply;

use std::fmt;

use crate::context::BenchmarkContext;
use crate::operation::OperationId;

/// Kernel entry point.
pub type KernelFn = fn(&mut BenchmarkContext);

/// Which side of a kernel pair is being run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Reference,
    Candidate,
}

impl Variant {
    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Reference => "reference",
            Variant::Candidate => "candidate",
        }
    }

    /// Label used in the stdout report.
    pub fn report_label(self) -> &'static str {
        match self {
            Variant::Reference => "UNOPTIMIZED(ms):",
            Variant::Candidate => "OPTIMIZED(ms):",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named kernel function
#[derive(Clone, Copy)]
pub struct Kernel {
    name: &'static str,
    run: KernelFn,
}

impl Kernel {
    pub const fn new(name: &'static str, run: KernelFn) -> Self {
        Self { name, run }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn invoke(&self, context: &mut BenchmarkContext) {
        (self.run)(context)
    }
}

impl fmt::Debug for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kernel").field("name", &self.name).finish()
    }
}

/// Reference and candidate kernels declared equivalent for one operation
#[derive(Debug, Clone, Copy)]
pub struct KernelPair {
    pub reference: Kernel,
    pub candidate: Kernel,
}

impl KernelPair {
    pub const fn new(reference: Kernel, candidate: Kernel) -> Self {
        Self { reference, candidate }
    }

    pub fn get(&self, variant: Variant) -> &Kernel {
        match variant {
            Variant::Reference => &self.reference,
            Variant::Candidate => &self.candidate,
        }
    }
}

/// Stack every benchmark thread gets on top of kernel recursion.
pub const BASE_STACK_BYTES: usize = 8 << 20;

/// Largest stack a benchmark thread may request.
pub const MAX_STACK_BYTES: usize = 1 << 30;

/// Stack needed to run both kernels of `operation` at size `n`, `None` on
/// overflow.
pub fn stack_bytes(operation: OperationId, n: usize) -> Option<usize> {
    let recursion = match operation {
        OperationId::Factorial => factorial::recursion_stack_bytes(n)?,
        OperationId::MatrixInit | OperationId::ArrayInit | OperationId::MatrixMultiply => 0,
    };
    recursion.checked_add(BASE_STACK_BYTES)
}

/// Resolve the built-in kernel pair for an operation.
pub fn pair_for(operation: OperationId) -> KernelPair {
    match operation {
        OperationId::MatrixInit => matrix_init::PAIR,
        OperationId::ArrayInit => array_init::PAIR,
        OperationId::Factorial => factorial::PAIR,
        OperationId::MatrixMultiply => matrix_multiply::PAIR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_operation_has_distinct_kernel_names() {
        for op in OperationId::ALL {
            let pair = pair_for(op);
            assert_ne!(pair.reference.name(), pair.candidate.name());
            assert!(pair.reference.name().ends_with("_unopt"));
            assert!(pair.candidate.name().ends_with("_opt"));
        }
    }

    #[test]
    fn only_factorial_needs_extra_stack() {
        assert_eq!(stack_bytes(OperationId::MatrixMultiply, 1 << 20), Some(BASE_STACK_BYTES));
        assert_eq!(
            stack_bytes(OperationId::Factorial, 200_000),
            Some(BASE_STACK_BYTES + 200_000 * factorial::FRAME_BYTES)
        );
        assert_eq!(stack_bytes(OperationId::Factorial, usize::MAX), None);
    }

    #[test]
    fn variant_labels() {
        assert_eq!(Variant::Reference.report_label(), "UNOPTIMIZED(ms):");
        assert_eq!(Variant::Candidate.report_label(), "OPTIMIZED(ms):");
        let pair = pair_for(OperationId::Factorial);
        assert_eq!(pair.get(Variant::Candidate).name(), "factorial_opt");
    }
}
