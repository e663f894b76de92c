//! Operation registry
//!
//! Binds an [`OperationId`] to its scratch-memory recipe, its pre-fill step,
//! and its kernel pair. Every context the driver times is built here, so the
//! reference and candidate phases start from identical state.

use std::time::Instant;

use copt_tracing::performance::{record_allocation, PerformanceSpan};

use crate::context::{BenchmarkContext, ELEMENT_BYTES};
use crate::error::{Error, Result};
use crate::kernels::{self, matrix_init, KernelPair, MAX_STACK_BYTES};
use crate::operation::{BufferId, OperationId};
use crate::oracle::{self, CapturedResult};

/// Scratch layout for one context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScratchRecipe {
    /// Buffers to allocate, all of the same length
    pub buffers: &'static [BufferId],
    /// Elements per buffer
    pub elements: usize,
}

impl ScratchRecipe {
    /// Compute the layout for `operation` at size `n`.
    ///
    /// Overflow in the element or byte count is reported as resource
    /// exhaustion: such a context could never be allocated.
    pub fn for_operation(operation: OperationId, n: usize) -> Result<Self> {
        let (buffers, elements): (&'static [BufferId], Option<usize>) = match operation {
            OperationId::MatrixInit => (&[BufferId::Lhs, BufferId::Rhs], n.checked_mul(n)),
            OperationId::ArrayInit => (&[BufferId::Lhs], Some(n)),
            OperationId::Factorial => (&[], Some(0)),
            OperationId::MatrixMultiply => (&[BufferId::Lhs, BufferId::Rhs, BufferId::Product], n.checked_mul(n)),
        };

        let overflow = || Error::SizeOverflow {
            n,
            buffers: buffers.len(),
        };
        let recipe = Self {
            buffers,
            elements: elements.ok_or_else(overflow)?,
        };
        recipe.total_bytes().ok_or_else(overflow)?;
        Ok(recipe)
    }

    /// Bytes across all buffers, or `None` on overflow.
    pub fn total_bytes(&self) -> Option<usize> {
        self.elements
            .checked_mul(ELEMENT_BYTES)?
            .checked_mul(self.buffers.len())
    }
}

/// Refuse sizes whose kernel recursion would not fit in a benchmark thread.
fn check_stack(operation: OperationId, n: usize) -> Result<()> {
    match kernels::stack_bytes(operation, n) {
        Some(required) if required <= MAX_STACK_BYTES => Ok(()),
        required => Err(Error::StackLimitExceeded {
            n,
            required: required.unwrap_or(usize::MAX),
            limit: MAX_STACK_BYTES,
        }),
    }
}

/// Resolves operations to contexts and kernel pairs
#[derive(Debug, Clone, Default)]
pub struct OperationRegistry {
    scratch_limit_bytes: Option<usize>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the scratch memory the harness holds at any one time.
    ///
    /// The budget covers a context plus whatever is held alongside it (the
    /// reference capture while the candidate context is built). A refusal is
    /// reported exactly like an allocator failure.
    pub fn with_scratch_limit(limit: Option<usize>) -> Self {
        Self {
            scratch_limit_bytes: limit,
        }
    }

    pub fn scratch_limit_bytes(&self) -> Option<usize> {
        self.scratch_limit_bytes
    }

    /// The built-in kernel pair for `operation`.
    pub fn kernel_pair(&self, operation: OperationId) -> KernelPair {
        kernels::pair_for(operation)
    }

    /// Allocate and pre-fill a fresh context.
    ///
    /// Every call returns a context in the same initial state for the same
    /// `(operation, n)`.
    pub fn build_context(&self, operation: OperationId, n: usize) -> Result<BenchmarkContext> {
        self.build_context_alongside(operation, n, 0)
    }

    /// Like [`Self::build_context`], while `held_bytes` of scratch are
    /// already live elsewhere.
    pub fn build_context_alongside(
        &self,
        operation: OperationId,
        n: usize,
        held_bytes: usize,
    ) -> Result<BenchmarkContext> {
        check_stack(operation, n)?;
        let recipe = ScratchRecipe::for_operation(operation, n)?;
        let total_bytes = recipe.total_bytes().unwrap_or(usize::MAX);
        self.check_budget(total_bytes.saturating_add(held_bytes))?;

        let start = Instant::now();
        let mut context = BenchmarkContext::allocate(operation, n, recipe.buffers, recipe.elements)?;
        record_allocation(total_bytes, recipe.buffers.len(), start.elapsed().as_micros() as u64);

        if operation == OperationId::MatrixMultiply {
            let _span = PerformanceSpan::new("matrix_multiply_prefill", None);
            matrix_init::reference(&mut context);
        }

        Ok(context)
    }

    /// Snapshot the outputs of `context`, counting the copy against the
    /// scratch budget together with the context itself.
    pub fn capture(&self, context: &BenchmarkContext) -> Result<CapturedResult> {
        self.check_budget(context.scratch_bytes().saturating_add(oracle::capture_bytes(context)))?;
        oracle::capture(context)
    }

    fn check_budget(&self, requested: usize) -> Result<()> {
        match self.scratch_limit_bytes {
            Some(limit) if requested > limit => Err(Error::ScratchLimitExceeded { requested, limit }),
            _ => Ok(()),
        }
    }

    /// Build a context and resolve the kernel pair in one step.
    pub fn resolve(&self, operation: OperationId, n: usize) -> Result<(BenchmarkContext, KernelPair)> {
        let context = self.build_context(operation, n)?;
        Ok((context, self.kernel_pair(operation)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipes_match_operation_layout() {
        let matrix = ScratchRecipe::for_operation(OperationId::MatrixInit, 4).unwrap();
        assert_eq!(matrix.buffers.len(), 2);
        assert_eq!(matrix.elements, 16);
        assert_eq!(matrix.total_bytes(), Some(2 * 16 * ELEMENT_BYTES));

        let array = ScratchRecipe::for_operation(OperationId::ArrayInit, 4).unwrap();
        assert_eq!(array.buffers, &[BufferId::Lhs]);
        assert_eq!(array.elements, 4);

        let factorial = ScratchRecipe::for_operation(OperationId::Factorial, 1_000_000).unwrap();
        assert!(factorial.buffers.is_empty());
        assert_eq!(factorial.total_bytes(), Some(0));

        let multiply = ScratchRecipe::for_operation(OperationId::MatrixMultiply, 3).unwrap();
        assert_eq!(multiply.buffers.len(), 3);
        assert_eq!(multiply.elements, 9);
    }

    #[test]
    fn overflowing_size_is_resource_exhaustion() {
        let err = ScratchRecipe::for_operation(OperationId::MatrixMultiply, usize::MAX).unwrap_err();
        assert!(matches!(err, Error::SizeOverflow { buffers: 3, .. }));

        let err = ScratchRecipe::for_operation(OperationId::ArrayInit, usize::MAX).unwrap_err();
        assert!(err.is_resource_exhaustion());
    }

    #[test]
    fn scratch_limit_rejects_before_allocating() {
        let registry = OperationRegistry::with_scratch_limit(Some(1024));
        let err = registry.build_context(OperationId::MatrixMultiply, 64).unwrap_err();
        match err {
            Error::ScratchLimitExceeded { requested, limit } => {
                assert_eq!(requested, 3 * 64 * 64 * ELEMENT_BYTES);
                assert_eq!(limit, 1024);
            }
            other => panic!("unexpected error: {other}"),
        }

        // Factorial needs no scratch and is never refused
        assert!(registry.build_context(OperationId::Factorial, 64).is_ok());
    }

    #[test]
    fn scratch_limit_counts_the_capture() {
        // One MatrixInit context at n = 16 is 2 KiB; with its capture, 4 KiB.
        let registry = OperationRegistry::with_scratch_limit(Some(3 * 1024));
        let ctx = registry.build_context(OperationId::MatrixInit, 16).unwrap();

        let err = registry.capture(&ctx).unwrap_err();
        assert!(matches!(err, Error::ScratchLimitExceeded { requested: 4096, limit: 3072 }));

        let err = registry
            .build_context_alongside(OperationId::MatrixInit, 16, 2048)
            .unwrap_err();
        assert!(err.is_resource_exhaustion());

        let roomy = OperationRegistry::with_scratch_limit(Some(4096));
        let captured = roomy.capture(&ctx).unwrap();
        assert!(roomy
            .build_context_alongside(OperationId::MatrixInit, 16, captured.scratch_bytes())
            .is_ok());
    }

    #[test]
    fn factorial_recursion_beyond_stack_limit_is_refused() {
        let registry = OperationRegistry::new();
        assert!(registry.build_context(OperationId::Factorial, 200_000).is_ok());

        let err = registry.build_context(OperationId::Factorial, 1 << 40).unwrap_err();
        assert!(matches!(err, Error::StackLimitExceeded { limit: MAX_STACK_BYTES, .. }));
        assert_eq!(err.exit_code(), crate::error::EXIT_RESOURCE);

        let err = registry.build_context(OperationId::Factorial, usize::MAX).unwrap_err();
        assert!(matches!(err, Error::StackLimitExceeded { required: usize::MAX, .. }));
    }

    #[test]
    fn matrix_multiply_inputs_are_prefilled() {
        let ctx = OperationRegistry::new()
            .build_context(OperationId::MatrixMultiply, 3)
            .unwrap();
        assert_eq!(ctx.lhs(), &[0, 0, 0, 1, 1, 1, 2, 2, 2]);
        assert_eq!(ctx.rhs(), &[1, 1, 1, 2, 2, 2, 3, 3, 3]);
        assert!(ctx.product().iter().all(|&v| v == 0));
    }

    #[test]
    fn fresh_contexts_are_identical() {
        let registry = OperationRegistry::new();
        for op in OperationId::ALL {
            let (mut first, pair) = registry.resolve(op, 6).unwrap();
            let second = registry.build_context(op, 6).unwrap();
            assert_eq!(first.lhs(), second.lhs());
            assert_eq!(first.rhs(), second.rhs());
            assert_eq!(first.product(), second.product());
            assert_eq!(first.scalar(), second.scalar());

            // Mutating one context never leaks into the next
            pair.reference.invoke(&mut first);
            let third = registry.build_context(op, 6).unwrap();
            assert_eq!(third.product(), second.product());
            assert_eq!(third.scalar(), 0);
        }
    }
}
