//! Factorial in wrapping unsigned 64-bit arithmetic

use super::{Kernel, KernelPair};
use crate::context::{BenchmarkContext, ContextParts};

pub const PAIR: KernelPair = KernelPair::new(
    Kernel::new("factorial_unopt", reference),
    Kernel::new("factorial_opt", candidate),
);

/// Upper bound on one `factorial_recursive` frame, unoptimized builds included.
pub const FRAME_BYTES: usize = 128;

/// Stack consumed by the reference kernel's recursion, `None` on overflow.
pub fn recursion_stack_bytes(n: usize) -> Option<usize> {
    n.checked_mul(FRAME_BYTES)
}

// Recursion depth equals n.
fn factorial_recursive(n: u64) -> u64 {
    if n == 0 {
        return 1;
    }
    n.wrapping_mul(factorial_recursive(n - 1))
}

/// One call frame per factor.
pub fn reference(context: &mut BenchmarkContext) {
    let ContextParts { n, scalar, .. } = context.parts_mut();
    *scalar = factorial_recursive(n as u64);
}

/// Single multiply loop.
pub fn candidate(context: &mut BenchmarkContext) {
    let ContextParts { n, scalar, .. } = context.parts_mut();

    let mut product: u64 = 1;
    for factor in 2..=n as u64 {
        product = product.wrapping_mul(factor);
    }
    *scalar = product;
}
