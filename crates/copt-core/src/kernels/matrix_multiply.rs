//! Dense integer matrix product: `C[i][j] = sum_k A[i][k] * B[k][j]`
//!
//! Inputs are pre-filled by the registry with the matrix-init rule before any
//! kernel runs. Products wrap in 32-bit two's complement, which keeps the
//! result independent of summation order.

use super::{Kernel, KernelPair};
use crate::context::{BenchmarkContext, ContextParts};

pub const PAIR: KernelPair = KernelPair::new(
    Kernel::new("matrix_multiply_unopt", reference),
    Kernel::new("matrix_multiply_opt", candidate),
);

/// i-j-k order, indexing through the flat buffers on every access.
pub fn reference(context: &mut BenchmarkContext) {
    let ContextParts { n, lhs, rhs, product, .. } = context.parts_mut();

    for i in 0..n {
        for j in 0..n {
            product[i * n + j] = 0;
            for k in 0..n {
                product[i * n + j] = product[i * n + j].wrapping_add(lhs[i * n + k].wrapping_mul(rhs[k * n + j]));
            }
        }
    }
}

/// Zero once, then i-k-j order with `A[i][k]` held in a register and
/// contiguous row walks over B and C.
pub fn candidate(context: &mut BenchmarkContext) {
    let ContextParts { n, lhs, rhs, product, .. } = context.parts_mut();

    product.fill(0);
    if n == 0 {
        return;
    }

    for (row_c, row_a) in product.chunks_exact_mut(n).zip(lhs.chunks_exact(n)) {
        for (&a_ik, row_b) in row_a.iter().zip(rhs.chunks_exact(n)) {
            for (c_ij, &b_kj) in row_c.iter_mut().zip(row_b) {
                *c_ij = c_ij.wrapping_add(a_ik.wrapping_mul(b_kj));
            }
        }
    }
}
