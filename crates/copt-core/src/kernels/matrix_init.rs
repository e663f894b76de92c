//! Matrix initialization: `A[i][j] = i`, `B[i][j] = i + 1`

use super::{Kernel, KernelPair};
use crate::context::{BenchmarkContext, ContextParts, Element};

pub const PAIR: KernelPair = KernelPair::new(
    Kernel::new("matrix_init_unopt", reference),
    Kernel::new("matrix_init_opt", candidate),
);

#[inline(never)]
fn check(i: usize, n: usize) -> bool {
    i < n
}

#[inline(never)]
fn set(buffer: &mut [Element], index: usize, value: Element) {
    buffer[index] = value;
}

/// Out-of-line bound checks and stores, recomputing the flat index per cell.
pub fn reference(context: &mut BenchmarkContext) {
    let ContextParts { n, lhs, rhs, .. } = context.parts_mut();

    let mut i = 0;
    while check(i, n) {
        let mut j = 0;
        while check(j, n) {
            set(lhs, i * n + j, i as Element);
            set(rhs, i * n + j, (i as Element).wrapping_add(1));
            j += 1;
        }
        i += 1;
    }
}

/// Row slices filled directly.
pub fn candidate(context: &mut BenchmarkContext) {
    let ContextParts { n, lhs, rhs, .. } = context.parts_mut();
    if n == 0 {
        return;
    }

    for (i, (row_a, row_b)) in lhs.chunks_exact_mut(n).zip(rhs.chunks_exact_mut(n)).enumerate() {
        let value = i as Element;
        row_a.fill(value);
        row_b.fill(value.wrapping_add(1));
    }
}
