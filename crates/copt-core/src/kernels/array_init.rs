//! Array initialization: `arr[i] = i * ((X % Y) * Z)`

use std::hint::black_box;

use super::{Kernel, KernelPair};
use crate::context::{BenchmarkContext, ContextParts, Element};

pub const X: Element = 500;
pub const Y: Element = 12;
pub const Z: Element = 8;

pub const PAIR: KernelPair = KernelPair::new(
    Kernel::new("array_init_unopt", reference),
    Kernel::new("array_init_opt", candidate),
);

/// Recomputes the modulus for every element and multiplies per element.
pub fn reference(context: &mut BenchmarkContext) {
    let ContextParts { n, lhs, .. } = context.parts_mut();

    for (i, slot) in lhs.iter_mut().enumerate().take(n) {
        let modulus = black_box(X) % Y;
        *slot = (i as Element).wrapping_mul(modulus).wrapping_mul(Z);
    }
}

/// Hoisted step, 4-way unrolled running sum, no multiply in the loop.
pub fn candidate(context: &mut BenchmarkContext) {
    let ContextParts { n, lhs, .. } = context.parts_mut();
    let n = n.min(lhs.len());

    let step = (X % Y) * Z;
    let step2 = step + step;
    let step3 = step2 + step;
    let step4 = step2 + step2;

    let mut value: Element = 0;
    let mut chunks = lhs[..n].chunks_exact_mut(4);
    for chunk in &mut chunks {
        chunk[0] = value;
        chunk[1] = value.wrapping_add(step);
        chunk[2] = value.wrapping_add(step2);
        chunk[3] = value.wrapping_add(step3);
        value = value.wrapping_add(step4);
    }

    for slot in chunks.into_remainder() {
        *slot = value;
        value = value.wrapping_add(step);
    }
}
