//! Benchmark contexts and scratch memory
//!
//! A [`BenchmarkContext`] exclusively owns the scratch buffers of one timed
//! phase. Contexts are built by the operation registry, mutated in place by
//! kernels, and dropped before the next phase's context is built.

use crate::error::{Error, Result};
use crate::operation::{BufferId, OperationId, OutputSlot};

/// Element type of every scratch buffer.
pub type Element = i32;

/// Bytes per scratch element.
pub const ELEMENT_BYTES: usize = std::mem::size_of::<Element>();

/// Scratch memory and result slot for a single kernel phase
#[derive(Debug)]
pub struct BenchmarkContext {
    operation: OperationId,
    n: usize,
    lhs: Vec<Element>,
    rhs: Vec<Element>,
    product: Vec<Element>,
    scalar: u64,
}

/// Simultaneous mutable access to every part of a context.
///
/// Buffers the operation does not use are empty slices.
pub struct ContextParts<'a> {
    pub n: usize,
    pub lhs: &'a mut [Element],
    pub rhs: &'a mut [Element],
    pub product: &'a mut [Element],
    pub scalar: &'a mut u64,
}

/// Read-only view of one oracle output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputView<'a> {
    Buffer(&'a [Element]),
    Scalar(u64),
}

impl BenchmarkContext {
    /// Reserve `buffers` zero-filled scratch buffers of `len` elements each.
    ///
    /// Fails without touching memory if any reservation is refused, so a
    /// partially allocated context is never returned.
    pub(crate) fn allocate(operation: OperationId, n: usize, buffers: &[BufferId], len: usize) -> Result<Self> {
        let mut context = Self {
            operation,
            n,
            lhs: Vec::new(),
            rhs: Vec::new(),
            product: Vec::new(),
            scalar: 0,
        };

        for &buffer in buffers {
            *context.buffer_vec_mut(buffer) = zeroed_buffer(len)?;
        }

        Ok(context)
    }

    pub fn operation(&self) -> OperationId {
        self.operation
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn lhs(&self) -> &[Element] {
        &self.lhs
    }

    pub fn rhs(&self) -> &[Element] {
        &self.rhs
    }

    pub fn product(&self) -> &[Element] {
        &self.product
    }

    pub fn scalar(&self) -> u64 {
        self.scalar
    }

    pub fn buffer(&self, id: BufferId) -> &[Element] {
        match id {
            BufferId::Lhs => &self.lhs,
            BufferId::Rhs => &self.rhs,
            BufferId::Product => &self.product,
        }
    }

    fn buffer_vec_mut(&mut self, id: BufferId) -> &mut Vec<Element> {
        match id {
            BufferId::Lhs => &mut self.lhs,
            BufferId::Rhs => &mut self.rhs,
            BufferId::Product => &mut self.product,
        }
    }

    /// Split the context into independently borrowable parts for a kernel.
    pub fn parts_mut(&mut self) -> ContextParts<'_> {
        ContextParts {
            n: self.n,
            lhs: &mut self.lhs,
            rhs: &mut self.rhs,
            product: &mut self.product,
            scalar: &mut self.scalar,
        }
    }

    pub fn output(&self, slot: OutputSlot) -> OutputView<'_> {
        match slot {
            OutputSlot::Buffer(id, _) => OutputView::Buffer(self.buffer(id)),
            OutputSlot::Scalar(_) => OutputView::Scalar(self.scalar),
        }
    }

    /// Total bytes held by the scratch buffers.
    pub fn scratch_bytes(&self) -> usize {
        (self.lhs.len() + self.rhs.len() + self.product.len()) * ELEMENT_BYTES
    }
}

/// Reserve exactly `len` elements and zero them.
pub(crate) fn zeroed_buffer(len: usize) -> Result<Vec<Element>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| Error::OutOfMemory {
            requested: len.saturating_mul(ELEMENT_BYTES),
        })?;
    buffer.resize(len, 0);
    Ok(buffer)
}

/// Deep-copy a buffer, reporting allocation failure instead of aborting.
pub(crate) fn copy_buffer(source: &[Element]) -> Result<Vec<Element>> {
    let mut copy = Vec::new();
    copy.try_reserve_exact(source.len()).map_err(|_| Error::OutOfMemory {
        requested: source.len().saturating_mul(ELEMENT_BYTES),
    })?;
    copy.extend_from_slice(source);
    Ok(copy)
}
