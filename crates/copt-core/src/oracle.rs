//! Result oracle
//!
//! [`capture`] deep-copies every output of a context right after the
//! reference run. [`verify`] consumes that capture and compares it exactly
//! against the candidate context: bitwise for buffers, numeric equality for
//! the scalar. The capture owns its data, so nothing done to either context
//! afterwards can change it.

use crate::context::{copy_buffer, BenchmarkContext, Element, OutputView, ELEMENT_BYTES};
use crate::error::{Error, Result};
use crate::operation::{OperationId, OutputSlot};

/// One captured output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapturedOutput {
    Buffer { slot: OutputSlot, values: Vec<Element> },
    Scalar { slot: OutputSlot, value: u64 },
}

impl CapturedOutput {
    pub fn slot(&self) -> OutputSlot {
        match self {
            CapturedOutput::Buffer { slot, .. } | CapturedOutput::Scalar { slot, .. } => *slot,
        }
    }
}

/// Owned snapshot of a reference run's outputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedResult {
    operation: OperationId,
    n: usize,
    outputs: Vec<CapturedOutput>,
}

impl CapturedResult {
    pub fn operation(&self) -> OperationId {
        self.operation
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn outputs(&self) -> &[CapturedOutput] {
        &self.outputs
    }

    /// Bytes held by the captured buffers.
    pub fn scratch_bytes(&self) -> usize {
        self.outputs
            .iter()
            .map(|output| match output {
                CapturedOutput::Buffer { values, .. } => values.len() * ELEMENT_BYTES,
                CapturedOutput::Scalar { .. } => 0,
            })
            .sum()
    }
}

/// Bytes a [`capture`] of `context` will allocate.
pub fn capture_bytes(context: &BenchmarkContext) -> usize {
    context
        .operation()
        .outputs()
        .iter()
        .map(|&slot| match context.output(slot) {
            OutputView::Buffer(values) => values.len() * ELEMENT_BYTES,
            OutputView::Scalar(_) => 0,
        })
        .sum()
}

/// Snapshot every output of `context`.
///
/// The copy is allocated outside any timed region; an allocation failure is
/// reported as resource exhaustion.
pub fn capture(context: &BenchmarkContext) -> Result<CapturedResult> {
    let operation = context.operation();
    let outputs = operation
        .outputs()
        .iter()
        .map(|&slot| match context.output(slot) {
            OutputView::Buffer(values) => Ok(CapturedOutput::Buffer {
                slot,
                values: copy_buffer(values)?,
            }),
            OutputView::Scalar(value) => Ok(CapturedOutput::Scalar { slot, value }),
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(
        operation = %operation,
        n = context.n(),
        outputs = outputs.len(),
        "reference_output_captured"
    );

    Ok(CapturedResult {
        operation,
        n: context.n(),
        outputs,
    })
}

/// Compare `context` against a capture, consuming the capture.
///
/// Returns [`Error::CorrectnessMismatch`] describing the first differing
/// element.
pub fn verify(context: &BenchmarkContext, captured: CapturedResult) -> Result<()> {
    let operation = captured.operation;

    if context.operation() != operation || context.n() != captured.n {
        return Err(Error::CorrectnessMismatch {
            operation,
            output: "context",
            index: 0,
            expected: format!("{operation} n={}", captured.n),
            actual: format!("{} n={}", context.operation(), context.n()),
        });
    }

    for expected in &captured.outputs {
        let slot = expected.slot();
        match (expected, context.output(slot)) {
            (CapturedOutput::Buffer { values, .. }, OutputView::Buffer(actual)) => {
                compare_buffers(operation, slot, values, actual)?;
            }
            (CapturedOutput::Scalar { value, .. }, OutputView::Scalar(actual)) => {
                if *value != actual {
                    return Err(Error::CorrectnessMismatch {
                        operation,
                        output: slot.name(),
                        index: 0,
                        expected: value.to_string(),
                        actual: actual.to_string(),
                    });
                }
            }
            (captured_output, _) => {
                return Err(Error::CorrectnessMismatch {
                    operation,
                    output: slot.name(),
                    index: 0,
                    expected: kind(captured_output).to_string(),
                    actual: "other output kind".to_string(),
                });
            }
        }
    }

    tracing::debug!(operation = %operation, n = captured.n, "candidate_output_verified");
    Ok(())
}

fn kind(output: &CapturedOutput) -> &'static str {
    match output {
        CapturedOutput::Buffer { .. } => "buffer",
        CapturedOutput::Scalar { .. } => "scalar",
    }
}

fn compare_buffers(operation: OperationId, slot: OutputSlot, expected: &[Element], actual: &[Element]) -> Result<()> {
    if expected == actual {
        return Ok(());
    }

    if let Some(index) = expected.iter().zip(actual).position(|(e, a)| e != a) {
        return Err(Error::CorrectnessMismatch {
            operation,
            output: slot.name(),
            index,
            expected: expected[index].to_string(),
            actual: actual[index].to_string(),
        });
    }

    // Equal prefix, different lengths
    let index = expected.len().min(actual.len());
    Err(Error::CorrectnessMismatch {
        operation,
        output: slot.name(),
        index,
        expected: format!("length {}", expected.len()),
        actual: format!("length {}", actual.len()),
    })
}
