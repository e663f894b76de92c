//! Stdout report
//!
//! Line order is part of the contract because tooling scrapes it:
//!
//! ```text
//! Running FACTORIAL with n = 10 loop = 1000
//!
//! UNOPTIMIZED(ms):           0.1
//! OPTIMIZED(ms):             0.0
//! SPEEDUP:             undefined
//! ```
//!
//! Each line is flushed as soon as it is written, so a run that faults after
//! the reference phase still leaves the banner and reference timing behind.

use std::fmt;
use std::io::Write;
use std::time::Duration;

use crate::error::Result;
use crate::operation::OperationId;
use crate::probe::TimingSample;

const LABEL_WIDTH: usize = 18;
const VALUE_WIDTH: usize = 12;

/// Ratio of reference to candidate time
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Speedup {
    Ratio(f64),
    /// Candidate time too small to divide by
    Undefined,
}

impl Speedup {
    /// Sentinel printed in place of a ratio.
    pub const UNDEFINED: &'static str = "undefined";

    /// `reference / candidate`, or [`Speedup::Undefined`] when the candidate
    /// sample is zero or below `threshold`.
    pub fn compute(reference: &TimingSample, candidate: &TimingSample, threshold: Duration) -> Self {
        if candidate.elapsed.is_zero() || candidate.elapsed < threshold {
            return Speedup::Undefined;
        }
        Speedup::Ratio(reference.millis() / candidate.millis())
    }

    pub fn ratio(&self) -> Option<f64> {
        match self {
            Speedup::Ratio(ratio) => Some(*ratio),
            Speedup::Undefined => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Speedup::Ratio(_))
    }
}

impl fmt::Display for Speedup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speedup::Ratio(ratio) => f.pad(&format!("{ratio:.1}")),
            Speedup::Undefined => f.pad(Self::UNDEFINED),
        }
    }
}

/// Writes report lines to a sink
#[derive(Debug)]
pub struct Reporter<W> {
    out: W,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn banner(&mut self, operation: OperationId, n: usize, loop_count: u64) -> Result<()> {
        writeln!(self.out, "Running {operation} with n = {n} loop = {loop_count}")?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }

    /// Timing line for either variant, labelled by the sample's variant.
    pub fn timing(&mut self, sample: &TimingSample) -> Result<()> {
        let label = sample.variant.report_label();
        let millis = sample.millis();
        writeln!(self.out, "{label:<LABEL_WIDTH$}{millis:>VALUE_WIDTH$.1}")?;
        self.out.flush()?;
        Ok(())
    }

    pub fn speedup(&mut self, speedup: Speedup) -> Result<()> {
        writeln!(self.out, "{:<LABEL_WIDTH$}{speedup:>VALUE_WIDTH$}", "SPEEDUP:")?;
        self.out.flush()?;
        Ok(())
    }
}
