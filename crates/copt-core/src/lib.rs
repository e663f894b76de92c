//! # copt-core
//!
//! Micro-benchmark harness that times a deliberately unoptimized reference
//! kernel against a hand-optimized candidate kernel, then refuses to report
//! a speedup unless both produced identical results.
//!
//! ## Components
//!
//! - [`registry`]: resolves an [`OperationId`] to scratch memory and a kernel pair
//! - [`probe`]: measures process CPU time across a repetition loop
//! - [`oracle`]: captures reference output and verifies the candidate against it
//! - [`driver`]: sequences one run and writes the report
//!
//! ## Example
//!
//! ```no_run
//! use copt_core::{BenchmarkDriver, HarnessConfig, OperationId, Reporter};
//!
//! let config = HarnessConfig::new(OperationId::Factorial, 10, 1000);
//! let mut reporter = Reporter::new(std::io::stdout().lock());
//! let outcome = BenchmarkDriver::new(config).run(&mut reporter)?;
//! println!("{}", outcome.speedup);
//! # Ok::<(), copt_core::Error>(())
//! ```

pub mod config;
pub mod context;
pub mod driver;
pub mod error;
pub mod instrumentation;
pub mod kernels;
pub mod operation;
pub mod oracle;
pub mod probe;
pub mod registry;
pub mod report;

pub use config::{HarnessConfig, DEFAULT_DEGENERATE_THRESHOLD};
pub use context::{BenchmarkContext, Element};
pub use driver::{BenchmarkDriver, BenchmarkOutcome, Phase};
pub use error::{Error, Result};
pub use kernels::{Kernel, KernelPair, Variant};
pub use operation::{BufferId, OperationId, OutputSlot};
pub use oracle::{CapturedOutput, CapturedResult};
pub use probe::{CpuClock, ProcessCpuClock, TimingProbe, TimingSample};
pub use registry::OperationRegistry;
pub use report::{Reporter, Speedup};
