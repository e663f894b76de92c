//! Logging setup shared by the copt binaries, tests and benches.
//!
//! Logs always go to stderr. Stdout carries the benchmark report and must
//! contain nothing else.
//!
//! Filter precedence, highest first:
//!
//! 1. `COPT_TRACING_DIRECTIVES` (or [`TracingConfig::directives`])
//! 2. `RUST_LOG`
//! 3. the profile's fallback directive, raised by `-v` flags
//!
//! ```no_run
//! use copt_tracing::{init_global_tracing, TracingConfig};
//!
//! let config = TracingConfig::for_cli().with_verbosity(1).with_env_overrides();
//! init_global_tracing(&config)?;
//! # Ok::<(), copt_tracing::TracingSetupError>(())
//! ```

pub mod performance;

use std::env;
use std::io;

use tracing::Subscriber;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

const PROFILE_VAR: &str = "COPT_TRACING_PROFILE";
const DIRECTIVES_VAR: &str = "COPT_TRACING_DIRECTIVES";
const FORMAT_VAR: &str = "COPT_TRACING_FORMAT";

/// Named starting points for a [`TracingConfig`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Profile {
    /// Developer terminal: pretty, coloured, `info` and up
    Local,
    /// Machine-read logs: JSON, no colour, `info` and up
    Ci,
    /// The `copt` binary: silent unless asked
    Cli,
}

impl Profile {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" => Some(Self::Local),
            "ci" => Some(Self::Ci),
            "cli" => Some(Self::Cli),
            _ => None,
        }
    }
}

/// Formatter used for log lines
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TracingOutput {
    Compact,
    Pretty,
    Json,
}

impl TracingOutput {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Some(Self::Compact),
            "pretty" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct TracingConfig {
    pub profile: Profile,
    /// Explicit filter directives, e.g. `copt_core=debug`
    pub directives: Option<String>,
    /// Used when neither explicit directives nor `RUST_LOG` are set
    pub default_directive: String,
    pub include_targets: bool,
    pub ansi: bool,
    /// Emit an event when each span closes, with its busy and idle time
    pub log_span_close: bool,
    pub output: TracingOutput,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self::for_profile(Profile::Local)
    }
}

impl TracingConfig {
    pub fn for_profile(profile: Profile) -> Self {
        let (default_directive, output, ansi) = match profile {
            Profile::Local => ("info", TracingOutput::Pretty, true),
            Profile::Ci => ("info", TracingOutput::Json, false),
            Profile::Cli => ("off", TracingOutput::Compact, false),
        };
        Self {
            profile,
            directives: None,
            default_directive: default_directive.to_owned(),
            include_targets: profile != Profile::Cli,
            ansi,
            log_span_close: false,
            output,
        }
    }

    pub fn for_local() -> Self {
        Self::for_profile(Profile::Local)
    }

    pub fn for_ci() -> Self {
        Self::for_profile(Profile::Ci)
    }

    /// Silent by default: an unconfigured `copt` run writes nothing to
    /// stderr except its own diagnostics.
    pub fn for_cli() -> Self {
        Self::for_profile(Profile::Cli)
    }

    /// Pick the profile named by `COPT_TRACING_PROFILE` (default `local`),
    /// then apply [`Self::with_env_overrides`].
    pub fn from_env() -> Self {
        let profile = env::var(PROFILE_VAR)
            .ok()
            .and_then(|value| Profile::parse(&value))
            .unwrap_or(Profile::Local);
        Self::for_profile(profile).with_env_overrides()
    }

    /// Apply `COPT_TRACING_DIRECTIVES` and `COPT_TRACING_FORMAT`.
    ///
    /// Blank or unrecognised values leave the current setting alone.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(directives) = env::var(DIRECTIVES_VAR).ok().filter(|d| !d.trim().is_empty()) {
            self.directives = Some(directives);
        }
        if let Some(output) = env::var(FORMAT_VAR).ok().as_deref().and_then(TracingOutput::parse) {
            self.output = output;
        }
        if self.output == TracingOutput::Json {
            self.ansi = false;
        }
        self
    }

    /// Raise the fallback directive for each `-v`: one gives `info`, more give `debug`.
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        let level = match verbosity {
            0 => return self,
            1 => "info",
            _ => "debug",
        };
        self.default_directive = level.to_owned();
        self
    }

    fn env_filter(&self) -> Result<EnvFilter, TracingSetupError> {
        let directives = match &self.directives {
            Some(directives) => directives.clone(),
            None => env::var(EnvFilter::DEFAULT_ENV).unwrap_or_else(|_| self.default_directive.clone()),
        };
        EnvFilter::try_new(&directives)
            .map_err(|err| TracingSetupError::InvalidFilter(format!("{directives}: {err}")))
    }

    fn span_events(&self) -> FmtSpan {
        if self.log_span_close {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }

    fn stderr_layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let base = fmt::layer()
            .with_writer(io::stderr)
            .with_target(self.include_targets)
            .with_span_events(self.span_events());

        match self.output {
            TracingOutput::Compact => base.compact().with_ansi(self.ansi).boxed(),
            TracingOutput::Pretty => base.pretty().with_ansi(self.ansi).boxed(),
            TracingOutput::Json => base.json().with_ansi(false).boxed(),
        }
    }
}

/// Subscriber installation failures
#[derive(Debug, thiserror::Error)]
pub enum TracingSetupError {
    #[error("invalid tracing directive {0}")]
    InvalidFilter(String),

    /// Usually means a global subscriber is already installed
    #[error("failed to install global tracing subscriber: {0}")]
    SubscriberInit(#[from] tracing_subscriber::util::TryInitError),
}

/// Assemble the stderr subscriber described by `config`.
pub fn build_subscriber(config: &TracingConfig) -> Result<impl Subscriber + Send + Sync, TracingSetupError> {
    let filter = config.env_filter()?;
    Ok(Registry::default().with(config.stderr_layer()).with(filter))
}

/// Install the subscriber described by `config` for the whole process.
pub fn init_global_tracing(config: &TracingConfig) -> Result<(), TracingSetupError> {
    build_subscriber(config)?.try_init()?;
    Ok(())
}
