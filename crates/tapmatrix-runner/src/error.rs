//! Error types for the runner
//!
//! Provides error handling for:
//! - Suite failures (errors raised inside a suite body)
//! - Strategy failures (unknown suites, sandbox spawn/exit/timeout)
//! - Configuration loading

use std::path::PathBuf;
use std::time::Duration;
use tapmatrix_plan::PlanError;
use tapmatrix_revtree::{StoreError, TreeError};

/// Error raised by a suite body
#[derive(Debug, thiserror::Error)]
pub enum SuiteError {
    /// Suite needs an endpoint the descriptor does not bind
    #[error("suite requires a {0} endpoint")]
    MissingEndpoint(&'static str),

    /// Storage failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Seeding failure
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// Suite-specific failure
    #[error("{0}")]
    Failed(String),
}

/// Error returned by an execution strategy instead of a result
#[derive(Debug, thiserror::Error)]
pub enum StrategyError {
    /// Descriptor names a suite with no registered body
    #[error("no suite registered as {0}")]
    UnknownSuite(String),

    /// Suite body returned an error
    #[error("suite {suite} failed: {source}")]
    Suite {
        /// Suite name
        suite: String,
        /// Underlying error
        #[source]
        source: SuiteError,
    },

    /// Sandboxed context could not be started
    #[error("failed to spawn {}: {source}", .program.display())]
    Spawn {
        /// Program launched
        program: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Reading the sandboxed context's output failed
    #[error("sandbox I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Sandboxed context exited without a completion signal
    #[error("sandboxed suite exited without reporting (status {status:?})")]
    SandboxExited {
        /// Exit code, if the process exited normally
        status: Option<i32>,
    },

    /// Completion signal carried a malformed payload
    #[error("malformed completion signal: {0}")]
    BadSignal(String),

    /// No completion signal within the deadline
    #[error("sandboxed suite timed out after {0:?}")]
    Timeout(Duration),

    /// Wait was cancelled
    #[error("sandboxed suite cancelled")]
    Cancelled,

    /// Descriptor could not be decoded
    #[error(transparent)]
    Plan(#[from] PlanError),
}

impl StrategyError {
    /// Check if the failure came from the sandbox wait bound
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: toml::de::Error,
    },

    /// Sandboxed strategy could not locate its executable
    #[error("cannot locate sandbox executable: {0}")]
    SandboxExecutable(#[source] std::io::Error),
}
