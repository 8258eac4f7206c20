//! Test plan runner
//!
//! Runs a generated plan strictly sequentially and reports a TAP stream:
//! - Strategies: in-process, or one sandboxed child process per descriptor
//! - Built-in suites over in-memory stores
//! - Halt on first failure, with the exit decision left to the caller
//!
//! # Example
//!
//! ```rust,ignore
//! use tapmatrix_runner::prelude::*;
//!
//! let config = RunnerConfig::new().with_suites(vec!["basics".into()]);
//! let run = TestRun::new(&config)?;
//! let summary = run.execute(&mut TapReporter::stdout()).await;
//! std::process::exit(summary.exit_code(config.halt_policy()).into());
//! ```

#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod run;
pub mod store_provider;
pub mod strategy;
pub mod suites;

pub use config::{HaltPolicy, RunnerConfig, DEFAULT_IN_PROCESS_HOST, DEFAULT_SANDBOXED_HOST};
pub use error::{ConfigError, StrategyError, SuiteError};
pub use executor::{
    Executor, FailureReason, Reporter, RunFailure, RunSummary, TapReporter, EXIT_INTERRUPTED,
};
pub use run::{build_plan, TestRun};
pub use store_provider::{MemoryStoreProvider, StoreProvider};
pub use strategy::{
    CancelToken, CompletionSignal, ExecutionResult, ExecutionStrategy, InProcessStrategy,
    SandboxedStrategy,
};
pub use suites::{default_registry, Suite, SuiteCatalog, SuiteContext};

/// Common imports for driving runs
pub mod prelude {
    pub use crate::{
        ExecutionResult, ExecutionStrategy, Executor, HaltPolicy, Reporter, RunSummary,
        RunnerConfig, TapReporter, TestRun,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
