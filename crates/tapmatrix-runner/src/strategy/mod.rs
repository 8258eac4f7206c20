//! Execution strategies
//!
//! A strategy runs one descriptor to completion and returns its
//! [`ExecutionResult`] or an error. Two implementations exist:
//! - [`InProcessStrategy`]: suite bodies run inside this process
//! - [`SandboxedStrategy`]: each descriptor runs in a child process that
//!   reports back through a completion signal
//!
//! The strategy is chosen once, at startup, by [`select`].

mod in_process;
mod sandboxed;

pub use in_process::InProcessStrategy;
pub use sandboxed::{CompletionSignal, SandboxedStrategy, COMPLETION_EVENT, DEFAULT_SANDBOX_TIMEOUT};

use crate::config::RunnerConfig;
use crate::error::{ConfigError, StrategyError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tapmatrix_plan::{ExecutionDescriptor, StrategyKind};
use tokio::sync::watch;

/// Outcome of one completed descriptor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Failed assertions
    pub failed: u32,
    /// Assertions evaluated
    pub assertions: u32,
}

impl ExecutionResult {
    /// Create a result
    #[inline]
    #[must_use]
    pub fn new(failed: u32, assertions: u32) -> Self {
        Self { failed, assertions }
    }

    /// Check if no assertion failed
    #[inline]
    #[must_use]
    pub fn passed(&self) -> bool {
        self.failed == 0
    }
}

/// Runs a single descriptor
#[async_trait::async_trait]
pub trait ExecutionStrategy: Send + Sync {
    /// Which strategy this is; plan expansion depends on it
    fn kind(&self) -> StrategyKind;

    /// Execute one descriptor to completion
    async fn execute(
        &self,
        descriptor: &ExecutionDescriptor,
    ) -> Result<ExecutionResult, StrategyError>;
}

/// Cancellation signal shared between a strategy and its owner
///
/// Clones observe the same signal.
#[derive(Debug, Clone)]
pub struct CancelToken {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl CancelToken {
    /// Create an untriggered token
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    /// Trigger cancellation
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    /// Check if cancellation was triggered
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolve once cancellation is triggered
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        // The sender lives as long as `self`, so the wait cannot fail early.
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the strategy named by the configuration
///
/// # Errors
/// Returns [`ConfigError::SandboxExecutable`] if the sandboxed strategy is
/// selected and the current executable cannot be located.
pub fn select(
    config: &RunnerConfig,
    cancel: CancelToken,
) -> Result<Arc<dyn ExecutionStrategy>, ConfigError> {
    match config.strategy {
        StrategyKind::InProcess => Ok(Arc::new(InProcessStrategy::with_builtin())),
        StrategyKind::Sandboxed => {
            let strategy = SandboxedStrategy::current_exe()
                .map_err(ConfigError::SandboxExecutable)?
                .with_timeout(config.sandbox_timeout())
                .with_cancel_token(cancel);
            Ok(Arc::new(strategy))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_result_passes_without_failures() {
        assert!(ExecutionResult::new(0, 3).passed());
        assert!(!ExecutionResult::new(1, 3).passed());
    }

    #[tokio::test]
    async fn cancel_token_wakes_waiters() {
        let token = CancelToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });

        assert!(!token.is_cancelled());
        token.cancel();
        handle.await.unwrap();
        assert!(token.is_cancelled());
    }
}
