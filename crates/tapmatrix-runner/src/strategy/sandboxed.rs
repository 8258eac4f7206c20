//! Sandboxed execution
//!
//! Each descriptor runs in its own child process. The descriptor is passed
//! as the last argument in query-string form; the child prints exactly one
//! completion line:
//!
//! ```text
//! {"event":"tests","detail":{"failed":0,"assertions":12}}
//! ```
//!
//! Other output lines are ignored. The wait for the completion line is
//! bounded by a timeout and can be cancelled; on either the child is
//! killed.

use super::{CancelToken, ExecutionResult, ExecutionStrategy};
use crate::error::StrategyError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tapmatrix_plan::{ExecutionDescriptor, StrategyKind};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};

/// Event name of the completion signal
pub const COMPLETION_EVENT: &str = "tests";

/// Default bound on a sandboxed descriptor
pub const DEFAULT_SANDBOX_TIMEOUT: Duration = Duration::from_secs(60);

/// Completion signal emitted by a sandboxed context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionSignal {
    /// Event name, always [`COMPLETION_EVENT`]
    pub event: String,
    /// Result payload
    pub detail: ExecutionResult,
}

impl CompletionSignal {
    /// Signal carrying `result`
    #[must_use]
    pub fn tests(result: ExecutionResult) -> Self {
        Self {
            event: COMPLETION_EVENT.to_string(),
            detail: result,
        }
    }

    /// Single-line JSON form
    #[must_use]
    pub fn to_line(&self) -> String {
        serde_json::json!({ "event": self.event, "detail": self.detail }).to_string()
    }

    /// Extract a completion signal from an output line
    ///
    /// Lines that are not JSON objects with `"event": "tests"` yield
    /// `Ok(None)`.
    ///
    /// # Errors
    /// [`StrategyError::BadSignal`] if the event matches but its detail is
    /// malformed.
    pub fn parse_line(line: &str) -> Result<Option<ExecutionResult>, StrategyError> {
        let line = line.trim();
        if !line.starts_with('{') {
            return Ok(None);
        }
        let Ok(value) = serde_json::from_str::<serde_json::Value>(line) else {
            return Ok(None);
        };
        if value.get("event").and_then(serde_json::Value::as_str) != Some(COMPLETION_EVENT) {
            return Ok(None);
        }
        let detail = value
            .get("detail")
            .cloned()
            .ok_or_else(|| StrategyError::BadSignal(line.to_string()))?;
        serde_json::from_value(detail)
            .map(Some)
            .map_err(|e| StrategyError::BadSignal(format!("{line}: {e}")))
    }
}

/// Runs each descriptor in a child process
#[derive(Debug, Clone)]
pub struct SandboxedStrategy {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
    cancel: CancelToken,
}

impl SandboxedStrategy {
    /// Launch `program` with `args`, followed by the descriptor query
    #[must_use]
    pub fn new(program: impl Into<PathBuf>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            timeout: DEFAULT_SANDBOX_TIMEOUT,
            cancel: CancelToken::new(),
        }
    }

    /// Re-launch the running executable with its `suite` subcommand
    ///
    /// # Errors
    /// Fails if the current executable path is unavailable.
    pub fn current_exe() -> std::io::Result<Self> {
        Ok(Self::new(std::env::current_exe()?, ["suite"]))
    }

    /// With wait bound
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// With cancellation token
    #[inline]
    #[must_use]
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token cancelling in-flight waits
    #[inline]
    #[must_use]
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    fn spawn(&self, descriptor: &ExecutionDescriptor) -> Result<Child, StrategyError> {
        Command::new(&self.program)
            .args(&self.args)
            .arg(descriptor.to_query())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| StrategyError::Spawn {
                program: self.program.clone(),
                source,
            })
    }
}

/// Kill the child if still running and reap it
async fn teardown(child: &mut Child) -> Option<i32> {
    let _ = child.start_kill();
    child.wait().await.ok().and_then(|status| status.code())
}

#[async_trait::async_trait]
impl ExecutionStrategy for SandboxedStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Sandboxed
    }

    async fn execute(
        &self,
        descriptor: &ExecutionDescriptor,
    ) -> Result<ExecutionResult, StrategyError> {
        if self.cancel.is_cancelled() {
            return Err(StrategyError::Cancelled);
        }

        let mut child = self.spawn(descriptor)?;
        tracing::debug!("Launched sandbox for {}", descriptor.to_query());

        let Some(stdout) = child.stdout.take() else {
            let status = teardown(&mut child).await;
            return Err(StrategyError::SandboxExited { status });
        };
        let mut reader = BufReader::new(stdout);

        // Byte lines: only the signal itself has to be valid text.
        let signal = async {
            let mut buf = Vec::new();
            loop {
                buf.clear();
                if reader.read_until(b'\n', &mut buf).await? == 0 {
                    return Ok::<_, StrategyError>(None);
                }
                let line = String::from_utf8_lossy(&buf);
                match CompletionSignal::parse_line(&line)? {
                    Some(result) => return Ok(Some(result)),
                    None => tracing::trace!("sandbox: {}", line.trim_end()),
                }
            }
        };

        let outcome = tokio::select! {
            waited = tokio::time::timeout(self.timeout, signal) => waited,
            () = self.cancel.cancelled() => {
                teardown(&mut child).await;
                return Err(StrategyError::Cancelled);
            }
        };

        let status = teardown(&mut child).await;
        match outcome {
            Ok(Ok(Some(result))) => Ok(result),
            Ok(Ok(None)) => Err(StrategyError::SandboxExited { status }),
            Ok(Err(e)) => Err(e),
            Err(_) => {
                tracing::warn!("Sandbox for {} timed out after {:?}", descriptor, self.timeout);
                Err(StrategyError::Timeout(self.timeout))
            }
        }
    }
}
