//! Sequential plan execution
//!
//! The executor owns a FIFO queue of descriptors and runs exactly one at a
//! time through its [`ExecutionStrategy`]. Descriptors reuse a small set of
//! named endpoints, so nothing runs concurrently.
//!
//! A descriptor fails when the strategy returns an error or a result with
//! failed assertions. The first failure halts the run; the remaining queue
//! is dropped. What happens to the process afterwards is decided by the
//! caller through [`RunSummary::exit_code`].

mod reporter;

pub use reporter::{Reporter, TapReporter};

use crate::config::HaltPolicy;
use crate::error::StrategyError;
use crate::strategy::{ExecutionResult, ExecutionStrategy};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tapmatrix_plan::ExecutionDescriptor;

/// Exit status of a run halted by cancellation
pub const EXIT_INTERRUPTED: u8 = 130;

/// Why a descriptor failed
#[derive(Debug)]
pub enum FailureReason {
    /// Completed with failed assertions
    Assertions(ExecutionResult),
    /// Strategy returned an error
    Error(StrategyError),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Assertions(result) => write!(
                f,
                "{} of {} assertions failed",
                result.failed, result.assertions
            ),
            Self::Error(e) => write!(f, "{e}"),
        }
    }
}

/// The descriptor that halted a run
#[derive(Debug)]
pub struct RunFailure {
    /// 1-based position in the plan
    pub number: usize,
    /// Failed descriptor
    pub descriptor: ExecutionDescriptor,
    /// What went wrong
    pub reason: FailureReason,
}

/// Totals for one run
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Descriptors in the plan
    pub planned: usize,
    /// Descriptors that passed
    pub passed: usize,
    /// Assertions from passed descriptors
    pub assertions: u64,
    /// First failure, if the run halted
    pub failure: Option<RunFailure>,
    /// Wall time
    pub elapsed_ms: u64,
}

impl RunSummary {
    /// Check if every descriptor passed
    #[inline]
    #[must_use]
    pub fn passed(&self) -> bool {
        self.failure.is_none()
    }

    /// Check if the run halted because it was cancelled
    #[must_use]
    pub fn cancelled(&self) -> bool {
        matches!(
            self.failure,
            Some(RunFailure {
                reason: FailureReason::Error(StrategyError::Cancelled),
                ..
            })
        )
    }

    /// Process exit status under `policy`
    ///
    /// A cancelled run exits with [`EXIT_INTERRUPTED`] whatever the policy.
    #[must_use]
    pub fn exit_code(&self, policy: HaltPolicy) -> u8 {
        if self.cancelled() {
            return EXIT_INTERRUPTED;
        }
        match (self.passed(), policy) {
            (false, HaltPolicy::ExitProcess) => 1,
            _ => 0,
        }
    }
}

/// Runs a plan one descriptor at a time
pub struct Executor {
    strategy: Arc<dyn ExecutionStrategy>,
}

impl Executor {
    /// Create an executor over `strategy`
    #[must_use]
    pub fn new(strategy: Arc<dyn ExecutionStrategy>) -> Self {
        Self { strategy }
    }

    /// Strategy in use
    #[inline]
    #[must_use]
    pub fn strategy(&self) -> &Arc<dyn ExecutionStrategy> {
        &self.strategy
    }

    /// Run `plan` to completion or first failure, streaming to `reporter`
    pub async fn run(
        &self,
        plan: Vec<ExecutionDescriptor>,
        reporter: &mut dyn Reporter,
    ) -> RunSummary {
        let start_time = Instant::now();
        let mut queue = VecDeque::from(plan);
        let mut summary = RunSummary {
            planned: queue.len(),
            ..RunSummary::default()
        };

        tracing::info!(
            "Running {} descriptors with {} strategy",
            summary.planned,
            self.strategy.kind()
        );
        reporter.plan(summary.planned);

        let mut number = 0;
        while let Some(descriptor) = queue.pop_front() {
            number += 1;
            tracing::debug!("[{}/{}] {}", number, summary.planned, descriptor);

            let reason = match self.strategy.execute(&descriptor).await {
                Ok(result) if result.passed() => {
                    summary.passed += 1;
                    summary.assertions += u64::from(result.assertions);
                    reporter.ok(number, &descriptor);
                    continue;
                }
                Ok(result) => FailureReason::Assertions(result),
                Err(e) => FailureReason::Error(e),
            };

            tracing::error!("{} failed: {}", descriptor, reason);
            reporter.not_ok(number, &descriptor, &reason);
            summary.failure = Some(RunFailure {
                number,
                descriptor,
                reason,
            });
            if !queue.is_empty() {
                tracing::info!("Halting with {} descriptors not run", queue.len());
            }
            break;
        }

        summary.elapsed_ms = u64::try_from(start_time.elapsed().as_millis()).unwrap_or(u64::MAX);
        reporter.finish(&summary);
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use tapmatrix_plan::StrategyKind;

    /// Fails the descriptor whose suite is named `fail`
    #[derive(Default)]
    struct NamedFailure {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl ExecutionStrategy for NamedFailure {
        fn kind(&self) -> StrategyKind {
            StrategyKind::InProcess
        }

        async fn execute(
            &self,
            descriptor: &ExecutionDescriptor,
        ) -> Result<ExecutionResult, StrategyError> {
            self.calls.lock().push(descriptor.suite().to_string());
            match descriptor.suite() {
                "fail" => Ok(ExecutionResult::new(1, 3)),
                "error" => Err(StrategyError::UnknownSuite("error".into())),
                "cancel" => Err(StrategyError::Cancelled),
                _ => Ok(ExecutionResult::new(0, 2)),
            }
        }
    }

    fn plan(names: &[&str]) -> Vec<ExecutionDescriptor> {
        names
            .iter()
            .map(|n| ExecutionDescriptor::without_endpoints(*n))
            .collect()
    }

    #[tokio::test]
    async fn passing_plan_sums_assertions() {
        let strategy = Arc::new(NamedFailure::default());
        let executor = Executor::new(strategy.clone());
        let mut reporter = TapReporter::new(Vec::new());

        let summary = executor.run(plan(&["a", "b", "c"]), &mut reporter).await;
        assert!(summary.passed());
        assert_eq!(summary.passed, 3);
        assert_eq!(summary.assertions, 6);
        assert_eq!(summary.exit_code(HaltPolicy::ExitProcess), 0);
        assert_eq!(strategy.calls.lock().len(), 3);
    }

    #[tokio::test]
    async fn failed_assertions_halt_the_run() {
        let strategy = Arc::new(NamedFailure::default());
        let executor = Executor::new(strategy.clone());
        let mut reporter = TapReporter::new(Vec::new());

        let summary = executor
            .run(plan(&["a", "fail", "b"]), &mut reporter)
            .await;
        assert_eq!(*strategy.calls.lock(), vec!["a", "fail"]);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.assertions, 2);

        let failure = summary.failure.as_ref().unwrap();
        assert_eq!(failure.number, 2);
        assert!(matches!(failure.reason, FailureReason::Assertions(_)));
        assert_eq!(summary.exit_code(HaltPolicy::ExitProcess), 1);
        assert_eq!(summary.exit_code(HaltPolicy::StopAdvancing), 0);
    }

    #[tokio::test]
    async fn errors_halt_the_run() {
        let strategy = Arc::new(NamedFailure::default());
        let executor = Executor::new(strategy.clone());
        let mut reporter = TapReporter::new(Vec::new());

        let summary = executor.run(plan(&["error", "a"]), &mut reporter).await;
        assert_eq!(strategy.calls.lock().len(), 1);
        assert!(matches!(
            summary.failure.map(|f| f.reason),
            Some(FailureReason::Error(StrategyError::UnknownSuite(_)))
        ));
    }

    #[tokio::test]
    async fn cancelled_run_exits_non_zero_under_any_policy() {
        let executor = Executor::new(Arc::new(NamedFailure::default()));
        let mut reporter = TapReporter::new(Vec::new());

        let summary = executor.run(plan(&["a", "cancel", "b"]), &mut reporter).await;
        assert!(summary.cancelled());
        assert_eq!(summary.exit_code(HaltPolicy::StopAdvancing), EXIT_INTERRUPTED);
        assert_eq!(summary.exit_code(HaltPolicy::ExitProcess), EXIT_INTERRUPTED);

        let failed = executor.run(plan(&["fail"]), &mut reporter).await;
        assert!(!failed.cancelled());
    }

    #[tokio::test]
    async fn empty_plan_passes() {
        let executor = Executor::new(Arc::new(NamedFailure::default()));
        let mut reporter = TapReporter::new(Vec::new());

        let summary = executor.run(Vec::new(), &mut reporter).await;
        assert!(summary.passed());
        let out = String::from_utf8(reporter.into_inner()).unwrap();
        assert_eq!(out, "1..0\n# ran 0 assertions\nResult: PASS\n");
    }
}
