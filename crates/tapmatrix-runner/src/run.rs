//! Run assembly
//!
//! Ties a [`RunnerConfig`] to a plan and an executor: the strategy is
//! chosen once, the plan is generated for that strategy, then executed.

use crate::config::{HaltPolicy, RunnerConfig};
use crate::error::ConfigError;
use crate::executor::{Executor, Reporter, RunSummary};
use crate::strategy::{self, CancelToken, ExecutionStrategy};
use std::sync::Arc;
use tapmatrix_plan::{ExecutionDescriptor, PlanGenerator, StrategyKind};

/// Plan for `config` under `strategy`
#[must_use]
pub fn build_plan(config: &RunnerConfig, strategy: StrategyKind) -> Vec<ExecutionDescriptor> {
    let registry = config.registry();
    PlanGenerator::new(&registry, config.topology_for(strategy), strategy)
        .generate(config.filter())
}

/// A planned run, ready to execute
pub struct TestRun {
    plan: Vec<ExecutionDescriptor>,
    executor: Executor,
    halt_policy: HaltPolicy,
    cancel: CancelToken,
}

impl TestRun {
    /// Select the configured strategy and plan for it
    ///
    /// # Errors
    /// Fails if the strategy cannot be built.
    pub fn new(config: &RunnerConfig) -> Result<Self, ConfigError> {
        let cancel = CancelToken::new();
        let strategy = strategy::select(config, cancel.clone())?;
        Ok(Self::with_strategy(config, strategy).with_cancel_token(cancel))
    }

    /// Plan for an already-built strategy
    #[must_use]
    pub fn with_strategy(config: &RunnerConfig, strategy: Arc<dyn ExecutionStrategy>) -> Self {
        let kind = strategy.kind();
        let plan = build_plan(config, kind);
        tracing::debug!("Planned {} descriptors", plan.len());
        Self {
            plan,
            executor: Executor::new(strategy),
            halt_policy: config.halt_policy_for(kind),
            cancel: CancelToken::new(),
        }
    }

    #[must_use]
    fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Descriptors in run order
    #[inline]
    #[must_use]
    pub fn plan(&self) -> &[ExecutionDescriptor] {
        &self.plan
    }

    /// Policy the caller applies after a failure
    #[inline]
    #[must_use]
    pub fn halt_policy(&self) -> HaltPolicy {
        self.halt_policy
    }

    /// Token that aborts an in-flight sandboxed descriptor
    #[inline]
    #[must_use]
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Execute the plan
    pub async fn execute(self, reporter: &mut dyn Reporter) -> RunSummary {
        self.executor.run(self.plan, reporter).await
    }
}
