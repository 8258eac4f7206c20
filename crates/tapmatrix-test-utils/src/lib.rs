//! Testing utilities for the tapmatrix workspace
//!
//! Shared fixtures: scripted strategies, sample suites and registries.

#![allow(missing_docs)]

use parking_lot::Mutex;
use std::collections::HashMap;
use tapmatrix_plan::{EndpointRef, ExecutionDescriptor, Registry, StrategyKind, TopologyMode};
use tapmatrix_runner::{
    ExecutionResult, ExecutionStrategy, SandboxedStrategy, StrategyError, Suite, SuiteContext,
    SuiteError,
};

/// Scripted outcome for one invocation
#[derive(Debug, Clone)]
pub enum Outcome {
    Pass(u32),
    FailAssertions { failed: u32, assertions: u32 },
    Error(String),
}

/// Strategy returning scripted outcomes by 1-based invocation number
#[derive(Debug)]
pub struct ScriptedStrategy {
    kind: StrategyKind,
    default: Outcome,
    scripted: HashMap<usize, Outcome>,
    calls: Mutex<Vec<ExecutionDescriptor>>,
}

impl ScriptedStrategy {
    /// Every invocation passes with `assertions`
    pub fn passing(assertions: u32) -> Self {
        Self {
            kind: StrategyKind::InProcess,
            default: Outcome::Pass(assertions),
            scripted: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_kind(mut self, kind: StrategyKind) -> Self {
        self.kind = kind;
        self
    }

    /// Invocation `number` reports one failed assertion
    pub fn fail_at(self, number: usize) -> Self {
        self.script(
            number,
            Outcome::FailAssertions {
                failed: 1,
                assertions: 1,
            },
        )
    }

    /// Invocation `number` returns an error
    pub fn error_at(self, number: usize, message: &str) -> Self {
        self.script(number, Outcome::Error(message.to_string()))
    }

    pub fn script(mut self, number: usize, outcome: Outcome) -> Self {
        self.scripted.insert(number, outcome);
        self
    }

    /// Descriptors received so far
    pub fn calls(&self) -> Vec<ExecutionDescriptor> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait::async_trait]
impl ExecutionStrategy for ScriptedStrategy {
    fn kind(&self) -> StrategyKind {
        self.kind
    }

    async fn execute(
        &self,
        descriptor: &ExecutionDescriptor,
    ) -> Result<ExecutionResult, StrategyError> {
        let number = {
            let mut calls = self.calls.lock();
            calls.push(descriptor.clone());
            calls.len()
        };
        match self.scripted.get(&number).unwrap_or(&self.default) {
            Outcome::Pass(assertions) => Ok(ExecutionResult::new(0, *assertions)),
            Outcome::FailAssertions { failed, assertions } => {
                Ok(ExecutionResult::new(*failed, *assertions))
            }
            Outcome::Error(message) => Err(StrategyError::Suite {
                suite: descriptor.suite().to_string(),
                source: SuiteError::Failed(message.clone()),
            }),
        }
    }
}

/// Suite recording `passed` and `failed` checks
#[derive(Debug, Clone, Copy)]
pub struct FixedSuite {
    pub passed: u32,
    pub failed: u32,
}

impl FixedSuite {
    pub fn passing(checks: u32) -> Self {
        Self {
            passed: checks,
            failed: 0,
        }
    }

    pub fn failing(failed: u32) -> Self {
        Self { passed: 0, failed }
    }
}

#[async_trait::async_trait]
impl Suite for FixedSuite {
    async fn run(&self, ctx: &mut SuiteContext) -> Result<(), SuiteError> {
        for _ in 0..self.passed {
            ctx.check(true, "fixed pass");
        }
        for _ in 0..self.failed {
            ctx.check(false, "fixed failure");
        }
        Ok(())
    }
}

/// Suite that always errors
#[derive(Debug, Clone, Copy)]
pub struct ErrorSuite;

#[async_trait::async_trait]
impl Suite for ErrorSuite {
    async fn run(&self, _ctx: &mut SuiteContext) -> Result<(), SuiteError> {
        Err(SuiteError::Failed("scripted error".into()))
    }
}

/// One suite per topology mode, in declaration order
pub fn sample_registry() -> Registry {
    Registry::from_entries([
        ("first", TopologyMode::NoDatabase),
        ("single", TopologyMode::SingleEndpoint),
        ("skipped", TopologyMode::Skip),
        ("http", TopologyMode::HttpOnly),
        ("server", TopologyMode::ServerOnly),
        ("pair", TopologyMode::TwoEndpoints),
    ])
}

/// `count` single-endpoint descriptors named `suite-1`, `suite-2`, ...
pub fn descriptors(count: usize) -> Vec<ExecutionDescriptor> {
    (1..=count)
        .map(|n| ExecutionDescriptor::single(format!("suite-{n}"), EndpointRef::local("db")))
        .collect()
}

/// Sandboxed strategy whose child runs `script` under `sh -c`
///
/// The descriptor query arrives as `$1`.
pub fn sh_sandbox(script: &str) -> SandboxedStrategy {
    SandboxedStrategy::new("sh", ["-c", script, "sandbox"])
}
