//! In-process execution
//!
//! Suite bodies and the storage backend are loaded once, when the strategy
//! is built; each descriptor then runs directly against resolved stores.

use super::{ExecutionResult, ExecutionStrategy};
use crate::error::StrategyError;
use crate::store_provider::{MemoryStoreProvider, StoreProvider};
use crate::suites::{SuiteCatalog, SuiteContext};
use std::sync::Arc;
use tapmatrix_plan::{ExecutionDescriptor, StrategyKind};

/// Runs suites inside the executor's process
pub struct InProcessStrategy {
    catalog: Arc<SuiteCatalog>,
    provider: Arc<dyn StoreProvider>,
}

impl InProcessStrategy {
    /// Create with a suite catalog and a storage backend
    #[must_use]
    pub fn new(catalog: Arc<SuiteCatalog>, provider: Arc<dyn StoreProvider>) -> Self {
        Self { catalog, provider }
    }

    /// Built-in suites over in-memory stores
    #[must_use]
    pub fn with_builtin() -> Self {
        Self::new(
            Arc::new(SuiteCatalog::with_builtin()),
            Arc::new(MemoryStoreProvider::new()),
        )
    }

    /// Storage backend in use
    #[inline]
    #[must_use]
    pub fn provider(&self) -> &Arc<dyn StoreProvider> {
        &self.provider
    }
}

#[async_trait::async_trait]
impl ExecutionStrategy for InProcessStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::InProcess
    }

    async fn execute(
        &self,
        descriptor: &ExecutionDescriptor,
    ) -> Result<ExecutionResult, StrategyError> {
        let suite = self
            .catalog
            .get(descriptor.suite())
            .ok_or_else(|| StrategyError::UnknownSuite(descriptor.suite().to_string()))?;

        let mut ctx = SuiteContext::new(descriptor, Arc::clone(&self.provider));
        tracing::debug!("Running {} in-process", descriptor);

        suite
            .run(&mut ctx)
            .await
            .map_err(|source| StrategyError::Suite {
                suite: descriptor.suite().to_string(),
                source,
            })?;

        Ok(ctx.result())
    }
}
