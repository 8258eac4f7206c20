//! Suite bodies
//!
//! A [`Suite`] runs against the stores bound by its descriptor and records
//! checks on a [`SuiteContext`]. Failed checks are counted, not raised; an
//! `Err` from the body aborts the suite.
//!
//! [`SuiteCatalog`] maps registry names to bodies. [`default_registry`]
//! lists the built-in suites with their topology modes, in report order.

mod builtin;

pub use builtin::{
    BasicsSuite, ConflictsSuite, PersistenceSuite, RemoteInfoSuite, ReplicationSuite, SetupSuite,
};

use crate::error::SuiteError;
use crate::store_provider::StoreProvider;
use crate::strategy::ExecutionResult;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;
use tapmatrix_plan::{EndpointRef, ExecutionDescriptor, Registry, TopologyMode};
use tapmatrix_revtree::DocumentStore;

/// A named suite body
#[async_trait::async_trait]
pub trait Suite: Send + Sync {
    /// Run all checks against the context's endpoints
    async fn run(&self, ctx: &mut SuiteContext) -> Result<(), SuiteError>;
}

/// Per-descriptor state handed to a suite body
pub struct SuiteContext {
    descriptor: ExecutionDescriptor,
    provider: Arc<dyn StoreProvider>,
    assertions: u32,
    failed: u32,
}

impl SuiteContext {
    /// Context for `descriptor` over `provider`
    #[must_use]
    pub fn new(descriptor: &ExecutionDescriptor, provider: Arc<dyn StoreProvider>) -> Self {
        Self {
            descriptor: descriptor.clone(),
            provider,
            assertions: 0,
            failed: 0,
        }
    }

    /// Descriptor being executed
    #[inline]
    #[must_use]
    pub fn descriptor(&self) -> &ExecutionDescriptor {
        &self.descriptor
    }

    /// Storage backend
    #[inline]
    #[must_use]
    pub fn provider(&self) -> &Arc<dyn StoreProvider> {
        &self.provider
    }

    /// Primary endpoint
    ///
    /// # Errors
    /// [`SuiteError::MissingEndpoint`] if the descriptor binds none.
    pub fn primary_endpoint(&self) -> Result<&EndpointRef, SuiteError> {
        self.descriptor
            .primary()
            .ok_or(SuiteError::MissingEndpoint("primary"))
    }

    /// Secondary endpoint
    ///
    /// # Errors
    /// [`SuiteError::MissingEndpoint`] if the descriptor binds none.
    pub fn secondary_endpoint(&self) -> Result<&EndpointRef, SuiteError> {
        self.descriptor
            .secondary()
            .ok_or(SuiteError::MissingEndpoint("secondary"))
    }

    /// Store behind the primary endpoint
    ///
    /// # Errors
    /// [`SuiteError::MissingEndpoint`] if the descriptor binds none.
    pub fn primary(&self) -> Result<Arc<dyn DocumentStore>, SuiteError> {
        Ok(self.provider.resolve(self.primary_endpoint()?))
    }

    /// Store behind the secondary endpoint
    ///
    /// # Errors
    /// [`SuiteError::MissingEndpoint`] if the descriptor binds none.
    pub fn secondary(&self) -> Result<Arc<dyn DocumentStore>, SuiteError> {
        Ok(self.provider.resolve(self.secondary_endpoint()?))
    }

    /// Record a check; returns `passed`
    pub fn check(&mut self, passed: bool, message: &str) -> bool {
        self.assertions += 1;
        if !passed {
            self.failed += 1;
            tracing::warn!("{}: check failed: {}", self.descriptor.suite(), message);
        }
        passed
    }

    /// Record an equality check
    pub fn check_eq<T: PartialEq + Debug>(&mut self, left: &T, right: &T, message: &str) -> bool {
        if left == right {
            self.check(true, message)
        } else {
            self.check(false, &format!("{message}: {left:?} != {right:?}"))
        }
    }

    /// Counts so far
    #[inline]
    #[must_use]
    pub fn result(&self) -> ExecutionResult {
        ExecutionResult::new(self.failed, self.assertions)
    }
}

/// Suite bodies by registry name
#[derive(Default)]
pub struct SuiteCatalog {
    suites: BTreeMap<String, Arc<dyn Suite>>,
}

impl SuiteCatalog {
    /// Create an empty catalog
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog of the built-in suites
    #[must_use]
    pub fn with_builtin() -> Self {
        let mut catalog = Self::new();
        catalog.register("setup", SetupSuite);
        catalog.register("basics", BasicsSuite);
        catalog.register("conflicts", ConflictsSuite);
        catalog.register("remote_info", RemoteInfoSuite);
        catalog.register("persistence", PersistenceSuite);
        catalog.register("replication", ReplicationSuite);
        catalog
    }

    /// Register a body, replacing any previous one with the same name
    pub fn register(&mut self, name: impl Into<String>, suite: impl Suite + 'static) {
        self.suites.insert(name.into(), Arc::new(suite));
    }

    /// Body registered as `name`
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Suite>> {
        self.suites.get(name).cloned()
    }

    /// Registered names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.suites.keys().map(String::as_str).collect()
    }
}

/// Built-in suites and their topology modes, in report order
///
/// `plugins` is registered as skipped: it stays listed but never runs.
#[must_use]
pub fn default_registry() -> Registry {
    Registry::from_entries([
        ("setup", TopologyMode::NoDatabase),
        ("basics", TopologyMode::SingleEndpoint),
        ("conflicts", TopologyMode::SingleEndpoint),
        ("remote_info", TopologyMode::HttpOnly),
        ("persistence", TopologyMode::ServerOnly),
        ("replication", TopologyMode::TwoEndpoints),
        ("plugins", TopologyMode::Skip),
    ])
}
