//! Runner configuration
//!
//! Loaded from an optional TOML file, then overlaid by environment and
//! command-line values. Every field has a default, so an empty file (or no
//! file) is a valid configuration.
//!
//! ```toml
//! strategy = "sandboxed"
//! remote_host = "http://localhost:2020"
//! suites = ["basics", "replication"]
//! sandbox_timeout_secs = 30
//!
//! [registry]
//! basics = "single_endpoint"
//! replication = "two_endpoints"
//! ```

use crate::error::ConfigError;
use crate::strategy::DEFAULT_SANDBOX_TIMEOUT;
use crate::suites::default_registry;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tapmatrix_plan::{Registry, StrategyKind, Topology, DEFAULT_PRIMARY_STORE, DEFAULT_SECONDARY_STORE};

/// Remote host used by in-process runs when none is configured
pub const DEFAULT_IN_PROCESS_HOST: &str = tapmatrix_plan::DEFAULT_REMOTE_HOST;

/// Remote host used by sandboxed runs when none is configured
pub const DEFAULT_SANDBOXED_HOST: &str = "http://localhost:2020";

/// What the caller does once a run has failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HaltPolicy {
    /// Terminate with a failing exit status
    ExitProcess,
    /// Stop advancing the queue and exit normally
    StopAdvancing,
}

impl HaltPolicy {
    /// Default policy for a strategy
    #[must_use]
    pub const fn for_strategy(strategy: StrategyKind) -> Self {
        match strategy {
            StrategyKind::InProcess => Self::ExitProcess,
            StrategyKind::Sandboxed => Self::StopAdvancing,
        }
    }
}

/// Runner configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerConfig {
    /// Execution strategy
    pub strategy: StrategyKind,
    /// Remote service base URL; defaults by strategy
    pub remote_host: Option<String>,
    /// Restrict the run to these suites
    pub suites: Option<Vec<String>>,
    /// Primary local store name
    pub primary_store: Option<String>,
    /// Secondary local store name
    pub secondary_store: Option<String>,
    /// Bound on each sandboxed descriptor, in seconds
    pub sandbox_timeout_secs: Option<u64>,
    /// Failure handling; defaults by strategy
    pub halt_policy: Option<HaltPolicy>,
    /// Suite registry; defaults to the built-in suites
    pub registry: Option<Registry>,
}

impl RunnerConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// With strategy
    #[inline]
    #[must_use]
    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    /// With remote host
    #[inline]
    #[must_use]
    pub fn with_remote_host(mut self, host: impl Into<String>) -> Self {
        self.remote_host = Some(host.into());
        self
    }

    /// With suite filter
    #[inline]
    #[must_use]
    pub fn with_suites(mut self, suites: Vec<String>) -> Self {
        self.suites = Some(suites);
        self
    }

    /// With sandbox timeout
    #[inline]
    #[must_use]
    pub fn with_sandbox_timeout_secs(mut self, secs: u64) -> Self {
        self.sandbox_timeout_secs = Some(secs);
        self
    }

    /// With halt policy
    #[inline]
    #[must_use]
    pub fn with_halt_policy(mut self, policy: HaltPolicy) -> Self {
        self.halt_policy = Some(policy);
        self
    }

    /// With registry
    #[inline]
    #[must_use]
    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Effective remote host
    #[must_use]
    pub fn remote_host(&self) -> &str {
        self.remote_host_for(self.strategy)
    }

    /// Remote host for runs under `strategy`
    #[must_use]
    pub fn remote_host_for(&self, strategy: StrategyKind) -> &str {
        match (&self.remote_host, strategy) {
            (Some(host), _) => host.as_str(),
            (None, StrategyKind::InProcess) => DEFAULT_IN_PROCESS_HOST,
            (None, StrategyKind::Sandboxed) => DEFAULT_SANDBOXED_HOST,
        }
    }

    /// Effective halt policy
    #[must_use]
    pub fn halt_policy(&self) -> HaltPolicy {
        self.halt_policy_for(self.strategy)
    }

    /// Halt policy for runs under `strategy`
    #[must_use]
    pub fn halt_policy_for(&self, strategy: StrategyKind) -> HaltPolicy {
        self.halt_policy
            .unwrap_or_else(|| HaltPolicy::for_strategy(strategy))
    }

    /// Effective sandbox timeout
    #[must_use]
    pub fn sandbox_timeout(&self) -> Duration {
        self.sandbox_timeout_secs
            .map_or(DEFAULT_SANDBOX_TIMEOUT, Duration::from_secs)
    }

    /// Endpoint naming for the run
    #[must_use]
    pub fn topology(&self) -> Topology {
        self.topology_for(self.strategy)
    }

    /// Endpoint naming for runs under `strategy`
    #[must_use]
    pub fn topology_for(&self, strategy: StrategyKind) -> Topology {
        Topology::new(self.remote_host_for(strategy)).with_stores(
            self.primary_store.as_deref().unwrap_or(DEFAULT_PRIMARY_STORE),
            self.secondary_store
                .as_deref()
                .unwrap_or(DEFAULT_SECONDARY_STORE),
        )
    }

    /// Suite filter; an empty list means no filter
    #[must_use]
    pub fn filter(&self) -> Option<&[String]> {
        self.suites.as_deref().filter(|suites| !suites.is_empty())
    }

    /// Effective registry
    #[must_use]
    pub fn registry(&self) -> Registry {
        self.registry.clone().unwrap_or_else(default_registry)
    }
}
