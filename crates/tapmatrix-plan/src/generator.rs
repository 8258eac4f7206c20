//! Plan generation
//!
//! [`PlanGenerator`] expands registry entries into descriptors. Expansion
//! is pure: no suite is touched and the same inputs always yield the same
//! plan.

use crate::descriptor::{EndpointRef, ExecutionDescriptor};
use crate::mode::{StrategyKind, TopologyMode};
use crate::registry::Registry;
use crate::{DEFAULT_PRIMARY_STORE, DEFAULT_SECONDARY_STORE};

/// Default remote host for in-process runs
pub const DEFAULT_REMOTE_HOST: &str = "http://localhost:5984";

/// Endpoint naming for a run
///
/// Remote endpoints are derived from the local names: `<host>/<name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    /// Primary local store name
    pub primary_store: String,
    /// Secondary local store name
    pub secondary_store: String,
    /// Remote service base URL
    pub remote_host: String,
}

impl Topology {
    /// Default store names against the given remote host
    #[must_use]
    pub fn new(remote_host: impl Into<String>) -> Self {
        Self {
            primary_store: DEFAULT_PRIMARY_STORE.to_string(),
            secondary_store: DEFAULT_SECONDARY_STORE.to_string(),
            remote_host: remote_host.into(),
        }
    }

    /// With custom local store names
    #[inline]
    #[must_use]
    pub fn with_stores(mut self, primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        self.primary_store = primary.into();
        self.secondary_store = secondary.into();
        self
    }

    fn local(&self) -> EndpointRef {
        EndpointRef::local(&self.primary_store)
    }

    fn local_other(&self) -> EndpointRef {
        EndpointRef::local(&self.secondary_store)
    }

    fn remote(&self) -> EndpointRef {
        EndpointRef::remote(self.remote_url(&self.primary_store))
    }

    fn remote_other(&self) -> EndpointRef {
        EndpointRef::remote(self.remote_url(&self.secondary_store))
    }

    fn remote_url(&self, store: &str) -> String {
        format!("{}/{}", self.remote_host.trim_end_matches('/'), store)
    }
}

impl Default for Topology {
    fn default() -> Self {
        Self::new(DEFAULT_REMOTE_HOST)
    }
}

/// Expands a registry into an ordered descriptor list
#[derive(Debug, Clone)]
pub struct PlanGenerator<'a> {
    registry: &'a Registry,
    topology: Topology,
    strategy: StrategyKind,
}

impl<'a> PlanGenerator<'a> {
    /// Create a generator for the given strategy
    #[must_use]
    pub fn new(registry: &'a Registry, topology: Topology, strategy: StrategyKind) -> Self {
        Self {
            registry,
            topology,
            strategy,
        }
    }

    /// Generate the plan
    ///
    /// With a filter, suites are expanded in filter order and names missing
    /// from the registry contribute nothing. Without one, registry order is
    /// used.
    #[must_use]
    pub fn generate(&self, filter: Option<&[String]>) -> Vec<ExecutionDescriptor> {
        let mut plan = Vec::new();
        match filter {
            Some(names) => {
                for name in names {
                    match self.registry.mode(name) {
                        Some(mode) => plan.extend(self.expand(name, mode)),
                        None => tracing::debug!("Suite {} not registered, skipping", name),
                    }
                }
            }
            None => {
                for (name, mode) in self.registry.iter() {
                    plan.extend(self.expand(name, mode));
                }
            }
        }
        plan
    }

    /// Expand a single suite
    #[must_use]
    pub fn expand(&self, suite: &str, mode: TopologyMode) -> Vec<ExecutionDescriptor> {
        let t = &self.topology;
        match mode {
            TopologyMode::Skip => Vec::new(),
            TopologyMode::NoDatabase => vec![ExecutionDescriptor::without_endpoints(suite)],
            TopologyMode::SingleEndpoint => vec![
                ExecutionDescriptor::single(suite, t.local()),
                ExecutionDescriptor::single(suite, t.remote()),
            ],
            TopologyMode::HttpOnly => vec![ExecutionDescriptor::single(suite, t.remote())],
            TopologyMode::ServerOnly => match self.strategy {
                StrategyKind::InProcess => vec![ExecutionDescriptor::single(suite, t.local())],
                StrategyKind::Sandboxed => Vec::new(),
            },
            // (R,L) and (L,R) are distinct on purpose: they exercise both
            // directions of cross-endpoint operations.
            TopologyMode::TwoEndpoints => vec![
                ExecutionDescriptor::pair(suite, t.local(), t.local_other()),
                ExecutionDescriptor::pair(suite, t.remote(), t.local()),
                ExecutionDescriptor::pair(suite, t.remote(), t.remote_other()),
                ExecutionDescriptor::pair(suite, t.local(), t.remote()),
            ],
        }
    }
}

/// Parse a comma-separated suite list
///
/// Whitespace around names is trimmed and empty entries are dropped.
#[must_use]
pub fn parse_filter(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator(registry: &Registry, strategy: StrategyKind) -> PlanGenerator<'_> {
        PlanGenerator::new(registry, Topology::default(), strategy)
    }

    #[test]
    fn single_endpoint_expands_local_then_remote() {
        let registry = Registry::from_entries([("basics", TopologyMode::SingleEndpoint)]);
        let plan = generator(&registry, StrategyKind::InProcess).generate(None);

        assert_eq!(
            plan,
            vec![
                ExecutionDescriptor::single("basics", EndpointRef::local("test_suite_db1")),
                ExecutionDescriptor::single(
                    "basics",
                    EndpointRef::remote("http://localhost:5984/test_suite_db1")
                ),
            ]
        );
    }

    #[test]
    fn server_only_depends_on_strategy() {
        let registry = Registry::from_entries([("persistence", TopologyMode::ServerOnly)]);

        assert_eq!(generator(&registry, StrategyKind::InProcess).generate(None).len(), 1);
        assert!(generator(&registry, StrategyKind::Sandboxed).generate(None).is_empty());
    }

    #[test]
    fn filter_reorders_and_drops_unknown() {
        let registry = Registry::from_entries([
            ("a", TopologyMode::NoDatabase),
            ("b", TopologyMode::NoDatabase),
        ]);
        let filter = parse_filter("b, missing ,a");
        let plan = generator(&registry, StrategyKind::InProcess).generate(Some(filter.as_slice()));

        let suites: Vec<&str> = plan.iter().map(ExecutionDescriptor::suite).collect();
        assert_eq!(suites, vec!["b", "a"]);
    }

    #[test]
    fn remote_host_trailing_slash_is_ignored() {
        let topology = Topology::new("http://couch:2020/");
        assert_eq!(topology.remote_url("db"), "http://couch:2020/db");
    }

    #[test]
    fn parse_filter_drops_empty_entries() {
        assert_eq!(parse_filter(",a,,b,"), vec!["a", "b"]);
        assert!(parse_filter("").is_empty());
    }
}
