//! Suite registry
//!
//! Provides [`Registry`], the ordered mapping from suite name to
//! [`TopologyMode`]. Iteration order is registration order and is the
//! only source of report ordering; nothing here sorts.

use crate::mode::TopologyMode;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered registry of suites and their topology modes
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Registry {
    suites: IndexMap<String, TopologyMode>,
}

impl Registry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            suites: IndexMap::new(),
        }
    }

    /// Build a registry from entries, keeping their order
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, TopologyMode)>,
        S: Into<String>,
    {
        let mut registry = Self::new();
        for (name, mode) in entries {
            registry.register(name, mode);
        }
        registry
    }

    /// Register a suite
    ///
    /// Re-registering an existing name updates its mode in place; the
    /// suite keeps its original position.
    pub fn register(&mut self, name: impl Into<String>, mode: TopologyMode) {
        self.suites.insert(name.into(), mode);
    }

    /// Look up a suite's mode
    #[inline]
    #[must_use]
    pub fn mode(&self, name: &str) -> Option<TopologyMode> {
        self.suites.get(name).copied()
    }

    /// Check if suite exists
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.suites.contains_key(name)
    }

    /// Suite names in registration order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.suites.keys().map(String::as_str).collect()
    }

    /// Get number of registered suites
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.suites.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.suites.is_empty()
    }

    /// Iterate over (name, mode) in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, TopologyMode)> {
        self.suites.iter().map(|(name, mode)| (name.as_str(), *mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_preserves_registration_order() {
        let registry = Registry::from_entries([
            ("setup", TopologyMode::NoDatabase),
            ("zeta", TopologyMode::SingleEndpoint),
            ("alpha", TopologyMode::Skip),
        ]);

        assert_eq!(registry.names(), vec!["setup", "zeta", "alpha"]);
    }

    #[test]
    fn reregistering_keeps_position() {
        let mut registry = Registry::new();
        registry.register("a", TopologyMode::Skip);
        registry.register("b", TopologyMode::Skip);
        registry.register("a", TopologyMode::HttpOnly);

        assert_eq!(registry.names(), vec!["a", "b"]);
        assert_eq!(registry.mode("a"), Some(TopologyMode::HttpOnly));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn missing_suite_has_no_mode() {
        let registry = Registry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.mode("nope"), None);
        assert!(!registry.contains("nope"));
    }
}
