//! Topology modes and execution strategy kinds

use crate::error::PlanError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a suite is bound to storage endpoints
///
/// Drives the expansion performed by [`crate::PlanGenerator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopologyMode {
    /// Suite is registered but never run
    Skip,
    /// Suite needs no store at all
    NoDatabase,
    /// Suite runs once against a local store and once against a remote one
    SingleEndpoint,
    /// Suite runs against a remote store only
    HttpOnly,
    /// Suite runs against a local store, in-process execution only
    ServerOnly,
    /// Suite runs against the four local/remote endpoint pairs
    TwoEndpoints,
}

impl TopologyMode {
    /// All modes, in declaration order
    pub const ALL: [TopologyMode; 6] = [
        TopologyMode::Skip,
        TopologyMode::NoDatabase,
        TopologyMode::SingleEndpoint,
        TopologyMode::HttpOnly,
        TopologyMode::ServerOnly,
        TopologyMode::TwoEndpoints,
    ];

    /// Stable textual name, as used in configuration files
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            TopologyMode::Skip => "skip",
            TopologyMode::NoDatabase => "no_database",
            TopologyMode::SingleEndpoint => "single_endpoint",
            TopologyMode::HttpOnly => "http_only",
            TopologyMode::ServerOnly => "server_only",
            TopologyMode::TwoEndpoints => "two_endpoints",
        }
    }
}

impl fmt::Display for TopologyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TopologyMode {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| PlanError::UnknownMode(s.to_string()))
    }
}

/// Which execution strategy runs the plan
///
/// Chosen once at startup; plan expansion depends on it for
/// [`TopologyMode::ServerOnly`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Suites run inside the executor's own process
    #[default]
    InProcess,
    /// Each descriptor runs in an isolated child context
    Sandboxed,
}

impl StrategyKind {
    /// Stable textual name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            StrategyKind::InProcess => "in-process",
            StrategyKind::Sandboxed => "sandboxed",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in-process" => Ok(StrategyKind::InProcess),
            "sandboxed" => Ok(StrategyKind::Sandboxed),
            other => Err(PlanError::UnknownStrategy(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_names_round_trip() {
        for mode in TopologyMode::ALL {
            assert_eq!(mode.as_str().parse::<TopologyMode>().unwrap(), mode);
        }
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert_eq!(
            "local".parse::<TopologyMode>(),
            Err(PlanError::UnknownMode("local".to_string()))
        );
    }

    #[test]
    fn strategy_kind_parses() {
        assert_eq!("sandboxed".parse::<StrategyKind>().unwrap(), StrategyKind::Sandboxed);
        assert_eq!("in-process".parse::<StrategyKind>().unwrap(), StrategyKind::InProcess);
        assert!("browser".parse::<StrategyKind>().is_err());
    }
}
