//! Test plan generation
//!
//! Expands an ordered registry of suites into a concrete matrix of
//! [`ExecutionDescriptor`]s, one per (suite, endpoint binding):
//! - [`Registry`]: ordered suite name → [`TopologyMode`] mapping
//! - [`PlanGenerator`]: pure, deterministic expansion
//! - [`ExecutionDescriptor`]: immutable execution unit, with a query-string
//!   form for handing work to a sandboxed context
//!
//! # Example
//!
//! ```rust
//! use tapmatrix_plan::{PlanGenerator, Registry, StrategyKind, Topology, TopologyMode};
//!
//! let mut registry = Registry::new();
//! registry.register("basics", TopologyMode::SingleEndpoint);
//! registry.register("plugins", TopologyMode::Skip);
//!
//! let generator = PlanGenerator::new(&registry, Topology::default(), StrategyKind::InProcess);
//! let plan = generator.generate(None);
//! assert_eq!(plan.len(), 2);
//! ```

#![warn(unreachable_pub)]

pub mod descriptor;
pub mod error;
pub mod generator;
pub mod mode;
pub mod registry;

pub use descriptor::{EndpointRef, ExecutionDescriptor};
pub use error::PlanError;
pub use generator::{parse_filter, PlanGenerator, Topology, DEFAULT_REMOTE_HOST};
pub use mode::{StrategyKind, TopologyMode};
pub use registry::Registry;

/// Name of the primary local store used by generated plans
pub const DEFAULT_PRIMARY_STORE: &str = "test_suite_db1";

/// Name of the secondary local store used by two-endpoint plans
pub const DEFAULT_SECONDARY_STORE: &str = "test_suite_db2";
