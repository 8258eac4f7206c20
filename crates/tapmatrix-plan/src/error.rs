//! Error types for plan handling

/// Errors raised while decoding plan inputs
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    /// Query string carried no suite name
    #[error("descriptor query is missing the suite name")]
    MissingSuite,

    /// A secondary endpoint was given without a primary one
    #[error("descriptor for {0} has a secondary endpoint but no primary")]
    SecondaryWithoutPrimary(String),

    /// Endpoint text was empty
    #[error("endpoint must not be empty")]
    EmptyEndpoint,

    /// Unrecognized topology mode name
    #[error("unknown topology mode: {0}")]
    UnknownMode(String),

    /// Unrecognized execution strategy name
    #[error("unknown execution strategy: {0}")]
    UnknownStrategy(String),
}
