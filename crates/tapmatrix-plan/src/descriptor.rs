//! Execution descriptors
//!
//! A descriptor binds one suite to zero, one or two endpoints. Descriptors
//! are immutable once built and travel to sandboxed contexts as query
//! strings (`?suite=..&primary=..&secondary=..`).

use crate::error::PlanError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::form_urlencoded;

const SUITE_KEY: &str = "suite";
const PRIMARY_KEY: &str = "primary";
const SECONDARY_KEY: &str = "secondary";

/// A storage target
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointRef {
    /// Locally named store
    Local(String),
    /// Remote service URL
    Remote(String),
}

impl EndpointRef {
    /// Local store by name
    #[inline]
    #[must_use]
    pub fn local(name: impl Into<String>) -> Self {
        Self::Local(name.into())
    }

    /// Remote store by URL
    #[inline]
    #[must_use]
    pub fn remote(url: impl Into<String>) -> Self {
        Self::Remote(url.into())
    }

    /// Check if this is a local store
    #[inline]
    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }

    /// Check if this is a remote store
    #[inline]
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    /// Store name or URL
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Local(name) => name,
            Self::Remote(url) => url,
        }
    }
}

impl fmt::Display for EndpointRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EndpointRef {
    type Err = PlanError;

    /// Anything with an `http://` or `https://` scheme is remote.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(PlanError::EmptyEndpoint);
        }
        if s.starts_with("http://") || s.starts_with("https://") {
            Ok(Self::remote(s))
        } else {
            Ok(Self::local(s))
        }
    }
}

/// One concrete execution unit
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutionDescriptor {
    suite: String,
    primary: Option<EndpointRef>,
    secondary: Option<EndpointRef>,
}

impl ExecutionDescriptor {
    /// Descriptor with no endpoints
    #[must_use]
    pub fn without_endpoints(suite: impl Into<String>) -> Self {
        Self {
            suite: suite.into(),
            primary: None,
            secondary: None,
        }
    }

    /// Descriptor bound to a single endpoint
    #[must_use]
    pub fn single(suite: impl Into<String>, primary: EndpointRef) -> Self {
        Self {
            suite: suite.into(),
            primary: Some(primary),
            secondary: None,
        }
    }

    /// Descriptor bound to a primary/secondary pair
    #[must_use]
    pub fn pair(suite: impl Into<String>, primary: EndpointRef, secondary: EndpointRef) -> Self {
        Self {
            suite: suite.into(),
            primary: Some(primary),
            secondary: Some(secondary),
        }
    }

    /// Suite name
    #[inline]
    #[must_use]
    pub fn suite(&self) -> &str {
        &self.suite
    }

    /// Primary endpoint, if any
    #[inline]
    #[must_use]
    pub fn primary(&self) -> Option<&EndpointRef> {
        self.primary.as_ref()
    }

    /// Secondary endpoint, if any
    #[inline]
    #[must_use]
    pub fn secondary(&self) -> Option<&EndpointRef> {
        self.secondary.as_ref()
    }

    /// Encode as a query string, leading `?` included
    #[must_use]
    pub fn to_query(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        serializer.append_pair(SUITE_KEY, &self.suite);
        if let Some(primary) = &self.primary {
            serializer.append_pair(PRIMARY_KEY, primary.as_str());
        }
        if let Some(secondary) = &self.secondary {
            serializer.append_pair(SECONDARY_KEY, secondary.as_str());
        }
        format!("?{}", serializer.finish())
    }

    /// Decode from a query string; the leading `?` is optional
    ///
    /// Unknown keys are ignored.
    ///
    /// # Errors
    /// - [`PlanError::MissingSuite`] if no `suite` key is present
    /// - [`PlanError::SecondaryWithoutPrimary`] for a lone secondary
    /// - [`PlanError::EmptyEndpoint`] for an empty endpoint value
    pub fn from_query(query: &str) -> Result<Self, PlanError> {
        let query = query.strip_prefix('?').unwrap_or(query);

        let mut suite = None;
        let mut primary = None;
        let mut secondary = None;
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                SUITE_KEY => suite = Some(value.into_owned()),
                PRIMARY_KEY => primary = Some(value.parse::<EndpointRef>()?),
                SECONDARY_KEY => secondary = Some(value.parse::<EndpointRef>()?),
                _ => {}
            }
        }

        let suite = suite.filter(|s| !s.is_empty()).ok_or(PlanError::MissingSuite)?;
        match (primary, secondary) {
            (None, None) => Ok(Self::without_endpoints(suite)),
            (Some(p), None) => Ok(Self::single(suite, p)),
            (Some(p), Some(s)) => Ok(Self::pair(suite, p, s)),
            (None, Some(_)) => Err(PlanError::SecondaryWithoutPrimary(suite)),
        }
    }
}

impl fmt::Display for ExecutionDescriptor {
    /// `<suite>, {"primary":..,"secondary":..}` as shown in report lines
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut bindings = serde_json::Map::new();
        if let Some(primary) = &self.primary {
            bindings.insert(PRIMARY_KEY.into(), primary.as_str().into());
        }
        if let Some(secondary) = &self.secondary {
            bindings.insert(SECONDARY_KEY.into(), secondary.as_str().into());
        }
        write!(f, "{}, {}", self.suite, serde_json::Value::Object(bindings))
    }
}
