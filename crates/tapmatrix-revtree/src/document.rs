//! Documents and store request/response types

use crate::revision::{RevisionId, RevisionLineage};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A document at one revision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document id
    pub id: String,
    /// Current revision; absent for a document never written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<RevisionId>,
    /// Explicit ancestry, used with verbatim (non-rewriting) writes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revisions: Option<RevisionLineage>,
    /// Document content
    #[serde(default)]
    pub body: Value,
}

impl Document {
    /// New unrevisioned document
    #[must_use]
    pub fn new(id: impl Into<String>, body: Value) -> Self {
        Self {
            id: id.into(),
            rev: None,
            revisions: None,
            body,
        }
    }

    /// Document pinned at a revision
    #[must_use]
    pub fn at(id: impl Into<String>, rev: RevisionId, body: Value) -> Self {
        Self::new(id, body).with_rev(rev)
    }

    /// With revision
    #[inline]
    #[must_use]
    pub fn with_rev(mut self, rev: RevisionId) -> Self {
        self.rev = Some(rev);
        self
    }

    /// With explicit lineage
    #[inline]
    #[must_use]
    pub fn with_revisions(mut self, revisions: RevisionLineage) -> Self {
        self.revisions = Some(revisions);
        self
    }
}

/// Options for [`crate::DocumentStore::put`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PutOptions {
    /// When `false`, the supplied revision id is stored verbatim instead
    /// of the store assigning a new one
    pub new_edits: bool,
}

impl PutOptions {
    /// Store-assigned revisions
    pub const NEW_EDITS: Self = Self { new_edits: true };

    /// Verbatim revisions
    pub const REPLICATE: Self = Self { new_edits: false };
}

impl Default for PutOptions {
    fn default() -> Self {
        Self::NEW_EDITS
    }
}

/// Result of a successful write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutResponse {
    /// Document id
    pub id: String,
    /// Revision now held by the store
    pub rev: RevisionId,
}

/// Store metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreInfo {
    /// Store name or URL
    pub name: String,
    /// Documents with at least one readable revision
    pub doc_count: usize,
}
