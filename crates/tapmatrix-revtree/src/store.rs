//! Storage client seam
//!
//! [`DocumentStore`] is the contract the seeding helpers and suites use.
//! Implementations must accept verbatim revision writes
//! ([`PutOptions::REPLICATE`]) and revision-pinned reads.

use crate::document::{Document, PutOptions, PutResponse, StoreInfo};
use crate::revision::{RevisionId, RevisionParseError};

/// Storage errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Document or revision does not exist
    #[error("not found: {id}{}", .rev.as_ref().map(|r| format!(" at {r}")).unwrap_or_default())]
    NotFound {
        /// Document id
        id: String,
        /// Requested revision, if any
        rev: Option<RevisionId>,
    },

    /// Update did not name a current leaf revision
    #[error("document update conflict: {id}")]
    Conflict {
        /// Document id
        id: String,
    },

    /// Verbatim write without a revision
    #[error("document {id} has no revision to store")]
    MissingRevision {
        /// Document id
        id: String,
    },

    /// Lineage does not describe the supplied revision
    #[error("invalid lineage for {id}: {reason}")]
    InvalidLineage {
        /// Document id
        id: String,
        /// What was wrong
        reason: String,
    },

    /// Malformed revision metadata
    #[error("revision error: {0}")]
    Revision(#[from] RevisionParseError),

    /// Store-specific failure (transport, backend)
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Check if this is a missing document or revision
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Document storage client
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Write a document
    ///
    /// With `new_edits = true` the store assigns the next revision, which
    /// requires `doc.rev` to name a current leaf (or be absent for a new
    /// document). With `new_edits = false` `doc.rev` is stored verbatim and
    /// linked through `doc.revisions` when present; writing an existing
    /// revision keeps its body and only links a missing parent.
    async fn put(&self, doc: Document, options: PutOptions) -> Result<PutResponse, StoreError>;

    /// Read a document at `rev`, or at its winning revision
    ///
    /// The returned document carries its full lineage in `revisions`.
    async fn get(&self, id: &str, rev: Option<&RevisionId>) -> Result<Document, StoreError>;

    /// Leaf revisions of a document, winner first
    async fn leaves(&self, id: &str) -> Result<Vec<RevisionId>, StoreError>;

    /// Store metadata
    async fn info(&self) -> Result<StoreInfo, StoreError>;
}
