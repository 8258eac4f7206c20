//! Revision tree seeding
//!
//! [`RevisionTreeBuilder`] writes explicit revision histories so suites can
//! start from known conflicts:
//! - [`insert_after`](RevisionTreeBuilder::insert_after): one revision,
//!   linked to its parent
//! - [`insert_branch`](RevisionTreeBuilder::insert_branch): a linear chain,
//!   root first, skipping revisions already stored
//! - [`insert_tree`](RevisionTreeBuilder::insert_tree): several branches
//!   sharing ancestors
//!
//! Every write is awaited before the next one starts; each insert depends
//! on its predecessor being stored.

use crate::document::{Document, PutOptions, PutResponse};
use crate::revision::{RevisionId, RevisionLineage};
use crate::store::{DocumentStore, StoreError};

/// Errors raised while seeding
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// Seed document carries no revision id
    #[error("seed document {0} has no revision")]
    MissingRevision(String),

    /// Parent is not exactly one generation older than the child
    #[error("{child} cannot descend from {parent}")]
    NotAChild {
        /// Child revision
        child: RevisionId,
        /// Declared parent revision
        parent: RevisionId,
    },

    /// Underlying store failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Counts from a seeding run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BranchReport {
    /// Revisions written
    pub inserted: usize,
    /// Revisions already present and left untouched
    pub skipped: usize,
}

impl BranchReport {
    /// Fold another report into this one
    #[inline]
    pub fn merge(&mut self, other: BranchReport) {
        self.inserted += other.inserted;
        self.skipped += other.skipped;
    }
}

/// Writes revision histories into a [`DocumentStore`]
pub struct RevisionTreeBuilder<'s, S: DocumentStore + ?Sized> {
    store: &'s S,
}

impl<'s, S: DocumentStore + ?Sized> RevisionTreeBuilder<'s, S> {
    /// Create a builder over `store`
    #[inline]
    #[must_use]
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Store `doc` at its own revision, as a child of `parent`
    ///
    /// Without a parent the document becomes a root. The store never
    /// rewrites the revision id.
    ///
    /// # Errors
    /// - [`TreeError::MissingRevision`] if `doc.rev` is absent
    /// - [`TreeError::NotAChild`] if `parent` is not one generation older
    /// - [`TreeError::Store`] on write failure
    pub async fn insert_after(
        &self,
        doc: &Document,
        parent: Option<&RevisionId>,
    ) -> Result<PutResponse, TreeError> {
        let rev = doc
            .rev
            .as_ref()
            .ok_or_else(|| TreeError::MissingRevision(doc.id.clone()))?;

        let mut seed = doc.clone();
        if let Some(parent) = parent {
            if parent.child_generation() != Some(rev.generation()) {
                return Err(TreeError::NotAChild {
                    child: rev.clone(),
                    parent: parent.clone(),
                });
            }
            let lineage = RevisionLineage::linking(rev, parent).map_err(StoreError::from)?;
            seed.revisions = Some(lineage);
        }

        Ok(self.store.put(seed, PutOptions::REPLICATE).await?)
    }

    /// Store a linear chain of revisions, root first
    ///
    /// `docs[i - 1]` is the parent of `docs[i]`. Revisions already in the
    /// store are skipped, so replaying a branch writes nothing.
    ///
    /// # Errors
    /// Stops at the first failed read or write.
    pub async fn insert_branch(&self, docs: &[Document]) -> Result<BranchReport, TreeError> {
        let mut report = BranchReport::default();
        let mut parent: Option<&RevisionId> = None;

        for doc in docs {
            let rev = doc
                .rev
                .as_ref()
                .ok_or_else(|| TreeError::MissingRevision(doc.id.clone()))?;

            match self.store.get(&doc.id, Some(rev)).await {
                Ok(_) => {
                    tracing::trace!("{} at {} already stored", doc.id, rev);
                    report.skipped += 1;
                }
                Err(e) if e.is_not_found() => {
                    self.insert_after(doc, parent).await?;
                    report.inserted += 1;
                }
                Err(e) => return Err(e.into()),
            }
            parent = Some(rev);
        }

        Ok(report)
    }

    /// Store several branches in order
    ///
    /// Shared ancestors are written once; a document whose branches
    /// diverge ends up with one leaf per branch.
    ///
    /// # Errors
    /// Stops at the first failing branch.
    pub async fn insert_tree(&self, branches: &[Vec<Document>]) -> Result<BranchReport, TreeError> {
        let mut report = BranchReport::default();
        for branch in branches {
            report.merge(self.insert_branch(branch).await?);
        }
        tracing::debug!(
            "Seeded {} branches: {} inserted, {} skipped",
            branches.len(),
            report.inserted,
            report.skipped
        );
        Ok(report)
    }
}

/// Write documents one after another with store-assigned revisions
///
/// # Errors
/// Stops at the first failed write; earlier writes stay in the store.
pub async fn write_docs<S: DocumentStore + ?Sized>(
    store: &S,
    docs: Vec<Document>,
) -> Result<Vec<PutResponse>, StoreError> {
    let mut responses = Vec::with_capacity(docs.len());
    for doc in docs {
        responses.push(store.put(doc, PutOptions::NEW_EDITS).await?);
    }
    Ok(responses)
}
