//! Revision tree seeding
//!
//! Builds branching revision histories (documents tied together by explicit
//! parent/child revision ids) so conflict handling can be tested against
//! known trees.
//!
//! # Example
//!
//! ```rust,ignore
//! use tapmatrix_revtree::prelude::*;
//!
//! let store = MemoryStore::new("db");
//! let a1 = Document::at("doc", "1-a".parse()?, json!({}));
//! let a2 = Document::at("doc", "2-a".parse()?, json!({}));
//! let b2 = Document::at("doc", "2-b".parse()?, json!({}));
//!
//! RevisionTreeBuilder::new(&store)
//!     .insert_tree(&[vec![a1.clone(), a2], vec![a1, b2]])
//!     .await?;
//! assert_eq!(store.leaves("doc").await?.len(), 2);
//! ```

#![warn(unreachable_pub)]

pub mod builder;
pub mod document;
pub mod memory;
pub mod revision;
pub mod store;

pub use builder::{write_docs, BranchReport, RevisionTreeBuilder, TreeError};
pub use document::{Document, PutOptions, PutResponse, StoreInfo};
pub use memory::MemoryStore;
pub use revision::{RevisionId, RevisionLineage, RevisionParseError, MAX_GENERATION};
pub use store::{DocumentStore, StoreError};

/// Common imports for seeding fixtures
pub mod prelude {
    pub use crate::{
        Document, DocumentStore, MemoryStore, PutOptions, RevisionId, RevisionLineage,
        RevisionTreeBuilder,
    };
}
