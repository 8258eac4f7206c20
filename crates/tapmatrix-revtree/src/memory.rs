//! In-memory document store
//!
//! Keeps a revision tree per document. Ancestors named by a lineage but
//! never written are kept as stubs: they link the tree but cannot be read.

use crate::document::{Document, PutOptions, PutResponse, StoreInfo};
use crate::revision::{RevisionId, RevisionLineage, RevisionParseError};
use crate::store::{DocumentStore, StoreError};
use parking_lot::RwLock;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};

/// Length of generated revision hashes, in hex chars
const GENERATED_HASH_LEN: usize = 32;

#[derive(Debug, Clone)]
struct RevisionNode {
    parent: Option<RevisionId>,
    /// `None` for stub ancestors
    body: Option<Value>,
}

impl RevisionNode {
    fn adopt(&mut self, parent: Option<RevisionId>) {
        if self.parent.is_none() {
            self.parent = parent;
        }
    }
}

#[derive(Debug, Default)]
struct RevisionTree {
    nodes: BTreeMap<RevisionId, RevisionNode>,
}

impl RevisionTree {
    fn is_readable(&self, rev: &RevisionId) -> bool {
        self.nodes.get(rev).is_some_and(|n| n.body.is_some())
    }

    /// Readable revisions with no children, winner first
    fn leaves(&self) -> Vec<RevisionId> {
        let parents: std::collections::HashSet<&RevisionId> =
            self.nodes.values().filter_map(|n| n.parent.as_ref()).collect();
        self.nodes
            .iter()
            .rev()
            .filter(|(rev, node)| node.body.is_some() && !parents.contains(rev))
            .map(|(rev, _)| rev.clone())
            .collect()
    }

    fn winner(&self) -> Option<RevisionId> {
        self.leaves().into_iter().next()
    }

    /// Ancestry of `rev`, child first, stopping at the first generation gap
    fn lineage(&self, rev: &RevisionId) -> Option<RevisionLineage> {
        let mut ids = vec![rev.hash().to_string()];
        let mut current = rev;
        while let Some(parent) = self.nodes.get(current).and_then(|n| n.parent.as_ref()) {
            if parent.generation().checked_add(1) != Some(current.generation()) {
                break;
            }
            ids.push(parent.hash().to_string());
            current = parent;
        }
        RevisionLineage::new(rev.generation(), ids).ok()
    }

    /// Insert `rev` verbatim, creating stub ancestors from `lineage`
    fn insert_verbatim(
        &mut self,
        id: &str,
        rev: RevisionId,
        lineage: Option<&RevisionLineage>,
        body: Value,
    ) -> Result<(), StoreError> {
        let chain = match lineage {
            Some(lineage) => {
                let head = lineage.head().ok_or(RevisionParseError::EmptyLineage)?;
                if head != rev {
                    return Err(StoreError::InvalidLineage {
                        id: id.to_string(),
                        reason: format!("lineage describes {head} but document is at {rev}"),
                    });
                }
                lineage.revision_ids()
            }
            None => vec![rev.clone()],
        };

        // Ancestors, oldest last; each links to the next one down the chain.
        // Known revisions without a parent gain the one the lineage names.
        for (idx, ancestor) in chain.iter().enumerate().skip(1) {
            let parent = chain.get(idx + 1).cloned();
            match self.nodes.get_mut(ancestor) {
                Some(node) => node.adopt(parent),
                None => {
                    self.nodes
                        .insert(ancestor.clone(), RevisionNode { parent, body: None });
                }
            }
        }

        let parent = chain.get(1).cloned();
        match self.nodes.get_mut(&rev) {
            Some(node) => {
                node.adopt(parent);
                if node.body.is_none() {
                    node.body = Some(body);
                }
            }
            None => {
                self.nodes.insert(
                    rev,
                    RevisionNode {
                        parent,
                        body: Some(body),
                    },
                );
            }
        }
        Ok(())
    }
}

/// Named in-memory [`DocumentStore`]
#[derive(Debug)]
pub struct MemoryStore {
    name: String,
    docs: RwLock<HashMap<String, RevisionTree>>,
}

impl MemoryStore {
    /// Create an empty store
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            docs: RwLock::new(HashMap::new()),
        }
    }

    /// Store name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn put_verbatim(&self, doc: Document) -> Result<PutResponse, StoreError> {
        let rev = doc.rev.clone().ok_or_else(|| StoreError::MissingRevision {
            id: doc.id.clone(),
        })?;

        let mut docs = self.docs.write();
        let tree = docs.entry(doc.id.clone()).or_default();
        tree.insert_verbatim(&doc.id, rev.clone(), doc.revisions.as_ref(), doc.body)?;

        tracing::trace!("{}: stored {} at {} verbatim", self.name, doc.id, rev);
        Ok(PutResponse { id: doc.id, rev })
    }

    fn put_new_edit(&self, doc: Document) -> Result<PutResponse, StoreError> {
        let mut docs = self.docs.write();
        let tree = docs.entry(doc.id.clone()).or_default();

        let parent = match (&doc.rev, tree.winner()) {
            (None, None) => None,
            (Some(rev), Some(_)) if tree.leaves().contains(rev) => Some(rev.clone()),
            _ => return Err(StoreError::Conflict { id: doc.id }),
        };

        let generation = match &parent {
            Some(p) => p
                .child_generation()
                .ok_or_else(|| RevisionParseError::GenerationExhausted(p.to_string()))?,
            None => 1,
        };
        let rev = RevisionId::new(generation, generate_hash(parent.as_ref(), &doc.body));
        tree.nodes.insert(
            rev.clone(),
            RevisionNode {
                parent,
                body: Some(doc.body),
            },
        );

        tracing::trace!("{}: wrote {} at {}", self.name, doc.id, rev);
        Ok(PutResponse { id: doc.id, rev })
    }
}

fn generate_hash(parent: Option<&RevisionId>, body: &Value) -> String {
    let mut hasher = Sha256::new();
    if let Some(parent) = parent {
        hasher.update(parent.to_string().as_bytes());
    }
    hasher.update([0]);
    hasher.update(body.to_string().as_bytes());
    let mut hash = hex::encode(hasher.finalize());
    hash.truncate(GENERATED_HASH_LEN);
    hash
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    async fn put(&self, doc: Document, options: PutOptions) -> Result<PutResponse, StoreError> {
        if options.new_edits {
            self.put_new_edit(doc)
        } else {
            self.put_verbatim(doc)
        }
    }

    async fn get(&self, id: &str, rev: Option<&RevisionId>) -> Result<Document, StoreError> {
        let not_found = || StoreError::NotFound {
            id: id.to_string(),
            rev: rev.cloned(),
        };

        let docs = self.docs.read();
        let tree = docs.get(id).ok_or_else(not_found)?;
        let rev = match rev {
            Some(rev) if tree.is_readable(rev) => rev.clone(),
            Some(_) => return Err(not_found()),
            None => tree.winner().ok_or_else(not_found)?,
        };

        let body = tree
            .nodes
            .get(&rev)
            .and_then(|n| n.body.clone())
            .ok_or_else(not_found)?;
        let mut doc = Document::at(id, rev.clone(), body);
        doc.revisions = tree.lineage(&rev);
        Ok(doc)
    }

    async fn leaves(&self, id: &str) -> Result<Vec<RevisionId>, StoreError> {
        let docs = self.docs.read();
        let tree = docs.get(id).ok_or_else(|| StoreError::NotFound {
            id: id.to_string(),
            rev: None,
        })?;
        Ok(tree.leaves())
    }

    async fn info(&self) -> Result<StoreInfo, StoreError> {
        let docs = self.docs.read();
        let doc_count = docs
            .values()
            .filter(|tree| tree.nodes.values().any(|n| n.body.is_some()))
            .count();
        Ok(StoreInfo {
            name: self.name.clone(),
            doc_count,
        })
    }
}
