//! Storage backend
//!
//! Resolves descriptor endpoints into store handles. The same endpoint
//! always resolves to the same store until it is destroyed, so descriptors
//! that reuse an endpoint name see each other's data.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tapmatrix_plan::EndpointRef;
use tapmatrix_revtree::{DocumentStore, MemoryStore};

/// Maps endpoints to store handles
pub trait StoreProvider: Send + Sync {
    /// Store for `endpoint`, created on first use
    fn resolve(&self, endpoint: &EndpointRef) -> Arc<dyn DocumentStore>;

    /// Drop the store behind `endpoint`; returns whether one existed
    fn destroy(&self, endpoint: &EndpointRef) -> bool;
}

/// In-memory backend
///
/// Remote endpoints are served by in-memory stores keyed by URL; no
/// network transport is involved.
#[derive(Debug, Default)]
pub struct MemoryStoreProvider {
    stores: RwLock<HashMap<EndpointRef, Arc<MemoryStore>>>,
}

impl MemoryStoreProvider {
    /// Create with no stores
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live stores
    #[must_use]
    pub fn len(&self) -> usize {
        self.stores.read().len()
    }

    /// Check if no store is live
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stores.read().is_empty()
    }
}

impl StoreProvider for MemoryStoreProvider {
    fn resolve(&self, endpoint: &EndpointRef) -> Arc<dyn DocumentStore> {
        if let Some(store) = self.stores.read().get(endpoint) {
            return Arc::clone(store) as Arc<dyn DocumentStore>;
        }
        let mut stores = self.stores.write();
        let store = stores.entry(endpoint.clone()).or_insert_with(|| {
            tracing::debug!("Creating store {}", endpoint);
            Arc::new(MemoryStore::new(endpoint.as_str()))
        });
        Arc::clone(store) as Arc<dyn DocumentStore>
    }

    fn destroy(&self, endpoint: &EndpointRef) -> bool {
        let existed = self.stores.write().remove(endpoint).is_some();
        if existed {
            tracing::debug!("Destroyed store {}", endpoint);
        }
        existed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tapmatrix_revtree::{Document, PutOptions};

    #[tokio::test]
    async fn same_endpoint_resolves_to_same_store() {
        let provider = MemoryStoreProvider::new();
        let endpoint = EndpointRef::local("db");

        provider
            .resolve(&endpoint)
            .put(Document::new("a", json!({})), PutOptions::NEW_EDITS)
            .await
            .unwrap();

        let again = provider.resolve(&endpoint);
        assert!(again.get("a", None).await.is_ok());
        assert_eq!(provider.len(), 1);
    }

    #[tokio::test]
    async fn destroy_drops_data() {
        let provider = MemoryStoreProvider::new();
        let endpoint = EndpointRef::remote("http://localhost:5984/db");
        provider
            .resolve(&endpoint)
            .put(Document::new("a", json!({})), PutOptions::NEW_EDITS)
            .await
            .unwrap();

        assert!(provider.destroy(&endpoint));
        assert!(!provider.destroy(&endpoint));
        assert!(provider.is_empty());
        assert!(provider.resolve(&endpoint).get("a", None).await.is_err());
    }
}
