//! RevisionTreeBuilder Tests
//!
//! Branch and tree seeding against an in-memory store, with every write
//! recorded so insert counts and ordering can be checked.

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::json;
use tapmatrix_revtree::*;

/// Store wrapper that records every write it forwards
struct CountingStore {
    inner: MemoryStore,
    puts: Mutex<Vec<Document>>,
}

impl CountingStore {
    fn new() -> Self {
        Self {
            inner: MemoryStore::new("counting"),
            puts: Mutex::new(Vec::new()),
        }
    }

    fn puts(&self) -> Vec<Document> {
        self.puts.lock().clone()
    }

    fn clear(&self) {
        self.puts.lock().clear();
    }
}

#[async_trait::async_trait]
impl DocumentStore for CountingStore {
    async fn put(&self, doc: Document, options: PutOptions) -> Result<PutResponse, StoreError> {
        self.puts.lock().push(doc.clone());
        self.inner.put(doc, options).await
    }

    async fn get(&self, id: &str, rev: Option<&RevisionId>) -> Result<Document, StoreError> {
        self.inner.get(id, rev).await
    }

    async fn leaves(&self, id: &str) -> Result<Vec<RevisionId>, StoreError> {
        self.inner.leaves(id).await
    }

    async fn info(&self) -> Result<StoreInfo, StoreError> {
        self.inner.info().await
    }
}

fn doc(rev: &str, value: u32) -> Document {
    Document::at("mydoc", rev.parse().unwrap(), json!({ "value": value }))
}

fn rev(s: &str) -> RevisionId {
    s.parse().unwrap()
}

#[tokio::test]
async fn test_insert_after_without_parent_keeps_revision() {
    let store = MemoryStore::new("db");
    let builder = RevisionTreeBuilder::new(&store);

    let response = builder.insert_after(&doc("3-zzz", 1), None).await.unwrap();

    assert_eq!(response.rev, rev("3-zzz"));
    assert_eq!(store.get("mydoc", None).await.unwrap().rev, Some(rev("3-zzz")));
}

#[tokio::test]
async fn test_insert_after_links_to_parent() {
    let store = MemoryStore::new("db");
    let builder = RevisionTreeBuilder::new(&store);

    builder.insert_after(&doc("1-a", 1), None).await.unwrap();
    builder.insert_after(&doc("2-b", 2), Some(&rev("1-a"))).await.unwrap();

    let stored = store.get("mydoc", Some(&rev("2-b"))).await.unwrap();
    assert_eq!(stored.body, json!({ "value": 2 }));
    assert_eq!(stored.revisions.unwrap().ids(), ["b", "a"]);
    assert_eq!(store.leaves("mydoc").await.unwrap(), vec![rev("2-b")]);
}

#[tokio::test]
async fn test_insert_after_rejects_bad_inputs() {
    let store = MemoryStore::new("db");
    let builder = RevisionTreeBuilder::new(&store);

    let err = builder
        .insert_after(&Document::new("mydoc", json!({})), None)
        .await
        .unwrap_err();
    assert_eq!(err, TreeError::MissingRevision("mydoc".into()));

    let err = builder
        .insert_after(&doc("3-c", 3), Some(&rev("1-a")))
        .await
        .unwrap_err();
    assert!(matches!(err, TreeError::NotAChild { .. }));
}

#[tokio::test]
async fn test_insert_after_parent_at_last_generation() {
    let store = MemoryStore::new("db");
    let builder = RevisionTreeBuilder::new(&store);
    let top = RevisionId::new(u64::MAX, "a");

    let err = builder
        .insert_after(&doc("1-b", 1), Some(&top))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        TreeError::NotAChild {
            child: rev("1-b"),
            parent: top,
        }
    );
    assert!(store.get("mydoc", None).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_insert_branch_writes_each_revision_in_order() {
    let store = CountingStore::new();
    let branch = vec![doc("1-a", 1), doc("2-b", 2), doc("3-c", 3), doc("4-d", 4)];

    let report = RevisionTreeBuilder::new(&store).insert_branch(&branch).await.unwrap();
    assert_eq!(report, BranchReport { inserted: 4, skipped: 0 });

    let puts = store.puts();
    let revs: Vec<String> = puts.iter().map(|d| d.rev.as_ref().unwrap().to_string()).collect();
    assert_eq!(revs, vec!["1-a", "2-b", "3-c", "4-d"]);

    assert!(puts[0].revisions.is_none());
    for (i, put) in puts.iter().enumerate().skip(1) {
        let lineage = put.revisions.as_ref().unwrap();
        assert!(lineage.ids().len() >= 2);
        assert_eq!(lineage.ids()[1], branch[i - 1].rev.as_ref().unwrap().hash());
    }
}

#[tokio::test]
async fn test_insert_branch_replay_writes_nothing() {
    let store = CountingStore::new();
    let branch = vec![doc("1-a", 1), doc("2-b", 2), doc("3-c", 3)];
    let builder = RevisionTreeBuilder::new(&store);

    builder.insert_branch(&branch).await.unwrap();
    store.clear();

    let report = builder.insert_branch(&branch).await.unwrap();
    assert_eq!(report, BranchReport { inserted: 0, skipped: 3 });
    assert!(store.puts().is_empty());
}

#[tokio::test]
async fn test_insert_tree_produces_conflict() {
    let store = CountingStore::new();
    let a1 = doc("1-a", 1);
    let tree = vec![vec![a1.clone(), doc("2-a", 2)], vec![a1, doc("2-b", 3)]];

    let report = RevisionTreeBuilder::new(&store).insert_tree(&tree).await.unwrap();
    assert_eq!(report, BranchReport { inserted: 3, skipped: 1 });

    let leaves = store.leaves("mydoc").await.unwrap();
    assert_eq!(leaves, vec![rev("2-b"), rev("2-a")]);
    for leaf in &leaves {
        let stored = store.get("mydoc", Some(leaf)).await.unwrap();
        assert_eq!(stored.revisions.unwrap().ids()[1], "a");
    }
    assert_eq!(store.info().await.unwrap().doc_count, 1);
}

#[tokio::test]
async fn test_insert_tree_with_deep_shared_prefix() {
    let store = MemoryStore::new("db");
    let trunk = vec![doc("1-a", 1), doc("2-a", 2)];
    let mut left = trunk.clone();
    left.push(doc("3-l", 3));
    let mut right = trunk;
    right.extend([doc("3-r", 3), doc("4-r", 4)]);

    RevisionTreeBuilder::new(&store)
        .insert_tree(&[left, right])
        .await
        .unwrap();

    assert_eq!(store.leaves("mydoc").await.unwrap(), vec![rev("4-r"), rev("3-l")]);
    let winner = store.get("mydoc", None).await.unwrap();
    assert_eq!(winner.rev, Some(rev("4-r")));
    assert_eq!(winner.revisions.unwrap().ids(), ["r", "r", "a", "a"]);
}

#[tokio::test]
async fn test_write_docs_is_sequential_and_stops_on_error() {
    let store = MemoryStore::new("db");
    let docs = vec![
        Document::new("one", json!({})),
        Document::new("two", json!({})),
    ];
    let responses = write_docs(&store, docs).await.unwrap();
    assert_eq!(responses.len(), 2);
    assert!(responses.iter().all(|r| r.rev.generation() == 1));

    let docs = vec![
        Document::new("three", json!({})),
        Document::new("one", json!({})),
        Document::new("four", json!({})),
    ];
    let err = write_docs(&store, docs).await.unwrap_err();
    assert_eq!(err, StoreError::Conflict { id: "one".into() });
    assert!(store.get("three", None).await.is_ok());
    assert!(store.get("four", None).await.unwrap_err().is_not_found());
}

proptest::proptest! {
    #[test]
    fn prop_linear_branch_links_every_generation(
        hashes in proptest::collection::vec("[a-f0-9]{4,12}", 1..12)
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        runtime.block_on(async {
            let store = CountingStore::new();
            let branch: Vec<Document> = hashes
                .iter()
                .enumerate()
                .map(|(i, h)| doc(&format!("{}-{h}", i + 1), 0))
                .collect();

            let report = RevisionTreeBuilder::new(&store).insert_branch(&branch).await.unwrap();
            assert_eq!(report.inserted, hashes.len());

            let winner = store.get("mydoc", None).await.unwrap();
            let mut expected = hashes.clone();
            expected.reverse();
            assert_eq!(winner.revisions.unwrap().ids(), expected.as_slice());

            store.clear();
            let replay = RevisionTreeBuilder::new(&store).insert_branch(&branch).await.unwrap();
            assert_eq!(replay.skipped, hashes.len());
            assert!(store.puts().is_empty());
        });
    }
}
