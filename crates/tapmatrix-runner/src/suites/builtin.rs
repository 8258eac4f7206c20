//! Built-in suites

use super::{Suite, SuiteContext};
use crate::error::SuiteError;
use serde_json::json;
use tapmatrix_plan::{EndpointRef, DEFAULT_PRIMARY_STORE, DEFAULT_SECONDARY_STORE};
use tapmatrix_revtree::{
    write_docs, Document, DocumentStore, PutOptions, RevisionId, RevisionTreeBuilder, StoreError,
};
use uuid::Uuid;

/// Fresh document id, so suites sharing a store never collide
fn doc_id(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

fn rev(text: &str) -> Result<RevisionId, SuiteError> {
    Ok(text.parse().map_err(StoreError::from)?)
}

/// Resets the default local stores
#[derive(Debug, Clone, Copy, Default)]
pub struct SetupSuite;

#[async_trait::async_trait]
impl Suite for SetupSuite {
    async fn run(&self, ctx: &mut SuiteContext) -> Result<(), SuiteError> {
        for name in [DEFAULT_PRIMARY_STORE, DEFAULT_SECONDARY_STORE] {
            let endpoint = EndpointRef::local(name);
            ctx.provider().destroy(&endpoint);
            let info = ctx.provider().resolve(&endpoint).info().await?;
            ctx.check_eq(&info.doc_count, &0, &format!("{name} starts empty"));
        }
        Ok(())
    }
}

/// Create, read and update a document
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicsSuite;

#[async_trait::async_trait]
impl Suite for BasicsSuite {
    async fn run(&self, ctx: &mut SuiteContext) -> Result<(), SuiteError> {
        let store = ctx.primary()?;
        let id = doc_id("basics");

        let created = store
            .put(Document::new(&id, json!({"count": 1})), PutOptions::NEW_EDITS)
            .await?;
        ctx.check_eq(&created.rev.generation(), &1, "first write is generation 1");

        let read = store.get(&id, None).await?;
        ctx.check_eq(&read.body, &json!({"count": 1}), "read returns written body");
        ctx.check_eq(&read.rev.as_ref(), &Some(&created.rev), "read returns current rev");

        let updated = store
            .put(
                Document::at(&id, created.rev.clone(), json!({"count": 2})),
                PutOptions::NEW_EDITS,
            )
            .await?;
        ctx.check_eq(&updated.rev.generation(), &2, "update bumps generation");

        let stale = store
            .put(
                Document::at(&id, created.rev.clone(), json!({"count": 3})),
                PutOptions::NEW_EDITS,
            )
            .await;
        ctx.check(
            matches!(stale, Err(StoreError::Conflict { .. })),
            "stale update conflicts",
        );

        let missing = store.get(&doc_id("missing"), None).await;
        ctx.check(
            missing.as_ref().is_err_and(StoreError::is_not_found),
            "unknown id is not found",
        );
        Ok(())
    }
}

/// Seeds a two-branch conflict and checks the winner
#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictsSuite;

#[async_trait::async_trait]
impl Suite for ConflictsSuite {
    async fn run(&self, ctx: &mut SuiteContext) -> Result<(), SuiteError> {
        let store = ctx.primary()?;
        let id = doc_id("conflicts");

        let root = Document::at(&id, rev("1-a")?, json!({"branch": "root"}));
        let tree = vec![
            vec![root.clone(), Document::at(&id, rev("2-a")?, json!({"branch": "a"}))],
            vec![root, Document::at(&id, rev("2-b")?, json!({"branch": "b"}))],
        ];

        let builder = RevisionTreeBuilder::new(store.as_ref());
        let report = builder.insert_tree(&tree).await?;
        ctx.check_eq(&report.inserted, &3, "shared root written once");
        ctx.check_eq(&report.skipped, &1, "shared root skipped on second branch");

        let leaves = store.leaves(&id).await?;
        ctx.check_eq(&leaves, &vec![rev("2-b")?, rev("2-a")?], "one leaf per branch");

        let winner = store.get(&id, None).await?;
        ctx.check_eq(&winner.rev, &Some(rev("2-b")?), "greatest hash wins the tie");
        ctx.check_eq(
            &winner.revisions.map(|l| l.ids().to_vec()),
            &Some(vec!["b".to_string(), "a".to_string()]),
            "winner descends from the shared root",
        );

        let replay = builder.insert_tree(&tree).await?;
        ctx.check_eq(&replay.inserted, &0, "replaying a tree writes nothing");
        Ok(())
    }
}

/// Remote endpoint identifies itself by URL
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoteInfoSuite;

#[async_trait::async_trait]
impl Suite for RemoteInfoSuite {
    async fn run(&self, ctx: &mut SuiteContext) -> Result<(), SuiteError> {
        let endpoint = ctx.primary_endpoint()?.clone();
        ctx.check(endpoint.is_remote(), "primary endpoint is remote");

        let info = ctx.primary()?.info().await?;
        ctx.check_eq(&info.name.as_str(), &endpoint.as_str(), "store reports its URL");
        Ok(())
    }
}

/// Data survives re-resolving the endpoint
#[derive(Debug, Clone, Copy, Default)]
pub struct PersistenceSuite;

#[async_trait::async_trait]
impl Suite for PersistenceSuite {
    async fn run(&self, ctx: &mut SuiteContext) -> Result<(), SuiteError> {
        let id = doc_id("persistence");
        let written = ctx
            .primary()?
            .put(Document::new(&id, json!({"kept": true})), PutOptions::NEW_EDITS)
            .await?;

        let reopened = ctx.primary()?;
        let read = reopened.get(&id, Some(&written.rev)).await?;
        ctx.check_eq(&read.body, &json!({"kept": true}), "reopened store keeps data");
        Ok(())
    }
}

/// Copies every leaf, with its lineage, from primary to secondary
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplicationSuite;

impl ReplicationSuite {
    async fn replicate(
        source: &dyn DocumentStore,
        target: &dyn DocumentStore,
        id: &str,
    ) -> Result<usize, SuiteError> {
        let leaves = source.leaves(id).await?;
        for leaf in &leaves {
            let doc = source.get(id, Some(leaf)).await?;
            target.put(doc, PutOptions::REPLICATE).await?;
        }
        Ok(leaves.len())
    }
}

#[async_trait::async_trait]
impl Suite for ReplicationSuite {
    async fn run(&self, ctx: &mut SuiteContext) -> Result<(), SuiteError> {
        let source = ctx.primary()?;
        let target = ctx.secondary()?;

        let docs = (0..3)
            .map(|n| Document::new(doc_id("replication"), json!({"n": n})))
            .collect::<Vec<_>>();
        let mut ids = write_docs(source.as_ref(), docs)
            .await?
            .into_iter()
            .map(|response| response.id)
            .collect::<Vec<_>>();

        let conflicted = doc_id("replication-conflict");
        let root = Document::at(&conflicted, rev("1-x")?, json!({}));
        RevisionTreeBuilder::new(source.as_ref())
            .insert_tree(&[
                vec![root.clone(), Document::at(&conflicted, rev("2-x")?, json!({"side": "x"}))],
                vec![root, Document::at(&conflicted, rev("2-y")?, json!({"side": "y"}))],
            ])
            .await?;
        ids.push(conflicted.clone());

        for id in &ids {
            let copied = Self::replicate(source.as_ref(), target.as_ref(), id).await?;
            let expected = source.leaves(id).await?;
            let actual = target.leaves(id).await?;
            ctx.check_eq(&actual, &expected, &format!("{id} leaves replicated"));
            ctx.check_eq(&copied, &expected.len(), &format!("{id} copied once per leaf"));
        }

        let winner = target.get(&conflicted, None).await?;
        ctx.check_eq(&winner.rev, &Some(rev("2-y")?), "winner survives replication");
        Ok(())
    }
}
