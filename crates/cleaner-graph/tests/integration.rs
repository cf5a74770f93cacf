//! Integration tests for the Neo4j store against a live Neo4j instance.
//!
//! These tests require a Neo4j server on bolt://localhost:7687.
//! Run with: cargo test --package cleaner-graph --test integration -- --ignored
//!
//! Skipped automatically if Neo4j is not available. Every test works on
//! nodes carrying a freshly generated label and never touches other data.

use cleaner_graph::{GraphClient, GraphConfig, GraphCounts, GraphError, GraphStore, GraphTxn};

async fn connect_or_skip() -> Option<GraphClient> {
    let config = GraphConfig::default();
    match GraphClient::connect(&config).await {
        Ok(client) => Some(client),
        Err(e) => {
            eprintln!("Skipping integration test (Neo4j not available): {e}");
            None
        }
    }
}

fn unique_label() -> String {
    format!("CleanerTest{}", rand::random::<u32>())
}

async fn cleanup(client: &GraphClient, label: &str) {
    let q = neo4rs::query(&format!("MATCH (n:`{label}`) DETACH DELETE n"));
    let _ = client.run(q).await;
}

async fn count_labelled(client: &GraphClient, label: &str) -> i64 {
    let q = neo4rs::query(&format!("MATCH (n:`{label}`) RETURN count(n) AS cnt"));
    client
        .query_one(q)
        .await
        .unwrap()
        .and_then(|row| row.get::<i64>("cnt").ok())
        .unwrap_or(0)
}

#[tokio::test]
#[ignore = "requires live Neo4j; run with: cargo test --package cleaner-graph --test integration -- --ignored"]
async fn test_node_delete_refused_with_relationships() {
    let Some(client) = connect_or_skip().await else {
        return;
    };
    let label = unique_label();

    let a = client.create_node(&[label.as_str()]).await.unwrap();
    let b = client.create_node(&[label.as_str()]).await.unwrap();
    let rel = client.create_relationship(a, b, "TEST_0").await.unwrap();

    let mut txn = client.begin().await.unwrap();
    let err = txn.delete_node(a).await.unwrap_err();
    assert!(matches!(err, GraphError::DanglingRelationships { degree: 1, .. }));
    txn.rollback().await.unwrap();

    let mut txn = client.begin().await.unwrap();
    assert!(txn.delete_relationship(rel).await.unwrap());
    assert!(txn.delete_node(a).await.unwrap());
    assert!(txn.delete_node(b).await.unwrap());
    let applied = txn.commit().await.unwrap();
    assert_eq!(applied.nodes, 2);
    assert_eq!(applied.relationships, 1);

    assert_eq!(count_labelled(&client, &label).await, 0);
    cleanup(&client, &label).await;
}

#[tokio::test]
#[ignore = "requires live Neo4j"]
async fn test_rollback_restores_deleted_nodes() {
    let Some(client) = connect_or_skip().await else {
        return;
    };
    let label = unique_label();

    let a = client.create_node(&[label.as_str()]).await.unwrap();

    let mut txn = client.begin().await.unwrap();
    assert!(txn.delete_node(a).await.unwrap());
    txn.rollback().await.unwrap();

    assert_eq!(count_labelled(&client, &label).await, 1);
    cleanup(&client, &label).await;
}

#[tokio::test]
#[ignore = "requires live Neo4j"]
async fn test_missing_entities_are_noops() {
    let Some(client) = connect_or_skip().await else {
        return;
    };
    let label = unique_label();

    let a = client.create_node(&[label.as_str()]).await.unwrap();
    let b = client.create_node(&[label.as_str()]).await.unwrap();
    let rel = client.create_relationship(a, b, "TEST_1").await.unwrap();
    cleanup(&client, &label).await;

    let mut txn = client.begin().await.unwrap();
    assert!(!txn.delete_relationship(rel).await.unwrap());
    assert!(!txn.delete_node(a).await.unwrap());
    assert_eq!(txn.commit().await.unwrap(), GraphCounts::default());
}

#[tokio::test]
#[ignore = "requires live Neo4j"]
async fn test_reference_node_lookup_by_label() {
    let label = unique_label();
    let config = GraphConfig {
        reference_label: Some(label.clone()),
        ..Default::default()
    };
    let client = match GraphClient::connect(&config).await {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Skipping integration test (Neo4j not available): {e}");
            return;
        }
    };

    let mut txn = client.begin().await.unwrap();
    assert_eq!(txn.reference_node().await.unwrap(), None);
    txn.rollback().await.unwrap();

    let reference = client.create_node(&[label.as_str()]).await.unwrap();
    let mut txn = client.begin().await.unwrap();
    assert_eq!(txn.reference_node().await.unwrap(), Some(reference));
    txn.rollback().await.unwrap();

    cleanup(&client, &label).await;
}
