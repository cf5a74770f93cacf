//! HTTP tests for the wipe endpoint.
//!
//! Each test boots the router over an embedded graph on an ephemeral port
//! and drives it with reqwest.

use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tokio::net::TcpListener;

use cleaner_core::{KeyValidator, WipeMode};
use cleaner_engine::WipeEngine;
use cleaner_graph::{GraphCounts, GraphError, GraphStore, MemoryGraph, MemoryTxn};
use cleaner_server::{router, AppState};

const DELETE_KEY: &str = "secret-key";
const FEW_NODES: usize = 500;
const MANY_NODES: usize = 1500;

async fn spawn_server(engine: WipeEngine<MemoryGraph>) -> String {
    spawn_with_state(AppState::new(engine, KeyValidator::new(DELETE_KEY))).await
}

async fn spawn_with_state<S: GraphStore>(state: AppState<S>) -> String {
    let app = router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

/// `max` nodes and `2 * max` random relationships between distinct nodes.
fn create_data(graph: &MemoryGraph, max: usize) {
    let nodes: Vec<_> = (0..max).map(|_| graph.create_node(&["Test"])).collect();
    let mut rng = rand::rng();
    for i in 0..max * 2 {
        let index = rng.random_range(0..max);
        let other = (index + 1 + rng.random_range(0..max - 1)) % max;
        graph
            .create_relationship(nodes[index], nodes[other], &format!("TEST_{i}"))
            .unwrap();
    }
}

async fn wipe(base: &str, key: &str) -> reqwest::Response {
    Client::new()
        .delete(format!("{base}/test/{key}"))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn health_returns_ok() {
    let base = spawn_server(WipeEngine::new(MemoryGraph::new())).await;

    let resp = Client::new().get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn wipe_with_few_nodes() {
    let graph = MemoryGraph::with_reference_node();
    assert_eq!(graph.node_count(), 1);
    create_data(&graph, FEW_NODES);
    assert_eq!(graph.node_count(), FEW_NODES as u64 + 1);
    assert_eq!(graph.relationship_count(), 2 * FEW_NODES as u64);

    let base = spawn_server(WipeEngine::new(graph.clone())).await;
    let resp = wipe(&base, DELETE_KEY).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["nodes"], FEW_NODES as u64);
    assert_eq!(body["relationships"], 2 * FEW_NODES as u64);
    assert_eq!(body["mode"], "single");
    assert_eq!(body["reference_node_retained"], true);

    assert_eq!(graph.node_count(), 1);
    assert_eq!(graph.relationship_count(), 0);
}

#[tokio::test]
async fn wipe_with_many_nodes() {
    for mode in [
        WipeMode::Single,
        WipeMode::Batched {
            batch_size: NonZeroUsize::new(250).unwrap(),
        },
    ] {
        let graph = MemoryGraph::with_reference_node();
        create_data(&graph, MANY_NODES);

        let base = spawn_server(WipeEngine::new(graph.clone()).with_mode(mode)).await;
        let resp = wipe(&base, DELETE_KEY).await;
        assert_eq!(resp.status(), StatusCode::OK, "mode {mode:?}");

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["mode"], mode.name());
        assert_eq!(body["nodes"], MANY_NODES as u64);
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.relationship_count(), 0);
    }
}

#[tokio::test]
async fn wipe_with_wrong_key_leaves_graph_alone() {
    let graph = MemoryGraph::with_reference_node();
    create_data(&graph, FEW_NODES);

    let base = spawn_server(WipeEngine::new(graph.clone())).await;
    let resp = wipe(&base, "wrong-key").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    assert_eq!(graph.node_count(), FEW_NODES as u64 + 1);
    assert_eq!(graph.relationship_count(), 2 * FEW_NODES as u64);
}

#[tokio::test]
async fn wipe_is_repeatable() {
    let graph = MemoryGraph::with_reference_node();
    create_data(&graph, 50);

    let base = spawn_server(WipeEngine::new(graph.clone())).await;
    assert_eq!(wipe(&base, DELETE_KEY).await.status(), StatusCode::OK);

    let resp = wipe(&base, DELETE_KEY).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["nodes"], 0);
    assert_eq!(body["relationships"], 0);
    assert_eq!(graph.node_count(), 1);
}

/// Embedded graph whose transactions take `delay` to open.
struct SlowStore {
    graph: MemoryGraph,
    delay: Duration,
}

#[async_trait]
impl GraphStore for SlowStore {
    type Txn = MemoryTxn;

    async fn begin(&self) -> Result<MemoryTxn, GraphError> {
        tokio::time::sleep(self.delay).await;
        self.graph.begin().await
    }

    async fn counts(&self) -> Result<GraphCounts, GraphError> {
        self.graph.counts().await
    }
}

#[tokio::test]
async fn wipe_timeout_returns_error_kind() {
    let graph = MemoryGraph::with_reference_node();
    create_data(&graph, FEW_NODES);
    let store = SlowStore {
        graph: graph.clone(),
        delay: Duration::from_secs(5),
    };
    let state = AppState::new(WipeEngine::new(store), KeyValidator::new(DELETE_KEY))
        .with_timeout(Duration::from_millis(50));

    let base = spawn_with_state(state).await;
    let resp = wipe(&base, DELETE_KEY).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "timeout");
    assert!(body["message"].as_str().unwrap().contains("time limit"));
    assert_eq!(graph.node_count(), FEW_NODES as u64 + 1);
    assert_eq!(graph.relationship_count(), 2 * FEW_NODES as u64);
}

#[tokio::test]
async fn batched_wipe_timeout_leaves_graph_consistent() {
    let graph = MemoryGraph::with_reference_node();
    create_data(&graph, FEW_NODES);
    let store = SlowStore {
        graph: graph.clone(),
        delay: Duration::from_millis(20),
    };
    // 1000 relationships need ten batches of 100, more than the limit allows.
    let engine = WipeEngine::new(store).with_mode(WipeMode::Batched {
        batch_size: NonZeroUsize::new(100).unwrap(),
    });
    let state = AppState::new(engine, KeyValidator::new(DELETE_KEY))
        .with_timeout(Duration::from_millis(150));

    let base = spawn_with_state(state).await;
    let resp = wipe(&base, DELETE_KEY).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "timeout");

    // Earlier batches stay committed; the one in flight is rolled back.
    let remaining = graph.relationship_count();
    assert!(remaining < 2 * FEW_NODES as u64);
    assert_eq!(remaining % 100, 0);
    assert_eq!(graph.node_count(), FEW_NODES as u64 + 1);
    assert!(graph.dangling_relationships().is_empty());
}

#[tokio::test]
async fn wipe_without_key_is_unauthorized() {
    let graph = MemoryGraph::with_reference_node();
    create_data(&graph, 20);
    let base = spawn_server(WipeEngine::new(graph.clone())).await;

    for path in ["/test", "/test/"] {
        let resp = Client::new()
            .delete(format!("{base}{path}"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "path {path}");
    }

    assert_eq!(graph.node_count(), 21);
    assert_eq!(graph.relationship_count(), 40);
}

#[tokio::test]
async fn wipe_route_requires_delete() {
    let base = spawn_server(WipeEngine::new(MemoryGraph::new())).await;

    let resp = Client::new()
        .get(format!("{base}/test/{DELETE_KEY}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}
