//! Neo4j connection management and the Neo4j-backed graph store.

use async_trait::async_trait;
use neo4rs::{ConfigBuilder, Graph, Query};

use cleaner_core::{Node, NodeId, Relationship, RelationshipId};

use crate::store::{GraphCounts, GraphError, GraphStore, GraphTxn};

/// Configuration for connecting to Neo4j.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
    pub fetch_size: usize,
    /// Label of the node a wipe retains, if the deployment keeps one.
    pub reference_label: Option<String>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: "cleaner-dev".to_string(),
            max_connections: 16,
            fetch_size: 256,
            reference_label: None,
        }
    }
}

/// Thread-safe Neo4j graph client with connection pooling.
///
/// Clone is cheap (inner Arc).
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
    reference_label: Option<String>,
}

impl GraphClient {
    /// Connect to Neo4j with the given configuration.
    pub async fn connect(config: &GraphConfig) -> Result<Self, GraphError> {
        let neo_config = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .max_connections(config.max_connections as usize)
            .fetch_size(config.fetch_size)
            .build()
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        let graph = Graph::connect(neo_config)
            .await
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        tracing::info!(uri = %config.uri, "Connected to Neo4j");
        Ok(Self {
            graph,
            reference_label: config.reference_label.clone(),
        })
    }

    /// Execute a write-only query (CREATE, MERGE, DELETE, SET).
    pub async fn run(&self, query: Query) -> Result<(), GraphError> {
        self.graph.run(query).await?;
        Ok(())
    }

    /// Execute a read query and return the first row, if any.
    pub async fn query_one(&self, query: Query) -> Result<Option<neo4rs::Row>, GraphError> {
        let mut stream = self.graph.execute(query).await?;
        Ok(stream.next().await?)
    }
}

#[async_trait]
impl GraphStore for GraphClient {
    type Txn = Neo4jTxn;

    async fn begin(&self) -> Result<Neo4jTxn, GraphError> {
        let txn = self.graph.start_txn().await?;
        Ok(Neo4jTxn::new(txn, self.reference_label.clone()))
    }

    async fn counts(&self) -> Result<GraphCounts, GraphError> {
        Ok(GraphCounts {
            nodes: self.count_nodes().await?,
            relationships: self.count_relationships().await?,
        })
    }
}

/// A Neo4j write transaction.
///
/// Holds the neo4rs transaction until `commit` or `rollback`. If dropped while
/// still open, a rollback is sent from a background task on the current
/// runtime.
pub struct Neo4jTxn {
    pub(crate) txn: Option<neo4rs::Txn>,
    pub(crate) reference_label: Option<String>,
    /// Deletes that matched an entity so far.
    pub(crate) removed: GraphCounts,
}

impl Neo4jTxn {
    fn new(txn: neo4rs::Txn, reference_label: Option<String>) -> Self {
        Self {
            txn: Some(txn),
            reference_label,
            removed: GraphCounts::default(),
        }
    }

    pub(crate) fn open(&mut self) -> Result<&mut neo4rs::Txn, GraphError> {
        self.txn.as_mut().ok_or(GraphError::TxnClosed)
    }

    /// Run a query inside the transaction and collect its rows.
    pub(crate) async fn rows(&mut self, query: Query) -> Result<Vec<neo4rs::Row>, GraphError> {
        let txn = self.open()?;
        let mut stream = txn.execute(query).await?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next(txn.handle()).await? {
            rows.push(row);
        }
        Ok(rows)
    }

    pub(crate) fn take(&mut self) -> Result<neo4rs::Txn, GraphError> {
        self.txn.take().ok_or(GraphError::TxnClosed)
    }
}

impl Drop for Neo4jTxn {
    fn drop(&mut self) {
        let Some(txn) = self.txn.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = txn.rollback().await {
                        tracing::warn!(error = %e, "Rollback of abandoned transaction failed");
                    }
                });
            }
            Err(_) => {
                tracing::warn!("Abandoned Neo4j transaction dropped outside a runtime");
            }
        }
    }
}

#[async_trait]
impl GraphTxn for Neo4jTxn {
    async fn relationships_after(
        &mut self,
        after: Option<RelationshipId>,
        limit: usize,
    ) -> Result<Vec<Relationship>, GraphError> {
        self.fetch_relationships_after(after, limit).await
    }

    async fn nodes_after(
        &mut self,
        after: Option<NodeId>,
        limit: usize,
    ) -> Result<Vec<Node>, GraphError> {
        self.fetch_nodes_after(after, limit).await
    }

    async fn reference_node(&mut self) -> Result<Option<NodeId>, GraphError> {
        self.find_reference_node().await
    }

    async fn delete_relationship(&mut self, id: RelationshipId) -> Result<bool, GraphError> {
        self.delete_relationship_by_id(id).await
    }

    async fn delete_node(&mut self, id: NodeId) -> Result<bool, GraphError> {
        self.delete_node_by_id(id).await
    }

    async fn clear_node_properties(&mut self, id: NodeId) -> Result<bool, GraphError> {
        self.clear_properties_by_id(id).await
    }

    async fn commit(mut self) -> Result<GraphCounts, GraphError> {
        self.take()?.commit().await?;
        Ok(self.removed)
    }

    async fn rollback(mut self) -> Result<(), GraphError> {
        self.take()?.rollback().await?;
        Ok(())
    }
}
