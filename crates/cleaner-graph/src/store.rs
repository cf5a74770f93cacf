//! Storage capability consumed by the deletion engine.
//!
//! A store hands out write transactions; everything the wipe reads or
//! deletes goes through one. Implementations must roll back any transaction
//! that is dropped without `commit`, so an abandoned wipe (error, panic, or a
//! cancelled request future) never leaves half-applied deletes behind.

use async_trait::async_trait;
use serde::Serialize;

use cleaner_core::{Node, NodeId, Relationship, RelationshipId};

/// Errors from graph operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Neo4j connection error: {0}")]
    Connection(String),

    #[error("Neo4j query error: {0}")]
    Query(#[from] neo4rs::Error),

    /// The store's referential check refused a node delete.
    #[error("Cannot delete {node}: it still has {degree} relationship(s)")]
    DanglingRelationships { node: NodeId, degree: u64 },

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Transaction is no longer open")]
    TxnClosed,

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Node and relationship totals: what a store holds, or what one commit
/// removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GraphCounts {
    pub nodes: u64,
    pub relationships: u64,
}

/// A graph store able to open write transactions.
#[async_trait]
pub trait GraphStore: Send + Sync + 'static {
    type Txn: GraphTxn;

    /// Begin a write transaction.
    async fn begin(&self) -> Result<Self::Txn, GraphError>;

    /// Committed node and relationship totals.
    async fn counts(&self) -> Result<GraphCounts, GraphError>;
}

/// One write transaction.
///
/// Reads observe committed data plus this transaction's own pending deletes.
/// Deleting an entity that is already gone returns `Ok(false)` rather than an
/// error, so races with concurrent writers are absorbed by the caller.
#[async_trait]
pub trait GraphTxn: Send {
    /// Up to `limit` relationships with id greater than `after`, ascending.
    async fn relationships_after(
        &mut self,
        after: Option<RelationshipId>,
        limit: usize,
    ) -> Result<Vec<Relationship>, GraphError>;

    /// Up to `limit` nodes with id greater than `after`, ascending.
    async fn nodes_after(
        &mut self,
        after: Option<NodeId>,
        limit: usize,
    ) -> Result<Vec<Node>, GraphError>;

    /// The store's permanent reference node, if it has one.
    async fn reference_node(&mut self) -> Result<Option<NodeId>, GraphError>;

    /// Delete a relationship if present.
    async fn delete_relationship(&mut self, id: RelationshipId) -> Result<bool, GraphError>;

    /// Delete a node if present.
    ///
    /// Fails with [`GraphError::DanglingRelationships`] while the node still
    /// has relationships visible to this transaction.
    async fn delete_node(&mut self, id: NodeId) -> Result<bool, GraphError>;

    /// Remove every property of a node if present.
    async fn clear_node_properties(&mut self, id: NodeId) -> Result<bool, GraphError>;

    /// Apply the transaction and report how many nodes and relationships it
    /// actually removed. Entities a concurrent writer removed first are not
    /// counted, even if their delete returned `true` earlier.
    async fn commit(self) -> Result<GraphCounts, GraphError>;

    async fn rollback(self) -> Result<(), GraphError>;
}
