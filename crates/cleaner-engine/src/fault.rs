//! A `MemoryGraph` wrapper that misbehaves once, on purpose.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use cleaner_core::{Node, NodeId, Relationship, RelationshipId};
use cleaner_graph::{GraphCounts, GraphError, GraphStore, GraphTxn, MemoryGraph, MemoryTxn};

#[derive(Debug, Clone, Copy)]
pub(crate) enum Fault {
    /// The n-th commit (1-based, across all transactions) is rejected.
    FailCommit { nth: usize },
    /// Another writer deletes the first relationship right before the wipe does.
    VanishFirstRelationship,
    /// Another writer attaches a new relationship to the first node the wipe
    /// tries to delete.
    EdgeAppearsOnFirstNodeDelete,
}

#[derive(Clone)]
pub(crate) struct FaultyStore {
    pub graph: MemoryGraph,
    fault: Fault,
    commits: Arc<AtomicUsize>,
    fired: Arc<AtomicBool>,
}

impl FaultyStore {
    pub fn new(graph: MemoryGraph, fault: Fault) -> Self {
        Self {
            graph,
            fault,
            commits: Arc::new(AtomicUsize::new(0)),
            fired: Arc::new(AtomicBool::new(false)),
        }
    }

    fn fire_once(&self) -> bool {
        !self.fired.swap(true, Ordering::SeqCst)
    }
}

#[async_trait]
impl GraphStore for FaultyStore {
    type Txn = FaultyTxn;

    async fn begin(&self) -> Result<FaultyTxn, GraphError> {
        Ok(FaultyTxn {
            inner: self.graph.begin().await?,
            store: self.clone(),
        })
    }

    async fn counts(&self) -> Result<GraphCounts, GraphError> {
        self.graph.counts().await
    }
}

pub(crate) struct FaultyTxn {
    inner: MemoryTxn,
    store: FaultyStore,
}

#[async_trait]
impl GraphTxn for FaultyTxn {
    async fn relationships_after(
        &mut self,
        after: Option<RelationshipId>,
        limit: usize,
    ) -> Result<Vec<Relationship>, GraphError> {
        self.inner.relationships_after(after, limit).await
    }

    async fn nodes_after(
        &mut self,
        after: Option<NodeId>,
        limit: usize,
    ) -> Result<Vec<Node>, GraphError> {
        self.inner.nodes_after(after, limit).await
    }

    async fn reference_node(&mut self) -> Result<Option<NodeId>, GraphError> {
        self.inner.reference_node().await
    }

    async fn delete_relationship(&mut self, id: RelationshipId) -> Result<bool, GraphError> {
        if matches!(self.store.fault, Fault::VanishFirstRelationship) && self.store.fire_once() {
            self.store.graph.remove_relationship(id);
        }
        self.inner.delete_relationship(id).await
    }

    async fn delete_node(&mut self, id: NodeId) -> Result<bool, GraphError> {
        if matches!(self.store.fault, Fault::EdgeAppearsOnFirstNodeDelete)
            && self.store.fire_once()
        {
            let late = self.store.graph.create_node(&["Late"]);
            self.store.graph.create_relationship(id, late, "LATE")?;
        }
        self.inner.delete_node(id).await
    }

    async fn clear_node_properties(&mut self, id: NodeId) -> Result<bool, GraphError> {
        self.inner.clear_node_properties(id).await
    }

    async fn commit(self) -> Result<GraphCounts, GraphError> {
        let n = self.store.commits.fetch_add(1, Ordering::SeqCst) + 1;
        if let Fault::FailCommit { nth } = self.store.fault {
            if n == nth {
                return Err(GraphError::Connection("commit rejected by store".into()));
            }
        }
        self.inner.commit().await
    }

    async fn rollback(self) -> Result<(), GraphError> {
        self.inner.rollback().await
    }
}
