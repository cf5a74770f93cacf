//! Embedded in-memory graph store.
//!
//! Committed state lives behind a single `RwLock` that is only ever held for
//! the duration of one synchronous step, never across an `.await`. A
//! [`MemoryTxn`] buffers its deletes and applies them at commit under the
//! write lock, re-checking referential integrity against whatever concurrent
//! writers committed in the meantime. Dropping a transaction discards its
//! buffer, which is the rollback.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Bound;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use cleaner_core::{Node, NodeId, Relationship, RelationshipId};

use crate::store::{GraphCounts, GraphError, GraphStore, GraphTxn};

/// Label carried by the reference node of a store created with one.
pub const REFERENCE_LABEL: &str = "ReferenceNode";

#[derive(Debug, Clone, Default)]
struct NodeRecord {
    labels: Vec<String>,
    properties: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Default)]
struct GraphState {
    nodes: BTreeMap<NodeId, NodeRecord>,
    relationships: BTreeMap<RelationshipId, Relationship>,
    /// Incident relationships per node, both directions.
    incident: HashMap<NodeId, BTreeSet<RelationshipId>>,
    reference: Option<NodeId>,
    next_node: u64,
    next_relationship: u64,
}

impl GraphState {
    fn insert_node(&mut self, labels: &[&str]) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        self.nodes.insert(
            id,
            NodeRecord {
                labels: labels.iter().map(|l| l.to_string()).collect(),
                properties: BTreeMap::new(),
            },
        );
        id
    }

    fn remove_relationship(&mut self, id: RelationshipId) -> bool {
        let Some(rel) = self.relationships.remove(&id) else {
            return false;
        };
        for endpoint in [rel.source, rel.target] {
            if let Some(set) = self.incident.get_mut(&endpoint) {
                set.remove(&id);
            }
        }
        true
    }

    /// Incident relationships of `node` not in `excluded`.
    fn degree_excluding(&self, node: NodeId, excluded: &BTreeSet<RelationshipId>) -> u64 {
        self.incident
            .get(&node)
            .map(|set| set.iter().filter(|id| !excluded.contains(id)).count() as u64)
            .unwrap_or(0)
    }
}

/// Thread-safe embedded graph. Clone is cheap (inner Arc).
#[derive(Clone, Default)]
pub struct MemoryGraph {
    state: Arc<RwLock<GraphState>>,
}

impl MemoryGraph {
    /// An empty store without a reference node.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose first node is a permanent reference node.
    pub fn with_reference_node() -> Self {
        let graph = Self::new();
        {
            let mut state = graph.state.write();
            let id = state.insert_node(&[REFERENCE_LABEL]);
            state.reference = Some(id);
        }
        graph
    }

    pub fn reference_node_id(&self) -> Option<NodeId> {
        self.state.read().reference
    }

    // ── Auto-commit writes ───────────────────────────────────────

    pub fn create_node(&self, labels: &[&str]) -> NodeId {
        self.state.write().insert_node(labels)
    }

    /// Create a relationship between two existing nodes.
    pub fn create_relationship(
        &self,
        source: NodeId,
        target: NodeId,
        rel_type: &str,
    ) -> Result<RelationshipId, GraphError> {
        let mut state = self.state.write();
        for endpoint in [source, target] {
            if !state.nodes.contains_key(&endpoint) {
                return Err(GraphError::NodeNotFound(endpoint));
            }
        }

        let id = RelationshipId(state.next_relationship);
        state.next_relationship += 1;
        state.relationships.insert(
            id,
            Relationship {
                id,
                source,
                target,
                rel_type: rel_type.to_string(),
            },
        );
        state.incident.entry(source).or_default().insert(id);
        state.incident.entry(target).or_default().insert(id);
        Ok(id)
    }

    pub fn set_node_property(
        &self,
        node: NodeId,
        key: &str,
        value: serde_json::Value,
    ) -> Result<(), GraphError> {
        let mut state = self.state.write();
        let record = state
            .nodes
            .get_mut(&node)
            .ok_or(GraphError::NodeNotFound(node))?;
        record.properties.insert(key.to_string(), value);
        Ok(())
    }

    /// Delete a relationship outside any wipe transaction.
    pub fn remove_relationship(&self, id: RelationshipId) -> bool {
        self.state.write().remove_relationship(id)
    }

    // ── Reads ────────────────────────────────────────────────────

    pub fn node_count(&self) -> u64 {
        self.state.read().nodes.len() as u64
    }

    pub fn relationship_count(&self) -> u64 {
        self.state.read().relationships.len() as u64
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.state.read().nodes.contains_key(&id)
    }

    pub fn node_labels(&self, id: NodeId) -> Option<Vec<String>> {
        self.state.read().nodes.get(&id).map(|r| r.labels.clone())
    }

    pub fn node_properties(&self, id: NodeId) -> Option<BTreeMap<String, serde_json::Value>> {
        self.state.read().nodes.get(&id).map(|r| r.properties.clone())
    }

    /// Snapshot of all committed relationships.
    pub fn relationships(&self) -> Vec<Relationship> {
        self.state.read().relationships.values().cloned().collect()
    }

    /// Relationships whose source or target node no longer exists.
    pub fn dangling_relationships(&self) -> Vec<RelationshipId> {
        let state = self.state.read();
        state
            .relationships
            .values()
            .filter(|r| {
                !state.nodes.contains_key(&r.source) || !state.nodes.contains_key(&r.target)
            })
            .map(|r| r.id)
            .collect()
    }
}

#[async_trait]
impl GraphStore for MemoryGraph {
    type Txn = MemoryTxn;

    async fn begin(&self) -> Result<MemoryTxn, GraphError> {
        Ok(MemoryTxn {
            graph: self.clone(),
            deleted_relationships: BTreeSet::new(),
            deleted_nodes: BTreeSet::new(),
            cleared_nodes: BTreeSet::new(),
        })
    }

    async fn counts(&self) -> Result<GraphCounts, GraphError> {
        let state = self.state.read();
        Ok(GraphCounts {
            nodes: state.nodes.len() as u64,
            relationships: state.relationships.len() as u64,
        })
    }
}

/// Write transaction over a [`MemoryGraph`].
pub struct MemoryTxn {
    graph: MemoryGraph,
    deleted_relationships: BTreeSet<RelationshipId>,
    deleted_nodes: BTreeSet<NodeId>,
    cleared_nodes: BTreeSet<NodeId>,
}

impl MemoryTxn {
    /// Deletes buffered so far, as (nodes, relationships).
    pub fn pending(&self) -> (usize, usize) {
        (self.deleted_nodes.len(), self.deleted_relationships.len())
    }
}

#[async_trait]
impl GraphTxn for MemoryTxn {
    async fn relationships_after(
        &mut self,
        after: Option<RelationshipId>,
        limit: usize,
    ) -> Result<Vec<Relationship>, GraphError> {
        let lower = after.map_or(Bound::Unbounded, Bound::Excluded);
        let state = self.graph.state.read();
        Ok(state
            .relationships
            .range((lower, Bound::Unbounded))
            .filter(|(id, _)| !self.deleted_relationships.contains(id))
            .take(limit)
            .map(|(_, rel)| rel.clone())
            .collect())
    }

    async fn nodes_after(
        &mut self,
        after: Option<NodeId>,
        limit: usize,
    ) -> Result<Vec<Node>, GraphError> {
        let lower = after.map_or(Bound::Unbounded, Bound::Excluded);
        let state = self.graph.state.read();
        Ok(state
            .nodes
            .range((lower, Bound::Unbounded))
            .filter(|(id, _)| !self.deleted_nodes.contains(id))
            .take(limit)
            .map(|(id, record)| Node {
                id: *id,
                labels: record.labels.clone(),
            })
            .collect())
    }

    async fn reference_node(&mut self) -> Result<Option<NodeId>, GraphError> {
        Ok(self.graph.state.read().reference)
    }

    async fn delete_relationship(&mut self, id: RelationshipId) -> Result<bool, GraphError> {
        if !self.graph.state.read().relationships.contains_key(&id) {
            return Ok(false);
        }
        Ok(self.deleted_relationships.insert(id))
    }

    async fn delete_node(&mut self, id: NodeId) -> Result<bool, GraphError> {
        let state = self.graph.state.read();
        if !state.nodes.contains_key(&id) || self.deleted_nodes.contains(&id) {
            return Ok(false);
        }
        let degree = state.degree_excluding(id, &self.deleted_relationships);
        if degree > 0 {
            return Err(GraphError::DanglingRelationships { node: id, degree });
        }
        drop(state);
        Ok(self.deleted_nodes.insert(id))
    }

    async fn clear_node_properties(&mut self, id: NodeId) -> Result<bool, GraphError> {
        if !self.graph.state.read().nodes.contains_key(&id) || self.deleted_nodes.contains(&id) {
            return Ok(false);
        }
        Ok(self.cleared_nodes.insert(id))
    }

    async fn commit(self) -> Result<GraphCounts, GraphError> {
        let mut state = self.graph.state.write();

        // Concurrent writers may have attached new relationships to nodes
        // this transaction deletes; nothing is applied if so.
        for node in &self.deleted_nodes {
            if !state.nodes.contains_key(node) {
                continue;
            }
            let degree = state.degree_excluding(*node, &self.deleted_relationships);
            if degree > 0 {
                return Err(GraphError::DanglingRelationships {
                    node: *node,
                    degree,
                });
            }
        }

        let mut relationships = 0u64;
        for id in &self.deleted_relationships {
            if state.remove_relationship(*id) {
                relationships += 1;
            }
        }

        let mut nodes = 0u64;
        for id in &self.deleted_nodes {
            if state.nodes.remove(id).is_some() {
                state.incident.remove(id);
                nodes += 1;
            }
            if state.reference == Some(*id) {
                state.reference = None;
            }
        }

        for id in &self.cleared_nodes {
            if let Some(record) = state.nodes.get_mut(id) {
                record.properties.clear();
            }
        }

        tracing::debug!(nodes, relationships, "Memory transaction committed");
        Ok(GraphCounts {
            nodes,
            relationships,
        })
    }

    async fn rollback(self) -> Result<(), GraphError> {
        let (nodes, relationships) = self.pending();
        tracing::debug!(nodes, relationships, "Memory transaction rolled back");
        Ok(())
    }
}
