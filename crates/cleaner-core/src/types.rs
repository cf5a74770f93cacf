//! Core domain types for the graph cleaner.
//!
//! The cleaner never owns graph entities: it refers to nodes and
//! relationships by identifier while enumerating and deleting them.

use std::fmt;
use std::num::NonZeroUsize;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Identity ──────────────────────────────────────────────────────

/// Identifier of a node, stable for the node's lifetime.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node:{}", self.0)
    }
}

/// Identifier of a relationship, stable for the relationship's lifetime.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelationshipId(pub u64);

impl fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rel:{}", self.0)
    }
}

// ── Entities ──────────────────────────────────────────────────────

/// A graph node as enumerated by the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    pub labels: Vec<String>,
}

/// A directed, typed edge between two nodes.
///
/// Both endpoints must exist for as long as the relationship does.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Relationship {
    pub id: RelationshipId,
    pub source: NodeId,
    pub target: NodeId,
    pub rel_type: String,
}

impl Relationship {
    /// Whether `node` is either endpoint of this relationship.
    pub fn touches(&self, node: NodeId) -> bool {
        self.source == node || self.target == node
    }
}

// ── Wipe ──────────────────────────────────────────────────────────

/// One wipe attempt, created per HTTP call and discarded afterwards.
///
/// The target set is implicit: every entity in the graph.
#[derive(Clone)]
pub struct DeletionRequest {
    pub wipe_id: Uuid,
    pub supplied_key: String,
    pub received_at: DateTime<Utc>,
}

impl DeletionRequest {
    pub fn new(supplied_key: impl Into<String>) -> Self {
        Self {
            wipe_id: Uuid::new_v4(),
            supplied_key: supplied_key.into(),
            received_at: Utc::now(),
        }
    }
}

impl fmt::Debug for DeletionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeletionRequest")
            .field("wipe_id", &self.wipe_id)
            .field("supplied_key", &"<redacted>")
            .field("received_at", &self.received_at)
            .finish()
    }
}

/// Transaction strategy used by the deletion engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WipeMode {
    /// Every delete in one transaction. A failure restores the whole graph.
    #[default]
    Single,
    /// Deletes split into committed sub-transactions of at most `batch_size`
    /// entities, all relationship batches before any node batch. A failure
    /// halts batching and leaves a partially emptied but consistent graph.
    Batched { batch_size: NonZeroUsize },
}

impl WipeMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Batched { .. } => "batched",
        }
    }
}

/// Entities actually removed by a wipe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WipeCounts {
    pub nodes: u64,
    pub relationships: u64,
    /// Committed transactions (always 1 in single mode).
    pub batches: u64,
    /// Reference node kept, with its properties cleared.
    pub retained: Option<NodeId>,
}

impl WipeCounts {
    pub fn absorb(&mut self, other: WipeCounts) {
        self.nodes += other.nodes;
        self.relationships += other.relationships;
        self.batches += other.batches;
        self.retained = self.retained.or(other.retained);
    }

    pub fn is_empty(&self) -> bool {
        self.nodes == 0 && self.relationships == 0
    }
}

/// JSON acknowledgment returned to the caller after a committed wipe.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WipeReport {
    pub nodes: u64,
    pub relationships: u64,
    pub batches: u64,
    pub mode: String,
    pub reference_node_retained: bool,
    pub completed_at: DateTime<Utc>,
}

impl WipeReport {
    pub fn new(counts: WipeCounts, mode: WipeMode) -> Self {
        Self {
            nodes: counts.nodes,
            relationships: counts.relationships,
            batches: counts.batches,
            mode: mode.name().to_string(),
            reference_node_retained: counts.retained.is_some(),
            completed_at: Utc::now(),
        }
    }
}
