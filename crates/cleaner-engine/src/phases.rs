//! The two ordered deletion phases shared by every strategy.
//!
//! Each phase pulls pages from its cursor and deletes what it sees inside
//! the caller's transaction, optionally stopping after `budget` entities so
//! a strategy can cut the work into batches. Entities that vanished since
//! they were enumerated are skipped, not reported.

use cleaner_core::NodeId;
use cleaner_graph::{GraphTxn, NodeCursor, RelationshipCursor};

use crate::error::Result;

/// How much of a phase ran inside one transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseProgress {
    /// Entities enumerated and acted on.
    pub visited: usize,
    /// Deletes the transaction accepted. A concurrent writer may still get
    /// there first, so the commit has the final say.
    pub removed: u64,
    /// Reference node whose properties were cleared instead of deleting it.
    pub retained: Option<NodeId>,
}

fn remaining(budget: Option<usize>, visited: usize) -> Option<usize> {
    budget.map(|b| b.saturating_sub(visited))
}

/// Delete every relationship the cursor still yields.
pub async fn delete_relationships<T: GraphTxn>(
    txn: &mut T,
    cursor: &mut RelationshipCursor,
    budget: Option<usize>,
) -> Result<PhaseProgress> {
    let mut progress = PhaseProgress::default();

    while let Some(page) = cursor
        .next_page_up_to(txn, remaining(budget, progress.visited))
        .await?
    {
        for rel in page {
            progress.visited += 1;
            if txn.delete_relationship(rel.id).await? {
                progress.removed += 1;
            } else {
                tracing::debug!(relationship = %rel.id, "Relationship vanished before delete");
            }
        }
    }

    Ok(progress)
}

/// Delete every node the cursor still yields, keeping `reference` (if any)
/// with its properties cleared.
pub async fn delete_nodes<T: GraphTxn>(
    txn: &mut T,
    cursor: &mut NodeCursor,
    budget: Option<usize>,
    reference: Option<NodeId>,
) -> Result<PhaseProgress> {
    let mut progress = PhaseProgress::default();

    while let Some(page) = cursor
        .next_page_up_to(txn, remaining(budget, progress.visited))
        .await?
    {
        for node in page {
            progress.visited += 1;
            if Some(node.id) == reference {
                if txn.clear_node_properties(node.id).await? {
                    progress.retained = Some(node.id);
                }
                continue;
            }
            if txn.delete_node(node.id).await? {
                progress.removed += 1;
            } else {
                tracing::debug!(node = %node.id, "Node vanished before delete");
            }
        }
    }

    Ok(progress)
}
