//! cleaner-engine: ordered bulk deletion of everything in a graph.
//!
//! Removes every relationship, then every node, through the
//! [`GraphStore`](cleaner_graph::GraphStore) capability. The ordering lives in
//! [`phases`]; [`WipeEngine`] only decides how the phases are cut into
//! transactions:
//!
//! - single mode runs both phases in one transaction, so a failure rolls the
//!   graph back to exactly where it started;
//! - batched mode commits sub-transactions of at most `batch_size` entities,
//!   finishing every relationship batch before the first node batch, so a
//!   failure leaves a partially emptied graph with no dangling relationships.

pub mod error;
pub mod phases;
pub mod types;

#[cfg(test)]
mod fault;

pub use error::WipeError;
pub use types::DeletionOutcome;

use std::num::NonZeroUsize;

use cleaner_core::{WipeCounts, WipeMode};
use cleaner_graph::{GraphCounts, GraphStore, GraphTxn, NodeCursor, RelationshipCursor};

use crate::error::Result;
use crate::phases::PhaseProgress;

const DEFAULT_PAGE_SIZE: usize = 500;

/// The bulk deletion engine.
pub struct WipeEngine<S> {
    store: S,
    mode: WipeMode,
    page_size: NonZeroUsize,
}

impl<S: GraphStore> WipeEngine<S> {
    /// Create an engine running in single-transaction mode.
    pub fn new(store: S) -> Self {
        Self {
            store,
            mode: WipeMode::Single,
            page_size: NonZeroUsize::new(DEFAULT_PAGE_SIZE).unwrap_or(NonZeroUsize::MIN),
        }
    }

    pub fn with_mode(mut self, mode: WipeMode) -> Self {
        self.mode = mode;
        self
    }

    /// Entities fetched per enumeration round trip.
    pub fn with_page_size(mut self, page_size: NonZeroUsize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn mode(&self) -> WipeMode {
        self.mode
    }

    /// Delete every relationship and every node except the store's
    /// reference node.
    pub async fn wipe(&self) -> Result<WipeCounts> {
        tracing::info!(mode = self.mode.name(), "Wipe started");

        let result = match self.mode {
            WipeMode::Single => self.wipe_single().await,
            WipeMode::Batched { batch_size } => self.wipe_batched(batch_size.get()).await,
        };

        match &result {
            Ok(counts) => tracing::info!(
                nodes = counts.nodes,
                relationships = counts.relationships,
                batches = counts.batches,
                "Wipe committed"
            ),
            Err(e) => tracing::warn!(kind = e.kind(), error = %e, "Wipe failed"),
        }
        result
    }

    async fn wipe_single(&self) -> Result<WipeCounts> {
        let mut txn = self.store.begin().await?;
        let work = self.delete_everything(&mut txn).await;
        settle(txn, work).await
    }

    async fn delete_everything(&self, txn: &mut S::Txn) -> Result<WipeCounts> {
        let mut rels = RelationshipCursor::new(self.page_size);
        let relationships = phases::delete_relationships(txn, &mut rels, None).await?;

        let reference = txn.reference_node().await?;
        let mut nodes = NodeCursor::new(self.page_size);
        let removed = phases::delete_nodes(txn, &mut nodes, None, reference).await?;

        Ok(WipeCounts {
            nodes: removed.removed,
            relationships: relationships.removed,
            batches: 0,
            retained: removed.retained,
        })
    }

    async fn wipe_batched(&self, batch_size: usize) -> Result<WipeCounts> {
        let mut total = WipeCounts::default();

        let mut rels = RelationshipCursor::new(self.page_size);
        while !rels.is_done() {
            let mut txn = self.store.begin().await?;
            let work = phases::delete_relationships(&mut txn, &mut rels, Some(batch_size)).await;
            let Some((_, applied)) = batch_or_stop(txn, work).await? else {
                break;
            };
            total.absorb(WipeCounts {
                relationships: applied.relationships,
                batches: 1,
                ..Default::default()
            });
            tracing::debug!(
                batch = total.batches,
                removed = applied.relationships,
                "Relationship batch committed"
            );
        }

        let mut nodes = NodeCursor::new(self.page_size);
        while !nodes.is_done() {
            let mut txn = self.store.begin().await?;
            let work = node_batch(&mut txn, &mut nodes, batch_size).await;
            let Some((progress, applied)) = batch_or_stop(txn, work).await? else {
                break;
            };
            total.absorb(WipeCounts {
                nodes: applied.nodes,
                batches: 1,
                retained: progress.retained,
                ..Default::default()
            });
            tracing::debug!(
                batch = total.batches,
                removed = applied.nodes,
                "Node batch committed"
            );
        }

        Ok(total)
    }
}

async fn node_batch<T: GraphTxn>(
    txn: &mut T,
    cursor: &mut NodeCursor,
    batch_size: usize,
) -> Result<PhaseProgress> {
    let reference = txn.reference_node().await?;
    phases::delete_nodes(txn, cursor, Some(batch_size), reference).await
}

/// Commit on success, roll back on failure. Removal counts are taken from
/// the commit, not from the deletes the transaction accepted.
async fn settle<T: GraphTxn>(txn: T, work: Result<WipeCounts>) -> Result<WipeCounts> {
    match work {
        Ok(mut counts) => {
            let applied = txn.commit().await?;
            counts.nodes = applied.nodes;
            counts.relationships = applied.relationships;
            counts.batches += 1;
            Ok(counts)
        }
        Err(e) => {
            rollback(txn).await;
            Err(e)
        }
    }
}

/// Settle one batch. An empty batch is discarded and ends its phase.
async fn batch_or_stop<T: GraphTxn>(
    txn: T,
    work: Result<PhaseProgress>,
) -> Result<Option<(PhaseProgress, GraphCounts)>> {
    match work {
        Ok(progress) if progress.visited == 0 => {
            rollback(txn).await;
            Ok(None)
        }
        Ok(progress) => {
            let applied = txn.commit().await?;
            Ok(Some((progress, applied)))
        }
        Err(e) => {
            rollback(txn).await;
            Err(e)
        }
    }
}

async fn rollback<T: GraphTxn>(txn: T) {
    if let Err(e) = txn.rollback().await {
        tracing::warn!(error = %e, "Rollback failed");
    }
}
