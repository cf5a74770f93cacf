//! Lazy enumeration of every relationship and node in a graph.
//!
//! Cursors page by id (keyset pagination) instead of holding a live iterator
//! over the store, so the set may shrink underneath them while the wipe
//! deletes what it has already seen. The position is kept in the cursor
//! itself, which lets one cursor continue across several transactions.

use std::num::NonZeroUsize;

use cleaner_core::{Node, NodeId, Relationship, RelationshipId};

use crate::store::{GraphError, GraphTxn};

/// Keyset position over entities identified by `K`.
#[derive(Debug, Clone)]
pub struct Cursor<K> {
    after: Option<K>,
    page_size: NonZeroUsize,
    done: bool,
}

/// Enumerates all relationships ("allRelationships").
pub type RelationshipCursor = Cursor<RelationshipId>;

/// Enumerates all nodes ("allNodes").
pub type NodeCursor = Cursor<NodeId>;

impl<K: Copy> Cursor<K> {
    pub fn new(page_size: NonZeroUsize) -> Self {
        Self {
            after: None,
            page_size,
            done: false,
        }
    }

    /// Whether the last fetch came back empty.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Last id handed out, if any.
    pub fn position(&self) -> Option<K> {
        self.after
    }

    fn limit(&self, max: Option<usize>) -> usize {
        match max {
            Some(max) => max.min(self.page_size.get()),
            None => self.page_size.get(),
        }
    }

    /// Record the last id of a fetched page. An empty page ends the cursor.
    fn advance(&mut self, last: Option<K>) -> bool {
        match last {
            Some(id) => {
                self.after = Some(id);
                true
            }
            None => {
                self.done = true;
                false
            }
        }
    }
}

impl Cursor<RelationshipId> {
    /// Next page of relationships, or `None` once the graph has no more.
    pub async fn next_page<T: GraphTxn>(
        &mut self,
        txn: &mut T,
    ) -> Result<Option<Vec<Relationship>>, GraphError> {
        self.next_page_up_to(txn, None).await
    }

    /// Like [`next_page`](Self::next_page), fetching at most `max` entities.
    pub async fn next_page_up_to<T: GraphTxn>(
        &mut self,
        txn: &mut T,
        max: Option<usize>,
    ) -> Result<Option<Vec<Relationship>>, GraphError> {
        if self.done || max == Some(0) {
            return Ok(None);
        }
        let page = txn
            .relationships_after(self.after, self.limit(max))
            .await?;
        Ok(self.advance(page.last().map(|r| r.id)).then_some(page))
    }
}

impl Cursor<NodeId> {
    /// Next page of nodes, or `None` once the graph has no more.
    pub async fn next_page<T: GraphTxn>(
        &mut self,
        txn: &mut T,
    ) -> Result<Option<Vec<Node>>, GraphError> {
        self.next_page_up_to(txn, None).await
    }

    /// Like [`next_page`](Self::next_page), fetching at most `max` entities.
    pub async fn next_page_up_to<T: GraphTxn>(
        &mut self,
        txn: &mut T,
        max: Option<usize>,
    ) -> Result<Option<Vec<Node>>, GraphError> {
        if self.done || max == Some(0) {
            return Ok(None);
        }
        let page = txn.nodes_after(self.after, self.limit(max)).await?;
        Ok(self.advance(page.last().map(|n| n.id)).then_some(page))
    }
}
