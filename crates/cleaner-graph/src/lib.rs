//! cleaner-graph: storage capability and backends for the graph cleaner.
//!
//! The deletion engine only talks to the [`GraphStore`]/[`GraphTxn`] traits.
//! Two backends implement them: [`MemoryGraph`], an embedded store used by
//! default and in tests, and [`GraphClient`], a Neo4j store over Bolt.
//! The [`cursor`] module provides the keyset-paged enumeration of every
//! relationship and node.

pub mod client;
pub mod cursor;
pub mod memory;
pub mod mutations;
pub mod queries;
pub mod store;

pub use client::{GraphClient, GraphConfig, Neo4jTxn};
pub use cursor::{NodeCursor, RelationshipCursor};
pub use memory::{MemoryGraph, MemoryTxn};
pub use store::{GraphCounts, GraphError, GraphStore, GraphTxn};
