//! cleaner-core: Shared types, configuration, and error handling for the graph cleaner.
//!
//! This crate provides the foundational pieces used across all cleaner components:
//! - Node and relationship identities as seen by the wipe
//! - The per-call `DeletionRequest` and the `WipeCounts`/`WipeReport` results
//! - The shared-secret `KeyValidator` guarding the wipe
//! - Configuration management
//! - Common error types

pub mod auth;
pub mod config;
pub mod error;
pub mod types;

pub use auth::KeyValidator;
pub use config::CleanerConfig;
pub use error::CleanerError;
pub use types::{
    DeletionRequest, Node, NodeId, Relationship, RelationshipId, WipeCounts, WipeMode, WipeReport,
};
