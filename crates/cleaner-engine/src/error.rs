//! Error types for the cleaner-engine crate.

use thiserror::Error;

use cleaner_core::NodeId;
use cleaner_graph::GraphError;

#[derive(Error, Debug)]
pub enum WipeError {
    /// A node still had relationships when its delete was attempted, either
    /// because the relationship phase missed some or because a concurrent
    /// writer added new ones.
    #[error("Referential integrity violation: {node} still has {degree} relationship(s)")]
    ReferentialIntegrity { node: NodeId, degree: u64 },

    #[error("Storage error: {0}")]
    Storage(GraphError),

    #[error("Wipe exceeded its {secs}s time limit")]
    Timeout { secs: u64 },
}

impl WipeError {
    /// Stable machine-readable name for the failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ReferentialIntegrity { .. } => "referential_integrity",
            Self::Storage(_) => "storage",
            Self::Timeout { .. } => "timeout",
        }
    }
}

impl From<GraphError> for WipeError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::DanglingRelationships { node, degree } => {
                Self::ReferentialIntegrity { node, degree }
            }
            other => Self::Storage(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, WipeError>;
