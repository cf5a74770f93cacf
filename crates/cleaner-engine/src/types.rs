//! Result of one wipe request.

use cleaner_core::WipeCounts;

use crate::error::WipeError;

/// What happened to a wipe request.
#[derive(Debug)]
pub enum DeletionOutcome {
    /// The supplied key did not match; the engine never ran.
    Unauthorized,
    /// Every relationship and every non-reference node was removed.
    Success(WipeCounts),
    /// The wipe failed. In single mode the graph is as it was before; in
    /// batched mode earlier batches stay committed.
    Failed(WipeError),
}

impl DeletionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

impl From<Result<WipeCounts, WipeError>> for DeletionOutcome {
    fn from(result: Result<WipeCounts, WipeError>) -> Self {
        match result {
            Ok(counts) => Self::Success(counts),
            Err(e) => Self::Failed(e),
        }
    }
}
