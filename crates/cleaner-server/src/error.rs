//! Error types for the cleaner-server crate.

use serde::Serialize;
use thiserror::Error;

use cleaner_engine::WipeError;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Config error: {0}")]
    Config(#[from] cleaner_core::CleanerError),
}

pub type Result<T> = std::result::Result<T, ServerError>;

/// JSON body of a failed wipe response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl From<&WipeError> for ErrorBody {
    fn from(err: &WipeError) -> Self {
        Self {
            error: err.kind(),
            message: err.to_string(),
        }
    }
}
