//! Module for reading problem specifications
pub mod expr_parse;
pub mod json;

use thiserror::Error;

/// Errors from loading a problem specification
#[derive(Debug, Error)]
pub enum IoError {
    /// The specification file could not be read
    #[error("specification file not found or unreadable")]
    FileNotFound,
    /// The JSON did not describe a valid specification
    #[error("failed to deserialize problem specification: {0}")]
    DeserializeError(#[from] serde_json::Error),
}
