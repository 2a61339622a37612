//! Error types for message decoding.

use thiserror::Error;

/// Errors raised while decoding a delivery's payload.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// The payload bytes are not the expected JSON document.
    #[error("malformed task payload: {0}")]
    Malformed(#[from] serde_json::Error),
}
