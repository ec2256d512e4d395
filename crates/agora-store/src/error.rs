//! Store error types.

use thiserror::Error;

/// Persistence-layer failures. Surfaced to callers as a generic storage
/// failure; the affected operation aborts without partial state.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Document decode/encode error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
