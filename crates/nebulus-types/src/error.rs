use thiserror::Error;

/// Errors from similarity store backends.
///
/// The episodic layer absorbs these at its boundary (log and degrade to an
/// empty result); they only cross crate boundaries between trait
/// implementations and that layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("backend error: {0}")]
    Backend(String),

    #[error("record not found: {0}")]
    NotFound(String),

    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),
}

/// Errors from knowledge graph persistence.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
