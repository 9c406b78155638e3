//! Error types for batch controller operations

use thiserror::Error;

/// Errors that can occur while batching embedding work
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Embedder returned {actual} vectors for {expected} texts")]
    BatchOutputMismatch { expected: usize, actual: usize },

    #[error("Configuration error: {0}")]
    Config(String),
}
