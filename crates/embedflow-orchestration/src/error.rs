//! Error types for job orchestration

use thiserror::Error;

/// Errors that can occur while orchestrating remote embedding jobs
#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Job submission failed: {0}")]
    Submission(String),

    #[error("Status check failed: {0}")]
    Status(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<reqwest::Error> for OrchestrationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            OrchestrationError::Timeout(err.to_string())
        } else {
            OrchestrationError::Network(err.to_string())
        }
    }
}

impl From<embedflow_batch::BatchError> for OrchestrationError {
    fn from(err: embedflow_batch::BatchError) -> Self {
        OrchestrationError::Embedding(err.to_string())
    }
}
