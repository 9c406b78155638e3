//! Seam between the orchestrator and the job-execution endpoint

use async_trait::async_trait;

use embedflow_core::{Chunk, ChunkVector};

use crate::Result;

/// Status reported by the endpoint for a submitted job.
#[derive(Debug, Clone)]
pub enum JobStatus {
    /// Accepted but not yet running.
    Queued,
    /// Running.
    InProgress,
    /// Finished with its vectors.
    Completed(Vec<ChunkVector>),
    /// Finished without a result.
    Failed(String),
    /// Aborted by a cancel request.
    Cancelled,
    /// Abandoned by the endpoint itself.
    TimedOut,
}

/// An asynchronous job-execution endpoint.
///
/// `submit` hands a batch to the endpoint and returns its job id,
/// `status` reports progress, and `cancel` is advisory cleanup whose
/// errors callers swallow.
#[async_trait]
pub trait JobEndpoint: Send + Sync {
    async fn submit(&self, batch_id: &str, chunks: &[Chunk]) -> Result<String>;

    async fn status(&self, job_id: &str) -> Result<JobStatus>;

    async fn cancel(&self, job_id: &str) -> Result<()>;
}
