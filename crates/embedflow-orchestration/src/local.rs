//! In-process job endpoint backed by the adaptive batch controller
//!
//! Single-process deployments run the vectorizer directly instead of
//! fanning out to a remote endpoint; this adapter gives them the same
//! submit/status/cancel surface so one orchestration path drives both
//! modes. Jobs complete (or fail) during `submit` and are terminal by the
//! first status poll.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use embedflow_batch::{AdaptiveBatcher, Embedder};
use embedflow_core::Chunk;

use crate::{
    endpoint::{JobEndpoint, JobStatus},
    error::OrchestrationError,
    Result,
};

/// [`JobEndpoint`] adapter over an in-process [`AdaptiveBatcher`].
pub struct LocalJobEndpoint<E: Embedder + 'static> {
    batcher: Arc<AdaptiveBatcher<E>>,
    jobs: Mutex<HashMap<String, JobStatus>>,
    next_id: AtomicU64,
}

impl<E: Embedder + 'static> LocalJobEndpoint<E> {
    pub fn new(batcher: Arc<AdaptiveBatcher<E>>) -> Self {
        Self {
            batcher,
            jobs: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl<E: Embedder + 'static> JobEndpoint for LocalJobEndpoint<E> {
    async fn submit(&self, batch_id: &str, chunks: &[Chunk]) -> Result<String> {
        let job_id = format!("local_{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let batcher = Arc::clone(&self.batcher);
        let owned: Vec<Chunk> = chunks.to_vec();
        // embedding is synchronous CPU-bound work; keep it off the runtime
        let outcome = tokio::task::spawn_blocking(move || batcher.embed_chunks(&owned))
            .await
            .map_err(|e| {
                OrchestrationError::Submission(format!("embedding task cancelled: {e}"))
            })?;
        let status = match outcome {
            Ok(vectors) => JobStatus::Completed(vectors),
            Err(err) => JobStatus::Failed(err.to_string()),
        };
        debug!(batch_id, job_id = %job_id, "local batch processed");
        self.jobs.lock().insert(job_id.clone(), status);
        Ok(job_id)
    }

    async fn status(&self, job_id: &str) -> Result<JobStatus> {
        self.jobs
            .lock()
            .get(job_id)
            .cloned()
            .ok_or_else(|| OrchestrationError::Status(format!("unknown local job {job_id}")))
    }

    async fn cancel(&self, _job_id: &str) -> Result<()> {
        Ok(())
    }
}
