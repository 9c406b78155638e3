//! Fan-out of a large embedding request across independent jobs
//!
//! Chunks are partitioned into fixed-size batches and each batch is
//! submitted as its own job. A single coordinating loop then advances all
//! jobs: per iteration it queries a bounded, earliest-submitted-first
//! slice of the pending set, maps remote statuses onto job states, and
//! sleeps until the next tick or the global deadline, whichever comes
//! first. Pending jobs left at the deadline are failed with a timeout
//! reason and cancelled best-effort.

use std::sync::Arc;
use std::time::Duration;

use futures::future;
use serde::Deserialize;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use embedflow_core::{Chunk, ChunkVector};

use crate::{
    endpoint::{JobEndpoint, JobStatus},
    error::OrchestrationError,
    Result,
};

fn default_batch_size() -> usize {
    64
}

fn default_max_concurrent_polls() -> usize {
    4
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_deadline_ms() -> u64 {
    300_000
}

/// Configuration for [`JobOrchestrator`].
#[derive(Debug, Clone, Deserialize)]
pub struct OrchestratorConfig {
    /// Chunks per submitted job. Default: 64.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Upper bound on status queries per polling iteration. Default: 4.
    #[serde(default = "default_max_concurrent_polls")]
    pub max_concurrent_polls: usize,
    /// Pause between polling iterations, in milliseconds. Default: 500.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Wall-clock bound for a whole run, in milliseconds. Default: 300000
    /// (5 minutes).
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_concurrent_polls: default_max_concurrent_polls(),
            poll_interval_ms: default_poll_interval_ms(),
            deadline_ms: default_deadline_ms(),
        }
    }
}

impl OrchestratorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }
}

/// Lifecycle of one submitted batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Completed,
    Failed,
}

/// One job tracking a submitted batch. Mutated only by the polling loop;
/// terminal once no longer [`JobState::Pending`].
#[derive(Debug, Clone)]
pub struct RemoteJob {
    /// Endpoint-assigned id; empty when submission itself failed.
    pub job_id: String,
    /// Derived batch identifier (`{prefix}_batch_{i}`).
    pub batch_id: String,
    /// Ids of the chunks this batch carries, in batch order.
    pub chunk_ids: Vec<String>,
    pub state: JobState,
    pub result: Option<Vec<ChunkVector>>,
    pub error: Option<String>,
}

/// Aggregated outcome of one orchestration run.
///
/// Partial success is a normal outcome: callers must reconcile
/// `failed_batch_count` and the missing chunk ids themselves (see
/// `embedflow_core::missing_chunk_ids`).
#[derive(Debug, Clone, Default)]
pub struct OrchestrationResult {
    /// Vectors from completed batches, concatenated in submission order.
    pub vectors: Vec<ChunkVector>,
    /// Batches that failed to submit, failed remotely, or timed out.
    pub failed_batch_count: usize,
}

/// Coordinates submission, polling, deadline, and aggregation for one
/// embedding request.
pub struct JobOrchestrator {
    endpoint: Arc<dyn JobEndpoint>,
    config: OrchestratorConfig,
}

impl JobOrchestrator {
    pub fn new(endpoint: Arc<dyn JobEndpoint>, config: OrchestratorConfig) -> Result<Self> {
        if config.batch_size == 0 {
            return Err(OrchestrationError::Config(
                "batch_size must be at least 1".to_string(),
            ));
        }
        if config.max_concurrent_polls == 0 {
            return Err(OrchestrationError::Config(
                "max_concurrent_polls must be at least 1".to_string(),
            ));
        }
        Ok(Self { endpoint, config })
    }

    /// Embed `chunks` as a set of independent jobs and return whatever
    /// succeeded before the deadline.
    ///
    /// Never fails over individual batches; only an empty result set and a
    /// nonzero `failed_batch_count` reveal partial failure.
    pub async fn run(&self, chunks: &[Chunk], job_prefix: &str) -> Result<OrchestrationResult> {
        if chunks.is_empty() {
            return Ok(OrchestrationResult::default());
        }
        info!(
            chunks = chunks.len(),
            batch_size = self.config.batch_size,
            "starting embedding orchestration"
        );

        let mut jobs = self.submit_batches(chunks, job_prefix).await;
        self.poll_jobs(&mut jobs).await;
        Ok(aggregate(jobs))
    }

    async fn submit_batches(&self, chunks: &[Chunk], job_prefix: &str) -> Vec<RemoteJob> {
        let batches: Vec<&[Chunk]> = chunks.chunks(self.config.batch_size).collect();
        let total = batches.len();
        let mut jobs = Vec::with_capacity(total);
        for (index, batch) in batches.into_iter().enumerate() {
            let batch_id = format!("{job_prefix}_batch_{index}");
            let chunk_ids: Vec<String> = batch.iter().map(|c| c.id.clone()).collect();
            match self.endpoint.submit(&batch_id, batch).await {
                Ok(job_id) => {
                    info!(batch = index + 1, total, job_id = %job_id, "batch submitted");
                    jobs.push(RemoteJob {
                        job_id,
                        batch_id,
                        chunk_ids,
                        state: JobState::Pending,
                        result: None,
                        error: None,
                    });
                }
                Err(err) => {
                    error!(batch = index + 1, total, error = %err, "batch submission failed");
                    jobs.push(RemoteJob {
                        job_id: String::new(),
                        batch_id,
                        chunk_ids,
                        state: JobState::Failed,
                        result: None,
                        error: Some(err.to_string()),
                    });
                }
            }
        }
        jobs
    }

    async fn poll_jobs(&self, jobs: &mut [RemoteJob]) {
        let deadline = Instant::now() + self.config.deadline();
        loop {
            let pending: Vec<usize> = jobs
                .iter()
                .enumerate()
                .filter(|(_, job)| job.state == JobState::Pending)
                .map(|(index, _)| index)
                .collect();
            if pending.is_empty() {
                return;
            }
            if Instant::now() >= deadline {
                break;
            }

            // earliest-submitted first: older batches get the status slots
            // when not everything fits in the window
            let slice: Vec<(usize, String)> = pending
                .into_iter()
                .take(self.config.max_concurrent_polls)
                .map(|index| (index, jobs[index].job_id.clone()))
                .collect();
            let checks = slice
                .iter()
                .map(|(_, job_id)| self.endpoint.status(job_id));
            let statuses = future::join_all(checks).await;

            for ((index, _), status) in slice.iter().zip(statuses) {
                apply_status(&mut jobs[*index], status);
            }

            if jobs.iter().any(|job| job.state == JobState::Pending) {
                let now = Instant::now();
                if now >= deadline {
                    break;
                }
                // wake at the deadline if it lands inside the interval
                tokio::time::sleep_until(deadline.min(now + self.config.poll_interval())).await;
            }
        }

        // deadline elapsed with work outstanding
        for job in jobs
            .iter_mut()
            .filter(|job| job.state == JobState::Pending)
        {
            warn!(batch_id = %job.batch_id, "deadline elapsed, abandoning batch");
            job.state = JobState::Failed;
            job.error = Some("Timeout".to_string());
            if let Err(err) = self.endpoint.cancel(&job.job_id).await {
                warn!(job_id = %job.job_id, error = %err, "cancellation failed");
            }
        }
    }
}

fn apply_status(job: &mut RemoteJob, status: Result<JobStatus>) {
    match status {
        Ok(JobStatus::Completed(vectors)) => {
            info!(batch_id = %job.batch_id, vectors = vectors.len(), "batch completed");
            job.result = Some(vectors);
            job.state = JobState::Completed;
        }
        Ok(JobStatus::Failed(reason)) => {
            error!(batch_id = %job.batch_id, reason = %reason, "batch failed");
            job.error = Some(reason);
            job.state = JobState::Failed;
        }
        Ok(JobStatus::Cancelled) => {
            error!(batch_id = %job.batch_id, "batch cancelled remotely");
            job.error = Some("Job CANCELLED".to_string());
            job.state = JobState::Failed;
        }
        Ok(JobStatus::TimedOut) => {
            error!(batch_id = %job.batch_id, "batch timed out remotely");
            job.error = Some("Job TIMED_OUT".to_string());
            job.state = JobState::Failed;
        }
        Ok(JobStatus::Queued) | Ok(JobStatus::InProgress) => {
            debug!(batch_id = %job.batch_id, "batch still in flight");
        }
        // a transport hiccup is not a verdict; the job stays pending and
        // is queried again next iteration
        Err(err) => {
            warn!(batch_id = %job.batch_id, error = %err, "status check failed");
        }
    }
}

fn aggregate(jobs: Vec<RemoteJob>) -> OrchestrationResult {
    let mut vectors = Vec::new();
    let mut failed_batch_count = 0;
    for job in jobs {
        match (job.state, job.result) {
            (JobState::Completed, Some(batch)) => vectors.extend(batch),
            _ => failed_batch_count += 1,
        }
    }
    info!(
        vectors = vectors.len(),
        failed = failed_batch_count,
        "embedding orchestration complete"
    );
    if failed_batch_count > 0 {
        warn!(failed = failed_batch_count, "some batches produced no vectors");
    }
    OrchestrationResult {
        vectors,
        failed_batch_count,
    }
}
