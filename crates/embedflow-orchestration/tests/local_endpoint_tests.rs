//! Orchestration over the in-process endpoint

use std::sync::Arc;

use embedflow_batch::{AdaptiveBatcher, BatchControllerConfig, Embedder, MemoryMonitor};
use embedflow_core::{missing_chunk_ids, Chunk};
use embedflow_orchestration::{
    JobEndpoint, JobOrchestrator, LocalJobEndpoint, OrchestrationError, OrchestratorConfig,
};

/// Deterministic embedder: the vector encodes the text length.
struct LengthEmbedder;

impl Embedder for LengthEmbedder {
    fn embed(&self, texts: &[String]) -> embedflow_batch::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| vec![t.len() as f32, 2.0]).collect())
    }

    fn dimension(&self) -> usize {
        2
    }
}

fn local_endpoint() -> Arc<LocalJobEndpoint<LengthEmbedder>> {
    let batcher = AdaptiveBatcher::with_monitor(
        LengthEmbedder,
        BatchControllerConfig::default(),
        MemoryMonitor::with_budget(u64::MAX),
    )
    .unwrap();
    Arc::new(LocalJobEndpoint::new(Arc::new(batcher)))
}

#[tokio::test]
async fn local_pipeline_embeds_every_chunk_in_order() {
    let endpoint = local_endpoint();
    let orchestrator = JobOrchestrator::new(
        endpoint,
        OrchestratorConfig {
            batch_size: 4,
            max_concurrent_polls: 2,
            poll_interval_ms: 10,
            deadline_ms: 10_000,
        },
    )
    .unwrap();
    let items: Vec<Chunk> = (0..10)
        .map(|i| Chunk::new(format!("c{i}"), "x".repeat(i + 1)))
        .collect();

    let result = orchestrator.run(&items, "local").await.unwrap();

    assert_eq!(result.failed_batch_count, 0);
    assert_eq!(result.vectors.len(), items.len());
    for (i, cv) in result.vectors.iter().enumerate() {
        assert_eq!(cv.chunk_id, format!("c{i}"));
        assert_eq!(cv.vector[0], (i + 1) as f32);
    }
    assert!(missing_chunk_ids(&items, &result.vectors).is_empty());
}

#[tokio::test]
async fn unknown_local_job_is_a_status_error() {
    let endpoint = local_endpoint();

    let err = endpoint.status("local_999").await.err().unwrap();
    assert!(matches!(err, OrchestrationError::Status(_)));
}

#[tokio::test]
async fn local_jobs_are_terminal_by_first_poll() {
    let endpoint = local_endpoint();
    let chunks = vec![Chunk::new("a", "hello"), Chunk::new("b", "world")];

    let job_id = endpoint.submit("solo_batch_0", &chunks).await.unwrap();
    let status = endpoint.status(&job_id).await.unwrap();

    assert!(matches!(
        status,
        embedflow_orchestration::JobStatus::Completed(_)
    ));
}
