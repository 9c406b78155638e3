//! End-to-end test of the embedding pipeline: adaptive batching behind the
//! in-process endpoint, driven by the job orchestrator, with caller-side
//! reconciliation of what failed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use embedflow_batch::{
    AdaptiveBatcher, BatchControllerConfig, BatchError, Embedder, MemoryMonitor,
};
use embedflow_core::{missing_chunk_ids, Chunk};
use embedflow_orchestration::{
    JobOrchestrator, LocalJobEndpoint, OrchestratorConfig,
};

/// Embedder that refuses any batch containing a poisoned text.
struct PoisonAwareEmbedder {
    calls: Arc<AtomicUsize>,
}

impl Embedder for PoisonAwareEmbedder {
    fn embed(&self, texts: &[String]) -> embedflow_batch::Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if texts.iter().any(|t| t.contains("poison")) {
            return Err(BatchError::Embedding("poisoned input".to_string()));
        }
        Ok(texts
            .iter()
            .map(|t| vec![t.len() as f32, 0.5, 0.25, 0.125])
            .collect())
    }

    fn dimension(&self) -> usize {
        4
    }
}

fn pipeline(calls: Arc<AtomicUsize>) -> JobOrchestrator {
    let batcher = AdaptiveBatcher::with_monitor(
        PoisonAwareEmbedder { calls },
        BatchControllerConfig {
            min_batch_size: 2,
            max_batch_size: 16,
            growth_step: 2,
            ..BatchControllerConfig::default()
        },
        MemoryMonitor::with_budget(u64::MAX),
    )
    .unwrap();
    let endpoint = Arc::new(LocalJobEndpoint::new(Arc::new(batcher)));
    JobOrchestrator::new(
        endpoint,
        OrchestratorConfig {
            batch_size: 5,
            max_concurrent_polls: 2,
            poll_interval_ms: 10,
            deadline_ms: 10_000,
        },
    )
    .unwrap()
}

fn make_chunks(poisoned: Option<usize>) -> Vec<Chunk> {
    (0..20)
        .map(|i| {
            let content = match poisoned {
                Some(p) if p == i => format!("poison {i}"),
                _ => format!("ordinary text number {i}"),
            };
            Chunk::new(format!("chunk-{i}"), content)
        })
        .collect()
}

#[tokio::test]
async fn healthy_pipeline_embeds_everything() {
    let calls = Arc::new(AtomicUsize::new(0));
    let orchestrator = pipeline(Arc::clone(&calls));
    let chunks = make_chunks(None);

    let result = orchestrator.run(&chunks, "e2e").await.unwrap();

    assert_eq!(result.failed_batch_count, 0);
    assert_eq!(result.vectors.len(), chunks.len());
    for (i, cv) in result.vectors.iter().enumerate() {
        assert_eq!(cv.chunk_id, format!("chunk-{i}"));
        assert_eq!(cv.vector.len(), 4);
    }
    assert!(missing_chunk_ids(&chunks, &result.vectors).is_empty());
    assert!(calls.load(Ordering::SeqCst) >= 4);
}

#[tokio::test]
async fn poisoned_batch_fails_alone_and_is_reconcilable() {
    let calls = Arc::new(AtomicUsize::new(0));
    let orchestrator = pipeline(Arc::clone(&calls));
    // chunk 7 sits in orchestration batch 1 (chunks 5..10)
    let chunks = make_chunks(Some(7));

    let result = orchestrator.run(&chunks, "e2e").await.unwrap();

    assert_eq!(result.failed_batch_count, 1);
    assert_eq!(result.vectors.len(), 15);

    let missing = missing_chunk_ids(&chunks, &result.vectors);
    let expected: Vec<String> = (5..10).map(|i| format!("chunk-{i}")).collect();
    assert_eq!(missing, expected);
}
