//! Adaptive batch sizing around a vectorization primitive
//!
//! The controller owns a live batch size bounded by
//! `[min_batch_size, max_batch_size]`. Oversized inputs are split into
//! consecutive sub-batches at the current size; a failed or
//! memory-pressured sub-batch shrinks the size and is re-split, and
//! sustained success grows it back.

use std::collections::VecDeque;

use parking_lot::Mutex;
use serde::Deserialize;
use tracing::{debug, info, warn};

use embedflow_core::{Chunk, ChunkVector};

use crate::{
    embedder::Embedder, error::BatchError, memory::MemoryMonitor, telemetry::BatchTelemetry,
    Result,
};

fn default_min_batch_size() -> usize {
    8
}

fn default_max_batch_size() -> usize {
    64
}

fn default_growth_step() -> usize {
    4
}

fn default_max_memory_percent() -> f64 {
    70.0
}

fn default_adaptive() -> bool {
    true
}

fn default_reclaim_interval() -> usize {
    10
}

/// Configuration for [`AdaptiveBatcher`].
#[derive(Debug, Clone, Deserialize)]
pub struct BatchControllerConfig {
    /// Smallest batch size the controller will shrink to. Also the
    /// starting size. Default: 8.
    #[serde(default = "default_min_batch_size")]
    pub min_batch_size: usize,
    /// Largest batch size the controller will grow to. Default: 64.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    /// Additive growth applied after a successful call. Default: 4.
    #[serde(default = "default_growth_step")]
    pub growth_step: usize,
    /// Memory budget as a percentage of total system memory. Default: 70.
    #[serde(default = "default_max_memory_percent")]
    pub max_memory_percent: f64,
    /// Disable to pin the batch size at `min_batch_size`. Default: true.
    #[serde(default = "default_adaptive")]
    pub adaptive: bool,
    /// Sub-batches between forced memory reclaims. Default: 10.
    #[serde(default = "default_reclaim_interval")]
    pub reclaim_interval: usize,
}

impl Default for BatchControllerConfig {
    fn default() -> Self {
        Self {
            min_batch_size: default_min_batch_size(),
            max_batch_size: default_max_batch_size(),
            growth_step: default_growth_step(),
            max_memory_percent: default_max_memory_percent(),
            adaptive: default_adaptive(),
            reclaim_interval: default_reclaim_interval(),
        }
    }
}

impl BatchControllerConfig {
    fn validate(&self) -> Result<()> {
        if self.min_batch_size == 0 {
            return Err(BatchError::Config(
                "min_batch_size must be at least 1".to_string(),
            ));
        }
        if self.max_batch_size < self.min_batch_size {
            return Err(BatchError::Config(format!(
                "max_batch_size {} is below min_batch_size {}",
                self.max_batch_size, self.min_batch_size
            )));
        }
        if self.growth_step == 0 {
            return Err(BatchError::Config(
                "growth_step must be at least 1".to_string(),
            ));
        }
        if self.reclaim_interval == 0 {
            return Err(BatchError::Config(
                "reclaim_interval must be at least 1".to_string(),
            ));
        }
        if self.max_memory_percent <= 0.0 || self.max_memory_percent > 100.0 {
            return Err(BatchError::Config(format!(
                "max_memory_percent {} is outside (0, 100]",
                self.max_memory_percent
            )));
        }
        Ok(())
    }
}

/// Grow/shrink state machine for the live batch size.
///
/// `current` stays within `[min, max]` and changes only through
/// [`BatchSizing::grow`] and [`BatchSizing::shrink`].
#[derive(Debug, Clone)]
pub struct BatchSizing {
    current: usize,
    min: usize,
    max: usize,
    step: usize,
}

impl BatchSizing {
    /// Start at `min`, the conservative end of the lattice.
    pub fn new(min: usize, max: usize, step: usize) -> Self {
        let min = min.max(1);
        Self {
            current: min,
            min,
            max: max.max(min),
            step: step.max(1),
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> usize {
        self.max
    }

    /// Additive increase after a successful call, clamped to `max`.
    /// Returns whether the size actually increased.
    pub fn grow(&mut self) -> bool {
        let previous = self.current;
        self.current = (self.current + self.step).min(self.max);
        self.current > previous
    }

    /// Halve after failure or pressure, clamped to `min`.
    /// Returns whether the size actually decreased.
    pub fn shrink(&mut self) -> bool {
        let previous = self.current;
        self.current = (self.current / 2).max(self.min);
        self.current < previous
    }
}

/// Memory-aware batching wrapper around an [`Embedder`].
///
/// One controller per vectorization backend. The live batch size persists
/// across calls on the instance; methods take `&self`, with the sizing
/// state and memory probe mutex-guarded so threaded callers cannot corrupt
/// them. Embedding itself is strictly sequential: the memory budget is a
/// whole-process resource, so sub-batches are never run in parallel.
pub struct AdaptiveBatcher<E: Embedder> {
    embedder: E,
    sizing: Mutex<BatchSizing>,
    monitor: Mutex<MemoryMonitor>,
    telemetry: BatchTelemetry,
    config: BatchControllerConfig,
}

impl<E: Embedder> AdaptiveBatcher<E> {
    pub fn new(embedder: E, config: BatchControllerConfig) -> Result<Self> {
        config.validate()?;
        let monitor = MemoryMonitor::new(config.max_memory_percent);
        Ok(Self::assemble(embedder, config, monitor))
    }

    /// Construct with an explicit memory monitor, pinning the budget
    /// instead of deriving it from system memory.
    pub fn with_monitor(
        embedder: E,
        config: BatchControllerConfig,
        monitor: MemoryMonitor,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::assemble(embedder, config, monitor))
    }

    fn assemble(embedder: E, config: BatchControllerConfig, monitor: MemoryMonitor) -> Self {
        let sizing = BatchSizing::new(
            config.min_batch_size,
            config.max_batch_size,
            config.growth_step,
        );
        Self {
            embedder,
            sizing: Mutex::new(sizing),
            monitor: Mutex::new(monitor),
            telemetry: BatchTelemetry::default(),
            config,
        }
    }

    /// Live batch size; changes as calls succeed or fail.
    pub fn current_batch_size(&self) -> usize {
        self.sizing.lock().current()
    }

    /// Vector dimension of the wrapped embedder.
    pub fn dimension(&self) -> usize {
        self.embedder.dimension()
    }

    pub fn telemetry(&self) -> &BatchTelemetry {
        &self.telemetry
    }

    /// Vectorize `texts`, splitting and retrying as memory pressure and
    /// failures dictate.
    ///
    /// Output vectors are in input order, one per text. The primitive's
    /// error propagates only once shrinking can no longer produce a
    /// smaller call.
    pub fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let stride = self.sizing.lock().current();
        let mut chunked = texts.len() > stride;
        let mut queue: VecDeque<&[String]> = VecDeque::new();
        if chunked {
            info!(
                total = texts.len(),
                batch_size = stride,
                "splitting oversized input"
            );
            queue.extend(texts.chunks(stride));
        } else {
            queue.push_back(texts);
        }

        let mut vectors = Vec::with_capacity(texts.len());
        let mut shrunk = false;
        let mut completed = 0usize;

        while let Some(segment) = queue.pop_front() {
            let size = self.sizing.lock().current();
            if segment.len() > size {
                // size shrank since the segment was queued; re-split in
                // order, and from here on the run is a chunked one
                chunked = true;
                for part in segment.chunks(size).rev() {
                    queue.push_front(part);
                }
                continue;
            }

            if !self.precall_check(chunked) {
                // mid-run safety valve: still unsafe after a reclaim, take
                // this segment again at a smaller size
                if self.shrink() {
                    shrunk = true;
                    queue.push_front(segment);
                    continue;
                }
            }

            match self.run_segment(segment) {
                Ok(batch) => {
                    vectors.extend(batch);
                    completed += 1;
                    if chunked && completed % self.config.reclaim_interval == 0 {
                        debug!(completed, "periodic memory reclaim");
                        self.embedder.trim_memory();
                    }
                    if !shrunk {
                        self.grow();
                    }
                }
                Err(err) => {
                    let decreased = self.shrink();
                    if decreased {
                        shrunk = true;
                    }
                    if decreased && self.sizing.lock().current() < segment.len() {
                        warn!(
                            error = %err,
                            segment = segment.len(),
                            "batch failed, retrying at reduced size"
                        );
                        queue.push_front(segment);
                        continue;
                    }
                    return Err(err);
                }
            }
        }

        Ok(vectors)
    }

    /// Vectorize chunks and pair each id with its vector, in input order.
    pub fn embed_chunks(&self, chunks: &[Chunk]) -> Result<Vec<ChunkVector>> {
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = self.embed(&texts)?;
        Ok(chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| ChunkVector {
                chunk_id: chunk.id.clone(),
                vector,
            })
            .collect())
    }

    /// Advisory memory check before a call. Returns false when the chunked
    /// safety valve should engage (still unsafe after a reclaim attempt).
    fn precall_check(&self, chunked: bool) -> bool {
        let reading = self.monitor.lock().reading();
        if reading.is_safe() {
            return true;
        }
        warn!(
            resident_bytes = reading.resident_bytes,
            budget_bytes = reading.budget_bytes,
            "memory pressure before batch, reclaiming"
        );
        self.embedder.trim_memory();
        let after = self.monitor.lock().reading();
        after.is_safe() || !chunked
    }

    fn run_segment(&self, segment: &[String]) -> Result<Vec<Vec<f32>>> {
        debug!(texts = segment.len(), "embedding batch");
        match self.embedder.embed(segment) {
            Ok(batch) => {
                if batch.len() != segment.len() {
                    self.telemetry.record_failure();
                    return Err(BatchError::BatchOutputMismatch {
                        expected: segment.len(),
                        actual: batch.len(),
                    });
                }
                self.telemetry.record_batch(segment.len());
                Ok(batch)
            }
            Err(err) => {
                self.telemetry.record_failure();
                Err(err)
            }
        }
    }

    fn grow(&self) {
        if !self.config.adaptive {
            return;
        }
        let mut sizing = self.sizing.lock();
        if sizing.grow() {
            self.telemetry.record_grow();
            debug!(batch_size = sizing.current(), "batch size increased");
        }
    }

    fn shrink(&self) -> bool {
        if !self.config.adaptive {
            return false;
        }
        let mut sizing = self.sizing.lock();
        let decreased = sizing.shrink();
        if decreased {
            self.telemetry.record_shrink();
            warn!(batch_size = sizing.current(), "batch size reduced");
        }
        decreased
    }
}
