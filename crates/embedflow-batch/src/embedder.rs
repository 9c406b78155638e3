//! Seam between the batch controller and the vectorization primitive

use crate::Result;

/// A vectorization primitive turning texts into fixed-dimension vectors.
///
/// Implementations may fail on resource exhaustion; the controller reacts
/// by shrinking its batch size and retrying. `embed` must return exactly
/// one vector per input text, in input order.
pub trait Embedder: Send + Sync {
    /// Vectorize a batch of texts.
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Vector dimension produced by this model instance.
    fn dimension(&self) -> usize;

    /// Advisory memory reclaim hook.
    ///
    /// Called when the controller observes memory pressure, and
    /// periodically between sub-batches to bound cumulative fragmentation.
    /// Implementations drop caches or trim allocator arenas; the default
    /// does nothing.
    fn trim_memory(&self) {}
}
