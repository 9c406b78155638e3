//! Memory-aware adaptive batching for embedding workloads
//!
//! Wraps a vectorization primitive (the [`Embedder`] trait) behind a
//! controller that shrinks its batch size under memory pressure or failure
//! and grows it back on sustained success. One controller per configured
//! backend; the live batch size is shared across all calls on the instance.

pub mod controller;
pub mod embedder;
pub mod error;
pub mod memory;
pub mod telemetry;

pub use controller::{AdaptiveBatcher, BatchControllerConfig, BatchSizing};
pub use embedder::Embedder;
pub use error::BatchError;
pub use memory::{MemoryMonitor, MemoryReading};
pub use telemetry::{BatchTelemetry, BatchTelemetrySnapshot};

/// Result type for batch controller operations
pub type Result<T> = std::result::Result<T, BatchError>;
