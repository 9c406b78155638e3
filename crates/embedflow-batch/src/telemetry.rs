//! Process-local counters for batch controller activity

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters tracking batch controller activity.
///
/// Process-local; exporting them to a metrics backend is the caller's
/// concern.
#[derive(Debug, Default)]
pub struct BatchTelemetry {
    batches: AtomicU64,
    texts: AtomicU64,
    failures: AtomicU64,
    grows: AtomicU64,
    shrinks: AtomicU64,
}

impl BatchTelemetry {
    pub(crate) fn record_batch(&self, texts: usize) {
        self.batches.fetch_add(1, Ordering::Relaxed);
        self.texts.fetch_add(texts as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_grow(&self) {
        self.grows.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_shrink(&self) {
        self.shrinks.fetch_add(1, Ordering::Relaxed);
    }

    /// Consistent-enough snapshot of the counters.
    pub fn snapshot(&self) -> BatchTelemetrySnapshot {
        BatchTelemetrySnapshot {
            batches: self.batches.load(Ordering::Relaxed),
            texts: self.texts.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            grows: self.grows.load(Ordering::Relaxed),
            shrinks: self.shrinks.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of [`BatchTelemetry`] counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchTelemetrySnapshot {
    /// Batches successfully embedded.
    pub batches: u64,
    /// Texts successfully embedded.
    pub texts: u64,
    /// Failed embedding calls.
    pub failures: u64,
    /// Batch size increases.
    pub grows: u64,
    /// Batch size reductions.
    pub shrinks: u64,
}
