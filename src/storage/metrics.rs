use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Trait for tracking relationship id cache activity.
///
/// Implementations collect statistics about load rounds, array upgrades,
/// shrinking and iterator rebinding, for monitoring and cache sizing.
pub trait RelIdMetrics: Send + Sync {
    /// Records one load round.
    ///
    /// # Parameters
    /// * `types` - Number of relationship types reconciled in the round.
    /// * `ids_added` - Number of ids the source delivered.
    /// * `ids_excluded` - Number of stale ids the source reported.
    fn load_round(&self, types: usize, ids_added: usize, ids_excluded: usize);

    /// Records an array switching to the loop-capable variant.
    fn array_upgraded(&self);

    /// Records an array being trimmed, with the bytes given back.
    fn array_shrunk(&self, reclaimed_bytes: usize);

    /// Records a live iterator being rebound to a replacement array.
    fn iterator_rebound(&self);
}

/// A no-op implementation of [`RelIdMetrics`] that discards all recorded metrics.
#[derive(Default)]
pub struct NoopMetrics;

impl RelIdMetrics for NoopMetrics {
    fn load_round(&self, _types: usize, _ids_added: usize, _ids_excluded: usize) {}
    fn array_upgraded(&self) {}
    fn array_shrunk(&self, _reclaimed_bytes: usize) {}
    fn iterator_rebound(&self) {}
}

/// A thread-safe counter-based implementation of [`RelIdMetrics`].
#[derive(Default)]
pub struct CounterMetrics {
    /// Number of load rounds performed.
    pub load_rounds: AtomicU64,

    /// Number of relationship types reconciled across all rounds.
    pub types_reconciled: AtomicU64,

    /// Number of ids delivered by the source.
    pub ids_loaded: AtomicU64,

    /// Number of stale ids reported by the source.
    pub ids_excluded: AtomicU64,

    /// Number of arrays upgraded to hold loops.
    pub upgrades: AtomicU64,

    /// Number of arrays trimmed.
    pub shrinks: AtomicU64,

    /// Bytes given back by trimming.
    pub bytes_reclaimed: AtomicU64,

    /// Number of iterator rebinds.
    pub rebinds: AtomicU64,
}

impl RelIdMetrics for CounterMetrics {
    fn load_round(&self, types: usize, ids_added: usize, ids_excluded: usize) {
        self.load_rounds.fetch_add(1, Ordering::Relaxed);
        self.types_reconciled
            .fetch_add(types as u64, Ordering::Relaxed);
        self.ids_loaded.fetch_add(ids_added as u64, Ordering::Relaxed);
        self.ids_excluded
            .fetch_add(ids_excluded as u64, Ordering::Relaxed);
    }

    fn array_upgraded(&self) {
        self.upgrades.fetch_add(1, Ordering::Relaxed);
    }

    fn array_shrunk(&self, reclaimed_bytes: usize) {
        self.shrinks.fetch_add(1, Ordering::Relaxed);
        self.bytes_reclaimed
            .fetch_add(reclaimed_bytes as u64, Ordering::Relaxed);
    }

    fn iterator_rebound(&self) {
        self.rebinds.fetch_add(1, Ordering::Relaxed);
    }
}

/// Returns the default metrics implementation wrapped in an [`Arc`].
///
/// The default implementation is [`NoopMetrics`].
pub fn default_metrics() -> Arc<dyn RelIdMetrics> {
    Arc::new(NoopMetrics)
}
