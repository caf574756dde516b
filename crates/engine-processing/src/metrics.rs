use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Default)]
struct InnerMetrics {
    units_merged: AtomicU64,
    records_merged: AtomicU64,
    empty_units_discarded: AtomicU64,
    idle_polls: AtomicU64,
}

/// Counters of the merge loop. Clones share the same counters.
#[derive(Debug, Clone, Default)]
pub struct MergeMetrics {
    inner: Arc<InnerMetrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeMetricsSnapshot {
    pub units_merged: u64,
    pub records_merged: u64,
    pub empty_units_discarded: u64,
    pub idle_polls: u64,
}

impl MergeMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_units(&self, count: u64) {
        self.inner.units_merged.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_records(&self, count: u64) {
        self.inner.records_merged.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_discarded(&self, count: u64) {
        self.inner
            .empty_units_discarded
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_idle_polls(&self, count: u64) {
        self.inner.idle_polls.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MergeMetricsSnapshot {
        MergeMetricsSnapshot {
            units_merged: self.inner.units_merged.load(Ordering::Relaxed),
            records_merged: self.inner.records_merged.load(Ordering::Relaxed),
            empty_units_discarded: self.inner.empty_units_discarded.load(Ordering::Relaxed),
            idle_polls: self.inner.idle_polls.load(Ordering::Relaxed),
        }
    }
}
