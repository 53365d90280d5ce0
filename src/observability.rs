//! Ledger counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics handle shared between the ledger and its host
#[derive(Debug, Default)]
pub struct Metrics {
    messages_recorded: AtomicU64,
    boundaries_closed: AtomicU64,
    publish_failures: AtomicU64,
    mirror_failures: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message_recorded(&self) {
        self.messages_recorded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn boundary_closed(&self) {
        self.boundaries_closed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "boundaries_closed", "Metric incremented");
    }

    pub fn publish_failed(&self) {
        self.publish_failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "publish_failures", "Metric incremented");
    }

    pub fn mirror_failed(&self) {
        self.mirror_failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "mirror_failures", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_recorded: self.messages_recorded.load(Ordering::Relaxed),
            boundaries_closed: self.boundaries_closed.load(Ordering::Relaxed),
            publish_failures: self.publish_failures.load(Ordering::Relaxed),
            mirror_failures: self.mirror_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub messages_recorded: u64,
    pub boundaries_closed: u64,
    pub publish_failures: u64,
    pub mirror_failures: u64,
}
