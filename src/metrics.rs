//! Metrics and monitoring for the queue actor.
//!
//! Shape grounded directly on `frys-eventbus::metrics::EventBusMetrics` —
//! atomic counters plus a point-in-time snapshot with a derived health
//! verdict — repurposed from event delivery to queue operations.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters for one queue actor instance.
#[derive(Debug, Default)]
pub struct QueueMetrics {
    /// Successful pushes.
    pub pushes: AtomicU64,
    /// Destructive pops that returned an item.
    pub pops: AtomicU64,
    /// Pops (destructive or via `PopWithAck`) that found nothing to return.
    pub pops_empty: AtomicU64,
    /// Locks created by `PopWithAck`.
    pub locks_created: AtomicU64,
    /// Locks recovered because they were observed expired.
    pub locks_expired_recovered: AtomicU64,
    /// Successful `Acknowledge` calls.
    pub acknowledged: AtomicU64,
    /// Offload attempts (segment moved hot -> cold).
    pub offloads_attempted: AtomicU64,
    /// Offload attempts that failed and were swallowed.
    pub offloads_failed: AtomicU64,
    /// Load-scan attempts (segment promoted cold -> hot).
    pub loads_attempted: AtomicU64,
    /// Load-scan attempts that failed (surfaced to the caller).
    pub loads_failed: AtomicU64,
    /// Count/segment desyncs self-healed during `Pop`.
    pub desyncs_healed: AtomicU64,
}

impl QueueMetrics {
    /// A fresh, zeroed counter set.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_push(&self) {
        self.pushes.fetch_add(1, Ordering::AcqRel);
    }

    pub fn record_pop(&self) {
        self.pops.fetch_add(1, Ordering::AcqRel);
    }

    pub fn record_pop_empty(&self) {
        self.pops_empty.fetch_add(1, Ordering::AcqRel);
    }

    pub fn record_lock_created(&self) {
        self.locks_created.fetch_add(1, Ordering::AcqRel);
    }

    pub fn record_lock_expired_recovered(&self) {
        self.locks_expired_recovered.fetch_add(1, Ordering::AcqRel);
    }

    pub fn record_acknowledged(&self) {
        self.acknowledged.fetch_add(1, Ordering::AcqRel);
    }

    pub fn record_offload_attempted(&self) {
        self.offloads_attempted.fetch_add(1, Ordering::AcqRel);
    }

    pub fn record_offload_failed(&self) {
        self.offloads_failed.fetch_add(1, Ordering::AcqRel);
    }

    pub fn record_load_attempted(&self) {
        self.loads_attempted.fetch_add(1, Ordering::AcqRel);
    }

    pub fn record_load_failed(&self) {
        self.loads_failed.fetch_add(1, Ordering::AcqRel);
    }

    pub fn record_desync_healed(&self) {
        self.desyncs_healed.fetch_add(1, Ordering::AcqRel);
    }

    /// A point-in-time snapshot for monitoring/health checks.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            pushes: self.pushes.load(Ordering::Acquire),
            pops: self.pops.load(Ordering::Acquire),
            pops_empty: self.pops_empty.load(Ordering::Acquire),
            locks_created: self.locks_created.load(Ordering::Acquire),
            locks_expired_recovered: self.locks_expired_recovered.load(Ordering::Acquire),
            acknowledged: self.acknowledged.load(Ordering::Acquire),
            offloads_attempted: self.offloads_attempted.load(Ordering::Acquire),
            offloads_failed: self.offloads_failed.load(Ordering::Acquire),
            loads_attempted: self.loads_attempted.load(Ordering::Acquire),
            loads_failed: self.loads_failed.load(Ordering::Acquire),
            desyncs_healed: self.desyncs_healed.load(Ordering::Acquire),
        }
    }
}

/// Snapshot of `QueueMetrics` at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub pushes: u64,
    pub pops: u64,
    pub pops_empty: u64,
    pub locks_created: u64,
    pub locks_expired_recovered: u64,
    pub acknowledged: u64,
    pub offloads_attempted: u64,
    pub offloads_failed: u64,
    pub loads_attempted: u64,
    pub loads_failed: u64,
    pub desyncs_healed: u64,
}

impl MetricsSnapshot {
    /// A load-scan failure is data-threatening (spec.md §4.4); a queue that
    /// has ever hit one is flagged unhealthy until an operator investigates.
    /// Offload failures merely degrade to hot-only mode and are not fatal.
    pub fn is_healthy(&self) -> bool {
        self.loads_failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording() {
        let metrics = QueueMetrics::new();
        metrics.record_push();
        metrics.record_pop();
        metrics.record_offload_failed();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.pushes, 1);
        assert_eq!(snapshot.pops, 1);
        assert_eq!(snapshot.offloads_failed, 1);
        // Offload failures alone don't make the queue unhealthy.
        assert!(snapshot.is_healthy());
    }

    #[test]
    fn test_load_failure_marks_unhealthy() {
        let metrics = QueueMetrics::new();
        metrics.record_load_failed();
        assert!(!metrics.snapshot().is_healthy());
    }
}
