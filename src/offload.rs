//! Offload manager (spec.md §4.4): moves full middle segments to cold
//! storage after a push, and promotes them back to hot storage just ahead
//! of consumption, keeping the hot-tier footprint bounded to roughly
//! `(buffer_segments + 2) * segment_size` items per priority.
//!
//! Grounded on `k-jingyang-lsm-tree`'s flush/compaction modules for the
//! "move a full unit between tiers, log the attempt, keep going" shape —
//! the closest real storage-engine analogue in the example pack to this
//! exact hot/cold migration.

use crate::metadata::{Metadata, Priority, SegmentId};
use crate::segment::Segment;
use crate::store::{cold_segment_key, hot_segment_key, HotStore, StateStore, StoreError};
use crate::QueueError;
use crate::QueueMetrics;

/// Scan for offload-eligible segments of `priority` and migrate them to cold
/// storage, ascending. Best-effort: any failure is logged and swallowed —
/// the segment in question (and everything after it) simply stays hot.
/// Called after a push commits (spec.md §4.3 step 6).
pub async fn offload_scan<H: StateStore, C: StateStore>(
    metadata: &mut Metadata,
    priority: Priority,
    hot: &HotStore<H>,
    cold: &C,
    actor_id: &str,
    metrics: &QueueMetrics,
) {
    let segment_size = metadata.config.segment_size;
    let buffer_segments = metadata.config.buffer_segments as u64;

    loop {
        let queue_meta = match metadata.queues.get(&priority) {
            Some(qm) => *qm,
            None => return,
        };
        let lower_bound = queue_meta.head_segment + buffer_segments;
        let candidate: SegmentId = match queue_meta.tail_offloaded_segment {
            Some(t) => t + 1,
            None => lower_bound + 1,
        };
        if candidate <= lower_bound || candidate >= queue_meta.tail_segment {
            return;
        }

        let key = hot_segment_key(priority, candidate);
        let bytes = match hot.get(&key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return, // nothing hot at this slot yet
            Err(e) => {
                log::warn!("offload scan: failed to read {key}: {e}");
                metrics.record_offload_failed();
                return;
            }
        };
        let segment = match Segment::decode_or_empty(Some(bytes)) {
            Ok(segment) => segment,
            Err(e) => {
                log::warn!("offload scan: corrupt segment {key}: {e}");
                metrics.record_offload_failed();
                return;
            }
        };
        if segment.len() != segment_size {
            // Tail-adjacent segment not yet full; nothing further is eligible.
            return;
        }

        metrics.record_offload_attempted();
        let cold_key = cold_segment_key(priority, candidate, actor_id);
        let encoded = match segment.encode() {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("offload scan: failed to encode {key}: {e}");
                metrics.record_offload_failed();
                return;
            }
        };
        if let Err(e) = cold.put(&cold_key, encoded).await {
            log::warn!("offload scan: cold put failed for {cold_key}: {e}");
            metrics.record_offload_failed();
            return; // degrade to hot-only mode for this and subsequent segments
        }

        let queue_meta = metadata.queues.get_mut(&priority).expect("checked above");
        if queue_meta.head_offloaded_segment.is_none() {
            queue_meta.head_offloaded_segment = Some(candidate);
        }
        queue_meta.tail_offloaded_segment = Some(candidate);
        hot.delete(key.clone()).await;

        if let Err(e) = metadata.stage(hot).await {
            log::warn!("offload scan: failed to stage metadata: {e}");
            metrics.record_offload_failed();
            return;
        }
        if let Err(e) = hot.commit().await {
            log::warn!("offload scan: failed to commit after offloading {key}: {e}");
            metrics.record_offload_failed();
            return;
        }
    }
}

/// Promote any offloaded segment within `buffer_segments` of the head back
/// to hot storage. Called before each consuming access (spec.md §4.3 step
/// 4a). Unlike offload, a failure here is potentially data-threatening and
/// is surfaced to the caller rather than swallowed.
pub async fn load_scan<H: StateStore, C: StateStore>(
    metadata: &mut Metadata,
    priority: Priority,
    hot: &HotStore<H>,
    cold: &C,
    actor_id: &str,
    metrics: &QueueMetrics,
) -> Result<(), QueueError> {
    let buffer_segments = metadata.config.buffer_segments as u64;

    loop {
        let queue_meta = match metadata.queues.get(&priority) {
            Some(qm) => *qm,
            None => return Ok(()),
        };
        let head_offloaded = match queue_meta.head_offloaded_segment {
            Some(n) => n,
            None => return Ok(()),
        };
        if head_offloaded > queue_meta.head_segment + buffer_segments {
            return Ok(());
        }

        metrics.record_load_attempted();
        let cold_key = cold_segment_key(priority, head_offloaded, actor_id);
        let bytes = match cold.get(&cold_key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                metrics.record_load_failed();
                return Err(QueueError::ColdStoreUnavailable {
                    key: cold_key,
                    reason: "segment missing from cold tier".to_string(),
                });
            }
            Err(e) => {
                metrics.record_load_failed();
                return Err(QueueError::ColdStoreUnavailable {
                    key: cold_key,
                    reason: e.to_string(),
                });
            }
        };

        let hot_key = hot_segment_key(priority, head_offloaded);
        hot.put(hot_key, bytes).await;

        let queue_meta = metadata.queues.get_mut(&priority).expect("checked above");
        let tail_offloaded = queue_meta.tail_offloaded_segment.expect("invariant 6");
        if head_offloaded == tail_offloaded {
            queue_meta.head_offloaded_segment = None;
            queue_meta.tail_offloaded_segment = None;
        } else {
            queue_meta.head_offloaded_segment = Some(head_offloaded + 1);
        }

        metadata.stage(hot).await.map_err(QueueError::from)?;
        hot.commit().await.map_err(QueueError::from)?;

        if let Err(e) = cold.delete(&cold_key).await {
            // The segment is safely promoted hot; a lingering cold copy is
            // harmless (it falls outside the offloaded range from now on,
            // so nothing will ever read it again) and not worth failing the
            // pop over.
            log::warn!("load scan: failed to delete promoted cold key {cold_key}: {e}");
        }
    }
}

/// Convenience wrapper used by tests that want a raw `StoreError` instead of
/// the `QueueError` the engine surfaces.
pub(crate) fn storage_unavailable(key: String, err: StoreError) -> QueueError {
    QueueError::ColdStoreUnavailable {
        key,
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault_store::FaultInjectingStore;
    use crate::memory_store::MemoryStore;
    use crate::metadata::QueueMeta;

    async fn make_full_segment(hot: &HotStore<MemoryStore>, priority: Priority, n: SegmentId, size: usize) {
        let mut segment = Segment::new();
        for i in 0..size {
            segment.items.push(vec![i as u8]);
        }
        hot.put(hot_segment_key(priority, n), segment.encode().unwrap())
            .await;
        hot.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_offload_then_load_roundtrip() {
        let hot = HotStore::new(MemoryStore::new());
        let cold = MemoryStore::new();
        let metrics = QueueMetrics::new();
        let mut metadata = Metadata::default();
        metadata.config.segment_size = 4;
        metadata.config.buffer_segments = 1;

        // head=0, tail=3: segments 0,1,2 full, segment 3 is the fresh tail.
        let mut queue_meta = QueueMeta::fresh();
        queue_meta.tail_segment = 3;
        queue_meta.count = 12;
        metadata.queues.insert(0, queue_meta);
        for n in 0..3 {
            make_full_segment(&hot, 0, n, 4).await;
        }

        offload_scan(&mut metadata, 0, &hot, &cold, "actor-a", &metrics).await;

        let qm = metadata.queues[&0];
        // head_segment(0) + buffer_segments(1) = 1 is the lower bound;
        // segment 2 is offload-eligible (1 < 2 < tail 3), segment 1 is not.
        assert_eq!(qm.offloaded_range(), Some((2, 2)));
        assert_eq!(hot.get(&hot_segment_key(0, 2)).await.unwrap(), None);
        assert!(cold.get(&cold_segment_key(0, 2, "actor-a")).await.unwrap().is_some());

        // Advance head past the buffer so segment 2 becomes load-eligible.
        metadata.queues.get_mut(&0).unwrap().head_segment = 1;
        load_scan(&mut metadata, 0, &hot, &cold, "actor-a", &metrics)
            .await
            .unwrap();

        let qm = metadata.queues[&0];
        assert_eq!(qm.offloaded_range(), None);
        assert!(hot.get(&hot_segment_key(0, 2)).await.unwrap().is_some());
        assert_eq!(cold.get(&cold_segment_key(0, 2, "actor-a")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_offload_failure_is_swallowed() {
        let hot = HotStore::new(MemoryStore::new());
        let cold = FaultInjectingStore::new(MemoryStore::new());
        cold.fail_permanently();
        let metrics = QueueMetrics::new();
        let mut metadata = Metadata::default();
        metadata.config.segment_size = 4;
        metadata.config.buffer_segments = 1;

        let mut queue_meta = QueueMeta::fresh();
        queue_meta.tail_segment = 3;
        queue_meta.count = 12;
        metadata.queues.insert(0, queue_meta);
        for n in 0..3 {
            make_full_segment(&hot, 0, n, 4).await;
        }

        offload_scan(&mut metadata, 0, &hot, &cold, "actor-a", &metrics).await;

        // Nothing moved; segment stays hot, no panic, failure recorded.
        assert_eq!(metadata.queues[&0].offloaded_range(), None);
        assert!(hot.get(&hot_segment_key(0, 2)).await.unwrap().is_some());
        assert_eq!(metrics.snapshot().offloads_failed, 1);
    }

    #[tokio::test]
    async fn test_load_failure_is_surfaced() {
        let hot = HotStore::new(MemoryStore::new());
        let cold = FaultInjectingStore::new(MemoryStore::new());
        let metrics = QueueMetrics::new();
        let mut metadata = Metadata::default();
        metadata.config.segment_size = 4;
        metadata.config.buffer_segments = 1;

        let mut queue_meta = QueueMeta::fresh();
        queue_meta.head_segment = 1;
        queue_meta.tail_segment = 3;
        queue_meta.head_offloaded_segment = Some(2);
        queue_meta.tail_offloaded_segment = Some(2);
        queue_meta.count = 4;
        metadata.queues.insert(0, queue_meta);

        cold.fail_permanently();
        let result = load_scan(&mut metadata, 0, &hot, &cold, "actor-a", &metrics).await;
        assert!(matches!(result, Err(QueueError::ColdStoreUnavailable { .. })));
        assert_eq!(metrics.snapshot().loads_failed, 1);
    }
}
