//! The segmented queue engine (spec.md §4.3): `Push` and the internal pop
//! used by both the destructive `Pop` operation and the lock-taking half of
//! `PopWithAck`.
//!
//! Grounded on `frys-eventbus::queues`'s `SegmentedQueue`/`PriorityQueue` for
//! the segment-allocation shape (full segment -> allocate next, drained
//! segment -> delete and advance) — reimplemented without that module's
//! lock-free atomics, since a virtual actor instance is invoked under
//! single-threaded semantics (spec.md §5) and the atomic machinery has no job
//! to do here.

use crate::metadata::{Metadata, Priority, QueueMeta};
use crate::offload::load_scan;
use crate::segment::Segment;
use crate::store::{hot_segment_key, HotStore, StateStore};
use crate::QueueError;
use crate::QueueMetrics;

/// Append `item` to the tail of `priority`'s queue, allocating a fresh
/// segment when the current tail is full (spec.md §4.3, Push steps 1-6).
/// Invokes the offload scan after committing; offload failures are
/// swallowed internally and never surface here.
pub async fn push<H: StateStore, C: StateStore>(
    metadata: &mut Metadata,
    hot: &HotStore<H>,
    cold: &C,
    actor_id: &str,
    priority: Priority,
    item: Vec<u8>,
    metrics: &QueueMetrics,
) -> Result<(), QueueError> {
    let segment_size = metadata.config.segment_size;
    let queue_meta = metadata
        .queues
        .entry(priority)
        .or_insert_with(QueueMeta::fresh);

    let tail_key = hot_segment_key(priority, queue_meta.tail_segment);
    let mut segment = Segment::decode_or_empty(hot.get(&tail_key).await?)?;

    if segment.is_full(segment_size) {
        queue_meta.tail_segment += 1;
        segment = Segment::new();
    }
    segment.items.push(item);
    queue_meta.count += 1;
    let tail_segment = queue_meta.tail_segment;

    let key = hot_segment_key(priority, tail_segment);
    hot.put(key, segment.encode()?).await;
    metadata.stage(hot).await?;
    hot.commit().await?;
    metrics.record_push();

    crate::offload::offload_scan(metadata, priority, hot, cold, actor_id, metrics).await;
    Ok(())
}

/// Remove and return the item at the front of the highest-priority
/// non-empty queue, tagged with its originating priority (spec.md §4.3, Pop
/// steps 1-6). Shared by the destructive `Pop` operation and the pop half of
/// `PopWithAck` — callers that need lock semantics wrap the result
/// themselves; this function only ever removes the item from its segment.
pub async fn pop_internal<H: StateStore, C: StateStore>(
    metadata: &mut Metadata,
    hot: &HotStore<H>,
    cold: &C,
    actor_id: &str,
    metrics: &QueueMetrics,
) -> Result<Option<(Vec<u8>, Priority)>, QueueError> {
    let priorities: Vec<Priority> = metadata.queues.keys().copied().collect();

    for priority in priorities {
        load_scan(metadata, priority, hot, cold, actor_id, metrics).await?;

        let queue_meta = match metadata.queues.get(&priority) {
            Some(qm) => *qm,
            None => continue,
        };
        if queue_meta.count == 0 {
            continue;
        }

        let head_key = hot_segment_key(priority, queue_meta.head_segment);
        let segment = Segment::decode_or_empty(hot.get(&head_key).await?)?;

        if segment.is_empty() {
            log::warn!(
                "pop: priority {priority} reports count {} but head segment {} is empty; healing by dropping the priority record",
                queue_meta.count, queue_meta.head_segment
            );
            metadata.queues.remove(&priority);
            metrics.record_desync_healed();
            metadata.stage(hot).await?;
            hot.commit().await?;
            continue;
        }

        let mut segment = segment;
        let item = segment.items.remove(0);
        let queue_meta = metadata.queues.get_mut(&priority).expect("checked above");
        queue_meta.count -= 1;

        if segment.is_empty() {
            if queue_meta.head_segment < queue_meta.tail_segment {
                queue_meta.head_segment += 1;
                hot.delete(head_key).await;
            } else {
                hot.delete(head_key).await;
                metadata.queues.remove(&priority);
            }
        } else {
            hot.put(head_key, segment.encode()?).await;
        }

        metadata.stage(hot).await?;
        hot.commit().await?;
        metrics.record_pop();
        return Ok(Some((item, priority)));
    }

    metrics.record_pop_empty();
    Ok(None)
}
