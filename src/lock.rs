//! Delivery lock and acknowledgement controller (spec.md §4.5): issuing a
//! TTL-bound lock for `PopWithAck`, and recovering one that has expired
//! unacknowledged by priority-preserving re-enqueue.
//!
//! Lock id generation is grounded on the `rand = "0.8"` dependency shared by
//! `frys-gateway`, `frys-plugin-storage`, and `frys-agent-system` elsewhere
//! in the pack — an 11-character token, not a UUID, per spec.md §4.5.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;

use crate::metadata::{ActiveLock, LockedItem, Metadata, Priority, QueueMeta};
use crate::segment::Segment;
use crate::store::{hot_segment_key, HotStore, StateStore};
use crate::QueueError;
use crate::QueueMetrics;

const LOCK_ID_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Generate an 11-character URL-safe random lock id.
pub fn generate_lock_id() -> String {
    let mut rng = rand::thread_rng();
    (0..crate::config::LOCK_ID_LENGTH)
        .map(|_| LOCK_ID_ALPHABET[rng.gen_range(0..LOCK_ID_ALPHABET.len())] as char)
        .collect()
}

/// Current unix time, seconds. The engine only ever deals in whole seconds
/// (spec.md §4.5's TTL bounds are themselves whole seconds).
pub fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Build a fresh lock over a single popped item.
pub fn create_lock(item: Vec<u8>, priority: Priority, ttl_seconds: u64, now: u64) -> ActiveLock {
    ActiveLock {
        lock_id: generate_lock_id(),
        created_at: now,
        expires_at: now + ttl_seconds,
        items: vec![LockedItem { item, priority }],
    }
}

/// Re-enqueue every item held by an expired lock, grouped by originating
/// priority and prepended to each priority's head segment so the recovered
/// items are the next ones popped, ahead of anything pushed since the lock
/// was taken (spec.md §4.5). No-op if there is no active lock.
///
/// A destroyed priority record (one that was fully drained and removed
/// while its items were locked) is recreated fresh — head/tail segment 0 —
/// before the recovered items are prepended to it.
pub async fn recover_expired_lock<H: StateStore>(
    metadata: &mut Metadata,
    hot: &HotStore<H>,
    metrics: &QueueMetrics,
) -> Result<(), QueueError> {
    let lock = match metadata.active_lock.take() {
        Some(lock) => lock,
        None => return Ok(()),
    };

    let mut by_priority: BTreeMap<Priority, Vec<Vec<u8>>> = BTreeMap::new();
    for locked in lock.items {
        by_priority.entry(locked.priority).or_default().push(locked.item);
    }

    for (priority, items) in by_priority {
        let recovered_count = items.len() as u64;
        let queue_meta = metadata
            .queues
            .entry(priority)
            .or_insert_with(QueueMeta::fresh);
        let head_key = hot_segment_key(priority, queue_meta.head_segment);

        let mut segment = Segment::decode_or_empty(hot.get(&head_key).await?)?;
        let mut rebuilt = items;
        rebuilt.append(&mut segment.items);
        segment.items = rebuilt;

        let queue_meta = metadata.queues.get_mut(&priority).expect("just inserted");
        queue_meta.count += recovered_count;
        hot.put(head_key, segment.encode()?).await;
    }

    metadata.stage(hot).await?;
    hot.commit().await?;
    metrics.record_lock_expired_recovered();
    Ok(())
}
