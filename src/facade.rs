//! Operation façade (spec.md §4.6): the single entry point a host adapter
//! calls per invocation. Owns the in-memory `Metadata`, the hot commit
//! barrier, and the cold store collaborator for one activated actor
//! instance, and exposes exactly the four operations spec.md §6 names.
//!
//! Grounded on `frys-eventbus::core::EventBus` as the user-facing type that
//! wraps the bus's internal collaborators behind a handful of public
//! methods — `QueueActor` plays the same role for one queue instance.

use crate::config::{clamp_ttl, validate_queue_config, ActorConfig};
use crate::engine;
use crate::error::QueueError;
use crate::lock::{self, now_unix};
use crate::metadata::Metadata;
use crate::metrics::{MetricsSnapshot, QueueMetrics};
use crate::store::{HotStore, StateStore};

/// Response of a `PopWithAck` call (spec.md §8 boundary behaviors and
/// scenarios 4-6). `locked` is true whenever a lock is held after this call
/// returns, whether newly created here or already outstanding from a prior
/// call; `item`/`lock_id`/`expires_at` are only populated when this call is
/// the one that took the lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopWithAckResult {
    pub locked: bool,
    pub count: usize,
    pub lock_id: Option<String>,
    pub item: Option<Vec<u8>>,
    pub expires_at: Option<u64>,
}

/// Response of a successful `Acknowledge` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcknowledgeResult {
    pub success: bool,
    pub items_acknowledged: u64,
}

/// One activated virtual-actor instance backing a single priority queue.
pub struct QueueActor<H: StateStore, C: StateStore> {
    hot: HotStore<H>,
    cold: C,
    config: ActorConfig,
    metadata: Metadata,
    metrics: QueueMetrics,
}

impl<H: StateStore, C: StateStore> QueueActor<H, C> {
    /// Activate an actor instance: load (or default-initialize) its
    /// metadata document from the hot store (spec.md §4.2, §4.6).
    pub async fn activate(hot_store: H, cold: C, config: ActorConfig) -> Result<Self, QueueError> {
        Self::activate_with_config(hot_store, cold, config, crate::metadata::QueueConfig::default())
            .await
    }

    /// Activate an actor instance, seeding `segment_size`/`buffer_segments`
    /// from `default_config` if this is the instance's very first
    /// activation (no metadata blob exists yet). On every later activation
    /// the persisted config takes over and `default_config` is ignored —
    /// config is read-once per spec.md §9, not dynamically reconfigurable.
    pub async fn activate_with_config(
        hot_store: H,
        cold: C,
        config: ActorConfig,
        default_config: crate::metadata::QueueConfig,
    ) -> Result<Self, QueueError> {
        let hot = HotStore::new(hot_store);
        let metadata = Metadata::load_with_default_config(&hot, default_config).await?;
        validate_queue_config(&metadata.config)
            .map_err(|reason| QueueError::Internal { reason: reason.to_string() })?;
        metadata.stage(&hot).await?;
        hot.commit().await?;
        Ok(Self {
            hot,
            cold,
            config,
            metadata,
            metrics: QueueMetrics::new(),
        })
    }

    /// A point-in-time snapshot of this instance's operation counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Enqueue `item` at `priority` (spec.md §4.3, §6). The engine treats
    /// `item` as an opaque byte blob and does not interpret or constrain its
    /// contents (spec.md §3) — any structural validation belongs to the
    /// external HTTP adapter, not here.
    pub async fn push(&mut self, priority: i64, item: Vec<u8>) -> Result<(), QueueError> {
        if priority < 0 || priority > u32::MAX as i64 {
            return Err(QueueError::InvalidArgument {
                field: "priority",
                reason: "must fit in a non-negative u32",
            });
        }

        engine::push(
            &mut self.metadata,
            &self.hot,
            &self.cold,
            &self.config.actor_id,
            priority as u32,
            item,
            &self.metrics,
        )
        .await
    }

    /// Destructively dequeue the front of the highest-priority non-empty
    /// queue, with no delivery guarantee beyond "removed" (spec.md §4.3,
    /// §6). Returns `None` if every queue is empty, or if a non-expired
    /// lock is outstanding (an expired one is recovered first, then this
    /// call proceeds normally).
    pub async fn pop(&mut self) -> Result<Option<Vec<u8>>, QueueError> {
        if let Some(lock) = self.metadata.active_lock.clone() {
            if lock.is_expired(now_unix()) {
                lock::recover_expired_lock(&mut self.metadata, &self.hot, &self.metrics).await?;
            } else {
                return Ok(None);
            }
        }

        let popped = engine::pop_internal(
            &mut self.metadata,
            &self.hot,
            &self.cold,
            &self.config.actor_id,
            &self.metrics,
        )
        .await?;
        Ok(popped.map(|(item, _)| item))
    }

    /// Dequeue under a TTL-bound delivery lock (spec.md §4.3, §4.5, §6, §8
    /// boundary behaviors). At most one lock may be outstanding per
    /// instance: calling this while a still-live lock exists does not pop
    /// anything and returns `{locked: true, count: 0}` describing the
    /// existing lock, leaving all state untouched (spec.md §8 scenario 6). A
    /// previous lock discovered expired is recovered (its items
    /// re-enqueued) before this call proceeds, per the lazy-expiry contract
    /// — no background timer ever runs.
    pub async fn pop_with_ack(
        &mut self,
        ttl_seconds: Option<u64>,
    ) -> Result<PopWithAckResult, QueueError> {
        if let Some(lock) = self.metadata.active_lock.clone() {
            if lock.is_expired(now_unix()) {
                lock::recover_expired_lock(&mut self.metadata, &self.hot, &self.metrics).await?;
            } else {
                return Ok(PopWithAckResult {
                    locked: true,
                    count: 0,
                    lock_id: None,
                    item: None,
                    expires_at: Some(lock.expires_at),
                });
            }
        }

        let popped = engine::pop_internal(
            &mut self.metadata,
            &self.hot,
            &self.cold,
            &self.config.actor_id,
            &self.metrics,
        )
        .await?;
        let (item, priority) = match popped {
            Some(pair) => pair,
            None => {
                return Ok(PopWithAckResult {
                    locked: false,
                    count: 0,
                    lock_id: None,
                    item: None,
                    expires_at: None,
                })
            }
        };

        let ttl = clamp_ttl(ttl_seconds);
        let lock = lock::create_lock(item.clone(), priority, ttl, now_unix());
        let lock_id = lock.lock_id.clone();
        let expires_at = lock.expires_at;
        self.metadata.active_lock = Some(lock);
        self.metadata.stage(&self.hot).await?;
        self.hot.commit().await?;
        self.metrics.record_lock_created();

        Ok(PopWithAckResult {
            locked: true,
            count: 1,
            lock_id: Some(lock_id),
            item: Some(item),
            expires_at: Some(expires_at),
        })
    }

    /// Acknowledge a previously locked item, releasing the lock (spec.md
    /// §4.3 Acknowledge, §6, §8 scenario 4). `lock_id` must match the
    /// currently active lock exactly; a mismatch leaves the lock untouched
    /// with its `expires_at` unchanged (spec.md §8 boundary behaviors).
    /// Check ordering is fixed per spec.md §7: empty id, then absent lock,
    /// then mismatched id, then expired, then success.
    ///
    /// If the active lock has already expired by the time this is called,
    /// its items are recovered (re-enqueued) as a side effect and
    /// `LockExpired` is returned rather than success — the caller no longer
    /// owns anything to acknowledge.
    pub async fn acknowledge(&mut self, lock_id: &str) -> Result<AcknowledgeResult, QueueError> {
        if lock_id.is_empty() {
            return Err(QueueError::InvalidLockId);
        }

        let lock = match self.metadata.active_lock.clone() {
            Some(lock) => lock,
            None => return Err(QueueError::LockNotFound),
        };
        if lock.lock_id != lock_id {
            return Err(QueueError::InvalidLockId);
        }
        if lock.is_expired(now_unix()) {
            lock::recover_expired_lock(&mut self.metadata, &self.hot, &self.metrics).await?;
            return Err(QueueError::LockExpired);
        }

        let items_acknowledged = lock.items.len() as u64;
        self.metadata.active_lock = None;
        self.metadata.stage(&self.hot).await?;
        self.hot.commit().await?;
        self.metrics.record_acknowledged();
        Ok(AcknowledgeResult {
            success: true,
            items_acknowledged,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::MemoryStore;

    async fn actor() -> QueueActor<MemoryStore, MemoryStore> {
        QueueActor::activate(MemoryStore::new(), MemoryStore::new(), ActorConfig::new("actor-a"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_push_then_pop_roundtrip() {
        let mut actor = actor().await;
        actor.push(0, b"hello".to_vec()).await.unwrap();
        let popped = actor.pop().await.unwrap();
        assert_eq!(popped, Some(b"hello".to_vec()));
        assert_eq!(actor.pop().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_push_rejects_negative_priority() {
        let mut actor = actor().await;
        let err = actor.push(-1, b"x".to_vec()).await.unwrap_err();
        assert!(matches!(err, QueueError::InvalidArgument { field: "priority", .. }));
    }

    #[tokio::test]
    async fn test_push_rejects_priority_above_u32_range() {
        let mut actor = actor().await;
        let err = actor.push(u32::MAX as i64 + 1, b"x".to_vec()).await.unwrap_err();
        assert!(matches!(err, QueueError::InvalidArgument { field: "priority", .. }));
    }

    #[tokio::test]
    async fn test_push_accepts_empty_item() {
        // spec.md §3: the engine treats items as opaque blobs and does not
        // interpret or constrain their contents.
        let mut actor = actor().await;
        actor.push(0, Vec::new()).await.unwrap();
        assert_eq!(actor.pop().await.unwrap(), Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_pop_with_ack_then_acknowledge() {
        let mut actor = actor().await;
        actor.push(0, b"locked".to_vec()).await.unwrap();

        let result = actor.pop_with_ack(Some(60)).await.unwrap();
        assert!(result.locked);
        assert_eq!(result.count, 1);
        assert_eq!(result.item, Some(b"locked".to_vec()));
        let lock_id = result.lock_id.unwrap();

        // A second PopWithAck while the lock is live doesn't pop anything.
        actor.push(0, b"other".to_vec()).await.unwrap();
        let second = actor.pop_with_ack(Some(60)).await.unwrap();
        assert!(second.locked);
        assert_eq!(second.count, 0);
        assert!(second.item.is_none());

        let ack = actor.acknowledge(&lock_id).await.unwrap();
        assert_eq!(ack, AcknowledgeResult { success: true, items_acknowledged: 1 });

        // Acknowledging twice reports there's nothing left to acknowledge.
        let err = actor.acknowledge(&lock_id).await.unwrap_err();
        assert!(matches!(err, QueueError::LockNotFound));
    }

    #[tokio::test]
    async fn test_acknowledge_rejects_wrong_lock_id() {
        let mut actor = actor().await;
        actor.push(0, b"item".to_vec()).await.unwrap();
        actor.pop_with_ack(Some(60)).await.unwrap();

        let err = actor.acknowledge("not-the-right-id").await.unwrap_err();
        assert!(matches!(err, QueueError::InvalidLockId));
    }

    #[tokio::test]
    async fn test_acknowledge_rejects_empty_lock_id() {
        let mut actor = actor().await;

        // Checked first, distinctly from "no active lock" (spec.md §7's
        // fixed check ordering: empty id, absent lock, mismatched id,
        // expired, success).
        let err = actor.acknowledge("").await.unwrap_err();
        assert!(matches!(err, QueueError::InvalidLockId));

        actor.push(0, b"item".to_vec()).await.unwrap();
        actor.pop_with_ack(Some(60)).await.unwrap();
        let err = actor.acknowledge("").await.unwrap_err();
        assert!(matches!(err, QueueError::InvalidLockId));
    }

    #[tokio::test]
    async fn test_pop_returns_none_while_lock_is_live() {
        let mut actor = actor().await;
        actor.push(0, b"locked".to_vec()).await.unwrap();
        actor.pop_with_ack(Some(60)).await.unwrap();

        actor.push(0, b"second".to_vec()).await.unwrap();
        assert_eq!(actor.pop().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_pop_with_ack_on_empty_queue() {
        let mut actor = actor().await;
        let result = actor.pop_with_ack(Some(30)).await.unwrap();
        assert!(!result.locked);
        assert_eq!(result.count, 0);
    }

    #[tokio::test]
    async fn test_activate_with_config_seeds_segment_size_on_first_activation() {
        let small = crate::metadata::QueueConfig {
            segment_size: 4,
            buffer_segments: 1,
        };
        let actor = QueueActor::activate_with_config(
            MemoryStore::new(),
            MemoryStore::new(),
            ActorConfig::new("a"),
            small,
        )
        .await
        .unwrap();
        assert_eq!(actor.metadata.config.segment_size, 4);
    }

    #[tokio::test]
    async fn test_expired_lock_recovers_and_is_popped_again() {
        let mut actor = actor().await;
        actor.push(0, b"item".to_vec()).await.unwrap();

        let result = actor.pop_with_ack(Some(1)).await.unwrap();
        let lock_id = result.lock_id.unwrap();
        // Force immediate expiry rather than sleeping in a test.
        actor.metadata.active_lock.as_mut().unwrap().expires_at = 0;

        let err = actor.acknowledge(&lock_id).await.unwrap_err();
        assert!(matches!(err, QueueError::LockExpired));
        assert!(actor.metadata.active_lock.is_none());

        // The recovered item is available again via plain Pop.
        assert_eq!(actor.pop().await.unwrap(), Some(b"item".to_vec()));
    }
}
