//! Segment store adapter: typed get/put/delete over two tiers, plus the hot
//! tier's atomic commit barrier.
//!
//! Grounded on the teacher's tiered-storage shape (`frys-eventbus`'s
//! distributed replication/cluster modules model a similar "local vs. shared"
//! split) generalized to the two concrete tiers spec.md names: an
//! actor-local *hot* store and a shared *cold* store.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

/// Error surfaced by a `StateStore` implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store (or the network path to it) is unavailable.
    Unavailable(String),
    /// The store rejected the operation for some other reason.
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable(reason) => write!(f, "store unavailable: {reason}"),
            StoreError::Backend(reason) => write!(f, "store backend error: {reason}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// A typed key-value interface. Implementers may choose any serialization
/// format for the byte blobs they store — this trait only moves opaque
/// bytes — provided it survives schema evolution of whatever the caller
/// encodes (see `crate::metadata` for the one document this crate encodes).
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Fetch a value, or `None` if the key is absent.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    /// Upsert a value.
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;
    /// Remove a key. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// Any shared handle to a store is itself a store. Lets a caller keep an
/// `Arc<MemoryStore>` around to inspect directly (tests, demos) while handing
/// a clone of the same `Arc` to a `QueueActor` as its hot or cold tier.
#[async_trait]
impl<S: StateStore + ?Sized> StateStore for Arc<S> {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(key).await
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        (**self).put(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        (**self).delete(key).await
    }
}

/// Buffers hot-tier mutations and flushes them atomically on `commit`.
///
/// The underlying `StateStore` is not assumed to support multi-key
/// transactions natively (that is the actor host's save-barrier, an external
/// collaborator per spec.md §6); `HotStore` provides the atomic-commit
/// contract spec.md requires by buffering writes/deletes in memory and
/// replaying them against the inner store only at `commit()`. A read
/// observes its own uncommitted writes (read-your-writes within one
/// operation), matching the "all hot mutations made since the last commit
/// land together or not at all" contract.
pub struct HotStore<S: StateStore> {
    inner: Arc<S>,
    pending: Mutex<HashMap<String, PendingWrite>>,
}

enum PendingWrite {
    Put(Vec<u8>),
    Delete,
}

impl<S: StateStore> HotStore<S> {
    /// Wrap a `StateStore` as the hot tier.
    pub fn new(inner: S) -> Self {
        Self {
            inner: Arc::new(inner),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Read a key, preferring an uncommitted buffered write if present.
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let pending = self.pending.lock().await;
        match pending.get(key) {
            Some(PendingWrite::Put(value)) => Ok(Some(value.clone())),
            Some(PendingWrite::Delete) => Ok(None),
            None => {
                drop(pending);
                self.inner.get(key).await
            }
        }
    }

    /// Buffer a write; not visible to the underlying store until `commit()`.
    pub async fn put(&self, key: impl Into<String>, value: Vec<u8>) {
        self.pending
            .lock()
            .await
            .insert(key.into(), PendingWrite::Put(value));
    }

    /// Buffer a delete; not visible to the underlying store until `commit()`.
    pub async fn delete(&self, key: impl Into<String>) {
        self.pending
            .lock()
            .await
            .insert(key.into(), PendingWrite::Delete);
    }

    /// Atomically apply every buffered mutation since the last commit.
    ///
    /// If any individual write fails, mutations already applied in this
    /// commit batch are not rolled back — a real host's save barrier is
    /// expected to provide true atomicity across the underlying keys; this
    /// in-process buffering only guarantees that *this crate* never
    /// observes a half-applied operation in between two commits.
    pub async fn commit(&self) -> Result<(), StoreError> {
        let mut pending = self.pending.lock().await;
        let batch: Vec<(String, PendingWrite)> = pending.drain().collect();
        drop(pending);

        for (key, write) in batch {
            match write {
                PendingWrite::Put(value) => self.inner.put(&key, value).await?,
                PendingWrite::Delete => self.inner.delete(&key).await?,
            }
        }
        Ok(())
    }
}

/// Hot-tier key for a priority's segment `n`.
pub fn hot_segment_key(priority: u32, segment: u64) -> String {
    format!("queue_{priority}_seg_{segment}")
}

/// Hot-tier key for the single metadata document.
pub const METADATA_KEY: &str = "metadata";

/// Cold-tier key for a priority's segment `n`, namespaced by actor id.
pub fn cold_segment_key(priority: u32, segment: u64, actor_id: &str) -> String {
    format!("offloaded_queue_{priority}_seg_{segment}_{actor_id}")
}
