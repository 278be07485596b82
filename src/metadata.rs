//! In-memory representation of the single metadata document: config plus
//! per-priority pointers and the active lock, with serialization to/from the
//! metadata blob.
//!
//! The source modeled this as an open-ended "dict of anything" (per
//! spec.md §9's design notes); here it is a tagged structure decoded once at
//! load and re-encoded once at commit, matching the teacher's own config
//! structs (`frys-eventbus::config`) but carrying real per-priority state
//! instead of bus-wide toggles. `#[serde(default)]` on every field added
//! after the first cut keeps old blobs loadable as the schema evolves.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::store::{HotStore, StateStore, StoreError, METADATA_KEY};

/// A non-negative priority class. Lower value = higher priority.
pub type Priority = u32;

/// Segment identifier, monotonically increasing per priority.
pub type SegmentId = u64;

/// Config values loaded at activation; authoritative for the activation's
/// lifetime (spec.md §4.2, §9 — read-once, not dynamically reconfigurable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Maximum items per segment.
    #[serde(default = "default_segment_size")]
    pub segment_size: usize,
    /// Full segments kept hot between the head segment and the nearest
    /// offloaded segment.
    #[serde(default = "default_buffer_segments")]
    pub buffer_segments: usize,
}

fn default_segment_size() -> usize {
    100
}

fn default_buffer_segments() -> usize {
    1
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            segment_size: default_segment_size(),
            buffer_segments: default_buffer_segments(),
        }
    }
}

/// Per-priority pointers (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueMeta {
    pub head_segment: SegmentId,
    pub tail_segment: SegmentId,
    pub count: u64,
    /// Present together or absent together (spec.md invariant 6).
    #[serde(default)]
    pub head_offloaded_segment: Option<SegmentId>,
    #[serde(default)]
    pub tail_offloaded_segment: Option<SegmentId>,
}

impl QueueMeta {
    /// A freshly created priority record: one empty segment, no offload range.
    pub fn fresh() -> Self {
        Self {
            head_segment: 0,
            tail_segment: 0,
            count: 0,
            head_offloaded_segment: None,
            tail_offloaded_segment: None,
        }
    }

    /// The offload range, if one is currently set.
    pub fn offloaded_range(&self) -> Option<(SegmentId, SegmentId)> {
        match (self.head_offloaded_segment, self.tail_offloaded_segment) {
            (Some(h), Some(t)) => Some((h, t)),
            (None, None) => None,
            // Invariant 6 guarantees these travel together; a mismatch here
            // means a prior commit left metadata inconsistent.
            _ => None,
        }
    }
}

/// An item held by the active lock, tagged with its originating priority so
/// that expiry recovery can re-enqueue to the correct queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedItem {
    pub item: Vec<u8>,
    pub priority: Priority,
}

/// The singleton lock describing an unacknowledged `PopWithAck` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveLock {
    pub lock_id: String,
    /// Unix timestamp, seconds.
    pub created_at: u64,
    /// Unix timestamp, seconds.
    pub expires_at: u64,
    pub items: Vec<LockedItem>,
}

impl ActiveLock {
    /// Whether this lock has expired as of `now` (unix seconds).
    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.expires_at
    }
}

/// The single logical metadata document (spec.md §4.2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub config: QueueConfig,
    #[serde(default)]
    pub queues: BTreeMap<Priority, QueueMeta>,
    #[serde(default)]
    pub active_lock: Option<ActiveLock>,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            config: QueueConfig::default(),
            queues: BTreeMap::new(),
            active_lock: None,
        }
    }
}

impl Metadata {
    /// Load the metadata document from the hot tier, initializing defaults
    /// on first activation (spec.md §4.2: absent blob -> default config,
    /// empty queues, no lock).
    pub async fn load<S: StateStore>(hot: &HotStore<S>) -> Result<Self, StoreError> {
        match hot.get(METADATA_KEY).await? {
            Some(bytes) => {
                let metadata: Metadata = serde_json::from_slice(&bytes).map_err(|e| {
                    StoreError::Backend(format!("metadata deserialization failed: {e}"))
                })?;
                Ok(metadata)
            }
            None => Ok(Metadata::default()),
        }
    }

    /// Like [`Metadata::load`], but seeds `config` from `default_config`
    /// rather than [`QueueConfig::default`] when no metadata blob exists yet
    /// — i.e. only on an actor instance's very first activation. Ignored on
    /// every later activation, since config is read-once (spec.md §9).
    pub async fn load_with_default_config<S: StateStore>(
        hot: &HotStore<S>,
        default_config: QueueConfig,
    ) -> Result<Self, StoreError> {
        match hot.get(METADATA_KEY).await? {
            Some(_) => Metadata::load(hot).await,
            None => Ok(Metadata {
                config: default_config,
                ..Metadata::default()
            }),
        }
    }

    /// Buffer the (re-)encoded metadata document as a hot-tier write. Does
    /// not itself commit — the caller commits alongside whatever segment
    /// mutations belong to the same operation.
    pub async fn stage<S: StateStore>(&self, hot: &HotStore<S>) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(self)
            .map_err(|e| StoreError::Backend(format!("metadata serialization failed: {e}")))?;
        hot.put(METADATA_KEY, bytes).await;
        Ok(())
    }
}
