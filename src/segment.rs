//! A segment: a bounded, ordered chunk of one priority's queue.
//!
//! The teacher's `queues.rs` modeled a segment as a fixed-capacity,
//! atomically-indexed array for lock-free concurrent access. This actor is
//! invoked under single-threaded-per-instance semantics (spec.md §5), so the
//! concurrency machinery is dropped; what's kept is the *shape* — a bounded
//! ordered chunk, full iff length == capacity, allocate-on-fill,
//! delete-on-drain — reimplemented as a plain owned `Vec` read from and
//! written to a `StateStore` blob.

use serde::{Deserialize, Serialize};

use crate::store::StoreError;

/// An ordered sequence of opaque item payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub items: Vec<Vec<u8>>,
}

impl Segment {
    /// An empty segment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of items currently held.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the segment holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the segment has reached `segment_size`. A segment may
    /// legally exceed this (invariant 5 exception: lock re-prepend onto the
    /// head segment), so callers check `is_full` only where spec.md directs
    /// — before a tail append, never as a hard cap.
    pub fn is_full(&self, segment_size: usize) -> bool {
        self.len() >= segment_size
    }

    /// Decode a segment blob, treating an absent blob as an empty segment
    /// (spec.md §4.3 push step 2: "treat missing as empty").
    pub fn decode_or_empty(bytes: Option<Vec<u8>>) -> Result<Self, StoreError> {
        match bytes {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| StoreError::Backend(format!("segment deserialization failed: {e}"))),
            None => Ok(Segment::new()),
        }
    }

    /// Encode for storage.
    pub fn encode(&self) -> Result<Vec<u8>, StoreError> {
        serde_json::to_vec(self)
            .map_err(|e| StoreError::Backend(format!("segment serialization failed: {e}")))
    }
}
