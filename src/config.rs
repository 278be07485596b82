//! Actor-level configuration: everything the façade needs that is not part
//! of the persisted metadata document (`crate::metadata::QueueConfig` covers
//! that half — segment size and buffer segments, loaded once at activation).
//!
//! Grounded on `frys-eventbus::config`'s `Default`-driven config struct
//! pattern, and on its `EventBus::validate_config` in `core.rs`.

use crate::metadata::QueueConfig;

/// Bounds on `PopWithAck`'s `ttl_seconds` argument (spec.md §4.3, §4.5).
pub const MIN_LOCK_TTL_SECONDS: u64 = 1;
pub const MAX_LOCK_TTL_SECONDS: u64 = 300;
pub const DEFAULT_LOCK_TTL_SECONDS: u64 = 30;

/// Length, in characters, of a generated lock id (spec.md §4.5).
pub const LOCK_ID_LENGTH: usize = 11;

/// Construction-time configuration for a `QueueActor` (spec.md §4.6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorConfig {
    /// This actor instance's id, used to namespace cold-tier keys
    /// (spec.md §4.1 — "actor id is part of the key to globalize the
    /// namespace").
    pub actor_id: String,
}

impl ActorConfig {
    /// Build a config for the named actor instance.
    pub fn new(actor_id: impl Into<String>) -> Self {
        Self {
            actor_id: actor_id.into(),
        }
    }
}

/// Validate a `QueueConfig` loaded from (or about to be written to)
/// metadata. Only exercised on the very first activation, since config is
/// read-once thereafter (spec.md §9).
pub fn validate_queue_config(config: &QueueConfig) -> Result<(), &'static str> {
    if config.segment_size == 0 {
        return Err("segment_size must be greater than 0");
    }
    if config.buffer_segments == 0 {
        return Err("buffer_segments must be at least 1");
    }
    Ok(())
}

/// Clamp a caller-supplied TTL into `[1, 300]` seconds, defaulting to 30
/// when absent (spec.md §4.3 step 1, §4.5).
pub fn clamp_ttl(ttl_seconds: Option<u64>) -> u64 {
    ttl_seconds
        .unwrap_or(DEFAULT_LOCK_TTL_SECONDS)
        .clamp(MIN_LOCK_TTL_SECONDS, MAX_LOCK_TTL_SECONDS)
}
