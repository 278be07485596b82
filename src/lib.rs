//! # queue-actor-core
//!
//! A segmented, priority-ordered FIFO queue engine for a single virtual
//! actor instance backed by an external key-value store.
//!
//! Each `QueueActor` owns exactly one queue, partitioned into priority
//! classes (lower value delivers first) with strict FIFO ordering within a
//! class. Items live in fixed-size segments that spill from a fast *hot*
//! store to a shared *cold* store once they fall far enough behind the
//! queue's head, and are promoted back just ahead of consumption — keeping
//! per-operation hot-tier memory bounded regardless of total queue depth.
//!
//! Four operations make up the public surface (spec.md §6):
//!
//! - [`QueueActor::push`] — enqueue an item at a priority.
//! - [`QueueActor::pop`] — destructively dequeue, no delivery guarantee.
//! - [`QueueActor::pop_with_ack`] — dequeue under a TTL-bound delivery lock.
//! - [`QueueActor::acknowledge`] — release a lock once its item is handled.
//!
//! This crate deliberately does not implement the actor runtime, placement,
//! or activation lifecycle; the external KV store; an HTTP or RPC surface;
//! authentication; or metrics transport. Those are the responsibility of a
//! host adapter built around [`facade::QueueActor`], which only needs an
//! implementation of [`store::StateStore`] for each tier.
//!
//! ## Example
//!
//! ```rust,no_run
//! use queue_actor_core::config::ActorConfig;
//! use queue_actor_core::memory_store::MemoryStore;
//! use queue_actor_core::QueueActor;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut actor = QueueActor::activate(
//!     MemoryStore::new(),
//!     MemoryStore::new(),
//!     ActorConfig::new("orders-42"),
//! )
//! .await?;
//!
//! actor.push(0, b"high priority order".to_vec()).await?;
//! actor.push(5, b"low priority order".to_vec()).await?;
//!
//! let result = actor.pop_with_ack(Some(30)).await?;
//! if let Some(lock_id) = result.lock_id {
//!     // ... process result.item ...
//!     actor.acknowledge(&lock_id).await?;
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all)]

/// Construction-time actor configuration and validation (spec.md §4.6, §9).
pub mod config;
/// Segmented queue engine: `Push` and the internal pop (spec.md §4.3).
pub mod engine;
/// Queue actor error types.
pub mod error;
/// In-memory `StateStore`, used by tests, demos, and as a default cold tier.
pub mod memory_store;
/// The persisted metadata document and its component types (spec.md §4.2).
pub mod metadata;
/// Operation counters and a point-in-time health snapshot.
pub mod metrics;
/// Hot/cold offload and load scans (spec.md §4.4).
pub mod offload;
/// Segment blob encoding (spec.md §4.1).
pub mod segment;
/// The `StateStore` collaborator trait and the hot-tier commit barrier.
pub mod store;

/// Delivery lock issuance, lazy expiry, and recovery (spec.md §4.5).
pub mod lock;

mod facade;
pub use facade::{AcknowledgeResult, PopWithAckResult, QueueActor};
pub use error::{QueueError, Result};

#[cfg(any(test, feature = "fault-injection"))]
/// A `StateStore` wrapper that fails on demand, for exercising graceful
/// degradation (spec.md §4.4). Exposed outside tests behind the
/// `fault-injection` feature so downstream integration suites can reuse it.
pub mod fault_store;

#[cfg(not(any(test, feature = "fault-injection")))]
mod fault_store;
