//! A `StateStore` wrapper that can be told to fail on demand, for exercising
//! §4.4's graceful-degradation contract (offload failures swallowed, load
//! failures surfaced as `QueueError::ColdStoreUnavailable`).
//!
//! Grounded on the pack's `ringwal-sim` crate, whose stated purpose is
//! deterministic simulation testing of the WAL this spec's storage engine
//! most resembles; that crate's sources weren't retrieved, so this module is
//! a from-scratch fault injector in the same spirit, not a port.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::store::{StateStore, StoreError};

/// Wraps any `StateStore` and can be configured to fail subsequent
/// operations, simulating an unavailable cold tier.
pub struct FaultInjectingStore<S: StateStore> {
    inner: S,
    always_fail: AtomicBool,
    fail_next: AtomicUsize,
}

impl<S: StateStore> FaultInjectingStore<S> {
    /// Wrap a store with fault injection disabled.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            always_fail: AtomicBool::new(false),
            fail_next: AtomicUsize::new(0),
        }
    }

    /// Every subsequent operation fails until `clear_faults` is called.
    pub fn fail_permanently(&self) {
        self.always_fail.store(true, Ordering::Release);
    }

    /// The next `n` operations fail, then the store behaves normally again.
    pub fn fail_next_n(&self, n: usize) {
        self.fail_next.store(n, Ordering::Release);
    }

    /// Restore normal operation.
    pub fn clear_faults(&self) {
        self.always_fail.store(false, Ordering::Release);
        self.fail_next.store(0, Ordering::Release);
    }

    fn should_fail(&self) -> bool {
        if self.always_fail.load(Ordering::Acquire) {
            return true;
        }
        let mut remaining = self.fail_next.load(Ordering::Acquire);
        while remaining > 0 {
            match self.fail_next.compare_exchange(
                remaining,
                remaining - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => remaining = actual,
            }
        }
        false
    }
}

#[async_trait]
impl<S: StateStore> StateStore for FaultInjectingStore<S> {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        if self.should_fail() {
            return Err(StoreError::Unavailable(format!(
                "injected fault on get({key})"
            )));
        }
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        if self.should_fail() {
            return Err(StoreError::Unavailable(format!(
                "injected fault on put({key})"
            )));
        }
        self.inner.put(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        if self.should_fail() {
            return Err(StoreError::Unavailable(format!(
                "injected fault on delete({key})"
            )));
        }
        self.inner.delete(key).await
    }
}
