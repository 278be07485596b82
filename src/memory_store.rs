//! An in-memory `StateStore`, with no external dependency, used as the
//! reference store for local development and for every test in this crate.
//!
//! Grounded on the teacher's in-memory registries (`BTreeMap`-backed
//! subscriber/topic state in `frys-eventbus::pubsub`), generalized to the
//! `StateStore` collaborator boundary.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::store::{StateStore, StoreError};

/// A `StateStore` backed by a process-local `HashMap`. Useful as the cold
/// tier in tests/demos, or as either tier when no external KV store is
/// wired up yet.
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held. Test-only convenience, not part of the
    /// `StateStore` contract.
    pub fn len(&self) -> usize {
        self.data.lock().unwrap().len()
    }

    /// Whether any key is present.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the keys currently present, for assertions in tests.
    pub fn keys(&self) -> Vec<String> {
        self.data.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.data.lock().unwrap().get(key).cloned())
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.data.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.data.lock().unwrap().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.is_empty());

        store.put("a", b"1".to_vec()).await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.len(), 1);

        store.delete("a").await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_delete_absent_key_is_not_an_error() {
        let store = MemoryStore::new();
        store.delete("missing").await.unwrap();
    }
}
