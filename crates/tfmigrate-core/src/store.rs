//! Keyed store abstraction
//!
//! The remote environment-variable store offers two primitives: upsert a
//! named scalar and delete one by name. It has no compare-and-swap and no
//! multi-key write. Everything the lock and ledger do is expressed through
//! this trait so the protocol can run against [`MemoryStore`] in tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::errors::Result;

/// Result of deleting a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The key existed and has been removed by this call
    Deleted,
    /// The key did not exist
    NotFound,
}

/// Minimal key/value capability of the remote store
pub trait KeyedStore: Send + Sync {
    /// Create or overwrite `key`
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the write or cannot be reached.
    fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`, reporting whether it existed
    ///
    /// # Errors
    ///
    /// Returns an error for any answer other than "deleted" or "not found".
    fn delete(&self, key: &str) -> Result<DeleteOutcome>;
}

/// In-memory store with the same semantics as the remote one
///
/// Each call is serialized by a mutex, so a delete can observe
/// [`DeleteOutcome::Deleted`] at most once per written value.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a key
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    /// Number of keys currently stored
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether the store holds no keys
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of every key/value pair, ordered by key
    pub fn entries(&self) -> BTreeMap<String, String> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl KeyedStore for MemoryStore {
    fn put(&self, key: &str, value: &str) -> Result<()> {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<DeleteOutcome> {
        let removed = self
            .entries
            .lock()
            .map(|mut e| e.remove(key).is_some())
            .unwrap_or(false);
        Ok(if removed {
            DeleteOutcome::Deleted
        } else {
            DeleteOutcome::NotFound
        })
    }
}
