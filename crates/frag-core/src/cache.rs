//! Shared in-memory payload cache.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

/// In-memory payload cache keyed by encoded request identity.
///
/// The cache is a cheap-to-clone handle; clones observe the same entries,
/// which is how every mount sharing a context also shares its cache.
/// Entries are written once per successful render attempt and never
/// evicted. Keys are content-derived, so two attempts racing to write the
/// same key produce identical bytes and last-writer-wins needs no
/// coordination.
#[derive(Clone, Default)]
pub struct PayloadCache {
    entries: Arc<RwLock<HashMap<String, Arc<[u8]>>>>,
}

impl PayloadCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the payload stored under `key`.
    pub fn get(&self, key: &str) -> Option<Arc<[u8]>> {
        self.entries.read().get(key).cloned()
    }

    /// Whether `key` has a stored payload.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Store `bytes` under `key`, replacing any previous entry.
    pub fn insert(&self, key: impl Into<String>, bytes: impl Into<Arc<[u8]>>) {
        let key = key.into();
        let bytes = bytes.into();
        tracing::debug!(key = %key, len = bytes.len(), "payload cached");
        self.entries.write().insert(key, bytes);
    }

    /// Number of cached payloads.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache holds no payloads.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl std::fmt::Debug for PayloadCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadCache")
            .field("entries", &self.len())
            .finish()
    }
}
