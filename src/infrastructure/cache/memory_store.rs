//! In-memory cache store, the injectable substitute for tests and
//! short-lived processes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::trace;

use crate::domain::entities::MediaUrl;
use crate::domain::errors::{PreloadError, PreloadResult};
use crate::domain::ports::CacheStorePort;

/// Cache store backed by a process-local map.
///
/// Supports fault injection so fail-open behavior in front of a broken
/// store stays testable.
#[derive(Default)]
pub struct MemoryCacheStore {
    entries: std::sync::RwLock<HashMap<String, Vec<u8>>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryCacheStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every membership check fail until reset.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes every insertion fail until reset.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Inserts an entry bypassing fault injection.
    pub fn insert_raw(&self, url: &MediaUrl, bytes: &[u8]) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(url.cache_key(), bytes.to_vec());
        }
    }

    /// Membership check bypassing fault injection.
    #[must_use]
    pub fn contains_raw(&self, url: &MediaUrl) -> bool {
        self.entries
            .read()
            .map(|entries| entries.contains_key(&url.cache_key()))
            .unwrap_or(false)
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    /// Returns true if the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl CacheStorePort for MemoryCacheStore {
    async fn contains(&self, url: &MediaUrl) -> PreloadResult<bool> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(PreloadError::CacheAccess("store unreachable".to_owned()));
        }
        let hit = self.contains_raw(url);
        trace!(url = %url, hit = hit, "memory store membership check");
        Ok(hit)
    }

    async fn insert(&self, url: &MediaUrl, bytes: &[u8]) -> PreloadResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PreloadError::CacheAccess("store unreachable".to_owned()));
        }
        self.insert_raw(url, bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> MediaUrl {
        MediaUrl::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_contains() {
        let store = MemoryCacheStore::new();
        let target = url("https://x/1.png");

        assert!(!store.contains(&target).await.unwrap());
        store.insert(&target, b"bytes").await.unwrap();
        assert!(store.contains(&target).await.unwrap());
    }

    #[tokio::test]
    async fn test_fault_injection() {
        let store = MemoryCacheStore::new();
        let target = url("https://x/1.png");

        store.set_fail_writes(true);
        assert!(store.insert(&target, b"bytes").await.is_err());
        assert!(store.is_empty());

        store.insert_raw(&target, b"bytes");
        store.set_fail_reads(true);
        assert!(store.contains(&target).await.is_err());
        assert!(store.contains_raw(&target));
    }
}
