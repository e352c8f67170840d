//! Thin interface over the persistent cache store.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

use crate::domain::entities::MediaUrl;
use crate::domain::ports::CacheStorePort;

/// Default capacity of the in-process membership memo.
pub const DEFAULT_MEMO_CAPACITY: usize = 1024;

/// Membership test and write-through insertion over an injected store.
///
/// An in-process LRU memo fronts the store so that repeat membership
/// checks within a session skip the store round trip. Store failures
/// are fail-open: an unreachable store reads as "not cached", forcing a
/// fresh load rather than silently skipping one.
pub struct CacheIndex {
    store: Arc<dyn CacheStorePort>,
    memo: Mutex<LruCache<String, ()>>,
}

impl CacheIndex {
    /// Creates an index over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn CacheStorePort>) -> Self {
        Self::with_memo_capacity(store, DEFAULT_MEMO_CAPACITY)
    }

    /// Creates an index with a custom memo capacity.
    #[must_use]
    pub fn with_memo_capacity(store: Arc<dyn CacheStorePort>, capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            store,
            memo: Mutex::new(LruCache::new(cap)),
        }
    }

    /// Returns true if the URL's resource is cache-resident.
    /// Never errors; store-access failures read as "not cached".
    pub async fn has_entry(&self, url: &MediaUrl) -> bool {
        let key = url.cache_key();

        {
            let mut memo = self.memo.lock().await;
            if memo.get(&key).is_some() {
                trace!(url = %url, "membership memo hit");
                return true;
            }
        }

        match self.store.contains(url).await {
            Ok(true) => {
                let mut memo = self.memo.lock().await;
                memo.put(key, ());
                true
            }
            Ok(false) => false,
            Err(e) => {
                warn!(url = %url, error = %e, "cache membership check failed, treating as uncached");
                false
            }
        }
    }

    /// Best-effort write-through. A failed write is logged and
    /// swallowed; cache population is an optimization, not a
    /// correctness requirement.
    pub async fn put_entry(&self, url: &MediaUrl, bytes: &[u8]) {
        match self.store.insert(url, bytes).await {
            Ok(()) => {
                let mut memo = self.memo.lock().await;
                memo.put(url.cache_key(), ());
                debug!(url = %url, size = bytes.len(), "stored media in cache");
            }
            Err(e) => {
                warn!(url = %url, error = %e, "cache write failed");
            }
        }
    }
}
