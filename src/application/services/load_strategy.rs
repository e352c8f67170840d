//! Single-resource load attempts with platform-aware fallback.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use tracing::{debug, warn};

use crate::application::services::CacheIndex;
use crate::domain::entities::{LoadOutcome, MediaUrl};
use crate::domain::errors::{PreloadError, PreloadResult};
use crate::domain::ports::{LoadOptions, MediaDecodePort, MediaFetchPort};

/// The closed set of load techniques.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTechnique {
    /// Explicit network fetch followed by a decode of the buffer.
    FetchThenDecode,
    /// Hand the URL to the decode primitive directly.
    DirectDecode,
}

/// Platform capability profile selecting the technique order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlatformProfile {
    /// Explicit fetch works; try it first, fall back to direct decode.
    #[default]
    Standard,
    /// Known variant where the explicit fetch path hangs rather than
    /// failing cleanly. It is skipped outright, not de-prioritized.
    QuirkyFetchCache,
}

impl PlatformProfile {
    /// The applicable techniques, in attempt order.
    #[must_use]
    pub const fn techniques(self) -> &'static [LoadTechnique] {
        match self {
            Self::Standard => &[LoadTechnique::FetchThenDecode, LoadTechnique::DirectDecode],
            Self::QuirkyFetchCache => &[LoadTechnique::DirectDecode],
        }
    }
}

/// Container for in-flight direct-decode handles.
///
/// One pool is created per coordinator invocation so concurrent batches
/// never interfere. Handle insertion and removal are paired through the
/// RAII guard, which keeps the pool consistent under any interleaving
/// of unrelated URLs.
#[derive(Debug, Default)]
pub struct DecodePool {
    active: std::sync::Mutex<HashSet<u64>>,
    next_id: AtomicU64,
}

impl DecodePool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a decode handle, detached again when the guard drops.
    #[must_use]
    pub fn attach(self: &Arc<Self>) -> DecodeHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut active) = self.active.lock() {
            active.insert(id);
        }
        DecodeHandle {
            pool: Arc::clone(self),
            id,
        }
    }

    /// Number of handles currently attached.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.lock().map(|a| a.len()).unwrap_or(0)
    }
}

/// RAII guard pairing handle insertion with removal.
#[derive(Debug)]
pub struct DecodeHandle {
    pool: Arc<DecodePool>,
    id: u64,
}

impl Drop for DecodeHandle {
    fn drop(&mut self) {
        if let Ok(mut active) = self.pool.active.lock() {
            active.remove(&self.id);
        }
    }
}

/// Performs one load attempt per URL, walking the profile's technique
/// order until one succeeds or all are exhausted.
pub struct LoadStrategy {
    fetcher: Arc<dyn MediaFetchPort>,
    decoder: Arc<dyn MediaDecodePort>,
    cache: Arc<CacheIndex>,
    profile: PlatformProfile,
    options: LoadOptions,
    pool: Arc<DecodePool>,
}

impl LoadStrategy {
    /// Creates a strategy with a fresh decode pool.
    #[must_use]
    pub fn new(
        fetcher: Arc<dyn MediaFetchPort>,
        decoder: Arc<dyn MediaDecodePort>,
        cache: Arc<CacheIndex>,
        profile: PlatformProfile,
        options: LoadOptions,
    ) -> Self {
        Self {
            fetcher,
            decoder,
            cache,
            profile,
            options,
            pool: Arc::new(DecodePool::new()),
        }
    }

    /// The pool holding this strategy's in-flight direct-decode handles.
    #[must_use]
    pub fn pool(&self) -> &Arc<DecodePool> {
        &self.pool
    }

    /// Loads a single URL. The URL is marked failed only after every
    /// applicable technique is exhausted; the reported reason is the
    /// last technique's error.
    ///
    /// On success the bytes are written through to the cache
    /// fire-and-forget; completion of the write is not awaited.
    pub async fn load(&self, url: &MediaUrl) -> LoadOutcome {
        let mut last_error = PreloadError::Decode {
            url: url.to_string(),
            reason: "no applicable load technique".to_owned(),
        };

        for technique in self.profile.techniques() {
            match self.attempt(*technique, url).await {
                Ok(bytes) => {
                    debug!(url = %url, technique = ?technique, "media preloaded");
                    let cache = Arc::clone(&self.cache);
                    let cache_url = url.clone();
                    tokio::spawn(async move {
                        cache.put_entry(&cache_url, &bytes).await;
                    });
                    return LoadOutcome::Loaded { url: url.clone() };
                }
                Err(e) => {
                    warn!(url = %url, technique = ?technique, error = %e, "load technique failed");
                    last_error = e;
                }
            }
        }

        LoadOutcome::Failed {
            url: url.clone(),
            error: last_error,
        }
    }

    async fn attempt(&self, technique: LoadTechnique, url: &MediaUrl) -> PreloadResult<Bytes> {
        match technique {
            LoadTechnique::FetchThenDecode => {
                let bytes = self.fetcher.fetch(url, &self.options).await?;
                self.decoder.decode_bytes(url, bytes.clone()).await?;
                Ok(bytes)
            }
            LoadTechnique::DirectDecode => {
                let _handle = self.pool.attach();
                self.decoder.decode_url(url, &self.options).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::mocks::{MockDecoder, MockFetcher};
    use crate::infrastructure::cache::MemoryCacheStore;

    fn url(s: &str) -> MediaUrl {
        MediaUrl::parse(s).unwrap()
    }

    fn strategy(
        fetcher: Arc<MockFetcher>,
        decoder: Arc<MockDecoder>,
        profile: PlatformProfile,
    ) -> LoadStrategy {
        let cache = Arc::new(CacheIndex::new(Arc::new(MemoryCacheStore::new())));
        LoadStrategy::new(fetcher, decoder, cache, profile, LoadOptions::default())
    }

    #[tokio::test]
    async fn test_fetch_path_succeeds_without_direct_decode() {
        let fetcher = Arc::new(MockFetcher::new());
        let decoder = Arc::new(MockDecoder::new());
        let strategy = strategy(fetcher.clone(), decoder.clone(), PlatformProfile::Standard);

        let outcome = strategy.load(&url("https://x/1.png")).await;

        assert!(outcome.is_loaded());
        assert_eq!(fetcher.call_count(), 1);
        assert!(decoder.direct_calls().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_falls_back_to_direct_decode() {
        let fetcher = Arc::new(MockFetcher::failing(["https://x/1.png"]));
        let decoder = Arc::new(MockDecoder::new());
        let strategy = strategy(fetcher.clone(), decoder.clone(), PlatformProfile::Standard);

        let outcome = strategy.load(&url("https://x/1.png")).await;

        assert!(outcome.is_loaded());
        assert_eq!(decoder.direct_calls(), vec!["https://x/1.png"]);
    }

    #[tokio::test]
    async fn test_quirky_profile_skips_fetch_path() {
        let fetcher = Arc::new(MockFetcher::new());
        let decoder = Arc::new(MockDecoder::new());
        let strategy = strategy(
            fetcher.clone(),
            decoder.clone(),
            PlatformProfile::QuirkyFetchCache,
        );

        let outcome = strategy.load(&url("https://x/1.png")).await;

        assert!(outcome.is_loaded());
        assert_eq!(fetcher.call_count(), 0);
        assert_eq!(decoder.direct_calls(), vec!["https://x/1.png"]);
    }

    #[tokio::test]
    async fn test_failed_only_after_all_techniques_exhausted() {
        let fetcher = Arc::new(MockFetcher::failing(["https://x/1.png"]));
        let decoder = Arc::new(MockDecoder::new().failing_direct(["https://x/1.png"]));
        let strategy = strategy(fetcher, decoder, PlatformProfile::Standard);

        let outcome = strategy.load(&url("https://x/1.png")).await;

        match outcome {
            LoadOutcome::Failed { error, .. } => {
                assert!(matches!(error, PreloadError::Decode { .. }));
            }
            LoadOutcome::Loaded { .. } => panic!("expected failure"),
        }
    }

    #[tokio::test]
    async fn test_decode_bytes_failure_falls_back() {
        let fetcher = Arc::new(MockFetcher::new());
        let decoder = Arc::new(MockDecoder::new().failing_bytes(["https://x/1.png"]));
        let strategy = strategy(fetcher, decoder.clone(), PlatformProfile::Standard);

        let outcome = strategy.load(&url("https://x/1.png")).await;

        assert!(outcome.is_loaded());
        assert_eq!(decoder.direct_calls(), vec!["https://x/1.png"]);
    }

    #[tokio::test]
    async fn test_pool_handles_are_paired() {
        let pool = Arc::new(DecodePool::new());
        let a = pool.attach();
        let b = pool.attach();
        assert_eq!(pool.active_count(), 2);
        drop(a);
        assert_eq!(pool.active_count(), 1);
        drop(b);
        assert_eq!(pool.active_count(), 0);
    }
}
