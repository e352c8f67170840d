//! Scoped wrapper running the coordinator for the lifetime of a
//! rendered region.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::application::services::{
    BatchHandle, PreloadCallbacks, PreloadCoordinator, UrlExtractor,
};
use crate::domain::entities::{MediaUrl, UrlBatch};

/// Input for one scope revision: an explicit URL list, arbitrary nested
/// data to scan, or both.
#[derive(Debug, Clone, Default)]
pub struct ScopeInput {
    /// URLs accepted as-is (caller-supplied explicit list).
    pub urls: Vec<String>,
    /// Arbitrary nested value scanned for candidate URLs.
    pub data: Option<Value>,
}

impl ScopeInput {
    /// Input from an explicit URL list.
    #[must_use]
    pub fn from_urls(urls: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
            data: None,
        }
    }

    /// Input from a nested data value.
    #[must_use]
    pub fn from_data(data: Value) -> Self {
        Self {
            urls: Vec::new(),
            data: Some(data),
        }
    }

    /// Resolves the input into a deduplicated batch: explicit URLs
    /// first, then extraction from the data value.
    #[must_use]
    pub fn resolve(&self) -> UrlBatch {
        let mut batch = UrlBatch::new();
        for raw in &self.urls {
            if let Some(url) = MediaUrl::trusted(raw.clone()) {
                batch.push(url);
            }
        }
        if let Some(data) = &self.data {
            for url in &UrlExtractor::extract(data) {
                batch.push(url.clone());
            }
        }
        batch
    }
}

/// Observable progress of the scope's current batch.
#[derive(Debug, Clone, Default)]
pub struct ScopeStatus {
    /// True while the current batch is unresolved.
    pub loading: bool,
    /// The batch failure message, if any.
    pub error: Option<String>,
    /// Number of URLs in the current batch.
    pub count: usize,
}

/// Runs the coordinator for a rendered region's lifetime.
///
/// Mounting with new input supersedes the previous batch: its in-flight
/// loads keep running but their results are ignored. A revision that
/// resolves to the currently mounted batch is a no-op. The scope never
/// gates the caller's content; it only publishes status for callers
/// that opt into rendering against it.
pub struct PreloadScope {
    coordinator: Arc<PreloadCoordinator>,
    current: std::sync::Mutex<Option<(UrlBatch, BatchHandle)>>,
    status_tx: watch::Sender<ScopeStatus>,
}

impl PreloadScope {
    /// Creates an idle scope.
    #[must_use]
    pub fn new(coordinator: Arc<PreloadCoordinator>) -> Self {
        let (status_tx, _) = watch::channel(ScopeStatus::default());
        Self {
            coordinator,
            current: std::sync::Mutex::new(None),
            status_tx,
        }
    }

    /// Starts preloading for one input revision and returns the
    /// resolved batch. Any previous revision is superseded first; an
    /// unchanged revision keeps the current batch and its callbacks,
    /// and the new callbacks never fire.
    pub fn mount(&self, input: &ScopeInput, callbacks: PreloadCallbacks) -> UrlBatch {
        let batch = input.resolve();
        let count = batch.len();

        if let Ok(mut current) = self.current.lock() {
            if let Some((mounted, _)) = current.as_ref()
                && *mounted == batch
            {
                debug!(count, "input revision unchanged, keeping current batch");
                return batch;
            }
            if let Some((_, handle)) = current.take() {
                handle.supersede();
            }
        }
        self.status_tx.send_replace(ScopeStatus {
            loading: true,
            error: None,
            count,
        });

        let success_tx = self.status_tx.clone();
        let error_tx = self.status_tx.clone();
        let PreloadCallbacks { on_success, on_error } = callbacks;
        let wrapped = PreloadCallbacks::new()
            .on_success(move || {
                success_tx.send_modify(|status| status.loading = false);
                if let Some(cb) = on_success {
                    cb();
                }
            })
            .on_error(move |error| {
                error_tx.send_modify(|status| {
                    status.loading = false;
                    status.error = Some(error.to_string());
                });
                match on_error {
                    Some(cb) => cb(error),
                    None => warn!(error = %error, "scope batch failed"),
                }
            });

        let handle = self.coordinator.run(batch.clone(), wrapped);
        if let Ok(mut current) = self.current.lock() {
            *current = Some((batch.clone(), handle));
        }
        batch
    }

    /// Subscribes to the scope's status channel.
    #[must_use]
    pub fn status(&self) -> watch::Receiver<ScopeStatus> {
        self.status_tx.subscribe()
    }

    /// Supersedes the current batch; in-flight loads keep running but
    /// their results are ignored.
    pub fn unmount(&self) {
        self.supersede_current();
        self.status_tx.send_modify(|status| status.loading = false);
        debug!("preload scope unmounted");
    }

    fn supersede_current(&self) {
        if let Ok(mut current) = self.current.lock()
            && let Some((_, handle)) = current.take()
        {
            handle.supersede();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::application::services::CacheIndex;
    use crate::domain::ports::mocks::{MockDecoder, MockFetcher};
    use crate::infrastructure::cache::MemoryCacheStore;

    fn scope_with(fetcher: Arc<MockFetcher>, decoder: MockDecoder) -> PreloadScope {
        let cache = Arc::new(CacheIndex::new(Arc::new(MemoryCacheStore::new())));
        let coordinator = Arc::new(PreloadCoordinator::new(cache, fetcher, Arc::new(decoder)));
        PreloadScope::new(coordinator)
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn test_mount_resolves_urls_and_data_together() {
        let scope = scope_with(Arc::new(MockFetcher::new()), MockDecoder::new());
        let input = ScopeInput {
            urls: vec!["https://x/1.png".into()],
            data: Some(json!(["https://x/2.png", "https://x/1.png"])),
        };

        let batch = scope.mount(&input, PreloadCallbacks::new());
        let urls: Vec<_> = batch.iter().map(|u| u.as_str().to_owned()).collect();
        assert_eq!(urls, vec!["https://x/1.png", "https://x/2.png"]);
    }

    #[tokio::test]
    async fn test_status_transitions_to_settled() {
        let scope = scope_with(Arc::new(MockFetcher::new()), MockDecoder::new());
        let mut status = scope.status();

        scope.mount(
            &ScopeInput::from_urls(["https://x/1.png"]),
            PreloadCallbacks::new(),
        );
        assert!(status.borrow_and_update().loading);
        assert_eq!(status.borrow().count, 1);

        settle().await;
        assert!(!status.borrow_and_update().loading);
        assert!(status.borrow().error.is_none());
    }

    #[tokio::test]
    async fn test_status_carries_batch_failure() {
        let fetcher = Arc::new(MockFetcher::failing(["https://x/1.png"]));
        let decoder = MockDecoder::new().failing_direct(["https://x/1.png"]);
        let scope = scope_with(fetcher, decoder);

        scope.mount(
            &ScopeInput::from_urls(["https://x/1.png"]),
            PreloadCallbacks::new(),
        );
        settle().await;

        let status = scope.status();
        assert!(status.borrow().error.is_some());
        assert!(!status.borrow().loading);
    }

    #[tokio::test]
    async fn test_remount_supersedes_previous_batch() {
        let scope = scope_with(Arc::new(MockFetcher::new()), MockDecoder::new());
        let first_successes = Arc::new(AtomicUsize::new(0));
        let second_successes = Arc::new(AtomicUsize::new(0));

        let counter = first_successes.clone();
        scope.mount(
            &ScopeInput::from_urls(["https://x/1.png"]),
            PreloadCallbacks::new().on_success(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        // New input revision before the first batch settles.
        let counter = second_successes.clone();
        scope.mount(
            &ScopeInput::from_urls(["https://x/2.png"]),
            PreloadCallbacks::new().on_success(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        settle().await;

        assert_eq!(first_successes.load(Ordering::SeqCst), 0);
        assert_eq!(second_successes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_remount_with_unchanged_input_is_a_noop() {
        let fetcher = Arc::new(MockFetcher::new());
        let scope = scope_with(fetcher.clone(), MockDecoder::new());
        let first_successes = Arc::new(AtomicUsize::new(0));
        let second_successes = Arc::new(AtomicUsize::new(0));

        let counter = first_successes.clone();
        scope.mount(
            &ScopeInput::from_urls(["https://x/1.png"]),
            PreloadCallbacks::new().on_success(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        settle().await;

        let counter = second_successes.clone();
        let batch = scope.mount(
            &ScopeInput::from_urls(["https://x/1.png"]),
            PreloadCallbacks::new().on_success(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        settle().await;

        assert_eq!(batch.len(), 1);
        assert_eq!(fetcher.call_count(), 1);
        assert_eq!(first_successes.load(Ordering::SeqCst), 1);
        assert_eq!(second_successes.load(Ordering::SeqCst), 0);

        // A genuinely new revision still runs.
        scope.mount(
            &ScopeInput::from_urls(["https://x/2.png"]),
            PreloadCallbacks::new(),
        );
        settle().await;
        assert_eq!(fetcher.call_count(), 2);
    }

    #[tokio::test]
    async fn test_unmounted_scope_discards_outcome() {
        let scope = scope_with(Arc::new(MockFetcher::new()), MockDecoder::new());
        let successes = Arc::new(AtomicUsize::new(0));

        let counter = successes.clone();
        scope.mount(
            &ScopeInput::from_urls(["https://x/1.png"]),
            PreloadCallbacks::new().on_success(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        scope.unmount();
        settle().await;

        assert_eq!(successes.load(Ordering::SeqCst), 0);
    }
}
