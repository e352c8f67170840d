//! Batch orchestration: cache filter, concurrent fan-out, one-shot
//! aggregate notification.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::future::join_all;
use tracing::{debug, warn};

use crate::application::services::{CacheIndex, LoadStrategy, PlatformProfile};
use crate::domain::entities::{LoadOutcome, MediaStatus, MediaUrl, UrlBatch};
use crate::domain::errors::PreloadError;
use crate::domain::ports::{LoadOptions, MediaDecodePort, MediaFetchPort};

/// One-shot completion callbacks for a batch.
///
/// Either callback may be omitted; a batch failure with no error
/// handler registered is logged and dropped.
#[derive(Default)]
pub struct PreloadCallbacks {
    pub(crate) on_success: Option<Box<dyn FnOnce() + Send>>,
    pub(crate) on_error: Option<Box<dyn FnOnce(PreloadError) + Send>>,
}

impl PreloadCallbacks {
    /// Creates empty callbacks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the success callback.
    #[must_use]
    pub fn on_success(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_success = Some(Box::new(f));
        self
    }

    /// Sets the error callback.
    #[must_use]
    pub fn on_error(mut self, f: impl FnOnce(PreloadError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }
}

impl std::fmt::Debug for PreloadCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreloadCallbacks")
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

#[derive(Default)]
struct BatchBook {
    pending: HashSet<MediaUrl>,
    succeeded: HashSet<MediaUrl>,
    failed: HashSet<MediaUrl>,
}

/// Aggregate state for one coordinator invocation.
///
/// The completion token lives on the state itself, so the at-most-once
/// guarantee is tied to the batch object rather than to ambient module
/// state. Results arriving after notification or supersession are
/// ignored.
struct BatchState {
    book: std::sync::Mutex<BatchBook>,
    notified: AtomicBool,
    callbacks: std::sync::Mutex<Option<PreloadCallbacks>>,
}

impl BatchState {
    fn new(callbacks: PreloadCallbacks) -> Self {
        Self {
            book: std::sync::Mutex::new(BatchBook::default()),
            notified: AtomicBool::new(false),
            callbacks: std::sync::Mutex::new(Some(callbacks)),
        }
    }

    fn is_notified(&self) -> bool {
        self.notified.load(Ordering::SeqCst)
    }

    fn take_callbacks(&self) -> Option<PreloadCallbacks> {
        self.callbacks.lock().ok().and_then(|mut slot| slot.take())
    }

    fn begin(&self, uncached: &[MediaUrl]) {
        if let Ok(mut book) = self.book.lock() {
            book.pending = uncached.iter().cloned().collect();
        }
    }

    fn record(&self, outcome: &LoadOutcome) {
        if self.is_notified() {
            return;
        }
        if let Ok(mut book) = self.book.lock() {
            let url = outcome.url();
            book.pending.remove(url);
            if outcome.is_loaded() {
                book.succeeded.insert(url.clone());
            } else {
                book.failed.insert(url.clone());
            }
        }
    }

    fn notify_success(&self) {
        if self.notified.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(callbacks) = self.take_callbacks()
            && let Some(on_success) = callbacks.on_success
        {
            on_success();
        }
    }

    fn notify_error(&self, error: PreloadError) {
        if self.notified.swap(true, Ordering::SeqCst) {
            return;
        }
        match self.take_callbacks().and_then(|c| c.on_error) {
            Some(on_error) => on_error(error),
            None => warn!(error = %error, "batch failed with no error handler registered"),
        }
    }

    fn discard(&self) {
        if self.notified.swap(true, Ordering::SeqCst) {
            return;
        }
        drop(self.take_callbacks());
        debug!("batch superseded, discarding future results");
    }
}

/// A point-in-time view of a batch's bookkeeping.
#[derive(Debug, Clone)]
pub struct BatchSnapshot {
    /// URLs still awaiting an outcome.
    pub pending: Vec<MediaUrl>,
    /// URLs that loaded.
    pub succeeded: Vec<MediaUrl>,
    /// URLs that exhausted every technique.
    pub failed: Vec<MediaUrl>,
    /// Whether the one-shot notification has fired (or been discarded).
    pub notified: bool,
}

impl BatchSnapshot {
    /// Status of one URL within this batch. URLs outside the uncached
    /// set (cache-resident or foreign) read as idle.
    #[must_use]
    pub fn status_of(&self, url: &MediaUrl) -> MediaStatus {
        if self.succeeded.contains(url) {
            MediaStatus::Loaded
        } else if self.failed.contains(url) {
            MediaStatus::Failed("load failed".to_owned())
        } else if self.pending.contains(url) {
            MediaStatus::Loading
        } else {
            MediaStatus::Idle
        }
    }
}

/// Handle to a running batch.
///
/// Dropping the handle does not cancel the batch; call
/// [`BatchHandle::supersede`] to discard its future results.
#[derive(Debug)]
pub struct BatchHandle {
    state: Arc<BatchState>,
    task: tokio::task::JoinHandle<()>,
}

impl std::fmt::Debug for BatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchState")
            .field("notified", &self.is_notified())
            .finish_non_exhaustive()
    }
}

impl BatchHandle {
    /// Discards the batch's future results without cancelling in-flight
    /// loads. Its callbacks will never fire.
    pub fn supersede(&self) {
        self.state.discard();
    }

    /// Whether the batch has delivered (or discarded) its notification.
    #[must_use]
    pub fn is_notified(&self) -> bool {
        self.state.is_notified()
    }

    /// Snapshot of the batch bookkeeping.
    #[must_use]
    pub fn snapshot(&self) -> BatchSnapshot {
        let notified = self.state.is_notified();
        self.state.book.lock().map_or(
            BatchSnapshot {
                pending: Vec::new(),
                succeeded: Vec::new(),
                failed: Vec::new(),
                notified,
            },
            |book| BatchSnapshot {
                pending: book.pending.iter().cloned().collect(),
                succeeded: book.succeeded.iter().cloned().collect(),
                failed: book.failed.iter().cloned().collect(),
                notified,
            },
        )
    }

    /// Waits for the batch task to settle. In-flight cache writes may
    /// still land afterwards.
    pub async fn finished(self) {
        let _ = self.task.await;
    }
}

/// Orchestrates one batch: filters cache-resident URLs, fans out loads
/// concurrently, and fires exactly one success or error notification.
pub struct PreloadCoordinator {
    cache: Arc<CacheIndex>,
    fetcher: Arc<dyn MediaFetchPort>,
    decoder: Arc<dyn MediaDecodePort>,
    profile: PlatformProfile,
    options: LoadOptions,
}

impl PreloadCoordinator {
    /// Creates a coordinator over the given collaborators.
    #[must_use]
    pub fn new(
        cache: Arc<CacheIndex>,
        fetcher: Arc<dyn MediaFetchPort>,
        decoder: Arc<dyn MediaDecodePort>,
    ) -> Self {
        Self {
            cache,
            fetcher,
            decoder,
            profile: PlatformProfile::default(),
            options: LoadOptions::default(),
        }
    }

    /// Sets the platform profile.
    #[must_use]
    pub fn with_profile(mut self, profile: PlatformProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Sets the per-load options.
    #[must_use]
    pub fn with_options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }

    /// Runs a batch fire-and-forget. Completion is reported through the
    /// callbacks, exactly once per batch; no retry happens at this
    /// layer. The returned handle allows superseding the invocation
    /// when the owning scope unmounts or its input changes.
    pub fn run(self: &Arc<Self>, batch: UrlBatch, callbacks: PreloadCallbacks) -> BatchHandle {
        let state = Arc::new(BatchState::new(callbacks));
        let coordinator = Arc::clone(self);
        let task_state = Arc::clone(&state);
        let task = tokio::spawn(async move {
            coordinator.drive(batch, task_state).await;
        });
        BatchHandle { state, task }
    }

    async fn drive(&self, batch: UrlBatch, state: Arc<BatchState>) {
        let checks = join_all(batch.iter().map(|url| self.cache.has_entry(url))).await;
        let uncached: Vec<MediaUrl> = batch
            .iter()
            .zip(checks)
            .filter(|(_, cached)| !cached)
            .map(|(url, _)| url.clone())
            .collect();

        if uncached.is_empty() {
            debug!(batch = batch.len(), "all resources cache-resident, nothing to load");
            state.notify_success();
            return;
        }

        debug!(batch = batch.len(), uncached = uncached.len(), "starting preload fan-out");
        state.begin(&uncached);

        let strategy = LoadStrategy::new(
            Arc::clone(&self.fetcher),
            Arc::clone(&self.decoder),
            Arc::clone(&self.cache),
            self.profile,
            self.options.clone(),
        );

        let outcomes = join_all(uncached.iter().map(|url| strategy.load(url))).await;

        let mut first_failure = None;
        for outcome in outcomes {
            state.record(&outcome);
            if first_failure.is_none()
                && let LoadOutcome::Failed { error, .. } = outcome
            {
                first_failure = Some(error);
            }
        }

        match first_failure {
            None => state.notify_success(),
            Some(error) => state.notify_error(error),
        }
    }
}
