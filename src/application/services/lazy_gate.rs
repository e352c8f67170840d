//! Viewport-gated deferral of a single resource's preload.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::application::services::{BatchHandle, PreloadCallbacks, PreloadCoordinator};
use crate::domain::entities::{MediaUrl, UrlBatch};
use crate::domain::ports::{ViewportOptions, ViewportSignalPort};

/// Lifecycle of a gated resource.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GateState {
    /// No observation registered.
    #[default]
    NotObserving,
    /// Waiting for the target to enter the viewport.
    Observing,
    /// The target entered the viewport.
    Intersecting,
    /// The preload is in flight.
    Loading,
    /// The resource loaded.
    Loaded,
    /// The load failed with an error message.
    Failed(String),
}

/// Defers one URL's preload until its target nears visibility.
///
/// The Intersecting -> Loading transition fires at most once per gate:
/// the observer task ends after the first intersection, so later
/// visibility changes are never seen. Detaching cancels the viewport
/// subscription; an in-flight load is not cancelled but its outcome is
/// discarded.
pub struct LazyGate {
    state: Arc<std::sync::Mutex<GateState>>,
    torn_down: Arc<AtomicBool>,
    batch: Arc<std::sync::Mutex<Option<BatchHandle>>>,
    observer: Option<tokio::task::JoinHandle<()>>,
}

impl LazyGate {
    /// Registers an observation for `url` and returns the gate.
    #[must_use]
    pub fn observe(
        url: MediaUrl,
        options: &ViewportOptions,
        signal: &dyn ViewportSignalPort,
        coordinator: Arc<PreloadCoordinator>,
    ) -> Self {
        let mut rx = signal.subscribe(options);
        let state = Arc::new(std::sync::Mutex::new(GateState::Observing));
        let torn_down = Arc::new(AtomicBool::new(false));
        let batch = Arc::new(std::sync::Mutex::new(None));

        let task_state = Arc::clone(&state);
        let task_torn_down = Arc::clone(&torn_down);
        let task_batch = Arc::clone(&batch);
        let observer = tokio::spawn(async move {
            loop {
                if *rx.borrow_and_update() {
                    break;
                }
                if rx.changed().await.is_err() {
                    // Signal source went away before any intersection.
                    return;
                }
            }

            Self::set_state(&task_state, GateState::Intersecting);
            debug!(url = %url, "gate opened, starting preload");
            Self::set_state(&task_state, GateState::Loading);

            let success_state = Arc::clone(&task_state);
            let success_torn_down = Arc::clone(&task_torn_down);
            let error_state = Arc::clone(&task_state);
            let error_torn_down = Arc::clone(&task_torn_down);
            let callbacks = PreloadCallbacks::new()
                .on_success(move || {
                    if !success_torn_down.load(Ordering::SeqCst) {
                        Self::set_state(&success_state, GateState::Loaded);
                    }
                })
                .on_error(move |error| {
                    if !error_torn_down.load(Ordering::SeqCst) {
                        Self::set_state(&error_state, GateState::Failed(error.to_string()));
                    }
                });

            let handle = coordinator.run(UrlBatch::from_urls([url]), callbacks);
            if let Ok(mut slot) = task_batch.lock() {
                *slot = Some(handle);
            }
        });

        Self {
            state,
            torn_down,
            batch,
            observer: Some(observer),
        }
    }

    fn set_state(state: &std::sync::Mutex<GateState>, next: GateState) {
        if let Ok(mut current) = state.lock() {
            *current = next;
        }
    }

    /// Current gate state.
    #[must_use]
    pub fn state(&self) -> GateState {
        self.state
            .lock()
            .map(|s| s.clone())
            .unwrap_or(GateState::NotObserving)
    }

    /// Cancels the viewport subscription and discards any in-flight
    /// outcome. The load itself runs to completion off to the side.
    pub fn detach(&mut self) {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(observer) = self.observer.take() {
            observer.abort();
        }
        if let Ok(slot) = self.batch.lock()
            && let Some(handle) = slot.as_ref()
        {
            handle.supersede();
        }
        debug!("lazy gate detached");
    }
}

impl Drop for LazyGate {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::application::services::CacheIndex;
    use crate::domain::ports::mocks::{MockDecoder, MockFetcher};
    use crate::infrastructure::cache::MemoryCacheStore;
    use crate::infrastructure::viewport::ManualViewportSignal;

    fn url(s: &str) -> MediaUrl {
        MediaUrl::parse(s).unwrap()
    }

    fn coordinator(fetcher: Arc<MockFetcher>, decoder: MockDecoder) -> Arc<PreloadCoordinator> {
        let cache = Arc::new(CacheIndex::new(Arc::new(MemoryCacheStore::new())));
        Arc::new(PreloadCoordinator::new(cache, fetcher, Arc::new(decoder)))
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn test_gate_never_intersecting_never_loads() {
        let fetcher = Arc::new(MockFetcher::new());
        let coordinator = coordinator(fetcher.clone(), MockDecoder::new());
        let signal = ManualViewportSignal::new();

        let gate = LazyGate::observe(
            url("https://x/1.png"),
            &ViewportOptions::default(),
            &signal,
            coordinator,
        );
        settle().await;

        assert_eq!(gate.state(), GateState::Observing);
        assert_eq!(fetcher.call_count(), 0);
    }

    #[tokio::test]
    async fn test_gate_loads_on_first_intersection() {
        let fetcher = Arc::new(MockFetcher::new());
        let coordinator = coordinator(fetcher.clone(), MockDecoder::new());
        let signal = ManualViewportSignal::new();

        let gate = LazyGate::observe(
            url("https://x/1.png"),
            &ViewportOptions::default(),
            &signal,
            coordinator,
        );
        signal.set_visible(true);
        settle().await;

        assert_eq!(gate.state(), GateState::Loaded);
        assert_eq!(fetcher.call_count(), 1);
    }

    #[tokio::test]
    async fn test_gate_fires_at_most_once() {
        let fetcher = Arc::new(MockFetcher::new());
        let coordinator = coordinator(fetcher.clone(), MockDecoder::new());
        let signal = ManualViewportSignal::new();

        let gate = LazyGate::observe(
            url("https://x/1.png"),
            &ViewportOptions::default(),
            &signal,
            coordinator,
        );
        signal.set_visible(true);
        settle().await;
        signal.set_visible(false);
        signal.set_visible(true);
        settle().await;

        assert_eq!(gate.state(), GateState::Loaded);
        assert_eq!(fetcher.call_count(), 1);
    }

    #[tokio::test]
    async fn test_gate_failure_is_reported() {
        let fetcher = Arc::new(MockFetcher::failing(["https://x/1.png"]));
        let decoder = MockDecoder::new().failing_direct(["https://x/1.png"]);
        let coordinator = coordinator(fetcher, decoder);
        let signal = ManualViewportSignal::new();

        let gate = LazyGate::observe(
            url("https://x/1.png"),
            &ViewportOptions::default(),
            &signal,
            coordinator,
        );
        signal.set_visible(true);
        settle().await;

        assert!(matches!(gate.state(), GateState::Failed(_)));
    }

    #[tokio::test]
    async fn test_detached_gate_discards_outcome() {
        let fetcher = Arc::new(MockFetcher::new());
        let coordinator = coordinator(fetcher.clone(), MockDecoder::new());
        let signal = ManualViewportSignal::new();

        let mut gate = LazyGate::observe(
            url("https://x/1.png"),
            &ViewportOptions::default(),
            &signal,
            coordinator,
        );
        gate.detach();
        signal.set_visible(true);
        settle().await;

        assert_ne!(gate.state(), GateState::Loaded);
        assert_eq!(fetcher.call_count(), 0);
    }
}
