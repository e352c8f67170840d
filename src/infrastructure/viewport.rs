//! Viewport signal adapters.

use tokio::sync::watch;
use tracing::debug;

use crate::domain::ports::{ViewportOptions, ViewportSignalPort};

/// Viewport signal driven programmatically.
///
/// Stands in for a real intersection observer in tests and headless
/// environments; the observation options are accepted and logged but
/// carry no geometry here.
pub struct ManualViewportSignal {
    tx: watch::Sender<bool>,
}

impl ManualViewportSignal {
    /// Creates a signal that starts out not intersecting.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Sets the current visibility, waking subscribers.
    pub fn set_visible(&self, visible: bool) {
        self.tx.send_replace(visible);
    }
}

impl Default for ManualViewportSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewportSignalPort for ManualViewportSignal {
    fn subscribe(&self, options: &ViewportOptions) -> watch::Receiver<bool> {
        debug!(
            threshold = options.threshold,
            root_margin = %options.root_margin,
            "viewport observation registered"
        );
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_see_visibility_changes() {
        let signal = ManualViewportSignal::new();
        let mut rx = signal.subscribe(&ViewportOptions::default());

        assert!(!*rx.borrow_and_update());
        signal.set_visible(true);
        rx.changed().await.unwrap();
        assert!(*rx.borrow_and_update());
    }
}
