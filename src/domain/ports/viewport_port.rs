//! Port definition for the viewport-intersection signal.

use tokio::sync::watch;

/// Options for registering a viewport observation.
#[derive(Debug, Clone)]
pub struct ViewportOptions {
    /// Visible fraction (0-1) required before the target counts as
    /// intersecting.
    pub threshold: f32,
    /// CSS-like margin string expanding the observation root.
    pub root_margin: String,
}

impl Default for ViewportOptions {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            root_margin: "0px".to_owned(),
        }
    }
}

/// Port for the external viewport-intersection signal.
///
/// Each subscription yields a watch channel that carries the target's
/// current visibility. Dropping the receiver cancels the subscription.
pub trait ViewportSignalPort: Send + Sync {
    /// Registers an observation and returns its visibility channel.
    fn subscribe(&self, options: &ViewportOptions) -> watch::Receiver<bool>;
}
