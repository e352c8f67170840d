//! Per-URL load results and status.

use crate::domain::entities::MediaUrl;
use crate::domain::errors::PreloadError;

/// The result of one load attempt for one URL.
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    /// The resource was fetched and decoded successfully.
    Loaded {
        /// The resource URL.
        url: MediaUrl,
    },
    /// Every applicable load technique failed for this URL.
    Failed {
        /// The resource URL.
        url: MediaUrl,
        /// The last technique's error.
        error: PreloadError,
    },
}

impl LoadOutcome {
    /// The URL this outcome belongs to.
    #[must_use]
    pub fn url(&self) -> &MediaUrl {
        match self {
            Self::Loaded { url } | Self::Failed { url, .. } => url,
        }
    }

    /// Returns true if the load succeeded.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }
}

/// Status of one resource in the preload pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MediaStatus {
    /// Loading has not started.
    #[default]
    Idle,
    /// A load attempt is in flight.
    Loading,
    /// The resource is loaded and cache-resident.
    Loaded,
    /// Loading failed with an error message.
    Failed(String),
}

impl MediaStatus {
    /// Returns true if the resource is loaded.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded)
    }

    /// Returns true if a load is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Returns true if loading failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}
