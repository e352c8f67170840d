//! Preload error types.

use thiserror::Error;

/// Result type for preload operations.
pub type PreloadResult<T> = std::result::Result<T, PreloadError>;

/// Errors that can occur while preloading media.
///
/// Per-URL failures are recovered locally up to the coordinator
/// boundary; only the batch-level outcome, carrying the first terminal
/// failure, crosses the boundary to the caller.
#[derive(Debug, Clone, Error)]
pub enum PreloadError {
    /// Network transport failure or non-success HTTP status.
    #[error("network error for {url}: {reason}")]
    Network {
        /// The resource URL.
        url: String,
        /// Transport or status description.
        reason: String,
    },

    /// The resource bytes could not be decoded.
    #[error("decode error for {url}: {reason}")]
    Decode {
        /// The resource URL.
        url: String,
        /// Decoder description.
        reason: String,
    },

    /// The persistent cache store could not be reached.
    /// Always swallowed by the engine (fail-open).
    #[error("cache access failed: {0}")]
    CacheAccess(String),
}
