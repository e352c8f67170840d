//! Infrastructure layer with external service adapters.

/// Persistent cache store adapters.
pub mod cache;
/// CLI configuration.
pub mod config;
/// Fetch and decode primitive adapters.
pub mod media;
/// Viewport signal adapters.
pub mod viewport;

pub use cache::{DiskCacheStore, MemoryCacheStore};
pub use config::{CliArgs, LogLevel, PreloadConfig};
pub use media::{HttpMediaFetcher, ImageMediaDecoder};
pub use viewport::ManualViewportSignal;
