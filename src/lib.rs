//! image-preloader - A media preload and cache coordination engine.
//!
//! This crate preloads remote media ahead of use: it extracts candidate
//! URLs from arbitrary nested data, deduplicates them, filters out
//! cache-resident resources, fans out concurrent load attempts with a
//! platform-aware fallback strategy, and reports aggregate success or
//! failure to the caller exactly once per batch.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing the preload services.
pub mod application;
/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing adapters for external services.
pub mod infrastructure;

/// Current version of the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = "image-preloader";
