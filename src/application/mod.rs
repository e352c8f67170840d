//! Application layer with the preload services.

/// Preload service implementations.
pub mod services;

pub use services::{
    BatchHandle, BatchSnapshot, CacheIndex, GateState, LazyGate, LoadStrategy, LoadTechnique,
    PlatformProfile, PreloadCallbacks, PreloadCoordinator, PreloadScope, ScopeInput, ScopeStatus,
    UrlExtractor,
};
