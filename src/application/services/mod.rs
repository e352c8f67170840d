//! Preload service implementations.

pub mod cache_index;
pub mod coordinator;
pub mod lazy_gate;
pub mod load_strategy;
pub mod preload_scope;
pub mod url_extractor;

pub use cache_index::CacheIndex;
pub use coordinator::{BatchHandle, BatchSnapshot, PreloadCallbacks, PreloadCoordinator};
pub use lazy_gate::{GateState, LazyGate};
pub use load_strategy::{DecodePool, LoadStrategy, LoadTechnique, PlatformProfile};
pub use preload_scope::{PreloadScope, ScopeInput, ScopeStatus};
pub use url_extractor::UrlExtractor;
