//! Port definitions for external collaborators.

mod cache_store_port;
mod media_port;
mod viewport_port;

pub use cache_store_port::{CACHE_NAMESPACE, CacheStorePort};
pub use media_port::{LoadOptions, MediaDecodePort, MediaFetchPort};
pub use viewport_port::{ViewportOptions, ViewportSignalPort};

#[cfg(test)]
pub mod mocks {
    pub use super::media_port::mock::{MockDecoder, MockFetcher};
}
