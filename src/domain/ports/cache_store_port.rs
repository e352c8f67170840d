//! Port definition for the persistent cache store.

use crate::domain::entities::MediaUrl;
use crate::domain::errors::PreloadResult;

/// Namespace shared by every consumer of the engine so that cache
/// membership is consistent across independent invocations.
pub const CACHE_NAMESPACE: &str = "image-preloader-cache";

/// Port for the external key-addressable cache store.
///
/// The store owns entry lifecycle entirely; the engine only reads
/// membership and writes bytes on successful loads. Implementations
/// must be thread-safe, and every call is treated as independently
/// atomic.
#[async_trait::async_trait]
pub trait CacheStorePort: Send + Sync {
    /// Membership test for a URL's resource.
    async fn contains(&self, url: &MediaUrl) -> PreloadResult<bool>;

    /// Stores the resource bytes for a URL.
    async fn insert(&self, url: &MediaUrl, bytes: &[u8]) -> PreloadResult<()>;
}
