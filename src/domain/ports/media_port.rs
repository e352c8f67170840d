//! Port definitions for the platform fetch and decode primitives.

use bytes::Bytes;

use crate::domain::entities::MediaUrl;
use crate::domain::errors::PreloadResult;

/// Options applied to a single load attempt.
///
/// The fetch path uses `accept`, `cache_control`, and `credentials` as
/// request headers; the direct-decode path maps `cross_origin` and
/// `referrer_policy` to their native header equivalents.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Accept header value for the explicit fetch path.
    pub accept: String,
    /// Cache-Control header value for the explicit fetch path.
    pub cache_control: String,
    /// Credential material for the explicit fetch path, sent as the
    /// Authorization header value when present.
    pub credentials: Option<String>,
    /// Cross-origin setting for the direct-decode path, sent as the
    /// Origin header value when present.
    pub cross_origin: Option<String>,
    /// Referrer policy for the direct-decode path, sent as the Referer
    /// header value when present.
    pub referrer_policy: Option<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            accept: "image/webp,image/*,*/*;q=0.8".to_owned(),
            cache_control: "no-cache".to_owned(),
            credentials: None,
            cross_origin: None,
            referrer_policy: None,
        }
    }
}

/// Port for the network fetch primitive.
#[async_trait::async_trait]
pub trait MediaFetchPort: Send + Sync {
    /// Fetches the resource bytes, failing on transport errors and
    /// non-success statuses alike.
    async fn fetch(&self, url: &MediaUrl, options: &LoadOptions) -> PreloadResult<Bytes>;
}

/// Port for the platform media-decode primitive.
#[async_trait::async_trait]
pub trait MediaDecodePort: Send + Sync {
    /// Decodes an already-fetched buffer; resolves on successful decode.
    async fn decode_bytes(&self, url: &MediaUrl, bytes: Bytes) -> PreloadResult<()>;

    /// Fetches and decodes in one step, applying cross-origin and
    /// referrer-policy options. Returns the raw bytes so the caller can
    /// write them through to the cache.
    async fn decode_url(&self, url: &MediaUrl, options: &LoadOptions) -> PreloadResult<Bytes>;
}
