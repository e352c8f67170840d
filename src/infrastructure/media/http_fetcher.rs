//! Network fetch primitive backed by reqwest.

use bytes::Bytes;
use tracing::debug;

use crate::domain::entities::MediaUrl;
use crate::domain::errors::{PreloadError, PreloadResult};
use crate::domain::ports::{LoadOptions, MediaFetchPort};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Fetch primitive issuing explicit GET requests with the load
/// options' accept and cache-control headers.
pub struct HttpMediaFetcher {
    client: reqwest::Client,
}

impl HttpMediaFetcher {
    /// Creates a fetcher with the given request timeout.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(timeout_secs: u64) -> PreloadResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| PreloadError::Network {
                url: String::new(),
                reason: format!("failed to create HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }

    /// Creates a fetcher with the default timeout.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn with_defaults() -> PreloadResult<Self> {
        Self::new(DEFAULT_TIMEOUT_SECS)
    }

    fn request(&self, url: &MediaUrl, options: &LoadOptions) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .get(url.as_str())
            .header(reqwest::header::ACCEPT, &options.accept)
            .header(reqwest::header::CACHE_CONTROL, &options.cache_control);
        if let Some(credentials) = &options.credentials {
            request = request.header(reqwest::header::AUTHORIZATION, credentials);
        }
        request
    }
}

#[async_trait::async_trait]
impl MediaFetchPort for HttpMediaFetcher {
    async fn fetch(&self, url: &MediaUrl, options: &LoadOptions) -> PreloadResult<Bytes> {
        debug!(url = %url, "fetching media");

        let response = self
            .request(url, options)
            .send()
            .await
            .map_err(|e| PreloadError::Network {
                url: url.to_string(),
                reason: format!("request failed: {e}"),
            })?;

        if !response.status().is_success() {
            return Err(PreloadError::Network {
                url: url.to_string(),
                reason: format!(
                    "HTTP {}: {}",
                    response.status(),
                    response.status().canonical_reason().unwrap_or("Unknown")
                ),
            });
        }

        response.bytes().await.map_err(|e| PreloadError::Network {
            url: url.to_string(),
            reason: format!("failed to read body: {e}"),
        })
    }
}
