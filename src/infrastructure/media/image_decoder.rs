//! Decode primitive backed by the image crate.

use bytes::Bytes;
use tracing::debug;

use crate::domain::entities::MediaUrl;
use crate::domain::errors::{PreloadError, PreloadResult};
use crate::domain::ports::{LoadOptions, MediaDecodePort};

/// Decode primitive that validates media bytes with the image crate.
///
/// The direct path performs its own fetch, the native analog of
/// handing a URL to a decode element: cross-origin and referrer-policy
/// options become the Origin and Referer request headers.
pub struct ImageMediaDecoder {
    client: reqwest::Client,
}

impl ImageMediaDecoder {
    /// Creates a decoder with the given request timeout for the direct
    /// path.
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

    /// Creates a decoder with the default timeout.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn with_defaults() -> PreloadResult<Self> {
        Self::new(super::http_fetcher::DEFAULT_TIMEOUT_SECS)
    }
}

#[async_trait::async_trait]
impl MediaDecodePort for ImageMediaDecoder {
    async fn decode_bytes(&self, url: &MediaUrl, bytes: Bytes) -> PreloadResult<()> {
        let decode_url = url.to_string();
        let decoded = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
            .await
            .map_err(|e| PreloadError::Decode {
                url: decode_url.clone(),
                reason: format!("decode task panicked: {e}"),
            })?
            .map_err(|e| PreloadError::Decode {
                url: decode_url,
                reason: format!("failed to decode media: {e}"),
            })?;

        debug!(url = %url, width = decoded.width(), height = decoded.height(), "media decoded");
        Ok(())
    }

    async fn decode_url(&self, url: &MediaUrl, options: &LoadOptions) -> PreloadResult<Bytes> {
        let mut request = self.client.get(url.as_str());
        if let Some(origin) = &options.cross_origin {
            request = request.header(reqwest::header::ORIGIN, origin);
        }
        if let Some(referrer) = &options.referrer_policy {
            request = request.header(reqwest::header::REFERER, referrer);
        }

        let response = request.send().await.map_err(|e| PreloadError::Network {
            url: url.to_string(),
            reason: format!("request failed: {e}"),
        })?;

        if !response.status().is_success() {
            return Err(PreloadError::Network {
                url: url.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        let bytes = response.bytes().await.map_err(|e| PreloadError::Network {
            url: url.to_string(),
            reason: format!("failed to read body: {e}"),
        })?;

        self.decode_bytes(url, bytes.clone()).await?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> MediaUrl {
        MediaUrl::parse(s).unwrap()
    }

    fn png_bytes() -> Bytes {
        let img = image::DynamicImage::new_rgb8(2, 2);
        let mut buffer = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buffer, image::ImageFormat::Png).unwrap();
        Bytes::from(buffer.into_inner())
    }

    #[tokio::test]
    async fn test_decode_bytes_accepts_valid_png() {
        let decoder = ImageMediaDecoder::with_defaults().unwrap();
        let result = decoder
            .decode_bytes(&url("https://x/ok.png"), png_bytes())
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_decode_bytes_rejects_garbage() {
        let decoder = ImageMediaDecoder::with_defaults().unwrap();
        let result = decoder
            .decode_bytes(&url("https://x/bad.png"), Bytes::from_static(b"not an image"))
            .await;
        assert!(matches!(result, Err(PreloadError::Decode { .. })));
    }
}
