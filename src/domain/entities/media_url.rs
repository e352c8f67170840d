//! Media URL value types.

/// A validated remote media URL.
///
/// Constructed either by parsing a string that carries a recognized URI
/// scheme, or taken as-is from a caller-supplied explicit list via
/// [`MediaUrl::trusted`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaUrl(String);

impl MediaUrl {
    /// Parses a candidate string, accepting it only when it starts with
    /// a recognized URI scheme.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.starts_with("http://") || raw.starts_with("https://") {
            Some(Self(raw.to_owned()))
        } else {
            None
        }
    }

    /// Accepts a caller-supplied URL as-is. Only emptiness is rejected.
    #[must_use]
    pub fn trusted(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.is_empty() { None } else { Some(Self(raw)) }
    }

    /// Returns the inner string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns a stable key for keyed stores, derived by hashing the URL.
    #[must_use]
    pub fn cache_key(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(self.0.as_bytes());
        let result = hasher.finalize();
        hex::encode(&result[..16])
    }
}

impl std::fmt::Display for MediaUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An ordered, duplicate-free sequence of [`MediaUrl`].
///
/// Membership order reflects first-seen order in the source traversal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlBatch {
    urls: Vec<MediaUrl>,
}

impl UrlBatch {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a batch from an iterator, deduplicating while preserving
    /// first occurrence.
    pub fn from_urls(urls: impl IntoIterator<Item = MediaUrl>) -> Self {
        let mut batch = Self::new();
        for url in urls {
            batch.push(url);
        }
        batch
    }

    /// Appends a URL unless it is already present.
    /// Returns true if the URL was inserted.
    pub fn push(&mut self, url: MediaUrl) -> bool {
        if self.urls.contains(&url) {
            false
        } else {
            self.urls.push(url);
            true
        }
    }

    /// Returns true if the batch contains the URL.
    #[must_use]
    pub fn contains(&self, url: &MediaUrl) -> bool {
        self.urls.contains(url)
    }

    /// Number of URLs in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// Returns true if the batch holds no URLs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Iterates the URLs in first-seen order.
    pub fn iter(&self) -> std::slice::Iter<'_, MediaUrl> {
        self.urls.iter()
    }
}

impl<'a> IntoIterator for &'a UrlBatch {
    type Item = &'a MediaUrl;
    type IntoIter = std::slice::Iter<'a, MediaUrl>;

    fn into_iter(self) -> Self::IntoIter {
        self.urls.iter()
    }
}

impl IntoIterator for UrlBatch {
    type Item = MediaUrl;
    type IntoIter = std::vec::IntoIter<MediaUrl>;

    fn into_iter(self) -> Self::IntoIter {
        self.urls.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_http_schemes() {
        assert!(MediaUrl::parse("https://example.com/a.png").is_some());
        assert!(MediaUrl::parse("http://example.com/a.png").is_some());
    }

    #[test]
    fn test_parse_rejects_plain_text() {
        assert!(MediaUrl::parse("just a caption").is_none());
        assert!(MediaUrl::parse("").is_none());
    }

    #[test]
    fn test_trusted_rejects_only_empty() {
        assert!(MediaUrl::trusted("relative/path.png").is_some());
        assert!(MediaUrl::trusted("").is_none());
    }

    #[test]
    fn test_cache_key_is_stable() {
        let a = MediaUrl::parse("https://example.com/a.png").unwrap();
        let b = MediaUrl::parse("https://example.com/a.png").unwrap();
        assert_eq!(a.cache_key(), b.cache_key());
        assert_eq!(a.cache_key().len(), 32);
    }

    #[test]
    fn test_batch_dedup_preserves_first_seen_order() {
        let one = MediaUrl::parse("https://x/1.png").unwrap();
        let two = MediaUrl::parse("https://x/2.png").unwrap();
        let batch = UrlBatch::from_urls([one.clone(), two.clone(), one.clone()]);

        assert_eq!(batch.len(), 2);
        let urls: Vec<_> = batch.iter().map(MediaUrl::as_str).collect();
        assert_eq!(urls, vec!["https://x/1.png", "https://x/2.png"]);
    }
}
