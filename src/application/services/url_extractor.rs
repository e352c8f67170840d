//! Extracts candidate media URLs from arbitrary nested data.


use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::domain::entities::{MediaUrl, UrlBatch};

/// Walks arbitrary nested values and produces a deduplicated,
/// order-stable batch of candidate URLs.
///
/// Pure and infallible: malformed input degrades to an empty or partial
/// batch, never an error.
pub struct UrlExtractor;

impl UrlExtractor {
    /// Extracts every candidate URL from `data`, deduplicated and in
    /// first-seen order: array elements before object values before
    /// nested recursion.
    #[must_use]
    pub fn extract(data: &Value) -> UrlBatch {
        let mut batch = UrlBatch::new();
        Self::walk(data, &mut batch);
        batch
    }

    fn walk(data: &Value, batch: &mut UrlBatch) {
        match data {
            Value::Array(items) => {
                for item in items {
                    Self::walk(item, batch);
                }
            }
            Value::Object(map) => {
                for value in map.values() {
                    Self::walk(value, batch);
                }
            }
            Value::String(text) => {
                if Self::is_markup(text) {
                    for url in Self::extract_from_markup(text) {
                        batch.push(url);
                    }
                } else if let Some(url) = MediaUrl::parse(text) {
                    batch.push(url);
                }
            }
            _ => {}
        }
    }

    /// Returns true if the string contains element-like markup tags.
    #[must_use]
    pub fn is_markup(text: &str) -> bool {
        static TAG_RE: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"</?[a-zA-Z][^<>]*>").unwrap());
        TAG_RE.is_match(text)
    }

    /// Extracts every `src` attribute value from a markup string, in
    /// document order.
    #[must_use]
    pub fn extract_from_markup(markup: &str) -> Vec<MediaUrl> {
        static SRC_RE: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r#"<[a-zA-Z][^>]+\ssrc="([^">]+)""#).unwrap());

        SRC_RE
            .captures_iter(markup)
            .filter_map(|cap| cap.get(1))
            .filter_map(|m| MediaUrl::trusted(m.as_str()))
            .collect()
    }
}
