//! Fetch and decode primitive adapters.

pub mod http_fetcher;
pub mod image_decoder;

pub use http_fetcher::HttpMediaFetcher;
pub use image_decoder::ImageMediaDecoder;
