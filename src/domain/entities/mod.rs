//! Domain entity definitions.

mod media_url;
mod outcome;

pub use media_url::{MediaUrl, UrlBatch};
pub use outcome::{LoadOutcome, MediaStatus};
