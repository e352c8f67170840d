//! Domain error types.

mod preload_error;

pub use preload_error::{PreloadError, PreloadResult};
