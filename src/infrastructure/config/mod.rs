//! CLI configuration.

mod app_config;
mod args;

pub use app_config::{LogLevel, PreloadConfig};
pub use args::CliArgs;
