//! Command-line argument definitions.

use std::path::PathBuf;

use clap::Parser;

use super::app_config::LogLevel;

/// Command-line arguments for the demo binary.
#[derive(Debug, Parser)]
#[command(
    name = "img-preload",
    version,
    about = "Preloads remote media into the shared disk cache",
    long_about = None
)]
pub struct CliArgs {
    /// Media URLs to preload.
    pub urls: Vec<String>,

    /// JSON file whose nested values are scanned for URLs.
    #[arg(long, value_name = "PATH")]
    pub data_file: Option<PathBuf>,

    /// Disk store directory.
    #[arg(long, value_name = "PATH")]
    pub cache_dir: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Skip the explicit fetch path and decode directly from URLs.
    #[arg(long)]
    pub direct_decode_only: bool,

    /// Request timeout in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Maximum disk store size in bytes.
    #[arg(long, value_name = "BYTES")]
    pub max_store_bytes: Option<u64>,
}
