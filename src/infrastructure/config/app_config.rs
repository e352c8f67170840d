//! Application configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::application::services::PlatformProfile;
use crate::infrastructure::cache::DEFAULT_MAX_STORE_SIZE;
use crate::infrastructure::media::http_fetcher::DEFAULT_TIMEOUT_SECS;

use super::CliArgs;

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Resolved configuration for the demo binary.
#[derive(Debug, Clone)]
pub struct PreloadConfig {
    /// Explicit URLs to preload.
    pub urls: Vec<String>,
    /// JSON file whose nested values are scanned for URLs.
    pub data_file: Option<PathBuf>,
    /// Disk store directory; platform cache dir when absent.
    pub cache_dir: Option<PathBuf>,
    /// Log file path; stderr when absent.
    pub log_path: Option<PathBuf>,
    /// Log verbosity level.
    pub log_level: LogLevel,
    /// Platform capability profile.
    pub profile: PlatformProfile,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum disk store size in bytes.
    pub max_store_bytes: u64,
}

impl From<CliArgs> for PreloadConfig {
    fn from(args: CliArgs) -> Self {
        Self {
            urls: args.urls,
            data_file: args.data_file,
            cache_dir: args.cache_dir,
            log_path: args.log_path,
            log_level: args.log_level.unwrap_or_default(),
            profile: if args.direct_decode_only {
                PlatformProfile::QuirkyFetchCache
            } else {
                PlatformProfile::Standard
            },
            timeout_secs: args.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            max_store_bytes: args.max_store_bytes.unwrap_or(DEFAULT_MAX_STORE_SIZE),
        }
    }
}
