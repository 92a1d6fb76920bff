//! Configuration types for yoink-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Downloader binary resolution settings
///
/// Groups settings for locating and invoking the external downloader.
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloaderConfig {
    /// Explicit path to the downloader executable (skips PATH discovery)
    #[serde(default)]
    pub binary_path: Option<PathBuf>,

    /// Binary name to look up when no explicit path is set (default: "yt-dlp")
    #[serde(default = "default_binary_name")]
    pub binary_name: String,

    /// Whether to search PATH for the binary if no explicit path is set (default: true)
    ///
    /// When disabled, the bare binary name is handed to the OS loader and
    /// resolution happens at spawn time instead.
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            binary_path: None,
            binary_name: default_binary_name(),
            search_path: true,
        }
    }
}

/// Lifecycle log settings
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Path of the append-only log file (None = no file logging)
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Minimum progress delta before another progress line is logged (default: 0.05)
    ///
    /// A progress report is logged when the fraction reaches 1.0 or has moved
    /// at least this far past the last logged value for the task. Bounds log
    /// volume under high-frequency progress chunks.
    #[serde(default = "default_progress_log_threshold")]
    pub progress_log_threshold: f64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_file: None,
            progress_log_threshold: default_progress_log_threshold(),
        }
    }
}

/// Event broadcast settings
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Broadcast channel capacity (default: 1000)
    ///
    /// A subscriber that falls further behind than this receives a
    /// `RecvError::Lagged` and misses the overwritten events.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

/// Main configuration for [`DownloadSupervisor`](crate::DownloadSupervisor)
///
/// Fields are organized into logical sub-configs:
/// - [`downloader`](DownloaderConfig) — binary resolution
/// - [`logging`](LoggingConfig) — log file and progress throttling
/// - [`events`](EventsConfig) — broadcast channel sizing
///
/// All sub-config fields are flattened, so the JSON/TOML format has no
/// nesting and every field is optional.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Downloader binary resolution
    #[serde(flatten)]
    pub downloader: DownloaderConfig,

    /// Log file and progress throttling
    #[serde(flatten)]
    pub logging: LoggingConfig,

    /// Event broadcast sizing
    #[serde(flatten)]
    pub events: EventsConfig,
}

impl Config {
    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the offending key when a value is out
    /// of range.
    pub fn validate(&self) -> Result<()> {
        if self.downloader.binary_name.trim().is_empty() {
            return Err(Error::Config {
                message: "binary_name must not be empty".to_string(),
                key: Some("binary_name".to_string()),
            });
        }

        let threshold = self.logging.progress_log_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(Error::Config {
                message: format!(
                    "progress_log_threshold must be in (0.0, 1.0], got {}",
                    threshold
                ),
                key: Some("progress_log_threshold".to_string()),
            });
        }

        if self.events.channel_capacity == 0 {
            return Err(Error::Config {
                message: "channel_capacity must be at least 1".to_string(),
                key: Some("channel_capacity".to_string()),
            });
        }

        Ok(())
    }
}

fn default_binary_name() -> String {
    "yt-dlp".to_string()
}

fn default_true() -> bool {
    true
}

fn default_progress_log_threshold() -> f64 {
    0.05
}

fn default_channel_capacity() -> usize {
    1000
}
