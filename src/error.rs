//! Error types for yoink-dl
//!
//! Failures inside a running task (spawn errors, non-zero exits, unreadable
//! output) never surface through this module to callers — they are contained
//! at the task level and reported as [`Event::TaskFailed`](crate::Event)
//! events. The variants here cover API misuse and supervisor lifecycle.

use crate::types::TaskId;
use thiserror::Error;

/// Result type alias for yoink-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for yoink-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "progress_log_threshold")
        key: Option<String>,
    },

    /// The downloader process could not be spawned
    #[error("failed to start downloader for {url}: {reason}")]
    Spawn {
        /// The URL the task was created for
        url: String,
        /// Description of the underlying OS error
        reason: String,
    },

    /// The downloader binary could not be found
    #[error("downloader binary '{name}' not found")]
    BinaryNotFound {
        /// The binary name that was searched for
        name: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No task with the given id exists
    #[error("task {0} not found")]
    TaskNotFound(TaskId),

    /// Shutdown in progress - not accepting new tasks
    #[error("shutdown in progress: not accepting new tasks")]
    ShuttingDown,
}
