//! Core types for yoink-dl

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a download task
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl TaskId {
    /// Create a new TaskId
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the inner u64 value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for TaskId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<TaskId> for u64 {
    fn from(id: TaskId) -> Self {
        id.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Task state
///
/// Transitions are monotonic: `Queued → Running → {Succeeded | Failed}`,
/// with `Queued → Failed` when the downloader process cannot be spawned.
/// Once a task reaches a terminal state it never transitions again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    /// Accepted and waiting for the downloader process to start
    Queued,
    /// Downloader process is running
    Running,
    /// Process exited with code 0
    Succeeded,
    /// Process failed to start or exited with a non-zero code
    Failed,
}

impl TaskState {
    /// Returns `true` for `Succeeded` and `Failed`
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Succeeded | TaskState::Failed)
    }
}

/// Snapshot of a single download task
///
/// Owned by the supervisor's coordination context; consumers receive clones
/// and look tasks up by [`TaskId`], never by position.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskInfo {
    /// Unique task identifier
    pub id: TaskId,

    /// The URL handed to the downloader (already trimmed)
    pub url: String,

    /// Current state
    pub state: TaskState,

    /// Completion fraction in [0.0, 1.0]; forced to 1.0 on success
    pub progress: f64,

    /// Failure description (spawn error or exit-code message)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// When the task was enqueued
    pub created_at: DateTime<Utc>,
}

/// Event emitted during the task lifecycle
///
/// Consumers subscribe via [`DownloadSupervisor::subscribe`](crate::DownloadSupervisor::subscribe)
/// and re-render by id lookup. Exactly one of `TaskSucceeded`/`TaskFailed` is
/// emitted per task.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Task accepted into the queue
    TaskQueued {
        /// Task ID
        id: TaskId,
        /// Trimmed URL
        url: String,
    },

    /// Downloader process started
    TaskStarted {
        /// Task ID
        id: TaskId,
    },

    /// Progress fraction observed in the process output
    TaskProgress {
        /// Task ID
        id: TaskId,
        /// Completion fraction in [0.0, 1.0]
        fraction: f64,
    },

    /// Process exited with code 0
    TaskSucceeded {
        /// Task ID
        id: TaskId,
    },

    /// Process failed to start or exited with a non-zero code
    TaskFailed {
        /// Task ID
        id: TaskId,
        /// Error message
        error: String,
        /// Exit code, if the process started and exited on its own
        #[serde(skip_serializing_if = "Option::is_none")]
        exit_code: Option<i32>,
    },

    /// Graceful shutdown initiated
    Shutdown,
}
