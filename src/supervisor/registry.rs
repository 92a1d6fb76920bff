//! Bookkeeping for tasks with a live downloader process
//!
//! Owned exclusively by the coordination context, so no locking. Tracks the
//! process task handle and the per-task throttle state for lifecycle logging.

use crate::types::TaskId;
use std::collections::HashMap;
use tokio::task::JoinHandle;

/// Per-task record kept while the downloader process is alive
struct ActiveTask {
    process: JoinHandle<()>,
    /// Last progress fraction written to the lifecycle log
    ///
    /// Starts at 0.0 so the initial 0% report is not logged; the first line
    /// appears once progress has moved a full threshold past zero.
    last_logged_progress: f64,
}

/// Registry of tasks whose downloader process has not yet exited
#[derive(Default)]
pub(crate) struct ActiveRegistry {
    tasks: HashMap<TaskId, ActiveTask>,
}

impl ActiveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a newly spawned process task
    pub fn register(&mut self, id: TaskId, process: JoinHandle<()>) {
        let previous = self.tasks.insert(
            id,
            ActiveTask {
                process,
                last_logged_progress: 0.0,
            },
        );
        debug_assert!(previous.is_none(), "task {id} registered twice");
        if previous.is_some() {
            tracing::error!(task_id = %id, "task registered twice, dropping earlier record");
        }
    }

    /// Stop tracking a task once its process has exited
    ///
    /// Returns the process task handle so the caller can await final cleanup
    /// if it cares; usually it is simply dropped, already finished.
    pub fn unregister(&mut self, id: TaskId) -> Option<JoinHandle<()>> {
        self.tasks.remove(&id).map(|task| task.process)
    }

    pub fn is_active(&self, id: TaskId) -> bool {
        self.tasks.contains_key(&id)
    }

    pub fn active_count(&self) -> usize {
        self.tasks.len()
    }

    /// Decide whether a progress report warrants a log line
    ///
    /// A line is due when the fraction reaches 1.0 or has advanced at least
    /// `threshold` past the last logged value. Advances the stored mark when
    /// it answers yes. Unknown tasks never log.
    pub fn should_log_progress(&mut self, id: TaskId, fraction: f64, threshold: f64) -> bool {
        let Some(task) = self.tasks.get_mut(&id) else {
            return false;
        };
        if fraction >= 1.0 || fraction - task.last_logged_progress >= threshold {
            task.last_logged_progress = fraction;
            true
        } else {
            false
        }
    }
}
