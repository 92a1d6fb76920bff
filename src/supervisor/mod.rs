//! Download supervisor
//!
//! [`DownloadSupervisor`] is the embeddable façade: it accepts URLs, spawns
//! one downloader process per task, republishes lifecycle events over a
//! broadcast channel, and answers queries about current task state. The
//! actual state machine runs inside a dedicated coordination task; see the
//! [`coordinator`] module.

mod coordinator;
mod process;
mod registry;

#[cfg(test)]
mod tests;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::{FileLogSink, LogSink, NoOpLogSink};
use crate::types::{Event, TaskId, TaskInfo};
use coordinator::{Command, Coordinator};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;

/// Supervises external downloader processes
///
/// Cheap to share behind an `Arc`; every method takes `&self`. Lifecycle
/// events are observed through [`subscribe`](Self::subscribe), state through
/// the query methods. Call [`shutdown`](Self::shutdown) once when done.
pub struct DownloadSupervisor {
    events: broadcast::Sender<Event>,
    commands: mpsc::UnboundedSender<Command>,
    next_id: AtomicU64,
    coordinator: Mutex<Option<JoinHandle<()>>>,
    log: Arc<dyn LogSink>,
}

impl std::fmt::Debug for DownloadSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadSupervisor")
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

impl DownloadSupervisor {
    /// Create a supervisor from configuration
    ///
    /// Opens the lifecycle log file when one is configured and starts the
    /// coordination task.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for invalid settings and [`Error::Io`] when
    /// the log file cannot be opened.
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let log: Arc<dyn LogSink> = match &config.logging.log_file {
            Some(path) => Arc::new(FileLogSink::create(path).await?),
            None => Arc::new(NoOpLogSink),
        };

        Ok(Self::with_log_sink(config, log))
    }

    /// Create a supervisor with an explicit log sink
    ///
    /// The configured `log_file` is ignored; `config` must already be valid.
    pub fn with_log_sink(config: Config, log: Arc<dyn LogSink>) -> Self {
        let (events, _) = broadcast::channel(config.events.channel_capacity);
        let (commands, command_rx) = mpsc::unbounded_channel();

        let coordinator =
            Coordinator::new(config, command_rx, events.clone(), Arc::clone(&log));
        let handle = tokio::spawn(coordinator.run());

        Self {
            events,
            commands,
            next_id: AtomicU64::new(1),
            coordinator: Mutex::new(Some(handle)),
            log,
        }
    }

    /// Subscribe to lifecycle events
    ///
    /// Only events emitted after this call are received. A subscriber that
    /// falls more than the configured channel capacity behind observes a
    /// [`broadcast::error::RecvError::Lagged`] and continues from the oldest
    /// retained event.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Queue a download for `url`
    ///
    /// The URL is trimmed first; a blank URL is ignored and yields
    /// `Ok(None)`. Otherwise the task id is returned immediately and the
    /// download proceeds in the background, reporting through events.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShuttingDown`] after [`shutdown`](Self::shutdown).
    pub fn enqueue(&self, url: &str) -> Result<Option<TaskId>> {
        let url = url.trim();
        if url.is_empty() {
            return Ok(None);
        }

        let id = TaskId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.commands
            .send(Command::Enqueue {
                id,
                url: url.to_string(),
            })
            .map_err(|_| Error::ShuttingDown)?;

        Ok(Some(id))
    }

    /// Fetch a snapshot of one task
    ///
    /// # Errors
    ///
    /// Returns [`Error::TaskNotFound`] for an unknown id and
    /// [`Error::ShuttingDown`] once the supervisor has stopped.
    pub async fn get_task(&self, id: TaskId) -> Result<TaskInfo> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::GetTask { id, reply })
            .map_err(|_| Error::ShuttingDown)?;
        rx.await
            .map_err(|_| Error::ShuttingDown)?
            .ok_or(Error::TaskNotFound(id))
    }

    /// Snapshot all tasks, newest first
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShuttingDown`] once the supervisor has stopped.
    pub async fn list_tasks(&self) -> Result<Vec<TaskInfo>> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::ListTasks { reply })
            .map_err(|_| Error::ShuttingDown)?;
        rx.await.map_err(|_| Error::ShuttingDown)
    }

    /// Whether the task's downloader process is still running
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShuttingDown`] once the supervisor has stopped.
    pub async fn is_active(&self, id: TaskId) -> Result<bool> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::IsActive { id, reply })
            .map_err(|_| Error::ShuttingDown)?;
        rx.await.map_err(|_| Error::ShuttingDown)
    }

    /// Stop the supervisor
    ///
    /// Emits [`Event::Shutdown`], stops the coordination task and flushes the
    /// lifecycle log. Downloader processes already running are left to finish
    /// on their own; no further events are emitted for them. Idempotent.
    pub async fn shutdown(&self) {
        let (reply, rx) = oneshot::channel();
        if self.commands.send(Command::Shutdown { reply }).is_ok() {
            let _ = rx.await;
        }

        let handle = self.coordinator.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "coordination task failed");
            }
        }

        self.log.close().await;
    }
}
