//! The coordination context
//!
//! All task state lives inside a single spawned task that owns the arena of
//! [`TaskInfo`] records and the active-process registry. The façade and the
//! per-process tasks talk to it over channels, so state transitions are
//! applied in exactly one place and need no locking.

use crate::config::Config;
use crate::logging::LogSink;
use crate::supervisor::process::{self, ProcessEvent, TaskUpdate};
use crate::supervisor::registry::ActiveRegistry;
use crate::types::{Event, TaskId, TaskInfo, TaskState};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};

/// Request from the façade to the coordination context
#[derive(Debug)]
pub(crate) enum Command {
    Enqueue {
        id: TaskId,
        url: String,
    },
    GetTask {
        id: TaskId,
        reply: oneshot::Sender<Option<TaskInfo>>,
    },
    ListTasks {
        reply: oneshot::Sender<Vec<TaskInfo>>,
    },
    IsActive {
        id: TaskId,
        reply: oneshot::Sender<bool>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

pub(crate) struct Coordinator {
    config: Config,
    tasks: HashMap<TaskId, TaskInfo>,
    /// Insertion order; reversed for newest-first listings
    order: Vec<TaskId>,
    registry: ActiveRegistry,
    commands: mpsc::UnboundedReceiver<Command>,
    updates: mpsc::UnboundedReceiver<TaskUpdate>,
    /// Handed to each spawned process task
    update_tx: mpsc::UnboundedSender<TaskUpdate>,
    events: broadcast::Sender<Event>,
    log: Arc<dyn LogSink>,
}

impl Coordinator {
    pub fn new(
        config: Config,
        commands: mpsc::UnboundedReceiver<Command>,
        events: broadcast::Sender<Event>,
        log: Arc<dyn LogSink>,
    ) -> Self {
        let (update_tx, updates) = mpsc::unbounded_channel();
        Self {
            config,
            tasks: HashMap::new(),
            order: Vec::new(),
            registry: ActiveRegistry::new(),
            commands,
            updates,
            update_tx,
            events,
            log,
        }
    }

    pub async fn run(mut self) {
        loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(Command::Shutdown { reply }) => {
                        self.shutdown();
                        let _ = reply.send(());
                        break;
                    }
                    Some(cmd) => self.handle_command(cmd),
                    // Façade dropped without an explicit shutdown.
                    None => break,
                },
                Some(update) = self.updates.recv() => self.handle_update(update),
            }
        }
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Enqueue { id, url } => self.enqueue(id, url),
            Command::GetTask { id, reply } => {
                let _ = reply.send(self.tasks.get(&id).cloned());
            }
            Command::ListTasks { reply } => {
                let listing = self
                    .order
                    .iter()
                    .rev()
                    .filter_map(|id| self.tasks.get(id).cloned())
                    .collect();
                let _ = reply.send(listing);
            }
            Command::IsActive { id, reply } => {
                let _ = reply.send(self.registry.is_active(id));
            }
            // Intercepted in run(); answering here keeps the arm total.
            Command::Shutdown { reply } => {
                let _ = reply.send(());
            }
        }
    }

    fn enqueue(&mut self, id: TaskId, url: String) {
        let info = TaskInfo {
            id,
            url: url.clone(),
            state: TaskState::Queued,
            progress: 0.0,
            error: None,
            created_at: chrono::Utc::now(),
        };
        self.tasks.insert(id, info);
        self.order.push(id);

        self.emit(Event::TaskQueued {
            id,
            url: url.clone(),
        });
        self.log.log(&format!("Queued task {id}: {url}"));

        match process::resolve_binary(&self.config.downloader) {
            Ok(binary) => {
                let handle = tokio::spawn(process::run_downloader(
                    id,
                    url,
                    binary,
                    self.update_tx.clone(),
                ));
                self.registry.register(id, handle);
            }
            Err(e) => self.fail_task(id, e.to_string(), None),
        }
    }

    fn handle_update(&mut self, update: TaskUpdate) {
        let TaskUpdate { id, event } = update;

        // Updates for terminal tasks are ignored, keeping the terminal
        // transition a one-shot no matter what straggles in.
        let is_terminal = match self.tasks.get(&id) {
            Some(task) => task.state.is_terminal(),
            None => {
                tracing::warn!(task_id = %id, "update for unknown task");
                return;
            }
        };
        if is_terminal {
            return;
        }

        match event {
            ProcessEvent::Started => {
                if let Some(task) = self.tasks.get_mut(&id) {
                    task.state = TaskState::Running;
                }
                self.emit(Event::TaskStarted { id });
                self.log.log(&format!("Task {id} started"));
            }
            ProcessEvent::Progress(fraction) => {
                if let Some(task) = self.tasks.get_mut(&id) {
                    task.progress = fraction;
                }
                self.emit(Event::TaskProgress { id, fraction });
                let threshold = self.config.logging.progress_log_threshold;
                if self.registry.should_log_progress(id, fraction, threshold) {
                    self.log
                        .log(&format!("Task {id} progress: {:.1}%", fraction * 100.0));
                }
            }
            ProcessEvent::Exited(Some(0)) => {
                self.registry.unregister(id);
                if let Some(task) = self.tasks.get_mut(&id) {
                    task.progress = 1.0;
                    task.state = TaskState::Succeeded;
                }
                self.emit(Event::TaskProgress { id, fraction: 1.0 });
                self.emit(Event::TaskSucceeded { id });
                self.log.log(&format!("Task {id} succeeded"));
            }
            ProcessEvent::Exited(code) => {
                self.registry.unregister(id);
                let error = match code {
                    Some(code) => format!("downloader exited with code {code}"),
                    None => "downloader terminated by signal".to_string(),
                };
                self.fail_task(id, error, code);
            }
            ProcessEvent::SpawnFailed(reason) => {
                self.registry.unregister(id);
                self.fail_task(id, reason, None);
            }
        }
    }

    fn fail_task(&mut self, id: TaskId, error: String, exit_code: Option<i32>) {
        if let Some(task) = self.tasks.get_mut(&id) {
            task.state = TaskState::Failed;
            task.error = Some(error.clone());
        }
        self.emit(Event::TaskFailed {
            id,
            error: error.clone(),
            exit_code,
        });
        self.log.log(&format!("Task {id} failed: {error}"));
    }

    fn shutdown(&mut self) {
        let active = self.registry.active_count();
        if active > 0 {
            tracing::info!(active, "shutting down with downloads still running");
        }
        self.emit(Event::Shutdown);
        self.log.log("Supervisor shut down");
    }

    fn emit(&self, event: Event) {
        // Err means no live subscribers, which is fine.
        let _ = self.events.send(event);
    }
}
