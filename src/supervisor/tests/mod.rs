//! Behaviour tests for the supervisor
//!
//! Downloader processes are stubbed with small shell scripts, so the
//! process-spawning tests are Unix-only. Stubs sleep between output lines so
//! each progress report arrives in its own read chunk.

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

mod enqueue;

use crate::config::{Config, DownloaderConfig};
use crate::logging::NoOpLogSink;
use crate::supervisor::DownloadSupervisor;
use crate::types::{Event, TaskId};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

const EVENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Write an executable `#!/bin/sh` stub into `dir`
#[cfg(unix)]
fn write_stub(dir: &std::path::Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("stub-downloader");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

fn config_with_binary(binary: PathBuf) -> Config {
    Config {
        downloader: DownloaderConfig {
            binary_path: Some(binary),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Supervisor wired to `binary` with logging discarded
fn supervisor_for(binary: PathBuf) -> DownloadSupervisor {
    DownloadSupervisor::with_log_sink(config_with_binary(binary), Arc::new(NoOpLogSink))
}

async fn next_event(events: &mut broadcast::Receiver<Event>) -> Event {
    tokio::time::timeout(EVENT_TIMEOUT, events.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

/// Receive events until the task reaches a terminal event, inclusive
async fn collect_until_terminal(
    events: &mut broadcast::Receiver<Event>,
    id: TaskId,
) -> Vec<Event> {
    let mut seen = Vec::new();
    loop {
        let event = next_event(events).await;
        let terminal = matches!(
            &event,
            Event::TaskSucceeded { id: event_id } | Event::TaskFailed { id: event_id, .. }
                if *event_id == id
        );
        seen.push(event);
        if terminal {
            return seen;
        }
    }
}
