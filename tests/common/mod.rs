//! Shared helpers for integration tests

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::broadcast;
use yoink_dl::{Event, TaskId};

pub const EVENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Write an executable `#!/bin/sh` stub downloader into `dir`
#[cfg(unix)]
pub fn write_stub(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("stub-downloader");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

pub async fn next_event(events: &mut broadcast::Receiver<Event>) -> Event {
    tokio::time::timeout(EVENT_TIMEOUT, events.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

/// Receive events until the task reaches a terminal event, inclusive
pub async fn collect_until_terminal(
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
