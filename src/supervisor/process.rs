//! Downloader process spawning and output capture
//!
//! One external downloader process per task. The process's stdout and stderr
//! are both captured: progress lines normally arrive on stderr for yt-dlp
//! style tools, but tools differ, so both streams feed the same parser.
//!
//! Output is consumed in raw chunks rather than lines because downloaders
//! redraw progress with carriage returns and never emit a newline until the
//! transfer ends. Waiting for `\n` would report no progress at all.

use crate::config::DownloaderConfig;
use crate::error::{Error, Result};
use crate::progress::parse_progress;
use crate::types::TaskId;
use futures::future::join_all;
use std::ffi::OsString;
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::sync::mpsc;

const READ_CHUNK_SIZE: usize = 4096;

/// Observation about a running downloader, sent to the coordination context
#[derive(Debug)]
pub(crate) enum ProcessEvent {
    /// The process spawned successfully
    Started,
    /// A progress fraction was parsed from the output
    Progress(f64),
    /// The process exited; `None` when it was killed by a signal
    Exited(Option<i32>),
    /// The process could not be spawned
    SpawnFailed(String),
}

/// A [`ProcessEvent`] tagged with the task it belongs to
#[derive(Debug)]
pub(crate) struct TaskUpdate {
    pub id: TaskId,
    pub event: ProcessEvent,
}

/// Resolve the downloader executable to invoke
///
/// An explicit `binary_path` wins. Otherwise the name is looked up on PATH
/// when `search_path` is set, failing with [`Error::BinaryNotFound`] when
/// absent; with `search_path` off the bare name is returned and resolution
/// is left to the OS at spawn time.
pub(crate) fn resolve_binary(config: &DownloaderConfig) -> Result<OsString> {
    if let Some(path) = &config.binary_path {
        return Ok(path.clone().into_os_string());
    }

    if config.search_path {
        let path = which::which(&config.binary_name).map_err(|_| Error::BinaryNotFound {
            name: config.binary_name.clone(),
        })?;
        return Ok(path.into_os_string());
    }

    Ok(OsString::from(&config.binary_name))
}

/// Spawn the downloader for one task and stream its output as updates
///
/// Sends `Started` (or `SpawnFailed`) immediately, then `Progress` updates as
/// parseable chunks arrive, and exactly one `Exited` after both output
/// streams have drained. Never returns an error to the caller: spawn
/// failures are reported through the update channel so the coordination
/// context applies the state transition in one place.
pub(crate) async fn run_downloader(
    id: TaskId,
    url: String,
    binary: OsString,
    updates: mpsc::UnboundedSender<TaskUpdate>,
) {
    let mut child = match Command::new(&binary)
        .arg(&url)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            tracing::warn!(task_id = %id, url = %url, error = %e, "failed to spawn downloader");
            let err = Error::Spawn {
                url,
                reason: e.to_string(),
            };
            let _ = updates.send(TaskUpdate {
                id,
                event: ProcessEvent::SpawnFailed(err.to_string()),
            });
            return;
        }
    };

    tracing::debug!(task_id = %id, url = %url, "downloader spawned");
    let _ = updates.send(TaskUpdate {
        id,
        event: ProcessEvent::Started,
    });

    let mut readers = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        readers.push(tokio::spawn(read_stream(id, stdout, updates.clone())));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(tokio::spawn(read_stream(id, stderr, updates.clone())));
    }

    let status = child.wait().await;

    // Drain remaining output before the terminal update so no Progress ever
    // trails the Exited for this task.
    join_all(readers).await;

    let exit_code = match status {
        Ok(status) => status.code(),
        Err(e) => {
            tracing::warn!(task_id = %id, error = %e, "failed to wait on downloader");
            None
        }
    };

    let _ = updates.send(TaskUpdate {
        id,
        event: ProcessEvent::Exited(exit_code),
    });
}

/// Read one output stream in raw chunks, forwarding parsed progress
///
/// Non-UTF-8 chunks are dropped silently; a later intact chunk supersedes
/// whatever was missed. Read errors end the loop, same as EOF.
async fn read_stream<R>(id: TaskId, mut stream: R, updates: mpsc::UnboundedSender<TaskUpdate>)
where
    R: AsyncReadExt + Unpin,
{
    let mut buf = [0u8; READ_CHUNK_SIZE];
    loop {
        match stream.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                let Ok(text) = std::str::from_utf8(&buf[..n]) else {
                    continue;
                };
                if let Some(fraction) = parse_progress(text) {
                    let _ = updates.send(TaskUpdate {
                        id,
                        event: ProcessEvent::Progress(fraction),
                    });
                }
            }
            Err(e) => {
                tracing::debug!(task_id = %id, error = %e, "downloader stream read ended");
                break;
            }
        }
    }
}
