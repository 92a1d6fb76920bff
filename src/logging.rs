//! Lifecycle log sinks
//!
//! The supervisor records task lifecycle lines (queued, started, throttled
//! progress, terminal outcome) through the [`LogSink`] trait. The default
//! [`FileLogSink`] appends timestamped lines to a file without blocking the
//! coordination context: `log` hands the line to a writer task over an
//! unbounded channel and returns immediately.

use async_trait::async_trait;
use std::path::Path;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

/// Destination for task lifecycle lines
///
/// `log` must be cheap and non-blocking since it is called from the
/// supervisor's coordination context. `close` flushes anything buffered and
/// releases the underlying resource.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Record one lifecycle line
    fn log(&self, message: &str);

    /// Flush buffered lines and release the sink
    async fn close(&self);
}

/// Appends timestamped lines to a file via a background writer task
pub struct FileLogSink {
    tx: std::sync::Mutex<Option<mpsc::UnboundedSender<String>>>,
    writer: Mutex<Option<JoinHandle<()>>>,
}

impl FileLogSink {
    /// Open `path` in append mode (created if missing) and start the writer
    pub async fn create(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())
            .await?;

        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        let writer = tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                if let Err(e) = file.write_all(line.as_bytes()).await {
                    tracing::warn!(error = %e, "failed to write log line");
                }
            }
            if let Err(e) = file.flush().await {
                tracing::warn!(error = %e, "failed to flush log file");
            }
        });

        Ok(Self {
            tx: std::sync::Mutex::new(Some(tx)),
            writer: Mutex::new(Some(writer)),
        })
    }
}

#[async_trait]
impl LogSink for FileLogSink {
    fn log(&self, message: &str) {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        let line = format!("[{timestamp}] {message}\n");
        // Lines logged after close are dropped.
        if let Ok(guard) = self.tx.lock() {
            if let Some(tx) = guard.as_ref() {
                let _ = tx.send(line);
            }
        }
    }

    async fn close(&self) {
        // Dropping the sender lets the writer drain buffered lines and exit.
        if let Ok(mut guard) = self.tx.lock() {
            guard.take();
        }
        let handle = self.writer.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "log writer task failed");
            }
        }
    }
}

/// Discards every line; used when no log file is configured
pub struct NoOpLogSink;

#[async_trait]
impl LogSink for NoOpLogSink {
    fn log(&self, _message: &str) {}

    async fn close(&self) {}
}
