//! # yoink-dl
//!
//! Embeddable supervisor library for external yt-dlp-style downloader
//! processes.
//!
//! yoink-dl is designed to be:
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Event-driven** - Consumers subscribe to events, no polling required
//! - **Fault-contained** - A failed download never takes down the supervisor
//!
//! Each queued URL gets its own downloader process. The supervisor parses
//! `[download]  N%` progress lines from the process output, drives the task
//! through `Queued → Running → {Succeeded | Failed}`, republishes every
//! transition as an [`Event`], and appends a throttled lifecycle log.
//!
//! ## Quick Start
//!
//! ```no_run
//! use yoink_dl::{Config, DownloadSupervisor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let supervisor = DownloadSupervisor::new(Config::default()).await?;
//!
//!     // Subscribe to events
//!     let mut events = supervisor.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     supervisor.enqueue("https://example.com/watch?v=abc123")?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Lifecycle log sinks
pub mod logging;
/// Progress line parsing
pub mod progress;
/// Core supervisor implementation
pub mod supervisor;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use config::{Config, DownloaderConfig, EventsConfig, LoggingConfig};
pub use error::{Error, Result};
pub use logging::{FileLogSink, LogSink, NoOpLogSink};
pub use supervisor::DownloadSupervisor;
pub use types::{Event, TaskId, TaskInfo, TaskState};

/// Helper function to run the supervisor with graceful signal handling.
///
/// Waits for a termination signal and then calls the supervisor's
/// `shutdown()` method.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with a `ctrl_c` fallback if
///   signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use yoink_dl::{Config, DownloadSupervisor, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let supervisor = DownloadSupervisor::new(Config::default()).await?;
///     run_with_shutdown(supervisor).await;
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(supervisor: DownloadSupervisor) {
    wait_for_signal().await;
    supervisor.shutdown().await;
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Signal registration may fail in restricted environments (containers, tests)
    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Ok(mut sigterm), Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            sigterm.recv().await;
        }
        (Err(e), Ok(mut sigint)) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            sigint.recv().await;
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "Could not register signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
