//! Enqueue semantics and task queries

use super::*;
use crate::error::Error;
use crate::types::{Event, TaskState};
use std::path::PathBuf;

/// Supervisor whose downloader never resolves; tasks fail at spawn, which is
/// irrelevant for the enqueue-side assertions here.
fn supervisor_without_binary() -> DownloadSupervisor {
    supervisor_for(PathBuf::from("/nonexistent/stub-downloader"))
}

#[tokio::test]
async fn blank_urls_are_ignored() {
    let supervisor = supervisor_without_binary();
    let mut events = supervisor.subscribe();

    assert_eq!(supervisor.enqueue("").unwrap(), None);
    assert_eq!(supervisor.enqueue("   ").unwrap(), None);
    assert_eq!(supervisor.enqueue("\t\n").unwrap(), None);

    // The next accepted URL produces the first event, proving the blanks
    // created no tasks.
    let id = supervisor.enqueue("https://example.com/v").unwrap().unwrap();
    match next_event(&mut events).await {
        Event::TaskQueued { id: queued, url } => {
            assert_eq!(queued, id);
            assert_eq!(url, "https://example.com/v");
        }
        other => panic!("expected TaskQueued, got {:?}", other),
    }

    assert_eq!(supervisor.list_tasks().await.unwrap().len(), 1);
    supervisor.shutdown().await;
}

#[tokio::test]
async fn urls_are_trimmed_before_use() {
    let supervisor = supervisor_without_binary();

    let id = supervisor
        .enqueue("  https://example.com/v  \n")
        .unwrap()
        .unwrap();

    let info = supervisor.get_task(id).await.unwrap();
    assert_eq!(info.url, "https://example.com/v");
    supervisor.shutdown().await;
}

#[tokio::test]
async fn task_ids_are_unique_and_increasing() {
    let supervisor = supervisor_without_binary();

    let a = supervisor.enqueue("https://example.com/a").unwrap().unwrap();
    let b = supervisor.enqueue("https://example.com/b").unwrap().unwrap();
    let c = supervisor.enqueue("https://example.com/c").unwrap().unwrap();

    assert!(a < b && b < c, "ids must be strictly increasing");
    supervisor.shutdown().await;
}

#[tokio::test]
async fn duplicate_urls_get_distinct_tasks() {
    let supervisor = supervisor_without_binary();

    let a = supervisor.enqueue("https://example.com/v").unwrap().unwrap();
    let b = supervisor.enqueue("https://example.com/v").unwrap().unwrap();
    assert_ne!(a, b);

    assert_eq!(supervisor.list_tasks().await.unwrap().len(), 2);
    supervisor.shutdown().await;
}

#[tokio::test]
async fn get_task_reports_unknown_ids() {
    let supervisor = supervisor_without_binary();

    let err = supervisor.get_task(TaskId::new(999)).await.unwrap_err();
    assert!(matches!(err, Error::TaskNotFound(id) if id == TaskId::new(999)));
    supervisor.shutdown().await;
}

#[tokio::test]
async fn list_tasks_is_newest_first() {
    let supervisor = supervisor_without_binary();

    let a = supervisor.enqueue("https://example.com/a").unwrap().unwrap();
    let b = supervisor.enqueue("https://example.com/b").unwrap().unwrap();
    let c = supervisor.enqueue("https://example.com/c").unwrap().unwrap();

    let listing = supervisor.list_tasks().await.unwrap();
    let ids: Vec<TaskId> = listing.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![c, b, a]);
    supervisor.shutdown().await;
}

#[tokio::test]
async fn enqueued_task_starts_in_queued_state() {
    let supervisor = supervisor_without_binary();
    let mut events = supervisor.subscribe();

    let id = supervisor.enqueue("https://example.com/v").unwrap().unwrap();

    // Before any process update can possibly have been applied, the queued
    // event itself carries the initial picture.
    match next_event(&mut events).await {
        Event::TaskQueued { id: queued, .. } => assert_eq!(queued, id),
        other => panic!("expected TaskQueued first, got {:?}", other),
    }

    // The binary does not exist, so the task ends Failed; its record survives
    // with the failure attached.
    collect_until_terminal(&mut events, id).await;
    let info = supervisor.get_task(id).await.unwrap();
    assert_eq!(info.state, TaskState::Failed);
    assert!(info.error.is_some());
    supervisor.shutdown().await;
}

#[tokio::test]
async fn enqueue_after_shutdown_is_rejected() {
    let supervisor = supervisor_without_binary();
    supervisor.shutdown().await;

    let err = supervisor.enqueue("https://example.com/v").unwrap_err();
    assert!(matches!(err, Error::ShuttingDown));

    let err = supervisor.list_tasks().await.unwrap_err();
    assert!(matches!(err, Error::ShuttingDown));
}

#[tokio::test]
async fn shutdown_is_idempotent_and_emits_event() {
    let supervisor = supervisor_without_binary();
    let mut events = supervisor.subscribe();

    supervisor.shutdown().await;
    supervisor.shutdown().await;

    match next_event(&mut events).await {
        Event::Shutdown => {}
        other => panic!("expected Shutdown, got {:?}", other),
    }
}
