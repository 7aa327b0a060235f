//! End-to-end reconciliation against the SQLite store

mod common;

use likesync_cache::{DatabasePool, SqliteLibraryStore};
use likesync_core::domain::{FailureKind, RunStatus, UNKNOWN_ARTIST};
use likesync_core::ports::{ISyncRunLedger, ITrackStore, SourceError, TrackFilter};
use likesync_sync::{ReconcileEngine, ReconcileOptions};

use common::{day, page, raw, rid, ScriptedSource};

async fn setup() -> SqliteLibraryStore {
    let pool = DatabasePool::in_memory()
        .await
        .expect("Failed to create in-memory database");
    SqliteLibraryStore::new(pool.pool().clone())
}

#[tokio::test]
async fn test_full_cycle_with_sqlite_store() {
    let store = setup().await;
    let engine = ReconcileEngine::new(ReconcileOptions::default());

    // Initial import across two pages
    let first = engine
        .reconcile(
            &ScriptedSource::pages(vec![
                page(vec![raw("t1", "Song A", &["X"], "2024-01-01")], true),
                page(vec![raw("t2", "Song B", &[], "2024-01-02")], false),
            ]),
            &store,
        )
        .await;

    assert_eq!(first.status(), RunStatus::Completed);
    assert_eq!(first.tracks_added(), 2);

    let t2 = store.find_by_remote_id(&rid("t2")).await.unwrap().unwrap();
    assert_eq!(t2.artist_name(), UNKNOWN_ARTIST);
    assert_eq!(t2.liked_at(), Some(day("2024-01-02")));

    // t2 was unliked remotely
    let second = engine
        .reconcile(
            &ScriptedSource::pages(vec![page(
                vec![raw("t1", "Song A", &["X"], "2024-01-01")],
                false,
            )]),
            &store,
        )
        .await;

    assert_eq!(second.status(), RunStatus::Completed);
    assert_eq!(second.tracks_updated(), 1);
    assert_eq!(second.tracks_removed(), 1);

    let liked = store
        .list_tracks(&TrackFilter::new().liked_only())
        .await
        .unwrap();
    assert_eq!(liked.len(), 1);
    assert_eq!(liked[0].remote_id().as_str(), "t1");

    // Both runs are in the ledger, newest first
    let runs = store.recent_runs(10).await.unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].id(), second.id());
    assert_eq!(runs[0].tracks_removed(), 1);

    let latest = store.latest_completed_run().await.unwrap().unwrap();
    assert_eq!(latest.id(), second.id());
}

#[tokio::test]
async fn test_failed_run_is_persisted_with_partial_counts() {
    let store = setup().await;
    let engine = ReconcileEngine::new(ReconcileOptions::default());

    let run = engine
        .reconcile(
            &ScriptedSource::new(vec![
                Ok(page(vec![raw("t1", "Song A", &["X"], "2024-01-01")], true)),
                Err(SourceError::Timeout(std::time::Duration::from_secs(30))),
            ]),
            &store,
        )
        .await;

    assert_eq!(run.status(), RunStatus::Failed);

    let stored = store.get_run(run.id()).await.unwrap().unwrap();
    assert_eq!(stored.status(), RunStatus::Failed);
    assert_eq!(stored.tracks_added(), 1);
    assert_eq!(stored.error_message(), run.error_message());
    assert_eq!(stored.error_kind(), run.error_kind());

    // The pending slot was released
    assert!(store.create_run(chrono::Utc::now()).await.is_ok());
}

#[tokio::test]
async fn test_pending_run_from_another_process_blocks_sync() {
    let store = setup().await;
    let orphan = store.create_run(chrono::Utc::now()).await.unwrap();
    let source = ScriptedSource::pages(vec![page(vec![raw("t1", "A", &["X"], "2024-01-01")], false)]);

    let run = ReconcileEngine::default().reconcile(&source, &store).await;

    assert_eq!(run.status(), RunStatus::Failed);
    assert_eq!(run.error_kind(), Some(FailureKind::Transient));
    assert!(run.error_message().unwrap().contains("already in progress"));
    assert!(source.requests().is_empty());
    assert!(store.get_run(orphan.id()).await.unwrap().unwrap().is_pending());
}

#[tokio::test]
async fn test_oversized_duration_does_not_abort_run() {
    let store = setup().await;
    let mut huge = raw("t1", "Endless", &["X"], "2024-01-01");
    huge.duration_ms = Some(u64::MAX);
    let mut normal = raw("t2", "Short", &["Y"], "2024-01-02");
    normal.duration_ms = Some(180_000);

    let run = ReconcileEngine::default()
        .reconcile(&ScriptedSource::pages(vec![page(vec![huge, normal], false)]), &store)
        .await;

    assert_eq!(run.status(), RunStatus::Completed, "{:?}", run.error_message());
    assert_eq!(run.tracks_added(), 2);

    let t1 = store.find_by_remote_id(&rid("t1")).await.unwrap().unwrap();
    assert_eq!(t1.metadata().duration_ms, None);
    assert_eq!(t1.title(), "Endless");

    let t2 = store.find_by_remote_id(&rid("t2")).await.unwrap().unwrap();
    assert_eq!(t2.metadata().duration_ms, Some(180_000));
}
