use std::sync::Arc;

use anyhow::Result;
use sneakersecure_lib::bootstrap::{AppBootstrap, BootstrapStatus, RESTART_HINT};
use sneakersecure_lib::catalog::{CatalogSeeder, SeedOutcome, CATALOG_KEY};
use sneakersecure_lib::db::CollectionDatabase;
use sneakersecure_lib::migration::{
    MigrationCoordinator, MigrationOutcome, LEGACY_COLLECTION_KEY, MIGRATION_FLAG_KEY,
};
use sneakersecure_lib::state::AppState;
use sneakersecure_lib::store::StoreHandle;

mod util;
use util::{RecordingDatabase, RecordingStore};

fn bootstrap(store: StoreHandle, db: Arc<dyn CollectionDatabase>) -> AppBootstrap {
    let seeder = CatalogSeeder::new(store.clone());
    let migration = MigrationCoordinator::new(store, db.clone());
    AppBootstrap::new(db, seeder, migration)
}

fn error_code(status: &BootstrapStatus) -> Option<&str> {
    match status {
        BootstrapStatus::Error(err) => Some(err.code()),
        _ => None,
    }
}

#[tokio::test]
async fn status_starts_loading_and_ends_ready() -> Result<()> {
    let store = RecordingStore::new();
    let db = RecordingDatabase::accepting();
    let app = bootstrap(store.handle(), db.clone());
    let mut rx = app.subscribe();
    assert_eq!(*rx.borrow(), BootstrapStatus::Loading);
    assert_eq!(app.status(), BootstrapStatus::Loading);

    let report = app.run().await;

    assert_eq!(report.status, BootstrapStatus::Ready);
    assert!(rx.has_changed()?);
    assert_eq!(*rx.borrow_and_update(), BootstrapStatus::Ready);
    assert_eq!(report.seed, Some(SeedOutcome::Seeded { count: 3 }));
    assert!(matches!(report.migration, Some(MigrationOutcome::NoLegacyData)));
    assert_eq!(db.init_calls(), 1);
    assert!(store.handle().get(CATALOG_KEY).await?.is_some());
    Ok(())
}

#[tokio::test]
async fn steps_run_in_order() -> Result<()> {
    let store = RecordingStore::new();
    let app = bootstrap(store.handle(), RecordingDatabase::accepting());
    app.run().await;

    let ops = store.ops();
    let first_catalog = ops.iter().position(|op| op.ends_with(CATALOG_KEY));
    let first_flag = ops.iter().position(|op| op.ends_with(MIGRATION_FLAG_KEY));
    assert!(first_catalog.is_some());
    assert!(first_catalog < first_flag);
    Ok(())
}

#[tokio::test]
async fn database_failure_stops_before_the_catalog() -> Result<()> {
    let store = RecordingStore::new();
    let db = RecordingDatabase::failing_init("disk full");
    let app = bootstrap(store.handle(), db.clone());

    let report = app.run().await;

    assert_eq!(error_code(&report.status), Some("DB/INIT"));
    if let BootstrapStatus::Error(err) = &report.status {
        assert_eq!(err.cause().map(|c| c.code()), Some("TEST/INIT"));
        assert_eq!(
            err.context().get("step").map(String::as_str),
            Some("initialize_database")
        );
    }
    assert_eq!(
        report.status.user_message().as_deref(),
        Some("Database error: Failed to initialize the database")
    );
    assert!(store.ops().is_empty());
    assert!(report.seed.is_none());
    assert!(report.migration.is_none());
    assert_eq!(app.status(), report.status);
    Ok(())
}

#[tokio::test]
async fn seed_failure_is_fatal_and_skips_migration() -> Result<()> {
    let store = RecordingStore::new();
    store.fail_writes_of(CATALOG_KEY);
    let db = RecordingDatabase::accepting();
    let app = bootstrap(store.handle(), db.clone());

    let report = app.run().await;

    assert_eq!(error_code(&report.status), Some("CATALOG/SEED"));
    assert!(report.migration.is_none());
    assert!(!store.touched(MIGRATION_FLAG_KEY));
    assert!(db.imports().is_empty());
    Ok(())
}

#[tokio::test]
async fn failed_migration_still_reaches_ready() -> Result<()> {
    let store = RecordingStore::new();
    store.handle().set(LEGACY_COLLECTION_KEY, "{broken").await?;
    let app = bootstrap(store.handle(), RecordingDatabase::accepting());

    let report = app.run().await;

    assert_eq!(report.status, BootstrapStatus::Ready);
    assert!(matches!(report.migration, Some(MigrationOutcome::Failed(_))));
    assert_eq!(store.handle().get(MIGRATION_FLAG_KEY).await?, None);
    Ok(())
}

#[tokio::test]
async fn second_launch_is_a_no_op() -> Result<()> {
    let store = RecordingStore::new();
    store
        .handle()
        .set(LEGACY_COLLECTION_KEY, r#"[{"id":"a","name":"Air Jordan 1"}]"#)
        .await?;
    let db = RecordingDatabase::accepting();
    let app = bootstrap(store.handle(), db.clone());

    let first = app.run().await;
    assert!(matches!(first.migration, Some(MigrationOutcome::Migrated { count: 1 })));
    let catalog = store.handle().get(CATALOG_KEY).await?;

    let second = app.run().await;
    assert_eq!(second.status, BootstrapStatus::Ready);
    assert_eq!(second.seed, Some(SeedOutcome::AlreadyPresent));
    assert!(matches!(second.migration, Some(MigrationOutcome::AlreadyDone)));
    assert_eq!(store.handle().get(CATALOG_KEY).await?, catalog);
    assert_eq!(db.imports().len(), 1);
    Ok(())
}

#[tokio::test]
async fn panic_during_migration_is_fatal() -> Result<()> {
    let store = RecordingStore::new();
    store
        .handle()
        .set(LEGACY_COLLECTION_KEY, r#"[{"id":"a","name":"Air Jordan 1"}]"#)
        .await?;
    let app = bootstrap(store.handle(), RecordingDatabase::panicking());

    let report = app.run().await;

    assert_eq!(error_code(&report.status), Some("RUNTIME/PANIC"));
    assert!(report.migration.is_none());
    assert_eq!(store.handle().get(MIGRATION_FLAG_KEY).await?, None);
    Ok(())
}

#[test]
fn status_serializes_with_a_state_tag() -> Result<()> {
    assert_eq!(
        serde_json::to_value(BootstrapStatus::Ready)?,
        serde_json::json!({ "state": "ready" })
    );
    assert_eq!(BootstrapStatus::Loading.user_message(), None);
    assert_eq!(RESTART_HINT, "Try restarting the app.");
    Ok(())
}

#[tokio::test]
async fn sqlite_backed_state_migrates_legacy_records() -> Result<()> {
    let store = StoreHandle::in_memory();
    store
        .set(
            LEGACY_COLLECTION_KEY,
            r#"[{"id":"b","name":"Yeezy Boost 350"},{"id":"a","name":"Air Jordan 1"}]"#,
        )
        .await?;
    let state = AppState::from_parts(store, util::memory_db().await);

    let report = state.bootstrap.run().await;
    assert_eq!(report.status, BootstrapStatus::Ready);

    let names: Vec<String> = state
        .db
        .list_collection()
        .await?
        .into_iter()
        .map(|item| item.name)
        .collect();
    assert_eq!(names, vec!["Air Jordan 1", "Yeezy Boost 350"]);
    assert!(state.migration.is_completed().await?);
    assert_eq!(state.catalog.get_all().await.len(), 3);
    Ok(())
}
