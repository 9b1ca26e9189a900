//! Startup sequence: database, catalog, then the legacy migration.
//!
//! Steps run strictly one after another. The first two are required for
//! the app to be usable; the migration is best-effort and only a panic in
//! it stops the app from becoming ready.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::catalog::{CatalogSeeder, SeedOutcome};
use crate::db::CollectionDatabase;
use crate::error::{AppError, AppResult};
use crate::migration::{MigrationCoordinator, MigrationOutcome};
use crate::util::dispatch_async_with_fence;

pub const RESTART_HINT: &str = "Try restarting the app.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "error", rename_all = "snake_case")]
pub enum BootstrapStatus {
    Loading,
    Ready,
    Error(AppError),
}

impl BootstrapStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, BootstrapStatus::Ready)
    }

    /// Text for the blocking error screen, if there is one to show.
    pub fn user_message(&self) -> Option<String> {
        match self {
            BootstrapStatus::Error(err) => Some(format!("Database error: {}", err.message())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapStep {
    InitializeDatabase,
    SeedCatalog,
    MigrateCollection,
}

impl BootstrapStep {
    pub const ORDER: [BootstrapStep; 3] = [
        BootstrapStep::InitializeDatabase,
        BootstrapStep::SeedCatalog,
        BootstrapStep::MigrateCollection,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BootstrapStep::InitializeDatabase => "initialize_database",
            BootstrapStep::SeedCatalog => "seed_catalog",
            BootstrapStep::MigrateCollection => "migrate_collection",
        }
    }
}

#[derive(Debug)]
pub struct BootstrapReport {
    pub status: BootstrapStatus,
    pub seed: Option<SeedOutcome>,
    pub migration: Option<MigrationOutcome>,
}

pub struct AppBootstrap {
    db: Arc<dyn CollectionDatabase>,
    seeder: CatalogSeeder,
    migration: MigrationCoordinator,
    status: watch::Sender<BootstrapStatus>,
}

impl AppBootstrap {
    pub fn new(
        db: Arc<dyn CollectionDatabase>,
        seeder: CatalogSeeder,
        migration: MigrationCoordinator,
    ) -> Self {
        let (status, _) = watch::channel(BootstrapStatus::Loading);
        Self {
            db,
            seeder,
            migration,
            status,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<BootstrapStatus> {
        self.status.subscribe()
    }

    pub fn status(&self) -> BootstrapStatus {
        self.status.borrow().clone()
    }

    pub async fn run(&self) -> BootstrapReport {
        self.status.send_replace(BootstrapStatus::Loading);
        let mut report = BootstrapReport {
            status: BootstrapStatus::Loading,
            seed: None,
            migration: None,
        };
        let overall = Instant::now();

        for step in BootstrapStep::ORDER {
            let started = Instant::now();
            info!(target: "sneakersecure", event = "bootstrap_step_start", step = step.as_str());
            if let Err(err) = self.run_step(step, &mut report).await {
                let err = err.with_context("step", step.as_str());
                err.log_with_event("bootstrap_failed");
                report.status = BootstrapStatus::Error(err);
                self.status.send_replace(report.status.clone());
                return report;
            }
            info!(
                target: "sneakersecure",
                event = "bootstrap_step_done",
                step = step.as_str(),
                duration_ms = started.elapsed().as_millis() as u64
            );
        }

        report.status = BootstrapStatus::Ready;
        self.status.send_replace(BootstrapStatus::Ready);
        info!(
            target: "sneakersecure",
            event = "bootstrap_ready",
            duration_ms = overall.elapsed().as_millis() as u64
        );
        report
    }

    async fn run_step(&self, step: BootstrapStep, report: &mut BootstrapReport) -> AppResult<()> {
        match step {
            BootstrapStep::InitializeDatabase => self.db.initialize().await.map_err(|err| {
                AppError::new("DB/INIT", "Failed to initialize the database").with_cause(err)
            }),
            BootstrapStep::SeedCatalog => {
                let outcome = self.seeder.ensure_seeded().await.map_err(|err| {
                    AppError::new("CATALOG/SEED", "Failed to initialize the sneaker catalog")
                        .with_cause(err)
                })?;
                report.seed = Some(outcome);
                Ok(())
            }
            BootstrapStep::MigrateCollection => {
                let outcome = dispatch_async_with_fence(|| self.migration.run()).await?;
                if outcome.is_failed() {
                    warn!(
                        target: "sneakersecure",
                        event = "bootstrap_migration_deferred",
                        outcome = outcome.label()
                    );
                }
                report.migration = Some(outcome);
                Ok(())
            }
        }
    }
}
