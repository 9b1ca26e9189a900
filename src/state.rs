use std::sync::Arc;

use anyhow::Context;

use crate::bootstrap::AppBootstrap;
use crate::catalog::{CatalogAccessor, CatalogSeeder};
use crate::config::AppConfig;
use crate::db::{CollectionDatabase, SqliteCollectionDb};
use crate::migration::MigrationCoordinator;
use crate::store::StoreHandle;

/// Process-wide wiring: one substrate, one database, and the components
/// built over them. Clones share everything.
#[derive(Clone)]
pub struct AppState {
    pub store: StoreHandle,
    pub db: SqliteCollectionDb,
    pub catalog: CatalogAccessor,
    pub migration: MigrationCoordinator,
    pub bootstrap: Arc<AppBootstrap>,
}

impl AppState {
    pub async fn open(config: &AppConfig) -> anyhow::Result<Self> {
        let store = StoreHandle::file(config.store_path());
        let db = SqliteCollectionDb::open(&config.database_path())
            .await
            .with_context(|| format!("open database {}", config.database_path().display()))?;
        Ok(Self::from_parts(store, db))
    }

    pub fn from_parts(store: StoreHandle, db: SqliteCollectionDb) -> Self {
        let seeder = CatalogSeeder::new(store.clone());
        let database: Arc<dyn CollectionDatabase> = Arc::new(db.clone());
        let migration = MigrationCoordinator::new(store.clone(), database.clone());
        let bootstrap = Arc::new(AppBootstrap::new(
            database,
            seeder.clone(),
            migration.clone(),
        ));
        Self {
            store,
            db,
            catalog: CatalogAccessor::new(seeder),
            migration,
            bootstrap,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::BootstrapStatus;
    use crate::config::AppConfig;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_wires_file_backed_components() {
        let dir = tempdir().unwrap();
        let config = AppConfig::for_data_dir(dir.path());
        let state = AppState::open(&config).await.unwrap();

        let report = state.bootstrap.run().await;
        assert_eq!(report.status, BootstrapStatus::Ready);
        assert_eq!(state.catalog.get_all().await.len(), 3);
        assert!(config.store_path().exists());
        assert!(config.database_path().exists());
        state.db.pool().close().await;
    }
}
