use futures::future::BoxFuture;
use futures::FutureExt;
use sqlx::{Row, SqlitePool};
use std::path::Path;
use tracing::{error, info, warn};

use super::CollectionDatabase;
use crate::error::{AppError, AppResult};
use crate::migrate;
use crate::model::CollectionItem;

const UPSERT_SQL: &str = "INSERT INTO collection_items \
     (id, name, description, image_url, manufacture_number, gallery, history, added_at, imported_at) \
     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) \
     ON CONFLICT(id) DO UPDATE SET \
       name = excluded.name, \
       description = excluded.description, \
       image_url = excluded.image_url, \
       manufacture_number = excluded.manufacture_number, \
       gallery = excluded.gallery, \
       history = excluded.history, \
       added_at = excluded.added_at, \
       imported_at = excluded.imported_at";

/// SQLite-backed store for the user's collection.
#[derive(Clone)]
pub struct SqliteCollectionDb {
    pool: SqlitePool,
}

impl SqliteCollectionDb {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn open(db_path: &Path) -> anyhow::Result<Self> {
        Ok(Self::new(super::open_sqlite_pool(db_path).await?))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn apply_schema(&self) -> AppResult<()> {
        migrate::apply_migrations(&self.pool).await.map_err(|err| {
            AppError::new("DB/SCHEMA", "Failed to apply schema migrations")
                .with_cause(AppError::from(err))
        })
    }

    /// Upsert every record inside one transaction. Rolls back on the first
    /// failure.
    pub async fn import(&self, records: &[CollectionItem]) -> AppResult<usize> {
        let imported_at = chrono::Utc::now().timestamp_millis();
        let mut tx = self.pool.begin().await?;
        info!(target: "sneakersecure", event = "db_tx_begin", records = records.len());

        for (index, item) in records.iter().enumerate() {
            let result = async {
                let gallery = serde_json::to_string(&item.gallery)?;
                let history = serde_json::to_string(&item.history)?;
                sqlx::query(UPSERT_SQL)
                    .bind(&item.id)
                    .bind(&item.name)
                    .bind(&item.description)
                    .bind(&item.image_url)
                    .bind(&item.manufacture_number)
                    .bind(gallery)
                    .bind(history)
                    .bind(&item.added_at)
                    .bind(imported_at)
                    .execute(&mut *tx)
                    .await?;
                Ok::<_, AppError>(())
            }
            .await;

            if let Err(err) = result {
                let err = err
                    .with_context("index", index.to_string())
                    .with_context("id", item.id.clone());
                if let Err(rb) = tx.rollback().await {
                    error!(target: "sneakersecure", event = "db_tx_rollback_failed", error = %rb);
                } else {
                    warn!(target: "sneakersecure", event = "db_tx_rollback", index);
                }
                return Err(err);
            }
        }

        tx.commit().await?;
        info!(target: "sneakersecure", event = "db_tx_commit", records = records.len());
        Ok(records.len())
    }

    pub async fn list_collection(&self) -> AppResult<Vec<CollectionItem>> {
        let rows = sqlx::query(
            "SELECT id, name, description, image_url, manufacture_number, gallery, history, added_at
               FROM collection_items
              ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            let gallery: String = row.try_get("gallery")?;
            let history: String = row.try_get("history")?;
            items.push(CollectionItem {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
                description: row.try_get("description")?,
                image_url: row.try_get("image_url")?,
                manufacture_number: row.try_get("manufacture_number")?,
                gallery: serde_json::from_str(&gallery)?,
                history: serde_json::from_str(&history)?,
                added_at: row.try_get("added_at")?,
            });
        }
        Ok(items)
    }
}

impl CollectionDatabase for SqliteCollectionDb {
    fn initialize(&self) -> BoxFuture<'_, AppResult<()>> {
        self.apply_schema().boxed()
    }

    fn bulk_import_collection<'a>(&'a self, records: &'a [CollectionItem]) -> BoxFuture<'a, bool> {
        async move {
            match self.import(records).await {
                Ok(count) => {
                    info!(target: "sneakersecure", event = "collection_imported", count);
                    true
                }
                Err(err) => {
                    err.log_with_event("collection_import_failed");
                    false
                }
            }
        }
        .boxed()
    }
}
