//! One-shot transfer of the legacy `myCollection` blob into the database.
//!
//! The completion flag is only written once the collection has nothing
//! left to migrate, so every failure here is retried on the next launch.
//! The legacy blob itself is never modified.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::db::CollectionDatabase;
use crate::model::CollectionItem;
use crate::store::{StorageError, StorageResult, StoreHandle};

pub const LEGACY_COLLECTION_KEY: &str = "myCollection";
pub const MIGRATION_FLAG_KEY: &str = "dbMigrationCompleted";
pub const MIGRATION_FLAG_DONE: &str = "true";

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("legacy collection is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("legacy collection is not a sequence (found {found})")]
    NotASequence { found: &'static str },
    #[error("legacy record {index} is invalid: {reason}")]
    InvalidRecord { index: usize, reason: String },
}

#[derive(Debug, Error)]
pub enum MigrationFailure {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("database rejected the import of {records} legacy records")]
    Import { records: usize },
}

#[derive(Debug)]
pub enum MigrationOutcome {
    AlreadyDone,
    NoLegacyData,
    Migrated { count: usize },
    Failed(MigrationFailure),
}

impl MigrationOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            MigrationOutcome::AlreadyDone => "already_done",
            MigrationOutcome::NoLegacyData => "no_legacy_data",
            MigrationOutcome::Migrated { .. } => "migrated",
            MigrationOutcome::Failed(_) => "failed",
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, MigrationOutcome::Failed(_))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Decode the legacy blob, checking every record against the
/// [`CollectionItem`] shape.
pub fn parse_legacy_collection(raw: &str) -> Result<Vec<CollectionItem>, ParseError> {
    let items = match serde_json::from_str::<Value>(raw)? {
        Value::Array(items) => items,
        other => {
            return Err(ParseError::NotASequence {
                found: json_kind(&other),
            })
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            let item: CollectionItem =
                serde_json::from_value(value).map_err(|err| ParseError::InvalidRecord {
                    index,
                    reason: err.to_string(),
                })?;
            if item.id.trim().is_empty() {
                return Err(ParseError::InvalidRecord {
                    index,
                    reason: "empty id".into(),
                });
            }
            if item.name.trim().is_empty() {
                return Err(ParseError::InvalidRecord {
                    index,
                    reason: "empty name".into(),
                });
            }
            Ok(item)
        })
        .collect()
}

#[derive(Clone)]
pub struct MigrationCoordinator {
    store: StoreHandle,
    db: Arc<dyn CollectionDatabase>,
}

impl MigrationCoordinator {
    pub fn new(store: StoreHandle, db: Arc<dyn CollectionDatabase>) -> Self {
        Self { store, db }
    }

    pub async fn is_completed(&self) -> StorageResult<bool> {
        Ok(self.store.get(MIGRATION_FLAG_KEY).await?.as_deref() == Some(MIGRATION_FLAG_DONE))
    }

    async fn mark_completed(&self) -> StorageResult<()> {
        self.store.set(MIGRATION_FLAG_KEY, MIGRATION_FLAG_DONE).await
    }

    /// Clear the completion flag so the next [`run`](Self::run) migrates again.
    pub async fn reset(&self) -> StorageResult<()> {
        self.store.remove(MIGRATION_FLAG_KEY).await?;
        warn!(target: "sneakersecure", event = "migration_flag_reset");
        Ok(())
    }

    /// Never fails outright; problems come back as [`MigrationOutcome::Failed`].
    pub async fn run(&self) -> MigrationOutcome {
        match self.try_run().await {
            Ok(outcome) => outcome,
            Err(failure) => {
                let event = match &failure {
                    MigrationFailure::Storage(_) => "migration_storage_failed",
                    MigrationFailure::Parse(_) => "migration_parse_failed",
                    MigrationFailure::Import { .. } => "migration_import_failed",
                };
                error!(target: "sneakersecure", event, error = %failure);
                MigrationOutcome::Failed(failure)
            }
        }
    }

    async fn try_run(&self) -> Result<MigrationOutcome, MigrationFailure> {
        if self.is_completed().await? {
            info!(target: "sneakersecure", event = "migration_already_done");
            return Ok(MigrationOutcome::AlreadyDone);
        }

        let Some(raw) = self.store.get_present(LEGACY_COLLECTION_KEY).await? else {
            self.mark_completed().await?;
            info!(target: "sneakersecure", event = "migration_no_legacy_data");
            return Ok(MigrationOutcome::NoLegacyData);
        };

        let records = parse_legacy_collection(&raw)?;
        info!(target: "sneakersecure", event = "migration_records_found", count = records.len());

        if !self.db.bulk_import_collection(&records).await {
            return Err(MigrationFailure::Import {
                records: records.len(),
            });
        }

        self.mark_completed().await?;
        info!(target: "sneakersecure", event = "migration_completed", count = records.len());
        Ok(MigrationOutcome::Migrated {
            count: records.len(),
        })
    }
}
