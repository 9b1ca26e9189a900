use tracing::{debug, info, warn};

use super::seeder::CatalogSeeder;
use super::CATALOG_KEY;
use crate::model::CatalogEntry;
use crate::store::StorageResult;

/// Read/update access to the persisted catalog for presentation code.
///
/// Failures never escape: reads degrade to empty/`None`, updates to `false`.
/// Entries handed out are owned snapshots; changing one has no effect until
/// it is passed back through [`CatalogAccessor::update`].
#[derive(Clone)]
pub struct CatalogAccessor {
    seeder: CatalogSeeder,
}

impl CatalogAccessor {
    pub fn new(seeder: CatalogSeeder) -> Self {
        Self { seeder }
    }

    async fn read(&self) -> StorageResult<Option<Vec<CatalogEntry>>> {
        self.seeder.store().get_json(CATALOG_KEY).await
    }

    pub async fn get_all(&self) -> Vec<CatalogEntry> {
        match self.read().await {
            Ok(Some(entries)) => return entries,
            Ok(None) => {
                info!(target: "sneakersecure", event = "catalog_missing_reseeding");
            }
            Err(err) => {
                warn!(target: "sneakersecure", event = "catalog_read_failed", error = %err);
                return Vec::new();
            }
        }

        if let Err(err) = self.seeder.ensure_seeded().await {
            warn!(target: "sneakersecure", event = "catalog_reseed_failed", error = %err);
            return Vec::new();
        }

        match self.read().await {
            Ok(entries) => entries.unwrap_or_default(),
            Err(err) => {
                warn!(target: "sneakersecure", event = "catalog_read_failed", error = %err);
                Vec::new()
            }
        }
    }

    pub async fn get_by_id(&self, id: &str) -> Option<CatalogEntry> {
        self.get_all().await.into_iter().find(|entry| entry.id == id)
    }

    /// Replace the stored entry sharing `entry.id` and rewrite the list.
    ///
    /// Returns `false` for an empty id, a missing catalog, or any storage
    /// failure. An id with no match still rewrites the list unchanged.
    pub async fn update(&self, entry: &CatalogEntry) -> bool {
        if entry.id.trim().is_empty() {
            warn!(target: "sneakersecure", event = "catalog_update_rejected", reason = "missing_id");
            return false;
        }

        let _guard = self.seeder.lock().lock().await;

        let mut entries = match self.read().await {
            Ok(Some(entries)) => entries,
            Ok(None) => {
                warn!(
                    target: "sneakersecure",
                    event = "catalog_update_rejected",
                    reason = "catalog_missing",
                    id = %entry.id
                );
                return false;
            }
            Err(err) => {
                warn!(
                    target: "sneakersecure",
                    event = "catalog_update_failed",
                    id = %entry.id,
                    error = %err
                );
                return false;
            }
        };

        let mut matched = false;
        for slot in entries.iter_mut().filter(|slot| slot.id == entry.id) {
            *slot = entry.clone();
            matched = true;
        }
        if !matched {
            debug!(target: "sneakersecure", event = "catalog_update_no_match", id = %entry.id);
        }

        match self.seeder.store().set_json(CATALOG_KEY, &entries).await {
            Ok(()) => {
                info!(
                    target: "sneakersecure",
                    event = "catalog_updated",
                    id = %entry.id,
                    matched
                );
                true
            }
            Err(err) => {
                warn!(
                    target: "sneakersecure",
                    event = "catalog_update_failed",
                    id = %entry.id,
                    error = %err
                );
                false
            }
        }
    }
}
