use std::sync::Arc;

use rand::Rng;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use super::templates::TEMPLATES;
use super::CATALOG_KEY;
use crate::id::new_id;
use crate::model::CatalogEntry;
use crate::store::{StorageResult, StoreHandle};

pub const EDITION_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Seeded { count: usize },
    AlreadyPresent,
}

/// Writes the reference catalog into the substrate the first time it is
/// needed. Cloning shares the underlying lock.
#[derive(Clone)]
pub struct CatalogSeeder {
    store: StoreHandle,
    lock: Arc<Mutex<()>>,
}

impl CatalogSeeder {
    pub fn new(store: StoreHandle) -> Self {
        Self {
            store,
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    /// Serializes every full-list rewrite of the catalog key.
    pub(crate) fn lock(&self) -> &Arc<Mutex<()>> {
        &self.lock
    }

    /// Seed the catalog unless the key holds a non-empty value. At most one
    /// write.
    pub async fn ensure_seeded(&self) -> StorageResult<SeedOutcome> {
        let _guard = self.lock.lock().await;

        let existing = self.store.get_present(CATALOG_KEY).await.map_err(|err| {
            error!(
                target: "sneakersecure",
                event = "catalog_seed_read_failed",
                key = CATALOG_KEY,
                error = %err
            );
            err
        })?;
        if existing.is_some() {
            debug!(target: "sneakersecure", event = "catalog_present", key = CATALOG_KEY);
            return Ok(SeedOutcome::AlreadyPresent);
        }

        let entries = prepare_catalog();
        self.store
            .set_json(CATALOG_KEY, &entries)
            .await
            .map_err(|err| {
                error!(
                    target: "sneakersecure",
                    event = "catalog_seed_write_failed",
                    key = CATALOG_KEY,
                    error = %err
                );
                err
            })?;
        info!(
            target: "sneakersecure",
            event = "catalog_seeded",
            count = entries.len()
        );
        Ok(SeedOutcome::Seeded {
            count: entries.len(),
        })
    }
}

/// Build a fresh catalog: one entry per template, each with a new id and a
/// newly drawn edition label.
pub fn prepare_catalog() -> Vec<CatalogEntry> {
    TEMPLATES
        .iter()
        .map(|template| template.instantiate(new_id(), random_edition()))
        .collect()
}

pub fn random_edition() -> String {
    let edition = rand::thread_rng().gen_range(1..=EDITION_SIZE);
    edition_label(edition)
}

pub fn edition_label(edition: u32) -> String {
    format!("Limited Edition {edition}/{EDITION_SIZE} Release")
}
