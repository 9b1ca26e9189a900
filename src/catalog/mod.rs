//! The reference sneaker catalog persisted under [`CATALOG_KEY`].
//!
//! Seeding and updates both rewrite the whole list, so they share one async
//! lock; see [`CatalogSeeder`] and [`CatalogAccessor`].

pub mod accessor;
pub mod seeder;
pub mod templates;

pub use accessor::CatalogAccessor;
pub use seeder::{edition_label, prepare_catalog, random_edition, CatalogSeeder, SeedOutcome};

pub const CATALOG_KEY: &str = "allSneakers";
