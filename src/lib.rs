//! Startup data migration and catalog initialization for SneakerSecure.
//!
//! [`bootstrap::AppBootstrap`] prepares the database, seeds the reference
//! catalog in the key-value substrate, and moves the legacy collection
//! blob into SQLite once. [`catalog::CatalogAccessor`] serves the catalog
//! afterwards.

pub mod bootstrap;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod id;
pub mod logging;
pub mod migrate;
pub mod migration;
pub mod model;
pub mod state;
pub mod store;
pub mod util;

pub use error::{AppError, AppResult};
