#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! Converts HuskTowns v1 data (flat legacy tables in MySQL or sqlite) into
//! the v2 town and claim world model.

pub mod catalog;
pub mod config;
pub mod error;
pub mod legacy;
pub mod migrate;
pub mod model;
pub mod store;

pub use config::MigratorConfig;
pub use error::{MigrationError, PersistError};
pub use migrate::{LiveState, MigrationOutcome, MigrationState, Migrator, Warning};
