//! Read access to the legacy (v1) schema.

#[cfg(feature = "mysql")]
mod mysql;
pub mod rows;
mod sqlite;
pub mod statement;

use crate::config::{DatabaseKind, MigratorConfig};
#[cfg(not(feature = "mysql"))]
use crate::error::MigrationError;

#[cfg(feature = "mysql")]
pub use self::mysql::MySqlSource;
pub use rows::{
    LegacyBonusRow, LegacyClaimCountRow, LegacyClaimRow, LegacyFlagRow, LegacyMemberRow,
    LegacySpawnRow, LegacyTownRow,
};
pub use sqlite::SqliteSource;
pub use statement::Statement;

/// One open connection to a legacy store. Every method runs a single query
/// and returns all of its rows. The connection is closed when dropped.
pub trait LegacySource {
    fn towns(&mut self) -> anyhow::Result<Vec<LegacyTownRow>>;
    /// Only players that belong to a town.
    fn members(&mut self) -> anyhow::Result<Vec<LegacyMemberRow>>;
    fn claim_counts(&mut self) -> anyhow::Result<Vec<LegacyClaimCountRow>>;
    /// Towns joined with their spawn location; towns without one are absent.
    fn spawns(&mut self) -> anyhow::Result<Vec<LegacySpawnRow>>;
    /// Bonus allowances summed per town.
    fn bonuses(&mut self) -> anyhow::Result<Vec<LegacyBonusRow>>;
    fn flags(&mut self) -> anyhow::Result<Vec<LegacyFlagRow>>;
    fn claims(&mut self) -> anyhow::Result<Vec<LegacyClaimRow>>;
}

/// Hands out legacy connections, one per extraction pass.
pub trait Connector {
    fn connect(&self) -> anyhow::Result<Box<dyn LegacySource>>;
}

impl Connector for MigratorConfig {
    fn connect(&self) -> anyhow::Result<Box<dyn LegacySource>> {
        open_connection(self)
    }
}

pub fn open_connection(config: &MigratorConfig) -> anyhow::Result<Box<dyn LegacySource>> {
    match config.database.kind {
        DatabaseKind::Sqlite => {
            let path = config.sqlite_path()?;
            log::info!("Opening legacy sqlite database at {path:?}");
            Ok(Box::new(SqliteSource::open(&path, config.tables.clone())?))
        }
        #[cfg(feature = "mysql")]
        DatabaseKind::MySql => {
            log::info!(
                "Connecting to legacy mysql database {} at {}:{}",
                config.database.name,
                config.database.host,
                config.database.port
            );
            Ok(Box::new(MySqlSource::open(
                &config.database,
                config.tables.clone(),
            )?))
        }
        #[cfg(not(feature = "mysql"))]
        DatabaseKind::MySql => {
            Err(MigrationError::UnsupportedDatabase(DatabaseKind::MySql.to_string()).into())
        }
    }
}
