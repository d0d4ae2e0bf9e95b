use anyhow::Context;
use directories_next::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{MigrationError, RowKind};

static SQLITE_FILE_NAME: &str = "HuskTownsData.db";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseKind {
    #[serde(alias = "mariadb")]
    MySql,
    Sqlite,
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseKind::MySql => write!(f, "mysql"),
            DatabaseKind::Sqlite => write!(f, "sqlite"),
        }
    }
}

impl DatabaseKind {
    fn parse(text: &str) -> anyhow::Result<Self> {
        match text.to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(DatabaseKind::MySql),
            "sqlite" => Ok(DatabaseKind::Sqlite),
            _ => Err(anyhow::format_err!(
                "Unknown legacy database type {text:?}, expected mysql or sqlite"
            )),
        }
    }
}

/// A legacy table name. Only plain identifiers are accepted, so a name can be
/// spliced into a statement without quoting issues.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TableName(String);

impl TableName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TableName {
    type Error = MigrationError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if valid {
            Ok(Self(name))
        } else {
            Err(MigrationError::InvalidTableName(name))
        }
    }
}

impl From<TableName> for String {
    fn from(name: TableName) -> Self {
        name.0
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn default_table(name: &str) -> TableName {
    TableName(name.to_owned())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableNames {
    pub players: TableName,
    pub towns: TableName,
    pub claims: TableName,
    pub flags: TableName,
    pub locations: TableName,
    pub bonuses: TableName,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            players: default_table("husktowns_players"),
            towns: default_table("husktowns_towns"),
            claims: default_table("husktowns_claims"),
            flags: default_table("husktowns_flags"),
            locations: default_table("husktowns_locations"),
            bonuses: default_table("husktowns_bonus"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    #[serde(rename = "type")]
    pub kind: DatabaseKind,
    pub host: String,
    pub port: u16,
    pub name: String,
    pub username: String,
    pub password: String,
    /// Path of the embedded legacy store. Relative to the data folder when
    /// not absolute.
    pub file: Option<PathBuf>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            kind: DatabaseKind::MySql,
            host: String::from("localhost"),
            port: 3306,
            name: String::from("HuskTowns"),
            username: String::from("root"),
            password: String::from("pa55w0rd"),
            file: None,
        }
    }
}

/// What to do with a legacy row whose town id matches no converted town.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnMissingTown {
    /// Fail the whole migration.
    #[default]
    Abort,
    /// Drop the row and record a warning.
    Skip,
}

#[allow(clippy::module_name_repetitions)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MissingTownPolicy {
    pub members: OnMissingTown,
    pub claim_counts: OnMissingTown,
    pub spawns: OnMissingTown,
    pub bonuses: OnMissingTown,
    pub flags: OnMissingTown,
}

impl MissingTownPolicy {
    pub fn skip_all() -> Self {
        Self {
            members: OnMissingTown::Skip,
            claim_counts: OnMissingTown::Skip,
            spawns: OnMissingTown::Skip,
            bonuses: OnMissingTown::Skip,
            flags: OnMissingTown::Skip,
        }
    }

    pub fn for_kind(&self, kind: RowKind) -> OnMissingTown {
        match kind {
            RowKind::Member => self.members,
            RowKind::ClaimCount => self.claim_counts,
            RowKind::Spawn => self.spawns,
            RowKind::Bonus => self.bonuses,
            RowKind::Flag => self.flags,
        }
    }
}

#[allow(clippy::module_name_repetitions)]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigratorConfig {
    pub database: DatabaseConfig,
    pub data_folder: Option<PathBuf>,
    pub tables: TableNames,
    pub policy: MissingTownPolicy,
}

impl MigratorConfig {
    pub fn try_from_str(text: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(text).context("Failed to parse the migrator config")
    }

    pub fn try_from_path(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read migrator config {path:?}"))?;
        Self::try_from_str(&content)
            .with_context(|| format!("Failed to load migrator config from {path:?}"))
    }

    /// Location of the embedded legacy store.
    pub fn sqlite_path(&self) -> anyhow::Result<PathBuf> {
        let data_folder = match &self.data_folder {
            Some(folder) => folder.clone(),
            None => ProjectDirs::from("", "", "HuskTowns")
                .map(|dirs| dirs.data_local_dir().to_path_buf())
                .context("Failed to determine the data folder for the legacy sqlite database")?,
        };
        Ok(match &self.database.file {
            Some(file) if file.is_absolute() => file.clone(),
            Some(file) => data_folder.join(file),
            None => data_folder.join(SQLITE_FILE_NAME),
        })
    }

    /// Sets a parameter by its legacy migrator name, e.g.
    /// `legacy_database_host`. Names are case insensitive.
    pub fn set_parameter(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        let table = || TableName::try_from(value.to_owned());
        match key.to_lowercase().as_str() {
            "legacy_database_type" => self.database.kind = DatabaseKind::parse(value)?,
            "legacy_database_host" => self.database.host = value.to_owned(),
            "legacy_database_port" => {
                self.database.port = value
                    .parse()
                    .with_context(|| format!("Failed to parse port {value:?}"))?;
            }
            "legacy_database_name" => self.database.name = value.to_owned(),
            "legacy_database_username" => self.database.username = value.to_owned(),
            "legacy_database_password" => self.database.password = value.to_owned(),
            "legacy_players_table" => self.tables.players = table()?,
            "legacy_towns_table" => self.tables.towns = table()?,
            "legacy_claims_table" => self.tables.claims = table()?,
            "legacy_flags_table" => self.tables.flags = table()?,
            "legacy_locations_table" => self.tables.locations = table()?,
            "legacy_bonuses_table" => self.tables.bonuses = table()?,
            // plot members have no counterpart in v2
            "legacy_plot_members_table" => {
                log::debug!("Ignoring legacy_plot_members_table = {value}");
            }
            _ => return Err(MigrationError::UnknownParameter(key.to_owned()).into()),
        }
        Ok(())
    }

    /// All parameters with their current value. The password is masked.
    pub fn parameters(&self) -> Vec<(&'static str, String)> {
        vec![
            ("legacy_database_type", self.database.kind.to_string()),
            ("legacy_database_host", self.database.host.clone()),
            ("legacy_database_port", self.database.port.to_string()),
            ("legacy_database_name", self.database.name.clone()),
            ("legacy_database_username", self.database.username.clone()),
            ("legacy_database_password", "*".repeat(self.database.password.len())),
            ("legacy_players_table", self.tables.players.to_string()),
            ("legacy_towns_table", self.tables.towns.to_string()),
            ("legacy_claims_table", self.tables.claims.to_string()),
            ("legacy_flags_table", self.tables.flags.to_string()),
            ("legacy_locations_table", self.tables.locations.to_string()),
            ("legacy_bonuses_table", self.tables.bonuses.to_string()),
        ]
    }
}
