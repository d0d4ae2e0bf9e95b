use std::fmt;
use thiserror::Error;

/// The legacy row kinds that reference a town by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowKind {
    Member,
    ClaimCount,
    Spawn,
    Bonus,
    Flag,
}

impl fmt::Display for RowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKind::Member => write!(f, "member"),
            RowKind::ClaimCount => write!(f, "claim count"),
            RowKind::Spawn => write!(f, "spawn"),
            RowKind::Bonus => write!(f, "bonus"),
            RowKind::Flag => write!(f, "flag"),
        }
    }
}

/// Faults that abort a migration and that callers may want to tell apart.
/// They travel inside [`anyhow::Error`]; use `downcast_ref` to inspect them.
#[allow(clippy::module_name_repetitions)]
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("legacy {kind} row references town #{town_id}, which does not exist")]
    MissingTown { kind: RowKind, town_id: i32 },

    #[error("unknown legacy claim type {0} (expected 0 = claim, 1 = farm, 2 = plot)")]
    UnknownClaimType(i32),

    #[error("invalid legacy table name {0:?}: only letters, digits and underscores are allowed")]
    InvalidTableName(String),

    #[error("invalid player uuid {0:?} in the legacy players table")]
    InvalidPlayerUuid(String),

    #[error("the {0} legacy database is not supported by this build")]
    UnsupportedDatabase(String),

    #[error("unknown migrator parameter {0:?}")]
    UnknownParameter(String),
}

/// Errors reported by the successor store.
#[derive(Debug, Error)]
pub enum PersistError {
    /// The entity cannot be stored in its current state (e.g. a duplicate
    /// town name). The migration skips the entity and carries on.
    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}
