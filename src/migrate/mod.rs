//! The legacy (v1) to v2 migration.
//!
//! A run reads the legacy store twice: once to rebuild the towns and once to
//! merge the claims into the claim worlds the successor already registered.
//! Nothing shared is touched while it runs; the caller receives a
//! [`MigrationOutcome`] and installs it into its [`LiveState`] in one step.

mod claims;
mod towns;
mod warning;

use anyhow::Context;
use std::collections::{HashMap, HashSet};
use std::fmt;
use time::OffsetDateTime;

use crate::catalog::{Levels, RulePresets, Roles};
use crate::config::{MigratorConfig, MissingTownPolicy};
use crate::error::PersistError;
use crate::legacy::Connector;
use crate::model::{ClaimWorld, ServerWorld, Town};
use crate::store::{Database, User};

pub use claims::merge_claims;
pub use towns::{TownAssembler, TownsById};
pub use warning::{Warning, Warnings};

static MIGRATED_MAYOR_NAME: &str = "(Migrated)";

#[allow(clippy::module_name_repetitions)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationState {
    Idle,
    Running,
    Succeeded,
    Aborted,
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationState::Idle => write!(f, "idle"),
            MigrationState::Running => write!(f, "running"),
            MigrationState::Succeeded => write!(f, "succeeded"),
            MigrationState::Aborted => write!(f, "aborted"),
        }
    }
}

/// Everything a successful run produced.
#[allow(clippy::module_name_repetitions)]
#[derive(Debug, Clone)]
pub struct MigrationOutcome {
    /// Towns that were saved, ordered by id.
    pub towns: Vec<Town>,
    /// Claim worlds left with at least one claim.
    pub claim_worlds: HashMap<ServerWorld, ClaimWorld>,
    pub warnings: Vec<Warning>,
    pub merged_claims: usize,
    pub pruned_claim_worlds: usize,
    pub started_at: OffsetDateTime,
    pub finished_at: OffsetDateTime,
}

/// The in-memory town and claim world caches the rest of the system reads.
#[derive(Debug, Clone, Default)]
pub struct LiveState {
    pub towns: Vec<Town>,
    pub claim_worlds: HashMap<ServerWorld, ClaimWorld>,
}

impl LiveState {
    /// Replaces both caches with the result of a migration and hands back
    /// its warnings.
    pub fn install(&mut self, outcome: MigrationOutcome) -> Vec<Warning> {
        *self = Self {
            towns: outcome.towns,
            claim_worlds: outcome.claim_worlds,
        };
        outcome.warnings
    }
}

pub struct Migrator<'a> {
    levels: &'a dyn Levels,
    roles: &'a dyn Roles,
    presets: &'a dyn RulePresets,
    policy: MissingTownPolicy,
    state: MigrationState,
}

impl<'a> Migrator<'a> {
    pub fn new(
        levels: &'a dyn Levels,
        roles: &'a dyn Roles,
        presets: &'a dyn RulePresets,
    ) -> Self {
        Self {
            levels,
            roles,
            presets,
            policy: MissingTownPolicy::default(),
            state: MigrationState::Idle,
        }
    }

    /// A migrator that applies the missing-town policy of `config`.
    pub fn from_config(
        config: &MigratorConfig,
        levels: &'a dyn Levels,
        roles: &'a dyn Roles,
        presets: &'a dyn RulePresets,
    ) -> Self {
        Self::new(levels, roles, presets).with_policy(config.policy)
    }

    #[must_use]
    pub fn with_policy(mut self, policy: MissingTownPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn state(&self) -> MigrationState {
        self.state
    }

    /// Runs the whole migration. A fault in any step aborts the run; already
    /// saved towns stay in `db`, but no live state has been touched.
    pub fn run(
        &mut self,
        connector: &dyn Connector,
        db: &mut dyn Database,
    ) -> anyhow::Result<MigrationOutcome> {
        self.state = MigrationState::Running;
        log::info!("Starting legacy migration");
        match self.migrate(connector, db) {
            Ok(outcome) => {
                self.state = MigrationState::Succeeded;
                log::info!(
                    "Legacy migration finished: {} towns, {} claims in {} claim worlds, {} warnings",
                    outcome.towns.len(),
                    outcome.merged_claims,
                    outcome.claim_worlds.len(),
                    outcome.warnings.len()
                );
                Ok(outcome)
            }
            Err(err) => {
                self.state = MigrationState::Aborted;
                log::error!("Legacy migration aborted: {err:?}");
                Err(err)
            }
        }
    }

    fn migrate(
        &self,
        connector: &dyn Connector,
        db: &mut dyn Database,
    ) -> anyhow::Result<MigrationOutcome> {
        let started_at = OffsetDateTime::now_utc();
        let mut warnings = Warnings::default();

        let assembler = TownAssembler {
            levels: self.levels,
            roles: self.roles,
            presets: self.presets,
            policy: self.policy,
        };
        let towns = {
            let mut source = connector
                .connect()
                .context("Failed to connect to the legacy database")?;
            assembler
                .assemble(source.as_mut(), &mut warnings)
                .context("Failed to convert legacy towns")?
        };
        let towns = save_towns(db, towns, &mut warnings)?;

        let mut claim_worlds = db
            .claim_worlds()
            .context("Failed to load the registered claim worlds")?;
        let merged_claims = {
            let mut source = connector
                .connect()
                .context("Failed to connect to the legacy database")?;
            let rows = source.claims()?;
            log::info!(
                "Merging {} legacy claims into {} claim worlds",
                rows.len(),
                claim_worlds.len()
            );
            merge_claims(&mut claim_worlds, rows, &mut warnings)
                .context("Failed to convert legacy claims")?
        };

        for (server_world, claim_world) in &claim_worlds {
            db.update_claim_world(claim_world)
                .with_context(|| format!("Failed to save claim world {server_world}"))?;
        }
        let pruned_claim_worlds = db
            .prune_claim_worlds()
            .context("Failed to prune empty claim worlds")?;
        claim_worlds.retain(|_, claim_world| !claim_world.is_empty());
        log::info!("Pruned {pruned_claim_worlds} empty claim worlds");

        Ok(MigrationOutcome {
            towns,
            claim_worlds,
            warnings: warnings.into_vec(),
            merged_claims,
            pruned_claim_worlds,
            started_at,
            finished_at: OffsetDateTime::now_utc(),
        })
    }
}

/// Creates and fills each town in the successor store. A town already stored
/// by an earlier run is overwritten. Towns the store refuses are skipped, other
/// store failures abort.
fn save_towns(
    db: &mut dyn Database,
    towns: Vec<Town>,
    warnings: &mut Warnings,
) -> anyhow::Result<Vec<Town>> {
    let mut saved = Vec::with_capacity(towns.len());
    // lowercase, as town names are unique regardless of case
    let mut saved_names = HashSet::new();
    for town in towns {
        let Some(mayor) = town.mayor() else {
            warnings.push(Warning::TownSkipped {
                town: town.name.clone(),
                reason: String::from("it has no members, so there is no mayor"),
            });
            continue;
        };
        let key = town.name.to_lowercase();
        let stored_before = !saved_names.contains(&key)
            && db
                .has_town(&town.name)
                .with_context(|| format!("Failed to look up town {}", town.name))?;
        let result = if stored_before {
            log::info!("Replacing previously stored town {}", town.name);
            db.update_town(&town)
        } else {
            db.create_town(&town.name, &User::of(mayor, MIGRATED_MAYOR_NAME))
                .and_then(|()| db.update_town(&town))
        };
        match result {
            Ok(()) => {
                log::debug!("Saved {town}");
                saved_names.insert(key);
                saved.push(town);
            }
            Err(PersistError::Conflict(reason)) => warnings.push(Warning::TownSkipped {
                town: town.name.clone(),
                reason,
            }),
            Err(PersistError::Backend(err)) => {
                return Err(err.context(format!("Failed to save town {}", town.name)));
            }
        }
    }
    log::info!("Saved {} migrated towns", saved.len());
    Ok(saved)
}
