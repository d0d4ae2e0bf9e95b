//! Rebuilds towns from the legacy towns, players, claims, locations, bonus
//! and flags tables.

use anyhow::Context;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::catalog::{Levels, RulePresets, Roles};
use crate::config::{MissingTownPolicy, OnMissingTown};
use crate::error::{MigrationError, RowKind};
use crate::legacy::{
    LegacyBonusRow, LegacyClaimCountRow, LegacyFlagRow, LegacyMemberRow, LegacySource,
    LegacySpawnRow, LegacyTownRow,
};
use crate::model::{ClaimType, Town};

use super::warning::{Warning, Warnings};

/// Towns under construction, by legacy id.
pub type TownsById = BTreeMap<i32, Town>;

pub struct TownAssembler<'a> {
    pub levels: &'a dyn Levels,
    pub roles: &'a dyn Roles,
    pub presets: &'a dyn RulePresets,
    pub policy: MissingTownPolicy,
}

impl TownAssembler<'_> {
    /// Reads every legacy table a town is made of and returns the towns
    /// ordered by id.
    pub fn assemble(
        &self,
        source: &mut dyn LegacySource,
        warnings: &mut Warnings,
    ) -> anyhow::Result<Vec<Town>> {
        let mut towns = self.build_towns(source.towns()?);
        log::info!("Converted {} legacy towns", towns.len());

        let members = source.members()?;
        log::info!("Resolving {} town members", members.len());
        self.resolve_members(&mut towns, members, warnings)?;

        self.apply_claim_counts(&mut towns, source.claim_counts()?, warnings)?;

        let spawns = source.spawns()?;
        log::info!("Resolving {} town spawns", spawns.len());
        self.apply_spawns(&mut towns, spawns, warnings)?;

        self.apply_bonuses(&mut towns, source.bonuses()?, warnings)?;

        let flags = source.flags()?;
        log::info!("Consolidating {} flag rows into town rules", flags.len());
        self.apply_flags(&mut towns, flags, warnings)?;

        Ok(towns.into_values().collect())
    }

    pub fn build_towns(&self, rows: Vec<LegacyTownRow>) -> TownsById {
        rows.into_iter()
            .map(|row| {
                let level = self.levels.highest_level_for(row.money);
                let mut town = Town::new(row.id, &row.name);
                town.bio = row.bio;
                town.greeting = row.greeting;
                town.farewell = row.farewell;
                town.rules = self.presets.default_claim_rules();
                town.level = level;
                town.money = row.money - self.levels.total_cost_for(level);
                (town.id, town)
            })
            .collect()
    }

    pub fn resolve_members(
        &self,
        towns: &mut TownsById,
        rows: Vec<LegacyMemberRow>,
        warnings: &mut Warnings,
    ) -> anyhow::Result<()> {
        for row in rows {
            let Some(town) = self.town_for(towns, RowKind::Member, row.town_id, warnings)? else {
                continue;
            };
            let player = Uuid::parse_str(&row.uuid)
                .map_err(|_| MigrationError::InvalidPlayerUuid(row.uuid.clone()))?;
            let weight = match self.roles.role_for_weight(row.role_weight) {
                Some(role) => role.weight,
                None => {
                    let substitute = self.roles.default_role().weight;
                    warnings.push(Warning::UnknownRoleWeight {
                        town_id: row.town_id,
                        player,
                        weight: row.role_weight,
                        substitute,
                    });
                    substitute
                }
            };
            town.add_member(player, weight);
        }
        Ok(())
    }

    pub fn apply_claim_counts(
        &self,
        towns: &mut TownsById,
        rows: Vec<LegacyClaimCountRow>,
        warnings: &mut Warnings,
    ) -> anyhow::Result<()> {
        for row in rows {
            if let Some(town) = self.town_for(towns, RowKind::ClaimCount, row.town_id, warnings)? {
                town.claims = row.claims;
            }
        }
        Ok(())
    }

    pub fn apply_spawns(
        &self,
        towns: &mut TownsById,
        rows: Vec<LegacySpawnRow>,
        warnings: &mut Warnings,
    ) -> anyhow::Result<()> {
        for row in rows {
            let Some(town) = self.town_for(towns, RowKind::Spawn, row.town_id, warnings)? else {
                continue;
            };
            town.spawn = row.to_spawn();
            if town.spawn.is_none() {
                log::debug!("Dropped incomplete spawn location of town #{}", row.town_id);
            }
        }
        Ok(())
    }

    pub fn apply_bonuses(
        &self,
        towns: &mut TownsById,
        rows: Vec<LegacyBonusRow>,
        warnings: &mut Warnings,
    ) -> anyhow::Result<()> {
        for row in rows {
            if let Some(town) = self.town_for(towns, RowKind::Bonus, row.town_id, warnings)? {
                town.bonus_claims = row.bonus_claims;
                town.bonus_members = row.bonus_members;
            }
        }
        Ok(())
    }

    /// Later rows for the same town and claim type replace earlier ones.
    pub fn apply_flags(
        &self,
        towns: &mut TownsById,
        rows: Vec<LegacyFlagRow>,
        warnings: &mut Warnings,
    ) -> anyhow::Result<()> {
        for row in rows {
            let Some(town) = self.town_for(towns, RowKind::Flag, row.town_id, warnings)? else {
                continue;
            };
            let claim_type = ClaimType::from_legacy(row.chunk_type)
                .with_context(|| format!("Failed to read flags of town #{}", row.town_id))?;
            town.rules.insert(claim_type, row.to_rules());
        }
        Ok(())
    }

    fn town_for<'t>(
        &self,
        towns: &'t mut TownsById,
        kind: RowKind,
        town_id: i32,
        warnings: &mut Warnings,
    ) -> anyhow::Result<Option<&'t mut Town>> {
        match towns.get_mut(&town_id) {
            Some(town) => Ok(Some(town)),
            None => match self.policy.for_kind(kind) {
                OnMissingTown::Abort => Err(MigrationError::MissingTown { kind, town_id }.into()),
                OnMissingTown::Skip => {
                    warnings.push(Warning::MissingTown { kind, town_id });
                    Ok(None)
                }
            },
        }
    }
}
