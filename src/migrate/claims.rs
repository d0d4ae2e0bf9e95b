use anyhow::Context;
use std::collections::{BTreeSet, HashMap};

use crate::legacy::LegacyClaimRow;
use crate::model::{Claim, ClaimType, ClaimWorld, ServerWorld};

use super::warning::{Warning, Warnings};

/// Appends legacy claims to the claim worlds the successor already knows.
///
/// Claim worlds are only ever filled, never created: a server registers its
/// worlds itself on startup, so a claim in an unknown world is dropped with a
/// warning. Claims a town holds from an earlier run are replaced, not
/// duplicated. Returns the number of claims merged.
pub fn merge_claims(
    claim_worlds: &mut HashMap<ServerWorld, ClaimWorld>,
    rows: Vec<LegacyClaimRow>,
    warnings: &mut Warnings,
) -> anyhow::Result<usize> {
    let town_ids: BTreeSet<i32> = rows.iter().map(|row| row.town_id).collect();
    for claim_world in claim_worlds.values_mut() {
        claim_world
            .claims
            .retain(|town_id, _| !town_ids.contains(town_id));
    }

    let mut merged = 0;
    for row in rows {
        let server_world = ServerWorld::legacy(&row.server, &row.world);
        let Some(claim_world) = claim_worlds.get_mut(&server_world) else {
            warnings.push(Warning::MissingClaimWorld {
                server_world,
                town_id: row.town_id,
            });
            continue;
        };
        let claim_type = ClaimType::from_legacy(row.chunk_type).with_context(|| {
            format!(
                "Failed to read claim at ({}, {}) in {server_world}",
                row.chunk_x, row.chunk_z
            )
        })?;
        claim_world.add_claim(row.town_id, Claim::at(row.chunk_x, row.chunk_z, claim_type));
        merged += 1;
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MigrationError;
    use crate::model::{Chunk, Environment, World};
    use uuid::Uuid;

    fn claim_row(x: i32, z: i32, chunk_type: i32, town_id: i32, world: &str) -> LegacyClaimRow {
        LegacyClaimRow {
            chunk_x: x,
            chunk_z: z,
            chunk_type,
            town_id,
            world: world.to_owned(),
            server: String::from("survival"),
        }
    }

    fn registered(name: &str, environment: Environment, id: i32) -> (ServerWorld, ClaimWorld) {
        let world = World {
            uuid: Uuid::from_u128(u128::try_from(id).unwrap()),
            name: name.to_owned(),
            environment,
        };
        (ServerWorld::new("survival", world), ClaimWorld::new(id))
    }

    #[test]
    fn claims_are_appended_per_town() {
        let mut claim_worlds: HashMap<_, _> =
            [registered("world", Environment::Normal, 1)].into_iter().collect();
        let mut warnings = Warnings::default();
        let merged = merge_claims(
            &mut claim_worlds,
            vec![
                claim_row(0, 0, 0, 1, "world"),
                claim_row(0, 1, 1, 1, "world"),
                claim_row(9, 9, 2, 2, "world"),
            ],
            &mut warnings,
        )
        .unwrap();

        assert_eq!(merged, 3);
        assert!(warnings.is_empty());
        let claim_world = &claim_worlds[&ServerWorld::legacy("survival", "world")];
        assert_eq!(claim_world.claims[&1].len(), 2);
        assert_eq!(claim_world.claims[&1][1].claim_type, ClaimType::Farm);
        assert_eq!(claim_world.claims[&2][0].chunk, Chunk { x: 9, z: 9 });
    }

    #[test]
    fn unknown_shard_is_skipped_and_never_created() {
        let mut claim_worlds: HashMap<_, _> =
            [registered("world", Environment::Normal, 1)].into_iter().collect();
        let mut warnings = Warnings::default();
        let merged = merge_claims(
            &mut claim_worlds,
            vec![claim_row(5, 10, 1, 1, "world_nether")],
            &mut warnings,
        )
        .unwrap();

        assert_eq!(merged, 0);
        assert_eq!(claim_worlds.len(), 1);
        assert!(claim_worlds.values().all(ClaimWorld::is_empty));
        let warnings = warnings.into_vec();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].to_string().contains("survival/world_nether"));
    }

    #[test]
    fn earlier_claims_of_migrated_towns_are_replaced() {
        let (server_world, mut claim_world) = registered("world", Environment::Normal, 1);
        claim_world.add_claim(1, Claim::at(0, 0, ClaimType::Claim));
        claim_world.add_claim(1, Claim::at(7, 7, ClaimType::Plot));
        claim_world.add_claim(5, Claim::at(3, 3, ClaimType::Claim));
        let mut claim_worlds: HashMap<_, _> =
            [(server_world.clone(), claim_world)].into_iter().collect();

        let merged = merge_claims(
            &mut claim_worlds,
            vec![claim_row(0, 0, 0, 1, "world")],
            &mut Warnings::default(),
        )
        .unwrap();

        assert_eq!(merged, 1);
        let claim_world = &claim_worlds[&server_world];
        assert_eq!(claim_world.claims[&1], vec![Claim::at(0, 0, ClaimType::Claim)]);
        assert_eq!(claim_world.claims[&5].len(), 1);
    }

    #[test]
    fn unknown_claim_type_aborts() {
        let mut claim_worlds: HashMap<_, _> =
            [registered("world", Environment::Normal, 1)].into_iter().collect();
        let err = merge_claims(
            &mut claim_worlds,
            vec![claim_row(0, 0, 3, 1, "world")],
            &mut Warnings::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MigrationError>(),
            Some(MigrationError::UnknownClaimType(3))
        ));
    }
}
