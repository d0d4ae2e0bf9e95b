//! Rows as they come out of the legacy schema. They are read once and
//! discarded after conversion.

use crate::model::{Flag, Position, Rules, Spawn, World};

#[derive(Debug, Clone, PartialEq)]
pub struct LegacyTownRow {
    pub id: i32,
    pub name: String,
    pub bio: Option<String>,
    pub greeting: Option<String>,
    pub farewell: Option<String>,
    pub money: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyMemberRow {
    pub uuid: String,
    pub town_id: i32,
    pub role_weight: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyClaimCountRow {
    pub town_id: i32,
    pub claims: i32,
}

/// A town joined with its spawn location. The location columns are nullable
/// in the legacy schema; a row with any of them missing describes no spawn.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacySpawnRow {
    pub town_id: i32,
    /// NULL reads as private.
    pub public: bool,
    pub server: Option<String>,
    pub world: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    pub yaw: Option<f32>,
    pub pitch: Option<f32>,
}

impl LegacySpawnRow {
    pub fn to_spawn(&self) -> Option<Spawn> {
        let (Some(server), Some(world), Some(x), Some(y), Some(z), Some(yaw), Some(pitch)) = (
            &self.server,
            &self.world,
            self.x,
            self.y,
            self.z,
            self.yaw,
            self.pitch,
        ) else {
            return None;
        };
        Some(Spawn {
            position: Position {
                x,
                y,
                z,
                world: World::legacy(world),
                yaw,
                pitch,
            },
            server: server.clone(),
            public: self.public,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyBonusRow {
    pub town_id: i32,
    pub bonus_claims: i32,
    pub bonus_members: i32,
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyFlagRow {
    pub town_id: i32,
    pub chunk_type: i32,
    pub explosion_damage: bool,
    pub fire_damage: bool,
    pub mob_griefing: bool,
    pub monster_spawning: bool,
    pub pvp: bool,
    pub public_interact_access: bool,
    pub public_container_access: bool,
    pub public_build_access: bool,
    pub public_farm_access: bool,
}

impl LegacyFlagRow {
    pub fn to_rules(&self) -> Rules {
        Rules::of(&[
            (Flag::ExplosionDamage, self.explosion_damage),
            (Flag::FireDamage, self.fire_damage),
            (Flag::MobGriefing, self.mob_griefing),
            (Flag::MonsterSpawning, self.monster_spawning),
            (Flag::Pvp, self.pvp),
            (Flag::PublicInteractAccess, self.public_interact_access),
            (Flag::PublicContainerAccess, self.public_container_access),
            (Flag::PublicBuildAccess, self.public_build_access),
            (Flag::PublicFarmAccess, self.public_farm_access),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyClaimRow {
    pub chunk_x: i32,
    pub chunk_z: i32,
    pub chunk_type: i32,
    pub town_id: i32,
    pub world: String,
    pub server: String,
}
