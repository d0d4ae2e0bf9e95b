use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

#[derive(Debug, Clone, Copy, EnumIter, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flag {
    ExplosionDamage,
    FireDamage,
    MobGriefing,
    MonsterSpawning,
    Pvp,
    PublicInteractAccess,
    PublicContainerAccess,
    PublicBuildAccess,
    PublicFarmAccess,
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flag::ExplosionDamage => write!(f, "explosion_damage"),
            Flag::FireDamage => write!(f, "fire_damage"),
            Flag::MobGriefing => write!(f, "mob_griefing"),
            Flag::MonsterSpawning => write!(f, "monster_spawning"),
            Flag::Pvp => write!(f, "pvp"),
            Flag::PublicInteractAccess => write!(f, "public_interact_access"),
            Flag::PublicContainerAccess => write!(f, "public_container_access"),
            Flag::PublicBuildAccess => write!(f, "public_build_access"),
            Flag::PublicFarmAccess => write!(f, "public_farm_access"),
        }
    }
}

/// The flag settings of one claim type within a town.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rules {
    pub flags: BTreeMap<Flag, bool>,
}

impl Rules {
    /// Every flag set to `value`.
    pub fn all(value: bool) -> Self {
        Self {
            flags: Flag::iter().map(|flag| (flag, value)).collect(),
        }
    }

    pub fn of(flags: &[(Flag, bool)]) -> Self {
        let mut rules = Self::all(false);
        for (flag, value) in flags {
            rules.flags.insert(*flag, *value);
        }
        rules
    }

    pub fn get(&self, flag: Flag) -> bool {
        self.flags.get(&flag).copied().unwrap_or(false)
    }
}
