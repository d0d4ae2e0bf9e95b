//! Successor-side policies the migration consults: leveling costs, the
//! role catalog and the default rule presets. Hosts plug their own
//! implementations in through the traits; the tables below load from YAML.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use strum::IntoEnumIterator;

use crate::model::{ClaimType, Flag, Rules};

pub trait Levels {
    /// The highest level whose total cost is covered by `balance`.
    fn highest_level_for(&self, balance: f64) -> u32;
    /// Money spent to reach `level` from level 1.
    fn total_cost_for(&self, level: u32) -> f64;
}

pub trait Roles {
    fn role_for_weight(&self, weight: i32) -> Option<&Role>;
    fn default_role(&self) -> &Role;
}

pub trait RulePresets {
    fn default_claim_rules(&self) -> BTreeMap<ClaimType, Rules>;
}

/// `costs[n]` is the price of going from level `n + 1` to `n + 2`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelTable {
    pub costs: Vec<f64>,
}

impl Default for LevelTable {
    fn default() -> Self {
        Self {
            costs: vec![
                2000.0, 4000.0, 8000.0, 16000.0, 32000.0, 64000.0, 128000.0, 256000.0, 512000.0,
                1_024_000.0, 2_048_000.0, 4_096_000.0, 8_192_000.0, 16_384_000.0, 32_768_000.0,
                65_536_000.0, 131_072_000.0, 262_144_000.0, 524_288_000.0,
            ],
        }
    }
}

impl LevelTable {
    pub fn max_level(&self) -> u32 {
        u32::try_from(self.costs.len()).unwrap_or(u32::MAX - 1) + 1
    }
}

impl Levels for LevelTable {
    fn highest_level_for(&self, balance: f64) -> u32 {
        let mut level = 1;
        while level < self.max_level() && self.total_cost_for(level + 1) <= balance {
            level += 1;
        }
        level
    }

    fn total_cost_for(&self, level: u32) -> f64 {
        let paid_levels = usize::try_from(level.saturating_sub(1)).unwrap_or(usize::MAX);
        self.costs.iter().take(paid_levels).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub weight: i32,
    pub name: String,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.weight)
    }
}

/// The role catalog. The lowest weight is the default role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Role>", into = "Vec<Role>")]
pub struct RoleTable {
    roles: Vec<Role>,
}

impl RoleTable {
    pub fn new(mut roles: Vec<Role>) -> anyhow::Result<Self> {
        roles.sort_by_key(|role| role.weight);
        roles.dedup_by_key(|role| role.weight);
        if roles.is_empty() {
            return Err(anyhow::format_err!("The role catalog needs at least one role"));
        }
        Ok(Self { roles })
    }
}

impl Default for RoleTable {
    fn default() -> Self {
        Self {
            roles: vec![
                Role {
                    weight: 1,
                    name: String::from("Resident"),
                },
                Role {
                    weight: 2,
                    name: String::from("Trustee"),
                },
                Role {
                    weight: 3,
                    name: String::from("Mayor"),
                },
            ],
        }
    }
}

impl TryFrom<Vec<Role>> for RoleTable {
    type Error = anyhow::Error;

    fn try_from(roles: Vec<Role>) -> Result<Self, Self::Error> {
        Self::new(roles).context("Failed to load the role catalog")
    }
}

impl From<RoleTable> for Vec<Role> {
    fn from(table: RoleTable) -> Self {
        table.roles
    }
}

impl Roles for RoleTable {
    fn role_for_weight(&self, weight: i32) -> Option<&Role> {
        self.roles.iter().find(|role| role.weight == weight)
    }

    fn default_role(&self) -> &Role {
        &self.roles[0]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultRulePresets {
    pub rules: BTreeMap<ClaimType, Rules>,
}

impl Default for DefaultRulePresets {
    fn default() -> Self {
        let rules = ClaimType::iter()
            .map(|claim_type| {
                let rules = match claim_type {
                    ClaimType::Claim | ClaimType::Plot => Rules::all(false),
                    ClaimType::Farm => Rules::of(&[
                        (Flag::MonsterSpawning, true),
                        (Flag::PublicFarmAccess, true),
                    ]),
                };
                (claim_type, rules)
            })
            .collect();
        Self { rules }
    }
}

impl RulePresets for DefaultRulePresets {
    fn default_claim_rules(&self) -> BTreeMap<ClaimType, Rules> {
        self.rules.clone()
    }
}
