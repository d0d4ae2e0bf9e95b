use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use super::claim::ClaimType;
use super::rules::Rules;
use super::world::World;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub world: World,
    pub yaw: f32,
    pub pitch: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spawn {
    pub position: Position,
    pub server: String,
    pub public: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Town {
    pub id: i32,
    pub name: String,
    pub bio: Option<String>,
    pub greeting: Option<String>,
    pub farewell: Option<String>,
    /// player uuid -> role weight
    pub members: BTreeMap<Uuid, i32>,
    pub rules: BTreeMap<ClaimType, Rules>,
    pub claims: i32,
    /// May be negative: a town whose legacy money did not cover its level is in debt.
    pub money: f64,
    pub level: u32,
    pub spawn: Option<Spawn>,
    pub color: String,
    pub bonus_claims: i32,
    pub bonus_members: i32,
}

impl Town {
    pub fn new(id: i32, name: &str) -> Self {
        Self {
            id,
            name: name.to_owned(),
            bio: None,
            greeting: None,
            farewell: None,
            members: BTreeMap::new(),
            rules: BTreeMap::new(),
            claims: 0,
            money: 0.0,
            level: 1,
            spawn: None,
            color: Self::color_for(name),
            bonus_claims: 0,
            bonus_members: 0,
        }
    }

    pub fn add_member(&mut self, player: Uuid, weight: i32) {
        self.members.insert(player, weight);
    }

    /// The member holding the highest role weight.
    pub fn mayor(&self) -> Option<Uuid> {
        self.members
            .iter()
            .max_by_key(|(_, weight)| **weight)
            .map(|(uuid, _)| *uuid)
    }

    /// A color that is stable for a given town name, so re-running a
    /// migration paints every town the same way.
    #[allow(clippy::cast_sign_loss)]
    pub fn color_for(name: &str) -> String {
        let mut rng = ChaCha8Rng::seed_from_u64(u64::from(java_string_hash(name) as u32));
        let [r, g, b]: [u8; 3] = rng.gen();
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}

impl fmt::Display for Town {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Town({}, {}, {} members)",
            self.id,
            self.name,
            self.members.len()
        )
    }
}

// the seed the successor plugin derives colors from
fn java_string_hash(text: &str) -> i32 {
    text.encode_utf16()
        .fold(0i32, |hash, unit| hash.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_hash_matches_java() {
        assert_eq!(java_string_hash(""), 0);
        assert_eq!(java_string_hash("a"), 97);
        assert_eq!(java_string_hash("Alpha"), 63357246);
    }

    #[test]
    fn color_is_deterministic_per_name() {
        let first = Town::color_for("Alpha");
        assert_eq!(first, Town::color_for("Alpha"));
        assert_eq!(first.len(), 7);
        assert!(first.starts_with('#'));
        assert_eq!(Town::new(1, "Alpha").color, first);
    }

    #[test]
    fn mayor_is_highest_weight_member() {
        let mut town = Town::new(1, "Alpha");
        assert_eq!(town.mayor(), None);

        let resident = Uuid::from_u128(1);
        let mayor = Uuid::from_u128(2);
        town.add_member(resident, 1);
        town.add_member(mayor, 3);
        assert_eq!(town.mayor(), Some(mayor));
    }
}
