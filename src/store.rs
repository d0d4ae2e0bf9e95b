//! The successor persistence layer, as far as the migration needs it.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use crate::error::PersistError;
use crate::model::{ClaimWorld, ServerWorld, Town};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub uuid: Uuid,
    pub username: String,
}

impl User {
    pub fn of(uuid: Uuid, username: &str) -> Self {
        Self {
            uuid,
            username: username.to_owned(),
        }
    }
}

pub trait Database {
    /// Registers a new town. Fails with [`PersistError::Conflict`] when the
    /// town cannot exist in the successor, e.g. because its name is taken.
    fn create_town(&mut self, name: &str, mayor: &User) -> Result<(), PersistError>;
    /// Stores the full state of a town created with [`Database::create_town`].
    fn update_town(&mut self, town: &Town) -> Result<(), PersistError>;
    /// Whether a town with this name is already stored.
    fn has_town(&self, name: &str) -> anyhow::Result<bool>;
    /// Every claim world the successor has registered so far.
    fn claim_worlds(&mut self) -> anyhow::Result<HashMap<ServerWorld, ClaimWorld>>;
    fn update_claim_world(&mut self, claim_world: &ClaimWorld) -> anyhow::Result<()>;
    /// Deletes claim worlds without any claims, returns how many were removed.
    fn prune_claim_worlds(&mut self) -> anyhow::Result<usize>;
}

/// A successor store held in memory. Used to preview a migration and in tests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryDatabase {
    /// keyed by lowercase name
    pub towns: BTreeMap<String, Town>,
    pub claim_worlds: Vec<(ServerWorld, ClaimWorld)>,
}

impl MemoryDatabase {
    /// Registers a claim world the way a server does when it first loads a world.
    pub fn register_world(&mut self, server_world: ServerWorld) -> i32 {
        let id = self
            .claim_worlds
            .iter()
            .map(|(_, claim_world)| claim_world.id)
            .max()
            .unwrap_or(0)
            + 1;
        self.claim_worlds.push((server_world, ClaimWorld::new(id)));
        id
    }

    pub fn town(&self, name: &str) -> Option<&Town> {
        self.towns.get(&name.to_lowercase())
    }

    pub fn claim_world(&self, server_world: &ServerWorld) -> Option<&ClaimWorld> {
        self.claim_worlds
            .iter()
            .find(|(key, _)| key == server_world)
            .map(|(_, claim_world)| claim_world)
    }
}

impl Database for MemoryDatabase {
    fn create_town(&mut self, name: &str, mayor: &User) -> Result<(), PersistError> {
        let key = name.to_lowercase();
        if self.towns.contains_key(&key) {
            return Err(PersistError::Conflict(format!(
                "a town named {name} already exists"
            )));
        }
        let id = self.towns.values().map(|town| town.id).max().unwrap_or(0) + 1;
        let mut town = Town::new(id, name);
        town.add_member(mayor.uuid, i32::MAX);
        self.towns.insert(key, town);
        Ok(())
    }

    fn update_town(&mut self, town: &Town) -> Result<(), PersistError> {
        match self.towns.get_mut(&town.name.to_lowercase()) {
            Some(stored) => {
                *stored = town.clone();
                Ok(())
            }
            None => Err(PersistError::Conflict(format!(
                "town {} has not been created",
                town.name
            ))),
        }
    }

    fn has_town(&self, name: &str) -> anyhow::Result<bool> {
        Ok(self.town(name).is_some())
    }

    fn claim_worlds(&mut self) -> anyhow::Result<HashMap<ServerWorld, ClaimWorld>> {
        Ok(self.claim_worlds.iter().cloned().collect())
    }

    fn update_claim_world(&mut self, claim_world: &ClaimWorld) -> anyhow::Result<()> {
        let (_, stored) = self
            .claim_worlds
            .iter_mut()
            .find(|(_, stored)| stored.id == claim_world.id)
            .ok_or_else(|| anyhow::format_err!("Claim world #{} does not exist", claim_world.id))?;
        *stored = claim_world.clone();
        Ok(())
    }

    fn prune_claim_worlds(&mut self) -> anyhow::Result<usize> {
        let before = self.claim_worlds.len();
        self.claim_worlds
            .retain(|(_, claim_world)| !claim_world.is_empty());
        Ok(before - self.claim_worlds.len())
    }
}
