use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Normal,
    Nether,
    End,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Normal => write!(f, "normal"),
            Environment::Nether => write!(f, "nether"),
            Environment::End => write!(f, "end"),
        }
    }
}

impl Environment {
    /// The legacy schema never stored a dimension, so it is guessed from the
    /// vanilla world folder naming. The suffix match is case sensitive.
    pub fn from_world_name(name: &str) -> Self {
        if name.ends_with("_nether") {
            Environment::Nether
        } else if name.ends_with("_the_end") {
            Environment::End
        } else {
            Environment::Normal
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    pub uuid: Uuid,
    pub name: String,
    pub environment: Environment,
}

impl World {
    /// A world recovered from legacy rows. The legacy store kept no world ids,
    /// so the nil uuid stands in for it.
    pub fn legacy(name: &str) -> Self {
        Self {
            uuid: Uuid::nil(),
            name: name.to_owned(),
            environment: Environment::from_world_name(name),
        }
    }
}

// Worlds are identified by name: legacy worlds carry a placeholder uuid and
// still have to line up with the worlds the successor registered.
impl PartialEq for World {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for World {}

impl Hash for World {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.environment)
    }
}

/// Key of a claim world shard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServerWorld {
    pub server: String,
    pub world: World,
}

impl ServerWorld {
    pub fn new(server: &str, world: World) -> Self {
        Self {
            server: server.to_owned(),
            world,
        }
    }

    pub fn legacy(server: &str, world_name: &str) -> Self {
        Self::new(server, World::legacy(world_name))
    }
}

impl fmt::Display for ServerWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.server, self.world)
    }
}
