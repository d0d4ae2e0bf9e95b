use std::fmt;
use uuid::Uuid;

use crate::error::RowKind;
use crate::model::ServerWorld;

/// A condition that did not stop the migration but lost or changed data.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    UnknownRoleWeight {
        town_id: i32,
        player: Uuid,
        weight: i32,
        substitute: i32,
    },
    MissingClaimWorld {
        server_world: ServerWorld,
        town_id: i32,
    },
    MissingTown {
        kind: RowKind,
        town_id: i32,
    },
    TownSkipped {
        town: String,
        reason: String,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnknownRoleWeight {
                town_id,
                player,
                weight,
                substitute,
            } => write!(
                f,
                "No role found for weight {weight} (player {player} of town #{town_id}), \
                 using the default role ({substitute}) instead. \
                 Does the role catalog match the legacy setup?"
            ),
            Warning::MissingClaimWorld {
                server_world,
                town_id,
            } => write!(
                f,
                "Could not find claim world for {server_world}, dropped a claim of town #{town_id}. \
                 Are all servers online and running the latest version?"
            ),
            Warning::MissingTown { kind, town_id } => write!(
                f,
                "Skipped legacy {kind} row: town #{town_id} does not exist"
            ),
            Warning::TownSkipped { town, reason } => {
                write!(f, "Skipped migrating {town}: {reason}")
            }
        }
    }
}

/// Collects warnings and logs each one as it is recorded.
#[derive(Debug, Default)]
pub struct Warnings(Vec<Warning>);

impl Warnings {
    pub fn push(&mut self, warning: Warning) {
        log::warn!("{warning}");
        self.0.push(warning);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<Warning> {
        self.0
    }
}
