use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use strum_macros::EnumIter;

use crate::error::MigrationError;

#[derive(Debug, Clone, Copy, EnumIter, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimType {
    Claim,
    Farm,
    Plot,
}

impl fmt::Display for ClaimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClaimType::Claim => write!(f, "claim"),
            ClaimType::Farm => write!(f, "farm"),
            ClaimType::Plot => write!(f, "plot"),
        }
    }
}

impl ClaimType {
    /// Decodes the `chunk_type` column of the legacy claims and flags tables.
    ///
    /// Legacy codes (v1 schema): `0` claim, `1` farm, `2` plot. Anything else
    /// is an [`MigrationError::UnknownClaimType`].
    pub fn from_legacy(code: i32) -> Result<Self, MigrationError> {
        match code {
            0 => Ok(ClaimType::Claim),
            1 => Ok(ClaimType::Farm),
            2 => Ok(ClaimType::Plot),
            other => Err(MigrationError::UnknownClaimType(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Chunk {
    pub x: i32,
    pub z: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub chunk: Chunk,
    pub claim_type: ClaimType,
}

impl Claim {
    pub fn at(x: i32, z: i32, claim_type: ClaimType) -> Self {
        Self {
            chunk: Chunk { x, z },
            claim_type,
        }
    }
}

/// All claims of one server world, grouped by the id of the owning town.
#[allow(clippy::module_name_repetitions)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimWorld {
    pub id: i32,
    pub claims: BTreeMap<i32, Vec<Claim>>,
}

impl ClaimWorld {
    pub fn new(id: i32) -> Self {
        Self {
            id,
            claims: BTreeMap::new(),
        }
    }

    pub fn add_claim(&mut self, town_id: i32, claim: Claim) {
        self.claims.entry(town_id).or_default().push(claim);
    }

    pub fn claim_count(&self) -> usize {
        self.claims.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.claim_count() == 0
    }
}
