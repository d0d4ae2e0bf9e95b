//! The successor domain model the legacy data is converted into.

pub mod claim;
pub mod rules;
pub mod town;
pub mod world;

pub use claim::{Chunk, Claim, ClaimType, ClaimWorld};
pub use rules::{Flag, Rules};
pub use town::{Position, Spawn, Town};
pub use world::{Environment, ServerWorld, World};
