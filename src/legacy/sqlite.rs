use anyhow::Context;
use rusqlite::{Connection, OpenFlags, Row};
use std::path::Path;

use crate::config::TableNames;

use super::rows::{
    LegacyBonusRow, LegacyClaimCountRow, LegacyClaimRow, LegacyFlagRow, LegacyMemberRow,
    LegacySpawnRow, LegacyTownRow,
};
use super::statement::Statement;
use super::LegacySource;

/// A legacy store kept in an embedded sqlite file.
pub struct SqliteSource {
    connection: Connection,
    tables: TableNames,
}

impl SqliteSource {
    /// Opens the file read only; a missing file is an error rather than a
    /// freshly created empty database.
    pub fn open(path: &Path, tables: TableNames) -> anyhow::Result<Self> {
        let connection = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .with_context(|| format!("Failed to open legacy database at {path:?}"))?;
        Ok(Self { connection, tables })
    }

    fn query<T, F>(&self, statement: Statement, mapper: F) -> anyhow::Result<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let sql = self.tables.format_statement(statement);
        let mut prepared = self
            .connection
            .prepare(&sql)
            .with_context(|| format!("Failed to read {statement:?} from legacy database (build statement)"))?;
        let rows = prepared
            .query_map([], mapper)
            .with_context(|| format!("Failed to read {statement:?} from legacy database (perform query)"))?
            .collect::<Result<Vec<T>, rusqlite::Error>>()
            .with_context(|| format!("Failed to convert legacy {statement:?} row"))?;
        Ok(rows)
    }
}

impl LegacySource for SqliteSource {
    fn towns(&mut self) -> anyhow::Result<Vec<LegacyTownRow>> {
        self.query(Statement::Towns, |row| {
            Ok(LegacyTownRow {
                id: row.get(0)?,
                name: row.get(1)?,
                bio: row.get(2)?,
                greeting: row.get(3)?,
                farewell: row.get(4)?,
                money: row.get(5)?,
            })
        })
    }

    fn members(&mut self) -> anyhow::Result<Vec<LegacyMemberRow>> {
        self.query(Statement::Members, |row| {
            Ok(LegacyMemberRow {
                uuid: row.get(0)?,
                town_id: row.get(1)?,
                role_weight: row.get(2)?,
            })
        })
    }

    fn claim_counts(&mut self) -> anyhow::Result<Vec<LegacyClaimCountRow>> {
        self.query(Statement::ClaimCounts, |row| {
            Ok(LegacyClaimCountRow {
                town_id: row.get(0)?,
                claims: row.get(1)?,
            })
        })
    }

    fn spawns(&mut self) -> anyhow::Result<Vec<LegacySpawnRow>> {
        self.query(Statement::Spawns, |row| {
            Ok(LegacySpawnRow {
                town_id: row.get(0)?,
                public: row.get::<usize, Option<bool>>(1)?.unwrap_or(false),
                server: row.get(2)?,
                world: row.get(3)?,
                x: row.get(4)?,
                y: row.get(5)?,
                z: row.get(6)?,
                yaw: row.get(7)?,
                pitch: row.get(8)?,
            })
        })
    }

    fn bonuses(&mut self) -> anyhow::Result<Vec<LegacyBonusRow>> {
        self.query(Statement::Bonuses, |row| {
            Ok(LegacyBonusRow {
                town_id: row.get(0)?,
                bonus_claims: row.get::<usize, Option<i32>>(1)?.unwrap_or(0),
                bonus_members: row.get::<usize, Option<i32>>(2)?.unwrap_or(0),
            })
        })
    }

    fn flags(&mut self) -> anyhow::Result<Vec<LegacyFlagRow>> {
        self.query(Statement::Flags, |row| {
            Ok(LegacyFlagRow {
                town_id: row.get(0)?,
                chunk_type: row.get(1)?,
                explosion_damage: row.get(2)?,
                fire_damage: row.get(3)?,
                mob_griefing: row.get(4)?,
                monster_spawning: row.get(5)?,
                pvp: row.get(6)?,
                public_interact_access: row.get(7)?,
                public_container_access: row.get(8)?,
                public_build_access: row.get(9)?,
                public_farm_access: row.get(10)?,
            })
        })
    }

    fn claims(&mut self) -> anyhow::Result<Vec<LegacyClaimRow>> {
        self.query(Statement::Claims, |row| {
            Ok(LegacyClaimRow {
                chunk_x: row.get(0)?,
                chunk_z: row.get(1)?,
                chunk_type: row.get(2)?,
                town_id: row.get(3)?,
                world: row.get(4)?,
                server: row.get(5)?,
            })
        })
    }
}
