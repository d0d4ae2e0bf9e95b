use anyhow::Context;
use mysql::prelude::{FromRow, Queryable};
use mysql::{Conn, Opts, OptsBuilder};

use crate::config::{DatabaseConfig, TableNames};

use super::rows::{
    LegacyBonusRow, LegacyClaimCountRow, LegacyClaimRow, LegacyFlagRow, LegacyMemberRow,
    LegacySpawnRow, LegacyTownRow,
};
use super::statement::Statement;
use super::LegacySource;

/// A legacy store on a MySQL / MariaDB server.
pub struct MySqlSource {
    connection: Conn,
    tables: TableNames,
}

impl MySqlSource {
    pub fn open(config: &DatabaseConfig, tables: TableNames) -> anyhow::Result<Self> {
        let opts = OptsBuilder::new()
            .ip_or_hostname(Some(config.host.clone()))
            .tcp_port(config.port)
            .db_name(Some(config.name.clone()))
            .user(Some(config.username.clone()))
            .pass(Some(config.password.clone()));
        let connection = Conn::new(Opts::from(opts)).with_context(|| {
            format!(
                "Failed to connect to legacy database {} at {}:{}",
                config.name, config.host, config.port
            )
        })?;
        Ok(Self { connection, tables })
    }

    fn query<T, U, F>(&mut self, statement: Statement, mapper: F) -> anyhow::Result<Vec<U>>
    where
        T: FromRow,
        F: FnMut(T) -> U,
    {
        let sql = self.tables.format_statement(statement);
        self.connection
            .query_map(sql, mapper)
            .with_context(|| format!("Failed to read {statement:?} from legacy database"))
    }
}

impl LegacySource for MySqlSource {
    fn towns(&mut self) -> anyhow::Result<Vec<LegacyTownRow>> {
        self.query(
            Statement::Towns,
            |(id, name, bio, greeting, farewell, money): (
                i32,
                String,
                Option<String>,
                Option<String>,
                Option<String>,
                f64,
            )| LegacyTownRow {
                id,
                name,
                bio,
                greeting,
                farewell,
                money,
            },
        )
    }

    fn members(&mut self) -> anyhow::Result<Vec<LegacyMemberRow>> {
        self.query(Statement::Members, |(uuid, town_id, role_weight): (String, i32, i32)| {
            LegacyMemberRow {
                uuid,
                town_id,
                role_weight,
            }
        })
    }

    fn claim_counts(&mut self) -> anyhow::Result<Vec<LegacyClaimCountRow>> {
        self.query(Statement::ClaimCounts, |(town_id, claims): (i32, i32)| {
            LegacyClaimCountRow { town_id, claims }
        })
    }

    fn spawns(&mut self) -> anyhow::Result<Vec<LegacySpawnRow>> {
        self.query(
            Statement::Spawns,
            |(town_id, public, server, world, x, y, z, yaw, pitch): (
                i32,
                Option<bool>,
                Option<String>,
                Option<String>,
                Option<f64>,
                Option<f64>,
                Option<f64>,
                Option<f32>,
                Option<f32>,
            )| LegacySpawnRow {
                town_id,
                public: public.unwrap_or(false),
                server,
                world,
                x,
                y,
                z,
                yaw,
                pitch,
            },
        )
    }

    fn bonuses(&mut self) -> anyhow::Result<Vec<LegacyBonusRow>> {
        self.query(
            Statement::Bonuses,
            |(town_id, bonus_claims, bonus_members): (i32, Option<i32>, Option<i32>)| {
                LegacyBonusRow {
                    town_id,
                    bonus_claims: bonus_claims.unwrap_or(0),
                    bonus_members: bonus_members.unwrap_or(0),
                }
            },
        )
    }

    fn flags(&mut self) -> anyhow::Result<Vec<LegacyFlagRow>> {
        self.query(
            Statement::Flags,
            |(
                town_id,
                chunk_type,
                explosion_damage,
                fire_damage,
                mob_griefing,
                monster_spawning,
                pvp,
                public_interact_access,
                public_container_access,
                public_build_access,
                public_farm_access,
            ): (i32, i32, bool, bool, bool, bool, bool, bool, bool, bool, bool)| LegacyFlagRow {
                town_id,
                chunk_type,
                explosion_damage,
                fire_damage,
                mob_griefing,
                monster_spawning,
                pvp,
                public_interact_access,
                public_container_access,
                public_build_access,
                public_farm_access,
            },
        )
    }

    fn claims(&mut self) -> anyhow::Result<Vec<LegacyClaimRow>> {
        self.query(
            Statement::Claims,
            |(chunk_x, chunk_z, chunk_type, town_id, world, server): (
                i32,
                i32,
                i32,
                i32,
                String,
                String,
            )| LegacyClaimRow {
                chunk_x,
                chunk_z,
                chunk_type,
                town_id,
                world,
                server,
            },
        )
    }
}
