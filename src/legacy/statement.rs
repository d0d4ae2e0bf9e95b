use crate::config::TableNames;

/// The fixed set of queries run against the legacy schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statement {
    Towns,
    Members,
    ClaimCounts,
    Spawns,
    Bonuses,
    Flags,
    Claims,
}

impl TableNames {
    /// Renders `statement` against the configured table names. Column order
    /// is fixed; the row readers rely on it.
    pub fn format_statement(&self, statement: Statement) -> String {
        let towns = &self.towns;
        match statement {
            Statement::Towns => format!(
                "SELECT `id`, `name`, `bio`, `greeting_message`, `farewell_message`, `money` \
                 FROM `{towns}`"
            ),
            Statement::Members => format!(
                "SELECT `uuid`, `town_id`, `town_role` FROM `{}` WHERE `town_id` IS NOT NULL",
                self.players
            ),
            Statement::ClaimCounts => format!(
                "SELECT `town_id`, COUNT(*) AS `claims` FROM `{}` GROUP BY `town_id`",
                self.claims
            ),
            Statement::Spawns => format!(
                "SELECT `{towns}`.`id` AS `town_id`, `is_spawn_public`, `server`, `world`, \
                 `x`, `y`, `z`, `yaw`, `pitch` \
                 FROM `{towns}` \
                 INNER JOIN `{locations}` ON `{towns}`.`spawn_location_id` = `{locations}`.`id`",
                locations = self.locations
            ),
            Statement::Bonuses => format!(
                "SELECT `town_id`, SUM(`bonus_claims`) AS `bonus_claims`, \
                 SUM(`bonus_members`) AS `bonus_members` \
                 FROM `{}` GROUP BY `town_id`",
                self.bonuses
            ),
            Statement::Flags => format!(
                "SELECT `town_id`, `chunk_type`, `explosion_damage`, `fire_damage`, \
                 `mob_griefing`, `monster_spawning`, `pvp`, `public_interact_access`, \
                 `public_container_access`, `public_build_access`, `public_farm_access` \
                 FROM `{}`",
                self.flags
            ),
            Statement::Claims => format!(
                "SELECT `chunk_x`, `chunk_z`, `chunk_type`, `town_id`, `world`, `server` \
                 FROM `{}`",
                self.claims
            ),
        }
    }
}
