use rusqlite::{params, Connection};
use std::path::PathBuf;
use tempfile::TempDir;
use uuid::Uuid;

use husktowns_migrator::catalog::{DefaultRulePresets, LevelTable, RoleTable};
use husktowns_migrator::config::{DatabaseKind, MissingTownPolicy, OnMissingTown, TableName};
use husktowns_migrator::error::RowKind;
use husktowns_migrator::model::{ClaimType, Environment, Flag, ServerWorld};
use husktowns_migrator::store::MemoryDatabase;
use husktowns_migrator::{
    LiveState, MigrationError, MigrationOutcome, MigrationState, Migrator, MigratorConfig, Warning,
};

const MAYOR: Uuid = Uuid::from_u128(0x1000);
const RESIDENT: Uuid = Uuid::from_u128(0x2000);
const STRANGER: Uuid = Uuid::from_u128(0x3000);

/// A legacy sqlite store on disk, with the v1 schema.
struct LegacyFixture {
    _dir: TempDir,
    path: PathBuf,
    prefix: String,
}

impl LegacyFixture {
    fn new() -> Self {
        Self::with_prefix("husktowns_")
    }

    fn with_prefix(prefix: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("HuskTownsData.db");
        let fixture = Self {
            _dir: dir,
            path,
            prefix: prefix.to_owned(),
        };
        let p = prefix;
        fixture
            .connection()
            .execute_batch(&format!(
                "CREATE TABLE {p}locations (id INTEGER PRIMARY KEY, server TEXT, world TEXT,
                     x REAL, y REAL, z REAL, yaw REAL, pitch REAL);
                 CREATE TABLE {p}towns (id INTEGER PRIMARY KEY, name TEXT NOT NULL, money REAL,
                     founded TIMESTAMP, greeting_message TEXT, farewell_message TEXT, bio TEXT,
                     spawn_location_id INTEGER, is_spawn_public INTEGER);
                 CREATE TABLE {p}players (id INTEGER PRIMARY KEY, username TEXT, uuid TEXT,
                     town_id INTEGER, town_role INTEGER, is_teleporting INTEGER);
                 CREATE TABLE {p}claims (id INTEGER PRIMARY KEY, town_id INTEGER, claim_time TIMESTAMP,
                     claimer_id INTEGER, server TEXT, world TEXT, chunk_x INTEGER, chunk_z INTEGER,
                     chunk_type INTEGER, plot_owner_id INTEGER);
                 CREATE TABLE {p}flags (town_id INTEGER, chunk_type INTEGER,
                     explosion_damage INTEGER, fire_damage INTEGER, mob_griefing INTEGER,
                     monster_spawning INTEGER, pvp INTEGER, public_interact_access INTEGER,
                     public_container_access INTEGER, public_build_access INTEGER,
                     public_farm_access INTEGER);
                 CREATE TABLE {p}bonus (id INTEGER PRIMARY KEY, town_id INTEGER, applier_id INTEGER,
                     applied_time TIMESTAMP, bonus_claims INTEGER, bonus_members INTEGER);"
            ))
            .unwrap();
        fixture
    }

    fn connection(&self) -> Connection {
        Connection::open(&self.path).unwrap()
    }

    fn town(&self, id: i32, name: &str, money: f64) -> &Self {
        self.connection()
            .execute(
                &format!(
                    "INSERT INTO {}towns (id, name, money, greeting_message, farewell_message, bio)
                     VALUES (?1, ?2, ?3, 'Welcome', 'Goodbye', ?4)",
                    self.prefix
                ),
                params![id, name, money, format!("The town of {name}")],
            )
            .unwrap();
        self
    }

    fn member(&self, uuid: Uuid, town_id: Option<i32>, role: i32) -> &Self {
        self.connection()
            .execute(
                &format!(
                    "INSERT INTO {}players (username, uuid, town_id, town_role) VALUES ('player', ?1, ?2, ?3)",
                    self.prefix
                ),
                params![uuid.to_string(), town_id, role],
            )
            .unwrap();
        self
    }

    fn spawn(&self, town_id: i32, server: &str, world: &str, public: bool) -> &Self {
        let connection = self.connection();
        connection
            .execute(
                &format!(
                    "INSERT INTO {}locations (server, world, x, y, z, yaw, pitch)
                     VALUES (?1, ?2, 10.5, 70.0, -20.5, 180.0, 15.0)",
                    self.prefix
                ),
                params![server, world],
            )
            .unwrap();
        let location_id = connection.last_insert_rowid();
        connection
            .execute(
                &format!(
                    "UPDATE {}towns SET spawn_location_id = ?1, is_spawn_public = ?2 WHERE id = ?3",
                    self.prefix
                ),
                params![location_id, public, town_id],
            )
            .unwrap();
        self
    }

    fn claim(&self, town_id: i32, server: &str, world: &str, x: i32, z: i32, chunk_type: i32) -> &Self {
        self.connection()
            .execute(
                &format!(
                    "INSERT INTO {}claims (town_id, server, world, chunk_x, chunk_z, chunk_type)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    self.prefix
                ),
                params![town_id, server, world, x, z, chunk_type],
            )
            .unwrap();
        self
    }

    fn flags(&self, town_id: i32, chunk_type: i32, pvp: bool, public_build: bool) -> &Self {
        self.connection()
            .execute(
                &format!(
                    "INSERT INTO {}flags VALUES (?1, ?2, 0, 0, 0, 1, ?3, 0, 0, ?4, 0)",
                    self.prefix
                ),
                params![town_id, chunk_type, pvp, public_build],
            )
            .unwrap();
        self
    }

    fn bonus(&self, town_id: i32, claims: i32, members: i32) -> &Self {
        self.connection()
            .execute(
                &format!(
                    "INSERT INTO {}bonus (town_id, bonus_claims, bonus_members) VALUES (?1, ?2, ?3)",
                    self.prefix
                ),
                params![town_id, claims, members],
            )
            .unwrap();
        self
    }

    fn execute(&self, sql: &str) -> &Self {
        self.connection()
            .execute(&sql.replace("{p}", &self.prefix), [])
            .unwrap();
        self
    }

    fn config(&self) -> MigratorConfig {
        let mut config = MigratorConfig::default();
        config.database.kind = DatabaseKind::Sqlite;
        config.database.file = Some(self.path.clone());
        config
    }
}

fn levels() -> LevelTable {
    // level 2 at 300, level 3 at 800, level 4 at 1800
    LevelTable {
        costs: vec![300.0, 500.0, 1000.0],
    }
}

fn target(worlds: &[(&str, &str)]) -> MemoryDatabase {
    let mut db = MemoryDatabase::default();
    for (server, world) in worlds {
        db.register_world(ServerWorld::legacy(server, world));
    }
    db
}

fn migrate(
    config: &MigratorConfig,
    db: &mut MemoryDatabase,
) -> (MigrationState, anyhow::Result<MigrationOutcome>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let levels = levels();
    let roles = RoleTable::default();
    let presets = DefaultRulePresets::default();
    let mut migrator = Migrator::from_config(config, &levels, &roles, &presets);
    assert_eq!(migrator.state(), MigrationState::Idle);
    let result = migrator.run(config, db);
    (migrator.state(), result)
}

#[test]
fn town_balance_is_money_left_after_level_cost() {
    let legacy = LegacyFixture::new();
    legacy
        .town(1, "Alpha", 1000.0)
        .member(MAYOR, Some(1), 3);

    let mut db = target(&[]);
    let (state, result) = migrate(&legacy.config(), &mut db);
    let outcome = result.unwrap();

    assert_eq!(state, MigrationState::Succeeded);
    let alpha = &outcome.towns[0];
    assert_eq!(alpha.id, 1);
    assert_eq!(alpha.level, 3);
    assert_eq!(alpha.money, 200.0);
    assert_eq!(alpha.greeting.as_deref(), Some("Welcome"));
    assert_eq!(alpha.bio.as_deref(), Some("The town of Alpha"));
    assert_eq!(db.town("Alpha"), Some(alpha));
}

#[test]
fn unknown_role_weight_becomes_default_role() {
    let legacy = LegacyFixture::new();
    legacy
        .town(1, "Alpha", 0.0)
        .member(MAYOR, Some(1), 3)
        .member(STRANGER, Some(1), 999)
        .member(RESIDENT, None, 2);

    let mut db = target(&[]);
    let outcome = migrate(&legacy.config(), &mut db).1.unwrap();

    let alpha = &outcome.towns[0];
    assert_eq!(alpha.members.len(), 2);
    assert_eq!(alpha.members[&STRANGER], 1);
    assert_eq!(alpha.members[&MAYOR], 3);
    assert!(!alpha.members.contains_key(&RESIDENT));
    assert_eq!(outcome.warnings.len(), 1);
    assert!(matches!(
        outcome.warnings[0],
        Warning::UnknownRoleWeight { weight: 999, substitute: 1, .. }
    ));
    assert!(outcome.warnings[0].to_string().contains("999"));
}

#[test]
fn claims_in_unregistered_worlds_are_dropped() {
    let legacy = LegacyFixture::new();
    legacy
        .town(1, "Alpha", 0.0)
        .member(MAYOR, Some(1), 3)
        .claim(1, "survival", "world_nether", 5, 10, 1);

    let mut db = target(&[("survival", "world")]);
    let outcome = migrate(&legacy.config(), &mut db).1.unwrap();

    assert_eq!(outcome.merged_claims, 0);
    assert!(outcome.claim_worlds.is_empty());
    assert_eq!(outcome.pruned_claim_worlds, 1);
    assert!(db.claim_worlds.is_empty());
    let missing: Vec<_> = outcome
        .warnings
        .iter()
        .filter(|warning| matches!(warning, Warning::MissingClaimWorld { .. }))
        .collect();
    assert_eq!(missing.len(), 1);
    assert!(missing[0].to_string().contains("survival/world_nether"));
    // the claim count still reflects the legacy claims table
    assert_eq!(outcome.towns[0].claims, 1);
}

#[test]
fn full_migration_rebuilds_towns_and_claim_worlds() {
    let legacy = LegacyFixture::new();
    legacy
        .town(1, "Alpha", 1000.0)
        .town(2, "Beta", 50.0)
        .member(MAYOR, Some(1), 3)
        .member(RESIDENT, Some(1), 1)
        .member(STRANGER, Some(2), 3)
        .spawn(1, "survival", "world_nether", true)
        .bonus(1, 5, 2)
        .bonus(1, 3, 1)
        .flags(1, 0, true, false)
        .flags(1, 2, false, true)
        .flags(1, 0, false, true)
        .claim(1, "survival", "world", 0, 0, 0)
        .claim(1, "survival", "world", 0, 1, 1)
        .claim(2, "survival", "world", 8, 8, 2)
        .claim(2, "creative", "world", 1, 1, 0);

    let mut db = target(&[("survival", "world"), ("survival", "world_the_end")]);
    let (state, result) = migrate(&legacy.config(), &mut db);
    let outcome = result.unwrap();
    assert_eq!(state, MigrationState::Succeeded);

    let alpha = &outcome.towns[0];
    assert_eq!(alpha.claims, 2);
    assert_eq!(alpha.bonus_claims, 8);
    assert_eq!(alpha.bonus_members, 3);
    assert_eq!(alpha.mayor(), Some(MAYOR));
    let spawn = alpha.spawn.as_ref().unwrap();
    assert!(spawn.public);
    assert_eq!(spawn.server, "survival");
    assert_eq!(spawn.position.world.name, "world_nether");
    assert_eq!(spawn.position.world.environment, Environment::Nether);
    assert_eq!(spawn.position.x, 10.5);
    assert_eq!(spawn.position.yaw, 180.0);

    let claim_rules = &alpha.rules[&ClaimType::Claim];
    assert!(!claim_rules.get(Flag::Pvp));
    assert!(claim_rules.get(Flag::PublicBuildAccess));
    assert!(claim_rules.get(Flag::MonsterSpawning));
    assert!(alpha.rules[&ClaimType::Plot].get(Flag::PublicBuildAccess));
    assert_eq!(
        alpha.rules[&ClaimType::Farm],
        DefaultRulePresets::default().rules[&ClaimType::Farm]
    );

    let beta = &outcome.towns[1];
    assert_eq!(beta.claims, 2);
    assert!(beta.spawn.is_none());
    assert_eq!(beta.level, 1);
    assert_eq!(beta.money, 50.0);

    let survival = ServerWorld::legacy("survival", "world");
    assert_eq!(outcome.merged_claims, 3);
    assert_eq!(outcome.claim_worlds.len(), 1);
    assert_eq!(outcome.pruned_claim_worlds, 1);
    let claim_world = &outcome.claim_worlds[&survival];
    assert_eq!(claim_world.claims[&1].len(), 2);
    assert_eq!(claim_world.claims[&1][1].claim_type, ClaimType::Farm);
    assert_eq!(claim_world.claims[&2][0].claim_type, ClaimType::Plot);
    assert_eq!(db.claim_world(&survival), Some(claim_world));
    assert!(db
        .claim_world(&ServerWorld::legacy("survival", "world_the_end"))
        .is_none());
    assert_eq!(outcome.warnings.len(), 1);

    let mut live = LiveState::default();
    let warnings = live.install(outcome.clone());
    assert_eq!(warnings, outcome.warnings);
    assert_eq!(live.towns, outcome.towns);
    assert_eq!(live.claim_worlds, outcome.claim_worlds);
}

#[test]
fn missing_town_reference_aborts_without_touching_live_state() {
    let legacy = LegacyFixture::new();
    legacy
        .town(1, "Alpha", 0.0)
        .member(MAYOR, Some(1), 3)
        .flags(42, 0, true, true);

    let mut db = target(&[("survival", "world")]);
    let (state, result) = migrate(&legacy.config(), &mut db);
    assert_eq!(state, MigrationState::Aborted);
    let err = result.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<MigrationError>(),
        Some(MigrationError::MissingTown {
            kind: RowKind::Flag,
            town_id: 42
        })
    ));
    assert!(db.towns.is_empty());
}

#[test]
fn missing_town_reference_is_skipped_with_skip_policy() {
    let legacy = LegacyFixture::new();
    legacy
        .town(1, "Alpha", 0.0)
        .member(MAYOR, Some(1), 3)
        .member(STRANGER, Some(7), 1)
        .flags(42, 0, true, true);

    let mut config = legacy.config();
    config.policy = MissingTownPolicy::skip_all();
    let mut db = target(&[]);
    let (state, result) = migrate(&config, &mut db);
    let outcome = result.unwrap();

    assert_eq!(state, MigrationState::Succeeded);
    assert_eq!(outcome.towns.len(), 1);
    assert_eq!(
        outcome.warnings,
        vec![
            Warning::MissingTown {
                kind: RowKind::Member,
                town_id: 7
            },
            Warning::MissingTown {
                kind: RowKind::Flag,
                town_id: 42
            },
        ]
    );
}

#[test]
fn policy_applies_per_row_kind() {
    let legacy = LegacyFixture::new();
    legacy
        .town(1, "Alpha", 0.0)
        .member(MAYOR, Some(1), 3)
        .bonus(5, 1, 1)
        .flags(42, 0, true, true);

    let mut config = legacy.config();
    config.policy.bonuses = OnMissingTown::Skip;
    let (state, result) = migrate(&config, &mut target(&[]));

    assert_eq!(state, MigrationState::Aborted);
    assert!(matches!(
        result.unwrap_err().downcast_ref::<MigrationError>(),
        Some(MigrationError::MissingTown {
            kind: RowKind::Flag,
            ..
        })
    ));
}

#[test]
fn conflicting_and_memberless_towns_are_skipped() {
    let legacy = LegacyFixture::new();
    legacy
        .town(1, "Alpha", 0.0)
        .town(2, "alpha", 0.0)
        .town(3, "Empty", 0.0)
        .member(MAYOR, Some(1), 3)
        .member(STRANGER, Some(2), 3);

    let mut db = target(&[]);
    let outcome = migrate(&legacy.config(), &mut db).1.unwrap();

    assert_eq!(outcome.towns.len(), 1);
    assert_eq!(outcome.towns[0].id, 1);
    let skipped: Vec<_> = outcome
        .warnings
        .iter()
        .filter_map(|warning| match warning {
            Warning::TownSkipped { town, .. } => Some(town.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(skipped, vec!["alpha", "Empty"]);
    assert_eq!(db.towns.len(), 1);
}

#[test]
fn repeated_runs_produce_the_same_content() {
    let legacy = LegacyFixture::new();
    legacy
        .town(1, "Alpha", 1000.0)
        .member(MAYOR, Some(1), 3)
        .spawn(1, "survival", "world", false)
        .flags(1, 1, true, true)
        .claim(1, "survival", "world", 3, 4, 0);

    let worlds = [("survival", "world")];
    let first = migrate(&legacy.config(), &mut target(&worlds)).1.unwrap();
    let second = migrate(&legacy.config(), &mut target(&worlds)).1.unwrap();

    assert_eq!(first.towns, second.towns);
    assert_eq!(first.claim_worlds, second.claim_worlds);
    assert_eq!(first.warnings, second.warnings);

    let mut live = LiveState::default();
    live.install(first);
    let previous = live.clone();
    live.install(second);
    assert_eq!(live.towns, previous.towns);
    assert_eq!(live.claim_worlds, previous.claim_worlds);
}

#[test]
fn rerun_against_migrated_store_rebuilds_the_same_content() {
    let legacy = LegacyFixture::new();
    legacy
        .town(1, "Alpha", 1000.0)
        .town(2, "Beta", 0.0)
        .member(MAYOR, Some(1), 3)
        .member(STRANGER, Some(2), 3)
        .claim(1, "survival", "world", 3, 4, 0)
        .claim(1, "survival", "world", 3, 5, 1)
        .claim(2, "survival", "world", 9, 9, 0)
        .claim(2, "survival", "world_nether", 0, 0, 0);

    let mut db = target(&[("survival", "world")]);
    let first = migrate(&legacy.config(), &mut db).1.unwrap();
    let stored_towns = db.towns.clone();
    let second = migrate(&legacy.config(), &mut db).1.unwrap();

    assert_eq!(second.towns.len(), 2);
    assert_eq!(first.towns, second.towns);
    assert_eq!(first.claim_worlds, second.claim_worlds);
    assert_eq!(first.warnings, second.warnings);
    assert_eq!(db.towns, stored_towns);

    let survival = db
        .claim_world(&ServerWorld::legacy("survival", "world"))
        .unwrap();
    assert_eq!(survival.claim_count(), 3);
    assert_eq!(survival.claims[&1].len(), 2);

    let mut live = LiveState::default();
    live.install(first);
    live.install(second.clone());
    assert_eq!(live.towns, second.towns);
}

#[test]
fn incomplete_spawn_locations_are_dropped() {
    let legacy = LegacyFixture::new();
    legacy
        .town(1, "Alpha", 0.0)
        .town(2, "Beta", 0.0)
        .member(MAYOR, Some(1), 3)
        .member(STRANGER, Some(2), 3)
        .spawn(1, "survival", "world", true)
        .spawn(2, "survival", "world_the_end", true)
        .execute(
            "UPDATE {p}locations SET world = NULL \
             WHERE id = (SELECT spawn_location_id FROM {p}towns WHERE id = 1)",
        )
        .execute("UPDATE {p}towns SET is_spawn_public = NULL WHERE id = 2");

    let (state, result) = migrate(&legacy.config(), &mut target(&[]));
    let outcome = result.unwrap();

    assert_eq!(state, MigrationState::Succeeded);
    assert!(outcome.towns[0].spawn.is_none());
    let spawn = outcome.towns[1].spawn.as_ref().unwrap();
    assert!(!spawn.public);
    assert_eq!(spawn.position.world.environment, Environment::End);
    assert!(outcome.warnings.is_empty());
}

#[test]
fn custom_table_names_are_honoured() {
    let legacy = LegacyFixture::with_prefix("v1_");
    legacy
        .town(1, "Alpha", 0.0)
        .member(MAYOR, Some(1), 3)
        .claim(1, "survival", "world", 0, 0, 0);

    let mut config = legacy.config();
    for (key, table) in [
        ("legacy_players_table", "v1_players"),
        ("legacy_towns_table", "v1_towns"),
        ("legacy_claims_table", "v1_claims"),
        ("legacy_flags_table", "v1_flags"),
        ("legacy_locations_table", "v1_locations"),
        ("legacy_bonuses_table", "v1_bonus"),
    ] {
        config.set_parameter(key, table).unwrap();
    }
    assert_eq!(
        config.tables.towns,
        TableName::try_from(String::from("v1_towns")).unwrap()
    );

    let outcome = migrate(&config, &mut target(&[("survival", "world")]))
        .1
        .unwrap();
    assert_eq!(outcome.towns.len(), 1);
    assert_eq!(outcome.merged_claims, 1);
}

#[test]
fn unreachable_legacy_store_aborts() {
    let legacy = LegacyFixture::new();
    let mut config = legacy.config();
    config.database.file = Some(legacy.path.with_file_name("missing.db"));

    let (state, result) = migrate(&config, &mut target(&[]));
    assert_eq!(state, MigrationState::Aborted);
    assert!(format!("{:?}", result.unwrap_err()).contains("Failed to connect to the legacy database"));
}
