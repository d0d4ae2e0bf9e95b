#![warn(clippy::pedantic)]

//! Previews a legacy migration: runs it against an in-memory successor store
//! and prints the result as JSON.

use anyhow::Context;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;

use husktowns_migrator::catalog::{DefaultRulePresets, LevelTable, RoleTable};
use husktowns_migrator::model::{ClaimWorld, ServerWorld, Town};
use husktowns_migrator::store::MemoryDatabase;
use husktowns_migrator::{MigratorConfig, Migrator};

#[derive(Parser)]
#[command(version, about = "Preview a HuskTowns v1 to v2 migration")]
struct Args {
    /// YAML file with the legacy database settings, catalogs and worlds
    config: PathBuf,
}

#[derive(Debug, Deserialize)]
struct WorldEntry {
    server: String,
    world: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PreviewConfig {
    #[serde(flatten)]
    migrator: MigratorConfig,
    levels: LevelTable,
    roles: RoleTable,
    /// claim worlds the servers have registered in the successor
    worlds: Vec<WorldEntry>,
}

impl PreviewConfig {
    fn try_from_path(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {path:?}"))?;
        serde_yaml::from_str(&content).with_context(|| format!("Failed to parse config {path:?}"))
    }
}

#[derive(Serialize)]
struct ClaimWorldReport<'a> {
    server_world: &'a ServerWorld,
    claim_world: &'a ClaimWorld,
}

#[derive(Serialize)]
struct Report<'a> {
    started_at: String,
    finished_at: String,
    towns: &'a [Town],
    claim_worlds: Vec<ClaimWorldReport<'a>>,
    merged_claims: usize,
    pruned_claim_worlds: usize,
    warnings: Vec<String>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run() {
        log::error!("{err:?}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = PreviewConfig::try_from_path(&args.config)?;

    let mut db = MemoryDatabase::default();
    for entry in &config.worlds {
        db.register_world(ServerWorld::legacy(&entry.server, &entry.world));
    }

    let presets = DefaultRulePresets::default();
    let mut migrator =
        Migrator::from_config(&config.migrator, &config.levels, &config.roles, &presets);
    let outcome = migrator.run(&config.migrator, &mut db)?;

    let mut claim_worlds: Vec<ClaimWorldReport<'_>> = outcome
        .claim_worlds
        .iter()
        .map(|(server_world, claim_world)| ClaimWorldReport {
            server_world,
            claim_world,
        })
        .collect();
    claim_worlds.sort_by_key(|report| report.claim_world.id);

    let report = Report {
        started_at: outcome.started_at.format(&Rfc3339)?,
        finished_at: outcome.finished_at.format(&Rfc3339)?,
        towns: &outcome.towns,
        claim_worlds,
        merged_claims: outcome.merged_claims,
        pruned_claim_worlds: outcome.pruned_claim_worlds,
        warnings: outcome.warnings.iter().map(ToString::to_string).collect(),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("Failed to serialize the report")?
    );
    Ok(())
}
