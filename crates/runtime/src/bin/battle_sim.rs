//! Headless demo battle between the sample kits.
//!
//! Usage: `battle-sim [CONFIG.toml]`
//!
//! Environment variables:
//! - `BATTLE_SEED` - Overrides the runner seed
//! - `BATTLE_KITS_DIR` - Loads kits from a directory instead of the built-in set
//! - `RUST_LOG` - Log filter (default: info)
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use battle_content::{ConfigLoader, KitLoader, KitRegistry};
use battle_core::{AbilityKit, Combatant, CombatantId, EngineConfig, StatKey, Team};
use runtime::{BattleRunner, RunnerConfig, SimCombatant};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let (engine_config, mut runner_config) = load_config(config_path.as_deref())?;
    if let Ok(seed) = std::env::var("BATTLE_SEED") {
        runner_config.seed = seed
            .parse()
            .with_context(|| format!("BATTLE_SEED is not a number: {seed}"))?;
    }

    let kits = match std::env::var_os("BATTLE_KITS_DIR") {
        Some(dir) => KitLoader::load_dir(Path::new(&dir))?,
        None => KitLoader::builtin()?,
    };

    let mut runner = BattleRunner::new(runner_config, engine_config)?;
    for (combatant, kit) in roster(&kits)? {
        runner.add(combatant, kit)?;
    }

    let report = runner.run()?;
    match report.winner {
        Some(team) => println!("team {} wins after {:.1}s", team.0, report.elapsed),
        None => println!("draw after {:.1}s", report.elapsed),
    }
    for combatant in runner.arena().iter() {
        println!(
            "  {} (team {}): {:.0}/{:.0} hp",
            combatant.id(),
            combatant.team().0,
            combatant.hp(),
            combatant.max_hp()
        );
    }
    println!("actions: {}  digest: {}", report.actions, report.digest);
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<(EngineConfig, RunnerConfig)> {
    Ok(match path {
        Some(path) => (
            ConfigLoader::load_section(path, "engine")?,
            ConfigLoader::load_section(path, "runner")?,
        ),
        None => (
            ConfigLoader::builtin_section("engine")?,
            ConfigLoader::builtin_section("runner")?,
        ),
    })
}

/// Two against two: a vanguard and a cleric facing a vanguard and a
/// pyromancer.
fn roster(kits: &KitRegistry) -> Result<Vec<(SimCombatant, Arc<dyn AbilityKit>)>> {
    let kit = |name: &str| {
        kits.get(name)
            .with_context(|| format!("kit '{name}' is not loaded"))
    };
    let tank = |id: u32, team: u8, x: f64| {
        SimCombatant::new(CombatantId(id), Team(team), 900.0)
            .at(x, 0.0)
            .with_stat(StatKey::Attack, 45.0)
            .with_stat(StatKey::Defense, 60.0)
            .with_stat(StatKey::Resistance, 30.0)
            .with_stat(StatKey::Speed, 10.0)
    };

    Ok(vec![
        (tank(1, 0, -1.0), kit("vanguard")?),
        (
            SimCombatant::new(CombatantId(2), Team(0), 600.0)
                .at(-3.0, 0.0)
                .with_stat(StatKey::Magic, 35.0)
                .with_stat(StatKey::HealPower, 40.0)
                .with_stat(StatKey::Resistance, 40.0),
            kit("cleric")?,
        ),
        (tank(3, 1, 1.0), kit("vanguard")?),
        (
            SimCombatant::new(CombatantId(4), Team(1), 550.0)
                .at(3.0, 0.0)
                .with_stat(StatKey::Magic, 60.0)
                .with_stat(StatKey::CritChance, 0.2)
                .with_stat(StatKey::Speed, 20.0),
            kit("pyromancer")?,
        ),
    ])
}
