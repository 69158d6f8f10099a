#![deny(warnings)]

//! Headless driver: load or start a hosting business, run it for a number of
//! days (batch or on the wall clock) and save it back.

use anyhow::{Context, Result};
use persistence::{default_sqlite_url, ensure_db_dir, init_db, load_state, save_state};
use serde::Deserialize;
use sim_core::*;
use sim_runtime::{apply, run_days, Command, RunSummary, Scheduler};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

const DEFAULT_DAYS: u32 = 30;
const DEFAULT_SLOT: &str = "main";

#[derive(Debug, Default, PartialEq)]
struct Args {
    config: Option<PathBuf>,
    days: Option<u32>,
    seed: Option<u64>,
    db: Option<String>,
    slot: Option<String>,
    live: bool,
    fresh: bool,
    json: bool,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Args {
    let mut out = Args::default();
    let mut it = args.into_iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => out.config = it.next().map(PathBuf::from),
            "--days" => out.days = it.next().and_then(|s| s.parse().ok()),
            "--seed" => out.seed = it.next().and_then(|s| s.parse().ok()),
            "--db" => out.db = it.next(),
            "--slot" => out.slot = it.next(),
            "--live" => out.live = true,
            "--fresh" => out.fresh = true,
            "--json" => out.json = true,
            other => warn!(arg = other, "ignoring unknown argument"),
        }
    }
    out
}

/// YAML run file. Every field is optional; flags win over the file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CliConfig {
    sim: SimConfig,
    days: Option<u32>,
    db_url: Option<String>,
    slot: Option<String>,
    /// Full `Catalogs` document replacing the built-in tables.
    catalog_file: Option<PathBuf>,
    /// Commands applied before the clock starts.
    opening_moves: Vec<Command>,
}

fn read_config(path: &Path) -> Result<CliConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

fn read_catalogs(path: Option<&Path>) -> Result<Catalogs> {
    let Some(path) = path else {
        return Ok(Catalogs::standard());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading catalogs {}", path.display()))?;
    let catalogs: Catalogs = serde_yaml::from_str(&text)
        .with_context(|| format!("parsing catalogs {}", path.display()))?;
    validate_catalogs(&catalogs)?;
    info!(path = %path.display(), "using catalog override");
    Ok(catalogs)
}

/// Run on the wall clock until `days` more days have elapsed.
async fn run_live(
    state: GameState,
    catalogs: Arc<Catalogs>,
    config: &SimConfig,
    days: u32,
) -> Result<(GameState, RunSummary)> {
    let start = state.day;
    let target = start.saturating_add(days);
    let scheduler = Scheduler::spawn(state, catalogs, config);
    let mut snapshots = scheduler.subscribe();
    scheduler.resume().await?;
    while snapshots.borrow_and_update().day < target {
        snapshots.changed().await?;
    }
    scheduler.pause().await?;
    let state = scheduler.shutdown().await?;
    let summary = RunSummary::of(&state, state.day - start);
    Ok((state, summary))
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();
    info!(git = env!("GIT_SHA"), built = env!("BUILD_DATE"), "starting CLI");

    let args = parse_args(std::env::args().skip(1));
    let file = match &args.config {
        Some(path) => read_config(path)?,
        None => CliConfig::default(),
    };
    let mut sim = file.sim.clone();
    if let Some(seed) = args.seed {
        sim.rng_seed = seed;
    }
    let days = args.days.or(file.days).unwrap_or(DEFAULT_DAYS);
    let url = args
        .db
        .or(file.db_url)
        .unwrap_or_else(|| default_sqlite_url().to_string());
    let slot = args
        .slot
        .or(file.slot)
        .unwrap_or_else(|| DEFAULT_SLOT.to_string());
    let catalogs = Arc::new(read_catalogs(file.catalog_file.as_deref())?);

    ensure_db_dir(&url)?;
    let pool = init_db(&url).await?;
    let loaded = if args.fresh {
        None
    } else {
        match load_state(&pool, &slot, &catalogs).await {
            Ok(found) => found,
            Err(e) => {
                warn!(slot, error = %e, "save unreadable, starting a new game");
                None
            }
        }
    };
    let mut state = loaded.unwrap_or_else(|| {
        info!(slot, "new game");
        GameState::new_game(&catalogs)
    });

    let mut rng = SimRng::seed_from_u64(sim.rng_seed);
    for command in &file.opening_moves {
        match apply(&state, &catalogs, command, &mut rng) {
            Ok(next) => state = next,
            Err(e) => warn!(?command, error = %e, "opening move rejected"),
        }
    }
    validate_state(&state, &catalogs)?;
    info!(day = state.day, days, live = args.live, seed = sim.rng_seed, "running");

    let (state, summary) = if args.live {
        run_live(state, Arc::clone(&catalogs), &sim, days).await?
    } else {
        run_days(&state, &catalogs, &mut rng, days)
    };
    validate_state(&state, &catalogs)?;

    println!(
        "KPI | days: {} | day: {} | cash: ${} | users: {} | rep: {:.1} | servers: {} | plans: {} | tickets: {} | milestones: {}/{}",
        summary.days_run,
        summary.final_day,
        summary.cash.round_dp(2),
        summary.total_users,
        summary.reputation,
        summary.servers,
        summary.plans,
        summary.open_tickets,
        summary.milestones_achieved,
        state.milestones.len()
    );
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    save_state(&pool, &slot, &state).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Args {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn flags_are_parsed() {
        let a = args(&["--days", "90", "--seed", "7", "--slot", "alt", "--live", "--json"]);
        assert_eq!(a.days, Some(90));
        assert_eq!(a.seed, Some(7));
        assert_eq!(a.slot.as_deref(), Some("alt"));
        assert!(a.live && a.json && !a.fresh);
    }

    #[test]
    fn bad_numbers_are_ignored() {
        let a = args(&["--days", "lots", "--bogus"]);
        assert_eq!(a, Args::default());
    }

    #[test]
    fn config_file_with_opening_moves() {
        let yaml = r#"
sim:
  tick_interval_ms: 50
days: 120
slot: campaign
opening_moves:
  - command: purchase_server
    model: us-scrap
  - command: buy_ad
    ad: google
"#;
        let cfg: CliConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.sim.tick_interval_ms, 50);
        assert_eq!(cfg.sim.rng_seed, 42);
        assert_eq!(cfg.days, Some(120));
        assert_eq!(cfg.opening_moves.len(), 2);
        assert!(matches!(cfg.opening_moves[0], Command::PurchaseServer { .. }));
    }

    #[test]
    fn builtin_catalogs_without_override() {
        assert_eq!(read_catalogs(None).unwrap(), Catalogs::standard());
    }
}
