// ═══════════════════════════════════════════════════════════════════════
// Runner — CLI entry point for single games, tournaments and ratings
// ═══════════════════════════════════════════════════════════════════════

use clap::{Parser, Subcommand};
use conquest_agents::{KingdomAi, PlannerConfig};
use conquest_engine::setup::ScenarioConfig;
use conquest_engine::Color;
use conquest_tournament::database::DEFAULT_K;
use conquest_tournament::{run_game, run_tournament, Database, GameResult, Profile, TournamentPlan};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "conquest-runner", about = "Adventure-map kingdom AI lab")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single game and print the standings
    Play {
        #[arg(short, long, default_value_t = 42)]
        seed: u64,
        #[arg(short, long, default_value_t = 60)]
        days: u32,
        /// Profiles seated in kingdom order: planner, cautious or passive
        #[arg(short, long, value_delimiter = ',', default_value = "planner,planner")]
        profiles: Vec<String>,
        /// Planner tuning as JSON
        #[arg(long)]
        config: Option<PathBuf>,
        /// Map generation settings as JSON
        #[arg(long)]
        scenario: Option<PathBuf>,
        /// Print the result as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Run N games in parallel and store them
    Tournament {
        #[arg(short, long, default_value_t = 20)]
        games: u32,
        #[arg(short, long, default_value_t = 60)]
        days: u32,
        #[arg(short, long, default_value_t = 42)]
        seed: u64,
        #[arg(short, long, value_delimiter = ',', default_value = "planner,cautious,passive")]
        profiles: Vec<String>,
        #[arg(long, default_value = "results.db")]
        db: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        scenario: Option<PathBuf>,
    },
    /// Show the ELO leaderboard
    Leaderboard {
        #[arg(long, default_value = "results.db")]
        db: PathBuf,
    },
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Commands::Play { seed, days, profiles, config, scenario, json } => {
            cmd_play(seed, days, &profiles, config.as_deref(), scenario.as_deref(), json)
        }
        Commands::Tournament { games, days, seed, profiles, db, config, scenario } => {
            cmd_tournament(games, days, seed, &profiles, &db, config.as_deref(), scenario.as_deref())
        }
        Commands::Leaderboard { db } => cmd_leaderboard(&db),
    };
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

type Outcome = conquest_tournament::Result<()>;

fn load_config(path: Option<&Path>) -> conquest_tournament::Result<Option<PlannerConfig>> {
    Ok(match path {
        Some(p) => Some(PlannerConfig::from_json_file(p)?),
        None => None,
    })
}

fn load_scenario(path: Option<&Path>) -> conquest_tournament::Result<ScenarioConfig> {
    let Some(path) = path else { return Ok(ScenarioConfig::default()) };
    let text = std::fs::read_to_string(path)?;
    Ok(ScenarioConfig::from_json(&text)?)
}

fn parse_profiles(names: &[String]) -> conquest_tournament::Result<Vec<Profile>> {
    names.iter().map(|n| n.parse()).collect()
}

fn cmd_play(seed: u64, days: u32, profiles: &[String], config: Option<&Path>, scenario: Option<&Path>, json: bool) -> Outcome {
    let config = load_config(config)?;
    let scenario = load_scenario(scenario)?;
    let profiles = parse_profiles(profiles)?;
    let plan = TournamentPlan { games: 1, base_seed: seed, max_days: days, profiles, scenario, config };

    info!(seed, days, "running single game");
    let mut agents: BTreeMap<Color, Box<dyn KingdomAi>> = plan.agents_for(0)?;
    let result = run_game(&mut agents, &plan.scenario, plan.seed_of(0), plan.max_days)?;

    if json {
        match serde_json::to_string_pretty(&result) {
            Ok(text) => println!("{text}"),
            Err(e) => error!("cannot serialise result: {e}"),
        }
    } else {
        print_standings(&result);
    }
    Ok(())
}

fn print_standings(result: &GameResult) {
    let how = if result.decisive { "conquest" } else { "day limit" };
    println!("Winner: {} ({how}, {} days)", result.winner, result.days_played);
    println!();
    println!("{:<8} {:<10} {:>7} {:>6} {:>10} {:>7}", "Kingdom", "Agent", "Castles", "Heroes", "Army", "Gold");
    println!("{}", "-".repeat(53));
    for k in &result.kingdoms {
        let status = if k.lost { " (lost)" } else { "" };
        println!(
            "{:<8} {:<10} {:>7} {:>6} {:>10.0} {:>7}{status}",
            k.color.to_string(),
            k.agent_name,
            k.castles,
            k.heroes,
            k.army_strength,
            k.gold,
        );
    }
}

fn cmd_tournament(
    games: u32,
    days: u32,
    seed: u64,
    profiles: &[String],
    db_path: &Path,
    config: Option<&Path>,
    scenario: Option<&Path>,
) -> Outcome {
    let plan = TournamentPlan {
        games,
        base_seed: seed,
        max_days: days,
        profiles: parse_profiles(profiles)?,
        scenario: load_scenario(scenario)?,
        config: load_config(config)?,
    };
    info!(games, days, profiles = ?plan.profiles, "tournament starts");

    let mut db = Database::open(db_path)?;
    let mut wins: BTreeMap<String, u32> = BTreeMap::new();
    let mut errors = 0u32;

    for (game, result) in run_tournament(&plan).into_iter().enumerate() {
        match result {
            Ok(result) => {
                if let Some(winner) = result.kingdom(result.winner) {
                    *wins.entry(winner.agent_name.clone()).or_default() += 1;
                }
                db.record_game(&result, DEFAULT_K)?;
            }
            Err(e) => {
                errors += 1;
                error!(game, "game failed: {e}");
            }
        }
    }

    println!("--- Summary ({games} games, {errors} errors) ---");
    for (name, w) in &wins {
        let pct = if games > 0 { f64::from(*w) / f64::from(games) * 100.0 } else { 0.0 };
        println!("  {name:10}: {w:>4} wins ({pct:.1}%)");
    }
    println!("\nResults saved to: {}", db_path.display());
    println!("Total games in DB: {}", db.game_count()?);
    Ok(())
}

fn cmd_leaderboard(db_path: &Path) -> Outcome {
    let db = Database::open(db_path)?;
    let board = db.leaderboard()?;
    if board.is_empty() {
        println!("No agents found. Run a tournament first.");
        return Ok(());
    }
    println!("{:<20} {:>8} {:>8} {:>8}", "Agent", "ELO", "Games", "Wins");
    println!("{}", "-".repeat(48));
    for row in &board {
        println!("{:<20} {:>8.1} {:>8} {:>8}", row.name, row.elo, row.games, row.wins);
    }
    Ok(())
}
