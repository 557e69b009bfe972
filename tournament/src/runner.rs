// ═══════════════════════════════════════════════════════════════════════
// Game Runner — plays complete headless games between kingdom AIs
// ═══════════════════════════════════════════════════════════════════════

use crate::error::{Result, TournamentError};
use crate::profile::Profile;
use conquest_agents::{KingdomAi, PlannerConfig};
use conquest_engine::engine::{self, end_day, update_losers};
use conquest_engine::setup::{create_scenario, ScenarioConfig};
use conquest_engine::{Color, Control, GameState};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Result of a completed game.
#[derive(Debug, Clone, Serialize)]
pub struct GameResult {
    pub seed: u64,
    pub winner: Color,
    /// True when the winner was the last kingdom standing rather than
    /// the leader at the day limit.
    pub decisive: bool,
    pub days_played: u32,
    pub kingdoms: Vec<KingdomResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct KingdomResult {
    pub color: Color,
    pub agent_name: String,
    pub castles: usize,
    pub heroes: usize,
    pub army_strength: f64,
    pub gold: i32,
    pub lost: bool,
}

impl GameResult {
    pub fn kingdom(&self, color: Color) -> Option<&KingdomResult> {
        self.kingdoms.iter().find(|k| k.color == color)
    }
}

/// Play one game. Every AI-controlled kingdom needs an agent in `agents`;
/// human kingdoms pass their turns.
pub fn run_game(
    agents: &mut BTreeMap<Color, Box<dyn KingdomAi>>,
    scenario: &ScenarioConfig,
    seed: u64,
    max_days: u32,
) -> Result<GameResult> {
    let mut state = create_scenario(scenario, seed)?;
    for kingdom in state.kingdoms.iter().filter(|k| k.control == Control::Ai) {
        if !agents.contains_key(&kingdom.color) {
            return Err(TournamentError::MissingAgent(kingdom.color));
        }
    }

    let mut days_played = 0;
    while days_played < max_days && engine::winner(&state).is_none() {
        play_day(agents, &mut state)?;
        days_played += 1;
        if engine::winner(&state).is_none() {
            end_day(&mut state);
        }
    }

    let result = build_result(&state, agents, seed, days_played)?;
    info!(seed, winner = %result.winner, decisive = result.decisive, days = days_played, "game finished");
    Ok(result)
}

fn play_day(agents: &mut BTreeMap<Color, Box<dyn KingdomAi>>, state: &mut GameState) -> Result<()> {
    let order: Vec<Color> = state.kingdoms.iter().filter(|k| !k.lost).map(|k| k.color).collect();
    for color in order {
        // An earlier kingdom may have finished this one off today
        if state.kingdom(color).map_or(true, |k| k.lost) {
            continue;
        }
        let Some(agent) = agents.get_mut(&color) else { continue };
        let summary = agent.kingdom_turn(state, color)?;
        debug!(day = state.day, %color, agent = agent.name(), moves = summary.moves, recruited = summary.recruited, "turn played");
        update_losers(state);
        if engine::winner(state).is_some() {
            break;
        }
    }
    Ok(())
}

fn build_result(
    state: &GameState,
    agents: &BTreeMap<Color, Box<dyn KingdomAi>>,
    seed: u64,
    days_played: u32,
) -> Result<GameResult> {
    let kingdoms: Vec<KingdomResult> = state
        .kingdoms
        .iter()
        .map(|k| {
            let living: Vec<_> = state.living_heroes(k.color).collect();
            KingdomResult {
                color: k.color,
                agent_name: agents.get(&k.color).map_or_else(|| "human".to_string(), |a| a.name().to_string()),
                castles: k.castles.len(),
                heroes: living.len(),
                army_strength: living.iter().map(|h| h.army_strength()).sum(),
                gold: k.funds.gold,
                lost: k.lost,
            }
        })
        .collect();

    if let Some(winner) = engine::winner(state) {
        return Ok(GameResult { seed, winner, decisive: true, days_played, kingdoms });
    }

    // Day limit: most castles, then the strongest field army
    let leader = kingdoms
        .iter()
        .filter(|k| !k.lost)
        .max_by(|a, b| a.castles.cmp(&b.castles).then(a.army_strength.total_cmp(&b.army_strength)))
        .map(|k| k.color);
    let Some(winner) = leader else {
        return Err(TournamentError::Stuck { seed, reason: "no kingdom left standing".into() });
    };
    Ok(GameResult { seed, winner, decisive: false, days_played, kingdoms })
}

// ── Tournaments ────────────────────────────────────────────────────────

/// A batch of seeded games. Seats rotate so each profile plays every
/// color across the batch.
#[derive(Debug, Clone)]
pub struct TournamentPlan {
    pub games: u32,
    pub base_seed: u64,
    pub max_days: u32,
    pub profiles: Vec<Profile>,
    pub scenario: ScenarioConfig,
    pub config: Option<PlannerConfig>,
}

impl TournamentPlan {
    pub fn seed_of(&self, game: u32) -> u64 {
        self.base_seed.wrapping_add(u64::from(game) * 1000)
    }

    /// Profile seated at `color` in game `game`.
    pub fn seat(&self, game: u32, color: Color) -> Option<Profile> {
        let slot = self.scenario.kingdoms.iter().position(|&c| c == color)?;
        if self.profiles.is_empty() {
            return None;
        }
        let index = (slot + game as usize) % self.profiles.len();
        Some(self.profiles[index])
    }

    pub fn agents_for(&self, game: u32) -> Result<BTreeMap<Color, Box<dyn KingdomAi>>> {
        let seed = self.seed_of(game);
        let mut agents = BTreeMap::new();
        for (i, &color) in self.scenario.kingdoms.iter().enumerate() {
            if self.scenario.human == Some(color) {
                continue;
            }
            let Some(profile) = self.seat(game, color) else { continue };
            agents.insert(color, profile.build(seed + i as u64, self.config.as_ref())?);
        }
        Ok(agents)
    }
}

/// Play every game of `plan` in parallel. Results come back in game order.
pub fn run_tournament(plan: &TournamentPlan) -> Vec<Result<GameResult>> {
    (0..plan.games)
        .into_par_iter()
        .map(|game| {
            let result = plan
                .agents_for(game)
                .and_then(|mut agents| run_game(&mut agents, &plan.scenario, plan.seed_of(game), plan.max_days));
            if let Err(e) = &result {
                warn!(game, error = %e, "game failed");
            }
            result
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use conquest_agents::PassiveAi;

    fn passive_table(seed: u64) -> BTreeMap<Color, Box<dyn KingdomAi>> {
        let mut agents: BTreeMap<Color, Box<dyn KingdomAi>> = BTreeMap::new();
        agents.insert(Color::Blue, Box::new(PassiveAi::new(seed)));
        agents.insert(Color::Red, Box::new(PassiveAi::new(seed + 1)));
        agents
    }

    #[test]
    fn passive_game_runs_to_day_limit() {
        let mut agents = passive_table(1);
        let result = run_game(&mut agents, &ScenarioConfig::default(), 5, 4).unwrap();
        assert_eq!(result.days_played, 4);
        assert!(!result.decisive);
        assert_eq!(result.kingdoms.len(), 2);
        assert!(result.kingdoms.iter().all(|k| k.agent_name == "passive" && k.castles == 1));
    }

    #[test]
    fn missing_agent_is_an_error() {
        let mut agents = passive_table(1);
        agents.remove(&Color::Red);
        let err = run_game(&mut agents, &ScenarioConfig::default(), 5, 4).unwrap_err();
        assert!(matches!(err, TournamentError::MissingAgent(Color::Red)));
    }

    #[test]
    fn planner_game_is_reproducible() {
        let plan = TournamentPlan {
            games: 1,
            base_seed: 11,
            max_days: 6,
            profiles: vec![Profile::Planner, Profile::Passive],
            scenario: ScenarioConfig::default(),
            config: None,
        };
        let first = run_game(&mut plan.agents_for(0).unwrap(), &plan.scenario, plan.seed_of(0), plan.max_days).unwrap();
        let second = run_game(&mut plan.agents_for(0).unwrap(), &plan.scenario, plan.seed_of(0), plan.max_days).unwrap();
        assert_eq!(first.winner, second.winner);
        assert_eq!(first.days_played, second.days_played);
        for (a, b) in first.kingdoms.iter().zip(&second.kingdoms) {
            assert_eq!(a.castles, b.castles);
            assert_eq!(a.gold, b.gold);
            assert_eq!(a.army_strength, b.army_strength);
        }
    }

    #[test]
    fn seats_rotate_between_games() {
        let plan = TournamentPlan {
            games: 2,
            base_seed: 0,
            max_days: 1,
            profiles: vec![Profile::Planner, Profile::Passive],
            scenario: ScenarioConfig::default(),
            config: None,
        };
        assert_eq!(plan.seat(0, Color::Blue), Some(Profile::Planner));
        assert_eq!(plan.seat(1, Color::Blue), Some(Profile::Passive));
        assert_eq!(plan.seat(0, Color::Green), None);
        let results = run_tournament(&plan);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.is_ok()));
    }
}
