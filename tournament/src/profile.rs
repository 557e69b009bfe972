// ═══════════════════════════════════════════════════════════════════════
// Profiles — named AI configurations that can sit at a table
// ═══════════════════════════════════════════════════════════════════════

use crate::error::{Result, TournamentError};
use conquest_agents::{KingdomAi, PassiveAi, Planner, PlannerConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Full planner with default tuning.
    Planner,
    /// Full planner demanding larger army advantages.
    Cautious,
    /// Develops castles, never moves heroes.
    Passive,
}

impl Profile {
    pub const ALL: [Profile; 3] = [Profile::Planner, Profile::Cautious, Profile::Passive];

    pub fn name(self) -> &'static str {
        match self {
            Profile::Planner => "planner",
            Profile::Cautious => "cautious",
            Profile::Passive => "passive",
        }
    }

    /// Build an agent. `base` replaces the default tuning of the planner
    /// profiles; the cautious profile keeps its own advantages on top.
    pub fn build(self, seed: u64, base: Option<&PlannerConfig>) -> Result<Box<dyn KingdomAi>> {
        Ok(match self {
            Profile::Planner => {
                let config = PlannerConfig { seed, ..base.cloned().unwrap_or_default() };
                Box::new(Planner::new(self.name(), config)?)
            }
            Profile::Cautious => {
                let cautious = PlannerConfig::cautious();
                let config = match base {
                    Some(b) => PlannerConfig { advantage: cautious.advantage, max_days_to_reach: cautious.max_days_to_reach, seed, ..b.clone() },
                    None => PlannerConfig { seed, ..cautious },
                };
                Box::new(Planner::new(self.name(), config)?)
            }
            Profile::Passive => Box::new(PassiveAi::new(seed)),
        })
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Profile {
    type Err = TournamentError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Profile::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| TournamentError::UnknownProfile(s.to_string()))
    }
}
