// ═══════════════════════════════════════════════════════════════════════
// Planner configuration — every tunable the strategic AI reads
//
// Values load from JSON; any field left out keeps its default, so a
// config file only needs the knobs it changes.
// ═══════════════════════════════════════════════════════════════════════

use conquest_engine::navigation::PathKnobs;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// How much stronger an army must be before the planner risks a fight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmyAdvantage {
    pub desperate: f64,
    pub small: f64,
    pub medium: f64,
    pub large: f64,
}

impl Default for ArmyAdvantage {
    fn default() -> Self {
        ArmyAdvantage { desperate: 0.8, small: 1.3, medium: 1.5, large: 1.8 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Island regions multiply their running safety by `num / den`.
    pub island_multiplier_num: i32,
    pub island_multiplier_den: i32,

    /// Movement cost beyond which a threat is ignored.
    pub threat_distance_limit: u32,
    pub max_days_to_reach: u32,
    /// Threat strength factor applied for each day beyond the first.
    pub daily_threat_decay: f64,

    pub advantage: ArmyAdvantage,
    /// Spell-point reserve paired with each non-desperate advantage.
    pub spell_reserve_large: f64,
    pub spell_reserve_medium: f64,

    pub dangerous_task_penalty: f64,
    pub fog_discovery_base: f64,

    /// Stat margin a hero must lack before walking to a same-role friend.
    pub meeting_stat_margin: u32,
    pub fighter_meeting_stat_margin: u32,

    pub early_hero_limit: usize,
    /// One extra hero is allowed per this many tiles of map width.
    pub map_width_per_hero: u32,

    /// Hard cap on scheduler iterations in a single turn.
    pub max_moves_per_turn: usize,

    pub seed: u64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            island_multiplier_num: 3,
            island_multiplier_den: 2,
            threat_distance_limit: 3000,
            max_days_to_reach: 3,
            daily_threat_decay: 0.5,
            advantage: ArmyAdvantage::default(),
            spell_reserve_large: 0.5,
            spell_reserve_medium: 0.25,
            dangerous_task_penalty: 50000.0,
            fog_discovery_base: -10000.0,
            meeting_stat_margin: 2,
            fighter_meeting_stat_margin: 1,
            early_hero_limit: 2,
            map_width_per_hero: 36,
            max_moves_per_turn: 256,
            seed: 0,
        }
    }
}

impl PlannerConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: PlannerConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Profile that demands larger margins before every fight.
    pub fn cautious() -> Self {
        PlannerConfig {
            advantage: ArmyAdvantage { desperate: 1.0, small: 1.6, medium: 2.0, large: 2.5 },
            max_days_to_reach: 4,
            ..PlannerConfig::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.island_multiplier_den == 0 {
            return Err(ConfigError::Invalid("island_multiplier_den must not be zero".into()));
        }
        if !(0.0..=1.0).contains(&self.daily_threat_decay) {
            return Err(ConfigError::Invalid(format!("daily_threat_decay {} outside 0..=1", self.daily_threat_decay)));
        }
        let a = &self.advantage;
        if a.desperate <= 0.0 || a.desperate > a.small || a.small > a.medium || a.medium > a.large {
            return Err(ConfigError::Invalid("advantages must be positive and ascending".into()));
        }
        if self.map_width_per_hero == 0 {
            return Err(ConfigError::Invalid("map_width_per_hero must not be zero".into()));
        }
        Ok(())
    }

    /// Pathfinder settings tried in order while searching for a target.
    pub fn relaxations(&self, losing: bool) -> Vec<PathKnobs> {
        if losing {
            return vec![PathKnobs { army_advantage: self.advantage.desperate, spell_reserve: 0.0 }];
        }
        vec![
            PathKnobs { army_advantage: self.advantage.large, spell_reserve: self.spell_reserve_large },
            PathKnobs { army_advantage: self.advantage.medium, spell_reserve: self.spell_reserve_medium },
            PathKnobs { army_advantage: self.advantage.small, spell_reserve: 0.0 },
        ]
    }

    /// Optimistic settings used when estimating what an enemy can reach.
    pub fn enemy_knobs(&self) -> PathKnobs {
        PathKnobs { army_advantage: self.advantage.desperate, spell_reserve: 0.0 }
    }
}
