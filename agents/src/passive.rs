// ═══════════════════════════════════════════════════════════════════════
// Passive AI — develops castles and never moves a hero.
// Serves as a baseline opponent and for testing engine stability.
// ═══════════════════════════════════════════════════════════════════════

use crate::agent::KingdomAi;
use crate::context::DEFAULT_SPELL_LEVEL;
use crate::development::castle_turn;
use crate::planner::TurnSummary;
use crate::region::SAFETY_OWN;
use conquest_engine::{Color, GameState, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

pub struct PassiveAi {
    rng: ChaCha8Rng,
}

impl PassiveAi {
    pub fn new(seed: u64) -> Self {
        PassiveAi { rng: ChaCha8Rng::seed_from_u64(seed) }
    }
}

impl KingdomAi for PassiveAi {
    fn name(&self) -> &str {
        "passive"
    }

    fn kingdom_turn(&mut self, world: &mut GameState, color: Color) -> Result<TurnSummary> {
        let Some(kingdom) = world.kingdom(color) else { return Ok(TurnSummary::default()) };
        if kingdom.lost {
            return Ok(TurnSummary::default());
        }
        let mut castles = kingdom.castles.clone();
        castles.shuffle(&mut self.rng);
        for castle in castles {
            castle_turn(world, castle, false, SAFETY_OWN, DEFAULT_SPELL_LEVEL)?;
        }
        debug!(%color, "passive turn done");
        Ok(TurnSummary::default())
    }
}
