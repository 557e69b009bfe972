// ═══════════════════════════════════════════════════════════════════════
// Kingdom AI Trait — interface every computer-controlled kingdom implements
//
// The game loop hands the whole game state to the AI of the kingdom whose
// turn it is. Fog of war is respected by the AI itself: the planner only
// scores what the kingdom can see, and the engine refuses moves into
// unexplored paths.
// ═══════════════════════════════════════════════════════════════════════

use crate::planner::TurnSummary;
use conquest_engine::{Color, GameState, Result};

pub trait KingdomAi: Send + Sync {
    /// Human-readable name for this AI (e.g. "planner", "passive").
    fn name(&self) -> &str;

    /// Play every hero and castle of `color` for the current day.
    fn kingdom_turn(&mut self, world: &mut GameState, color: Color) -> Result<TurnSummary>;
}
