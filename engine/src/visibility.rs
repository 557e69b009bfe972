// ═══════════════════════════════════════════════════════════════════════
// Visibility — fog of war per kingdom
//
// Every tile carries a fog bit per color. Heroes and castles uncover a
// square around themselves; the AI may only path through tiles its own
// kingdom has uncovered.
// ═══════════════════════════════════════════════════════════════════════

use crate::types::*;

/// Radius a castle uncovers around itself.
pub const CASTLE_VIEW_RADIUS: u32 = 5;

/// How far a hero sees: base 2 plus one tile per scouting level.
pub fn scouting_radius(hero: &Hero) -> u32 {
    2 + hero.skills.level(Skill::Scouting) as u32
}

pub fn is_fog(state: &GameState, position: Position, color: Color) -> bool {
    state.map.tile(position).map(|t| t.is_fog(color)).unwrap_or(true)
}

/// Uncover a square around `center`; returns the tiles that were hidden before.
pub fn reveal_around(state: &mut GameState, color: Color, center: Position, radius: u32) -> Vec<Position> {
    let positions: Vec<Position> = state.map.positions_in_radius(center, radius).collect();
    let mut revealed = Vec::new();
    for pos in positions {
        if let Some(tile) = state.map.tile_mut(pos) {
            if tile.is_fog(color) {
                tile.fog &= !color.bit();
                revealed.push(pos);
            }
        }
    }
    revealed
}

/// Number of still-hidden tiles a visit to `center` would uncover.
pub fn fog_reveal_count(state: &GameState, color: Color, center: Position, radius: u32) -> u32 {
    state
        .map
        .positions_in_radius(center, radius)
        .filter(|&pos| is_fog(state, pos, color))
        .count() as u32
}

/// Remove all fog for a kingdom (the view-all spell).
pub fn reveal_all(state: &mut GameState, color: Color) -> Vec<Position> {
    let mut revealed = Vec::new();
    for (idx, tile) in state.map.tiles.iter_mut().enumerate() {
        if tile.is_fog(color) {
            tile.fog &= !color.bit();
            revealed.push(Position(idx as u32));
        }
    }
    revealed
}

/// Initial uncovering around every hero and castle of every kingdom.
pub fn reveal_starting_areas(state: &mut GameState) {
    let mut sources: Vec<(Color, Position, u32)> = Vec::new();
    for hero in state.heroes.iter().filter(|h| h.alive) {
        if let Some(color) = hero.color {
            sources.push((color, hero.position, scouting_radius(hero)));
        }
    }
    for castle in &state.castles {
        if let Some(color) = castle.color {
            sources.push((color, castle.position, CASTLE_VIEW_RADIUS));
        }
    }
    for (color, center, radius) in sources {
        reveal_around(state, color, center, radius);
    }
}
