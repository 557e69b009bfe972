// ═══════════════════════════════════════════════════════════════════════
// Navigation — movement costs, reachability and teleport shortcuts
//
// Action objects (monsters, pickups, castles, heroes) are destinations
// only: a path may end on them but never pass through. Guarded tiles are
// enterable only when the traveller outmatches the guard by the current
// army-advantage knob.
// ═══════════════════════════════════════════════════════════════════════

use crate::types::*;
use crate::visibility::{fog_reveal_count, is_fog, scouting_radius};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Maximum jump length of the dimension door spell, in tiles.
pub const TELEPORT_RANGE: u32 = 8;
pub const TELEPORT_MOVE_COST: u32 = 225;
pub const TELEPORT_SPELL_POINTS: u32 = 10;

const UNREACHED: u32 = u32::MAX;

/// Tunable pathfinder settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathKnobs {
    /// Guard strength is multiplied by this before comparing with the traveller.
    pub army_advantage: f64,
    /// Share of maximum spell points that must stay unspent.
    pub spell_reserve: f64,
}

impl Default for PathKnobs {
    fn default() -> Self {
        PathKnobs { army_advantage: 1.0, spell_reserve: 0.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub to: Position,
    pub cost: u32,
    pub teleport: bool,
}

pub fn path_cost(path: &[Step]) -> u32 {
    path.iter().map(|s| s.cost).sum()
}

/// Who is moving, for fog and guard checks.
#[derive(Debug, Clone, Copy)]
pub struct Traveller {
    pub origin: Position,
    /// Whose fog limits the search; `None` sees everything.
    pub viewer: Option<Color>,
    pub color: Option<Color>,
    pub strength: f64,
    /// Heroes of this color are treated as absent.
    pub ignore_heroes_of: Option<Color>,
}

impl Traveller {
    pub fn hero(hero: &Hero) -> Self {
        Traveller {
            origin: hero.position,
            viewer: hero.color,
            color: hero.color,
            strength: hero.army_strength(),
            ignore_heroes_of: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Entry {
    Blocked,
    /// Walkable, may continue beyond.
    Pass,
    /// Action tile: the path must end here.
    Stop,
}

/// Single-source shortest movement costs from an origin.
#[derive(Debug, Clone)]
pub struct Reachability {
    origin: Position,
    dist: Vec<u32>,
    prev: Vec<u32>,
}

impl Reachability {
    pub fn origin(&self) -> Position {
        self.origin
    }

    /// Movement cost to reach `to`; 0 when unreachable or at the origin.
    pub fn distance(&self, to: Position) -> u32 {
        match self.dist.get(to.index()) {
            Some(&d) if d != UNREACHED && to != self.origin => d,
            _ => 0,
        }
    }

    pub fn is_reachable(&self, to: Position) -> bool {
        self.distance(to) > 0
    }

    /// Steps from the origin to `to`; empty when unreachable.
    pub fn path_to(&self, to: Position) -> Vec<Step> {
        if !self.is_reachable(to) {
            return Vec::new();
        }
        let mut steps = Vec::new();
        let mut current = to.index();
        while current != self.origin.index() {
            let prev = self.prev[current] as usize;
            steps.push(Step {
                to: Position(current as u32),
                cost: self.dist[current] - self.dist[prev],
                teleport: false,
            });
            current = prev;
        }
        steps.reverse();
        steps
    }

    /// Every reachable position (origin excluded) with its cost.
    pub fn reachable(&self) -> impl Iterator<Item = (Position, u32)> + '_ {
        self.dist
            .iter()
            .enumerate()
            .filter(move |(i, &d)| d != UNREACHED && *i != self.origin.index())
            .map(|(i, &d)| (Position(i as u32), d))
    }
}

fn step_cost(state: &GameState, to: Position, diagonal: bool) -> Option<u32> {
    let cost = state.map.tile(to)?.terrain.move_cost()?;
    Some(if diagonal { cost * 3 / 2 } else { cost })
}

fn entry(state: &GameState, traveller: &Traveller, knobs: &PathKnobs, pos: Position) -> Entry {
    let Some(tile) = state.map.tile(pos) else { return Entry::Blocked };
    if !tile.terrain.is_passable() {
        return Entry::Blocked;
    }
    if let Some(viewer) = traveller.viewer {
        if tile.is_fog(viewer) {
            return Entry::Blocked;
        }
    }
    let outmatches = |guard: f64| traveller.strength > guard * knobs.army_advantage;

    if let Some(hero) = tile.hero.and_then(|id| state.hero(id)) {
        if hero.color.is_some() && hero.color != traveller.ignore_heroes_of {
            return match traveller.color {
                Some(color) if hero.color == Some(color) => Entry::Stop,
                Some(color) if state.is_friend(color, hero.color) => Entry::Blocked,
                _ if outmatches(state.tile_army_strength(pos)) => Entry::Stop,
                _ => Entry::Blocked,
            };
        }
    }

    match &tile.object {
        MapObject::None => Entry::Pass,
        MapObject::Castle(id) => {
            let Some(castle) = state.castle(*id) else { return Entry::Blocked };
            match traveller.color {
                Some(color) if castle.color == Some(color) => Entry::Stop,
                Some(color) if state.is_friend(color, castle.color) => Entry::Blocked,
                _ if outmatches(castle.garrison.strength() * castle.defensive_bonus()) => Entry::Stop,
                _ => Entry::Blocked,
            }
        }
        other => match other.guard() {
            Some(guard) if !outmatches(guard.strength()) => Entry::Blocked,
            _ => Entry::Stop,
        },
    }
}

/// Dijkstra over the 8-connected tile grid.
pub fn reachability_from(state: &GameState, traveller: &Traveller, knobs: PathKnobs) -> Reachability {
    let n = state.map.size();
    let mut dist = vec![UNREACHED; n];
    let mut prev = vec![UNREACHED; n];
    let mut entries: Vec<Option<Entry>> = vec![None; n];
    let mut heap = BinaryHeap::new();

    let origin = traveller.origin;
    if !state.map.is_valid(origin) {
        return Reachability { origin, dist, prev };
    }
    dist[origin.index()] = 0;
    heap.push(Reverse((0u32, origin.0)));

    while let Some(Reverse((d, idx))) = heap.pop() {
        let pos = Position(idx);
        if d > dist[pos.index()] {
            continue;
        }
        if pos != origin && entries[pos.index()] == Some(Entry::Stop) {
            continue;
        }
        for (next, diagonal) in state.map.neighbours(pos) {
            let kind = *entries[next.index()].get_or_insert_with(|| entry(state, traveller, &knobs, next));
            if kind == Entry::Blocked {
                continue;
            }
            let Some(cost) = step_cost(state, next, diagonal) else { continue };
            let nd = d + cost;
            if nd < dist[next.index()] {
                dist[next.index()] = nd;
                prev[next.index()] = pos.0;
                heap.push(Reverse((nd, next.0)));
            }
        }
    }

    Reachability { origin, dist, prev }
}

pub fn reachability(state: &GameState, hero: &Hero, knobs: PathKnobs) -> Reachability {
    reachability_from(state, &Traveller::hero(hero), knobs)
}

/// Movement cost for an arbitrary army between two tiles; 0 when unreachable.
pub fn distance_for_army(state: &GameState, traveller: &Traveller, to: Position, knobs: PathKnobs) -> u32 {
    reachability_from(state, traveller, knobs).distance(to)
}

/// Dimension-door shortcut: jump next to the target, then step onto it.
/// Returns an empty path when the spell cannot be used.
pub fn teleport_path(state: &GameState, hero: &Hero, to: Position, knobs: PathKnobs) -> Vec<Step> {
    if !hero.knows_dimension_door || !hero.has_spellbook {
        return Vec::new();
    }
    let reserve = (knobs.spell_reserve * hero.max_spell_points() as f64).ceil() as u32;
    if hero.spell_points < TELEPORT_SPELL_POINTS + reserve || hero.move_points < TELEPORT_MOVE_COST {
        return Vec::new();
    }
    let map = &state.map;
    if map.tile_distance(hero.position, to) <= 1 {
        return Vec::new();
    }
    let traveller = Traveller::hero(hero);
    let target_entry = entry(state, &traveller, &knobs, to);
    if target_entry == Entry::Blocked {
        return Vec::new();
    }
    if target_entry == Entry::Pass && map.tile_distance(hero.position, to) <= TELEPORT_RANGE {
        return vec![Step { to, cost: TELEPORT_MOVE_COST, teleport: true }];
    }

    let landing = map
        .neighbours(to)
        .filter(|&(land, _)| {
            map.tile(land).map(|t| t.is_open()).unwrap_or(false)
                && hero.color.map(|c| !is_fog(state, land, c)).unwrap_or(true)
                && map.tile_distance(hero.position, land) <= TELEPORT_RANGE
        })
        .filter_map(|(land, diagonal)| step_cost(state, to, diagonal).map(|c| (c, land)))
        .min();

    match landing {
        Some((cost, land)) => vec![
            Step { to: land, cost: TELEPORT_MOVE_COST, teleport: true },
            Step { to, cost, teleport: false },
        ],
        None => Vec::new(),
    }
}

/// Closest reachable empty tile, used to step out of someone's way.
pub fn nearest_open_tile(state: &GameState, hero: &Hero) -> Option<Position> {
    let reach = reachability(state, hero, PathKnobs::default());
    reach
        .reachable()
        .filter(|(pos, _)| state.map.tile(*pos).map(|t| t.is_open()).unwrap_or(false))
        .min_by_key(|&(pos, d)| (d, pos))
        .map(|(pos, _)| pos)
}

/// A hero standing in a corridor (blocked on both sides of an axis)
/// may be stopping others from passing.
pub fn is_possibly_blocking(state: &GameState, hero: &Hero) -> bool {
    let map = &state.map;
    let (x, y) = map.xy(hero.position);
    let blocked = |dx: i32, dy: i32| {
        let (nx, ny) = (x + dx, y + dy);
        if nx < 0 || ny < 0 || nx >= map.width as i32 || ny >= map.height as i32 {
            return true;
        }
        let tile = &map.tiles[map.position(nx as u32, ny as u32).index()];
        !tile.terrain.is_passable() || tile.hero.is_some_and(|id| id != hero.id)
    };
    (blocked(-1, 0) && blocked(1, 0)) || (blocked(0, -1) && blocked(0, 1))
}

/// Nearest reachable empty tile that would uncover fog. The flag tells
/// whether the tile lies outside the hero's current region.
pub fn fog_discovery_tile(state: &GameState, hero: &Hero, reach: &Reachability) -> Option<(Position, bool)> {
    let color = hero.color?;
    let radius = scouting_radius(hero);
    let best = reach
        .reachable()
        .filter(|(pos, _)| state.map.tile(*pos).map(|t| t.is_open()).unwrap_or(false))
        .filter_map(|(pos, d)| {
            let count = fog_reveal_count(state, color, pos, radius);
            (count > 0).then_some((d, Reverse(count), pos))
        })
        .min()?;
    let target = best.2;
    let expansion = state.map.region_of(target) != state.map.region_of(hero.position);
    Some((target, expansion))
}
