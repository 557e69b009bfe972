// ═══════════════════════════════════════════════════════════════════════
// Game Engine — hero movement, object visits and the day cycle
//
// Architecture:
//   The engine is a pure state machine. It never calls an AI. Agents
//   inspect the state, choose a path or a castle action, and hand it to
//   one of the functions below, which validate and apply it.
//
// Flow:
//   1. Each kingdom takes its turn through move/build/recruit calls
//   2. `end_day()` pays income, restores movement and grows dwellings
//   3. `update_losers()` / `winner()` decide when the game is over
// ═══════════════════════════════════════════════════════════════════════

use crate::army::{resolve_battle, Troop};
use crate::economy::{self, building_cost, building_requirements, Funds, HERO_RECRUIT_COST};
use crate::error::{EngineError, Result};
use crate::monsters::Monster;
use crate::navigation::{teleport_path, PathKnobs, Step, TELEPORT_SPELL_POINTS};
use crate::setup::make_recruit;
use crate::types::*;
use crate::visibility::{reveal_all, reveal_around, scouting_radius};
use tracing::{debug, trace};

pub const VIEW_ALL_SPELL_POINTS: u32 = 15;
pub const OASIS_MOVE_BONUS: u32 = 800;
pub const GAZEBO_EXPERIENCE: u32 = 1000;

/// What happened while a hero walked a path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoveReport {
    pub steps_taken: usize,
    /// Objects the hero interacted with, with their kind before the visit.
    pub actions: Vec<(Position, ObjectKind)>,
    /// Tiles uncovered for the hero's kingdom.
    pub revealed: Vec<Position>,
    /// A hero freed from a jail during this move.
    pub released_hero: Option<HeroId>,
    pub hero_alive: bool,
    /// Movement stopped early because a new action object came into view.
    pub interrupted: bool,
}

struct VisitOutcome {
    alive: bool,
    released: Option<HeroId>,
}

// ── Movement ───────────────────────────────────────────────────────────

/// Walk `path` as far as movement points allow. The last step may land on
/// an action object, which is resolved on arrival.
pub fn move_hero(state: &mut GameState, hero_id: HeroId, path: &[Step]) -> Result<MoveReport> {
    let hero = state.hero(hero_id).ok_or(EngineError::HeroNotFound(hero_id))?;
    let Some(color) = hero.color.filter(|_| hero.alive) else {
        return Err(EngineError::HeroUnavailable(hero_id, "not on the map".into()));
    };
    let mut report = MoveReport { hero_alive: true, ..MoveReport::default() };

    for (i, step) in path.iter().enumerate() {
        let hero = state.hero(hero_id).ok_or(EngineError::HeroNotFound(hero_id))?;
        if !state.map.is_valid(step.to) {
            return Err(EngineError::InvalidStep(step.to));
        }
        if !step.teleport && state.map.tile_distance(hero.position, step.to) != 1 {
            return Err(EngineError::InvalidStep(step.to));
        }
        if hero.move_points < step.cost || (step.teleport && hero.spell_points < TELEPORT_SPELL_POINTS) {
            break;
        }

        let kind = state.object_kind(step.to);
        spend_movement(state, hero_id, step)?;

        if kind.is_action_object() {
            let outcome = visit(state, hero_id, step.to)?;
            report.actions.push((step.to, kind));
            report.released_hero = outcome.released.or(report.released_hero);
            report.steps_taken += 1;
            if !outcome.alive {
                report.hero_alive = false;
                return Ok(report);
            }
            report.revealed.extend(reveal_for_hero(state, hero_id, color)?);
            break;
        }

        relocate(state, hero_id, step.to)?;
        report.steps_taken += 1;

        let revealed = reveal_for_hero(state, hero_id, color)?;
        let discovered = revealed.iter().any(|&p| state.object_kind(p).is_action_object());
        report.revealed.extend(revealed);
        if discovered && i + 1 < path.len() {
            report.interrupted = true;
            break;
        }
    }

    Ok(report)
}

fn spend_movement(state: &mut GameState, hero_id: HeroId, step: &Step) -> Result<()> {
    let hero = state.hero_mut(hero_id).ok_or(EngineError::HeroNotFound(hero_id))?;
    hero.move_points -= step.cost;
    if step.teleport {
        hero.spell_points -= TELEPORT_SPELL_POINTS;
    }
    Ok(())
}

fn relocate(state: &mut GameState, hero_id: HeroId, to: Position) -> Result<()> {
    let from = state.hero(hero_id).ok_or(EngineError::HeroNotFound(hero_id))?.position;
    if let Some(tile) = state.map.tile_mut(from) {
        if tile.hero == Some(hero_id) {
            tile.hero = None;
        }
    }
    let tile = state.map.tile_mut(to).ok_or(EngineError::InvalidStep(to))?;
    tile.hero = Some(hero_id);
    if let Some(hero) = state.hero_mut(hero_id) {
        hero.position = to;
    }
    Ok(())
}

fn reveal_for_hero(state: &mut GameState, hero_id: HeroId, color: Color) -> Result<Vec<Position>> {
    let hero = state.hero(hero_id).ok_or(EngineError::HeroNotFound(hero_id))?;
    let (position, radius) = (hero.position, scouting_radius(hero));
    Ok(reveal_around(state, color, position, radius))
}

// ── Object visits ──────────────────────────────────────────────────────

fn visit(state: &mut GameState, hero_id: HeroId, pos: Position) -> Result<VisitOutcome> {
    let color = state
        .hero(hero_id)
        .and_then(|h| h.color)
        .ok_or(EngineError::HeroUnavailable(hero_id, "no owner".into()))?;
    let mut outcome = VisitOutcome { alive: true, released: None };

    if let Some(other) = state.map.tile(pos).and_then(|t| t.hero) {
        let other_color = state.hero(other).and_then(|h| h.color);
        if other_color == Some(color) {
            meet_heroes(state, hero_id, other)?;
        } else {
            outcome.alive = attack_hero(state, hero_id, other, pos)?;
        }
        return Ok(outcome);
    }

    let object = state.map.tile(pos).map(|t| t.object.clone()).unwrap_or(MapObject::None);
    trace!(hero = hero_id.0, %pos, kind = %object.kind(), "visit");
    let mut enter = true;

    match object {
        MapObject::None => {}
        MapObject::Castle(castle_id) => {
            let castle_color = state.castle(castle_id).and_then(|c| c.color);
            if castle_color != Some(color) {
                let defender = state.tile_army_strength(pos);
                if !fight(state, hero_id, defender, |state, ratio| {
                    if let Some(castle) = state.castle_mut(castle_id) {
                        castle.garrison.apply_losses(ratio);
                    }
                })? {
                    outcome.alive = false;
                    return Ok(outcome);
                }
                capture_castle(state, castle_id, color)?;
            }
        }
        MapObject::Monster(troop) | MapObject::Pyramid(troop) => {
            enter = false;
            let is_pyramid = matches!(object, MapObject::Pyramid(_));
            let won = fight(state, hero_id, troop.strength(), |state, ratio| {
                if let Some(tile) = state.map.tile_mut(pos) {
                    if let MapObject::Monster(t) | MapObject::Pyramid(t) = &mut tile.object {
                        t.count -= (t.count as f64 * ratio).ceil().min(t.count as f64) as u32;
                    }
                }
            })?;
            if !won {
                outcome.alive = false;
                return Ok(outcome);
            }
            clear_object(state, pos);
            if is_pyramid {
                if let Some(hero) = state.hero_mut(hero_id) {
                    hero.power += 2;
                    hero.knowledge += 2;
                }
            }
        }
        MapObject::Resource { resource, amount } => {
            add_funds(state, color, Funds::of(resource, amount));
            clear_object(state, pos);
        }
        MapObject::TreasureChest { gold } => {
            add_funds(state, color, Funds::gold(gold));
            clear_object(state, pos);
        }
        MapObject::Campfire { resource, amount, gold } => {
            add_funds(state, color, Funds::of(resource, amount) + Funds::gold(gold));
            clear_object(state, pos);
        }
        MapObject::Artifact { value } => {
            if let Some(hero) = state.hero_mut(hero_id) {
                hero.artifact_value += value;
            }
            clear_object(state, pos);
        }
        MapObject::Mine { resource, .. } => {
            if let Some(tile) = state.map.tile_mut(pos) {
                tile.object = MapObject::Mine { resource, owner: Some(color) };
            }
        }
        MapObject::FreeDwelling(troop) => {
            let joined = state.hero_mut(hero_id).map(|h| h.army.join(troop)).unwrap_or(false);
            if joined {
                if let Some(tile) = state.map.tile_mut(pos) {
                    tile.object = MapObject::FreeDwelling(Troop::new(troop.monster, 0));
                }
            }
        }
        MapObject::RecruitDwelling(troop) => {
            let unit_cost = Funds::gold(troop.monster.def().gold_cost);
            let affordable = state.kingdom(color).map(|k| k.funds.times(&unit_cost)).unwrap_or(0).min(troop.count);
            let joinable = state.hero(hero_id).map(|h| h.army.can_join(troop.monster)).unwrap_or(false);
            if affordable > 0 && joinable {
                if let Some(kingdom) = state.kingdom_mut(color) {
                    kingdom.funds -= unit_cost * affordable;
                }
                if let Some(hero) = state.hero_mut(hero_id) {
                    hero.army.join(Troop::new(troop.monster, affordable));
                }
                if let Some(tile) = state.map.tile_mut(pos) {
                    tile.object = MapObject::RecruitDwelling(Troop::new(troop.monster, troop.count - affordable));
                }
            }
        }
        MapObject::Jail(prisoner) => {
            enter = false;
            let room = state.kingdom(color).map(|k| k.heroes.len() < MAX_HEROES_PER_KINGDOM).unwrap_or(false);
            if room {
                clear_object(state, pos);
                place_hero(state, prisoner, color, pos)?;
                outcome.released = Some(prisoner);
            }
        }
        MapObject::ObservationTower { radius } => {
            reveal_around(state, color, pos, radius);
        }
        MapObject::Temple
        | MapObject::FaerieRing
        | MapObject::MagicWell
        | MapObject::ArtesianSpring
        | MapObject::Xanadu
        | MapObject::WitchsHut(_)
        | MapObject::Gazebo
        | MapObject::Oasis
        | MapObject::Sign
        | MapObject::Obelisk => {
            let first_visit = state.hero(hero_id).map(|h| !h.has_visited(pos)).unwrap_or(false);
            if let Some(hero) = state.hero_mut(hero_id) {
                apply_shrine(hero, &object, first_visit);
            }
        }
    }

    if let Some(hero) = state.hero_mut(hero_id) {
        hero.visited.insert(pos);
    }
    if enter {
        relocate(state, hero_id, pos)?;
    }
    update_losers(state);
    Ok(outcome)
}

fn apply_shrine(hero: &mut Hero, object: &MapObject, first_visit: bool) {
    match object {
        MapObject::Temple => hero.morale = (hero.morale + 2).min(MORALE_MAX),
        MapObject::FaerieRing => hero.luck = (hero.luck + 1).min(MORALE_MAX),
        MapObject::MagicWell => hero.spell_points = hero.spell_points.max(hero.max_spell_points()),
        MapObject::ArtesianSpring => hero.spell_points = hero.spell_points.max(hero.max_spell_points() * 2),
        MapObject::Xanadu if first_visit => {
            hero.attack += 1;
            hero.defense += 1;
            hero.power += 1;
            hero.knowledge += 1;
        }
        MapObject::WitchsHut(skill) if first_visit => {
            let level = hero.skills.level(*skill);
            hero.skills.set(*skill, level + 1);
        }
        MapObject::Gazebo if first_visit => hero.experience += GAZEBO_EXPERIENCE,
        MapObject::Oasis if first_visit => hero.move_points += OASIS_MOVE_BONUS,
        _ => {}
    }
}

fn clear_object(state: &mut GameState, pos: Position) {
    if let Some(tile) = state.map.tile_mut(pos) {
        tile.object = MapObject::None;
    }
}

fn add_funds(state: &mut GameState, color: Color, funds: Funds) {
    if let Some(kingdom) = state.kingdom_mut(color) {
        kingdom.funds += funds;
    }
}

/// Auto-resolve a battle for `hero_id`. The closure applies losses to the
/// defender when the hero loses. Returns whether the hero won.
fn fight<F>(state: &mut GameState, hero_id: HeroId, defender: f64, defender_losses: F) -> Result<bool>
where
    F: FnOnce(&mut GameState, f64),
{
    let attacker = state.hero(hero_id).ok_or(EngineError::HeroNotFound(hero_id))?.army_strength();
    let outcome = resolve_battle(attacker, defender);
    debug!(hero = hero_id.0, attacker, defender, won = outcome.attacker_wins, "battle");
    if outcome.attacker_wins {
        if let Some(hero) = state.hero_mut(hero_id) {
            hero.army.apply_losses(outcome.winner_losses);
        }
    } else {
        defender_losses(state, outcome.winner_losses);
        kill_hero(state, hero_id);
    }
    Ok(outcome.attacker_wins)
}

fn attack_hero(state: &mut GameState, hero_id: HeroId, defender_id: HeroId, pos: Position) -> Result<bool> {
    let defender_strength = state.tile_army_strength(pos);
    let won = fight(state, hero_id, defender_strength, |state, ratio| {
        if let Some(defender) = state.hero_mut(defender_id) {
            defender.army.apply_losses(ratio);
        }
    })?;
    if won {
        kill_hero(state, defender_id);
        if let Some(castle_id) = state.castle_at(pos).map(|c| c.id) {
            let color = state.hero(hero_id).and_then(|h| h.color);
            if let Some(color) = color {
                capture_castle(state, castle_id, color)?;
                relocate(state, hero_id, pos)?;
            }
        }
    }
    update_losers(state);
    Ok(won)
}

fn kill_hero(state: &mut GameState, hero_id: HeroId) {
    let Some(hero) = state.hero_mut(hero_id) else { return };
    hero.alive = false;
    hero.army.troops.clear();
    let (pos, color) = (hero.position, hero.color);
    if let Some(tile) = state.map.tile_mut(pos) {
        if tile.hero == Some(hero_id) {
            tile.hero = None;
        }
    }
    if let Some(kingdom) = color.and_then(|c| state.kingdom_mut(c)) {
        kingdom.heroes.retain(|&id| id != hero_id);
    }
    update_losers(state);
}

fn capture_castle(state: &mut GameState, castle_id: CastleId, color: Color) -> Result<()> {
    let castle = state.castle_mut(castle_id).ok_or(EngineError::CastleNotFound(castle_id))?;
    let previous = castle.color.replace(color);
    castle.garrison.troops.clear();
    let position = castle.position;
    if let Some(old) = previous.and_then(|c| state.kingdom_mut(c)) {
        old.castles.retain(|&id| id != castle_id);
    }
    if let Some(kingdom) = state.kingdom_mut(color) {
        kingdom.castles.push(castle_id);
    }
    reveal_around(state, color, position, crate::visibility::CASTLE_VIEW_RADIUS);
    debug!(castle = castle_id.0, %color, "castle captured");
    Ok(())
}

/// Hand the weaker role's troops to the senior hero; the giver keeps its
/// weakest stack so that it still has an army.
fn meet_heroes(state: &mut GameState, visitor: HeroId, host: HeroId) -> Result<()> {
    let a = state.hero(visitor).ok_or(EngineError::HeroNotFound(visitor))?;
    let b = state.hero(host).ok_or(EngineError::HeroNotFound(host))?;
    let visitor_receives = (a.role.rank(), a.army_strength()) > (b.role.rank(), b.army_strength());
    let (giver, receiver) = if visitor_receives { (host, visitor) } else { (visitor, host) };

    let mut given = state.hero(giver).map(|h| h.army.clone()).unwrap_or_default();
    let keep = given.weakest_troop().and_then(|idx| given.take(idx));
    let mut receiving = state.hero(receiver).map(|h| h.army.clone()).unwrap_or_default();
    let mut left_over = Vec::new();
    given.sort_strongest_first();
    for troop in given.troops {
        if !receiving.join(troop) {
            left_over.push(troop);
        }
    }
    if let Some(troop) = keep {
        left_over.push(troop);
    }

    if let Some(hero) = state.hero_mut(receiver) {
        hero.army = receiving;
        hero.met_heroes.insert(giver);
    }
    if let Some(hero) = state.hero_mut(giver) {
        hero.army = crate::army::Army::new(left_over);
        hero.met_heroes.insert(receiver);
    }
    Ok(())
}

fn place_hero(state: &mut GameState, hero_id: HeroId, color: Color, near: Position) -> Result<()> {
    let spot = std::iter::once(near)
        .chain(state.map.neighbours(near).map(|(p, _)| p))
        .find(|&p| state.map.tile(p).map(|t| t.is_open()).unwrap_or(false))
        .ok_or(EngineError::HeroUnavailable(hero_id, "no room to place".into()))?;
    let hero = state.hero_mut(hero_id).ok_or(EngineError::HeroNotFound(hero_id))?;
    hero.color = Some(color);
    hero.alive = true;
    hero.position = spot;
    hero.move_points = 0;
    if let Some(tile) = state.map.tile_mut(spot) {
        tile.hero = Some(hero_id);
    }
    if let Some(kingdom) = state.kingdom_mut(color) {
        kingdom.heroes.push(hero_id);
    }
    reveal_for_hero(state, hero_id, color)?;
    Ok(())
}

// ── Spells and army management ─────────────────────────────────────────

/// Jump next to `to` with dimension door and step onto it.
pub fn cast_teleport(state: &mut GameState, hero_id: HeroId, to: Position, knobs: PathKnobs) -> Result<MoveReport> {
    let hero = state.hero(hero_id).ok_or(EngineError::HeroNotFound(hero_id))?;
    let path = teleport_path(state, hero, to, knobs);
    if path.is_empty() {
        return Err(EngineError::HeroUnavailable(hero_id, format!("cannot teleport to {to}")));
    }
    move_hero(state, hero_id, &path)
}

/// Cast the view-all spell; returns whether anything was uncovered.
pub fn cast_view_all(state: &mut GameState, hero_id: HeroId) -> Result<bool> {
    let hero = state.hero_mut(hero_id).ok_or(EngineError::HeroNotFound(hero_id))?;
    let Some(color) = hero.color else {
        return Err(EngineError::HeroUnavailable(hero_id, "no owner".into()));
    };
    if !hero.knows_view_all || !hero.has_spellbook || hero.spell_points < VIEW_ALL_SPELL_POINTS {
        return Ok(false);
    }
    hero.spell_points -= VIEW_ALL_SPELL_POINTS;
    Ok(!reveal_all(state, color).is_empty())
}

/// Strongest stacks first, the order auto-combat favours.
pub fn optimize_army(state: &mut GameState, hero_id: HeroId) -> Result<()> {
    let hero = state.hero_mut(hero_id).ok_or(EngineError::HeroNotFound(hero_id))?;
    hero.army.sort_strongest_first();
    Ok(())
}

fn castle_of_guest(state: &GameState, hero_id: HeroId) -> Result<CastleId> {
    let hero = state.hero(hero_id).ok_or(EngineError::HeroNotFound(hero_id))?;
    state
        .castle_at(hero.position)
        .filter(|c| c.color == hero.color)
        .map(|c| c.id)
        .ok_or(EngineError::HeroUnavailable(hero_id, "not inside an own castle".into()))
}

/// Move every garrison stack the hero can hold into the hero's army.
pub fn reinforce_hero_in_castle(state: &mut GameState, hero_id: HeroId) -> Result<()> {
    let castle_id = castle_of_guest(state, hero_id)?;
    let castle = state.castle_mut(castle_id).ok_or(EngineError::CastleNotFound(castle_id))?;
    let mut garrison = std::mem::take(&mut castle.garrison);
    garrison.sort_strongest_first();

    let hero = state.hero_mut(hero_id).ok_or(EngineError::HeroNotFound(hero_id))?;
    let mut remaining = Vec::new();
    for troop in garrison.troops {
        if !hero.army.join(troop) {
            remaining.push(troop);
        }
    }
    hero.army.sort_strongest_first();
    if let Some(castle) = state.castle_mut(castle_id) {
        castle.garrison = crate::army::Army::new(remaining);
    }
    Ok(())
}

/// Leave `count` creatures of one of the hero's stacks in the castle.
pub fn move_troop_to_garrison(state: &mut GameState, hero_id: HeroId, index: usize, count: u32) -> Result<()> {
    let castle_id = castle_of_guest(state, hero_id)?;
    let hero = state.hero(hero_id).ok_or(EngineError::HeroNotFound(hero_id))?;
    let Some(troop) = hero.army.troops.get(index).copied() else {
        return Err(EngineError::HeroUnavailable(hero_id, format!("no troop in slot {index}")));
    };
    // A hero never walks away empty-handed
    let count = if hero.army.troops.len() == 1 { count.min(troop.count.saturating_sub(1)) } else { count.min(troop.count) };
    if count == 0 {
        return Ok(());
    }
    let castle = state.castle_mut(castle_id).ok_or(EngineError::CastleNotFound(castle_id))?;
    if !castle.garrison.join(Troop::new(troop.monster, count)) {
        return Ok(());
    }
    if let Some(hero) = state.hero_mut(hero_id) {
        hero.army.troops[index].count -= count;
        hero.army.troops.retain(|t| t.count > 0);
    }
    Ok(())
}

/// Leave every stack slower than the hero's fastest one in the castle.
/// Returns the number of stacks left behind.
pub fn move_slow_troops_to_garrison(state: &mut GameState, hero_id: HeroId) -> Result<u32> {
    castle_of_guest(state, hero_id)?;
    let mut moved = 0;
    loop {
        let hero = state.hero(hero_id).ok_or(EngineError::HeroNotFound(hero_id))?;
        if hero.army.troops.len() < 2 {
            break;
        }
        let fastest = hero.army.troops.iter().map(|t| t.monster.def().speed).max().unwrap_or(0);
        let Some(slowest) = hero.army.slowest_troop() else { break };
        let troop = hero.army.troops[slowest];
        if troop.monster.def().speed >= fastest {
            break;
        }
        let before = hero.army.troops.len();
        move_troop_to_garrison(state, hero_id, slowest, troop.count)?;
        let after = state.hero(hero_id).map(|h| h.army.troops.len()).unwrap_or(before);
        if after == before {
            break;
        }
        moved += 1;
    }
    Ok(moved)
}

// ── Castles ────────────────────────────────────────────────────────────

/// Hire a hero from the tavern offer into the castle.
pub fn recruit_hero(state: &mut GameState, castle_id: CastleId, offer: usize) -> Result<HeroId> {
    let castle = state.castle(castle_id).ok_or(EngineError::CastleNotFound(castle_id))?;
    let color = castle.color.ok_or(EngineError::CastleNotFound(castle_id))?;
    let position = castle.position;
    if state.castle_guest(castle).is_some() {
        return Err(EngineError::CannotBuild(Building::Tavern, "castle already has a guest".into()));
    }
    let kingdom = state.kingdom(color).ok_or(EngineError::KingdomNotFound(color))?;
    if kingdom.heroes.len() >= MAX_HEROES_PER_KINGDOM {
        return Err(EngineError::CannotBuild(Building::Tavern, "hero limit reached".into()));
    }
    if !kingdom.funds.covers(&Funds::gold(HERO_RECRUIT_COST)) {
        return Err(EngineError::CannotBuild(Building::Tavern, "not enough gold".into()));
    }
    let hero_id = *kingdom
        .recruits
        .get(offer)
        .ok_or(EngineError::CannotBuild(Building::Tavern, format!("no recruit #{offer}")))?;

    let replacement = make_recruit(state);
    if let Some(kingdom) = state.kingdom_mut(color) {
        kingdom.funds -= Funds::gold(HERO_RECRUIT_COST);
        kingdom.recruits[offer] = replacement;
        kingdom.heroes.push(hero_id);
    }
    let hero = state.hero_mut(hero_id).ok_or(EngineError::HeroNotFound(hero_id))?;
    hero.color = Some(color);
    hero.alive = true;
    hero.position = position;
    hero.move_points = hero.max_move_points;
    if let Some(tile) = state.map.tile_mut(position) {
        tile.hero = Some(hero_id);
    }
    reveal_for_hero(state, hero_id, color)?;
    debug!(hero = hero_id.0, castle = castle_id.0, %color, "hero recruited");
    Ok(hero_id)
}

/// Hire every affordable creature in the castle's dwellings into the garrison.
pub fn recruit_in_castle(state: &mut GameState, castle_id: CastleId) -> Result<u32> {
    let castle = state.castle(castle_id).ok_or(EngineError::CastleNotFound(castle_id))?;
    let color = castle.color.ok_or(EngineError::CastleNotFound(castle_id))?;
    let mut available = castle.available.clone();
    let mut garrison = castle.garrison.clone();
    let mut funds = state.kingdom(color).ok_or(EngineError::KingdomNotFound(color))?.funds;

    // Highest tier first
    available.sort_by(|a, b| b.monster.def().level.cmp(&a.monster.def().level));
    let mut hired = 0;
    for troop in &mut available {
        let unit_cost = Funds::gold(troop.monster.def().gold_cost);
        let count = funds.times(&unit_cost).min(troop.count);
        if count == 0 || !garrison.can_join(troop.monster) {
            continue;
        }
        garrison.join(Troop::new(troop.monster, count));
        funds -= unit_cost * count;
        troop.count -= count;
        hired += count;
    }

    if let Some(kingdom) = state.kingdom_mut(color) {
        kingdom.funds = funds;
    }
    if let Some(castle) = state.castle_mut(castle_id) {
        castle.garrison = garrison;
        castle.available = available;
    }
    Ok(hired)
}

/// Buy a building when the kingdom holds `funds_multiplier` times its cost.
/// One building per castle per day.
pub fn build(state: &mut GameState, castle_id: CastleId, building: Building, funds_multiplier: u32) -> Result<bool> {
    let castle = state.castle(castle_id).ok_or(EngineError::CastleNotFound(castle_id))?;
    let color = castle.color.ok_or(EngineError::CastleNotFound(castle_id))?;
    if castle.built_today || castle.has(building) {
        return Ok(false);
    }
    if !building_requirements(building).iter().all(|&b| castle.has(b)) {
        return Ok(false);
    }
    let cost = building_cost(building);
    let kingdom = state.kingdom_mut(color).ok_or(EngineError::KingdomNotFound(color))?;
    if !kingdom.funds.covers(&(cost * funds_multiplier.max(1))) {
        return Ok(false);
    }
    kingdom.funds -= cost;

    let castle = state.castle_mut(castle_id).ok_or(EngineError::CastleNotFound(castle_id))?;
    castle.buildings.insert(building);
    castle.built_today = true;
    if let Some(tier) = dwelling_tier(building) {
        let monster = Monster::castle_lineup(tier);
        castle.available.push(Troop::new(monster, monster.def().weekly_growth));
    }
    debug!(castle = castle_id.0, ?building, "built");
    Ok(true)
}

fn dwelling_tier(building: Building) -> Option<u8> {
    match building {
        Building::Dwelling1 => Some(1),
        Building::Dwelling2 => Some(2),
        Building::Dwelling3 => Some(3),
        Building::Dwelling4 => Some(4),
        _ => None,
    }
}

// ── Day cycle ──────────────────────────────────────────────────────────

/// Daily movement: slow stacks drag the hero down, logistics adds 10% per level.
pub fn max_move_points(hero: &Hero) -> u32 {
    let slowest = hero.army.slowest_troop().map(|i| hero.army.troops[i].monster.def().speed).unwrap_or(4);
    let base = (BASE_MOVE_POINTS as i32 + (slowest.clamp(1, 7) as i32 - 4) * 100) as u32;
    base + base * hero.skills.level(Skill::Logistics) as u32 / 10
}

/// Pay income, restore movement and spell points, and grow dwellings
/// at the start of each week.
pub fn end_day(state: &mut GameState) {
    let colors: Vec<Color> = state.kingdoms.iter().filter(|k| !k.lost).map(|k| k.color).collect();
    for color in colors {
        let income = economy::kingdom_daily_income(state, color);
        add_funds(state, color, income);
    }
    for hero in state.heroes.iter_mut().filter(|h| h.alive && h.color.is_some()) {
        hero.max_move_points = max_move_points(hero);
        hero.move_points = hero.max_move_points;
        hero.spell_points = (hero.spell_points + 1).min(hero.max_spell_points().max(hero.spell_points));
    }
    for castle in &mut state.castles {
        castle.built_today = false;
    }
    state.day += 1;
    if state.day_of_week() == 1 {
        for castle in &mut state.castles {
            for troop in &mut castle.available {
                troop.count += troop.monster.def().weekly_growth;
            }
        }
    }
}

/// A kingdom with neither castles nor heroes is out of the game.
pub fn update_losers(state: &mut GameState) {
    for kingdom in &mut state.kingdoms {
        if !kingdom.lost && kingdom.castles.is_empty() && kingdom.heroes.is_empty() {
            kingdom.lost = true;
            debug!(color = %kingdom.color, "kingdom lost");
        }
    }
}

/// The last kingdom standing.
pub fn winner(state: &GameState) -> Option<Color> {
    let mut alive = state.kingdoms.iter().filter(|k| !k.lost);
    match (alive.next(), alive.next()) {
        (Some(k), None) => Some(k.color),
        _ => None,
    }
}
