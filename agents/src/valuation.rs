// ═══════════════════════════════════════════════════════════════════════
// Valuation — how much a hero wants to walk to a map object
//
// Architecture:
//   `Valuation` borrows the world, the turn context and the config, and
//   every scorer is a read-only method on it. `object_value()` picks the
//   scorer for the hero's role; the role scorers (see `specialists.rs`)
//   special-case a few categories and fall through to `general_value()`
//   for the rest.
//
// Raw values are then adjusted by the caller:
//   1. `ThreatField::penalty_at()` for tiles an enemy hero can strike
//   2. `region_threat_penalty()` for regions holding a stronger army
//   3. `discount()` for distance, growing gently with the game day
// ═══════════════════════════════════════════════════════════════════════

use crate::budget::{pile_estimate, resource_priority};
use crate::config::PlannerConfig;
use crate::context::TurnContext;
use crate::development::castle_visit_value;
use crate::host::WorldHost;
use crate::table::{lookup, Rule};
use conquest_engine::economy::mine_daily_income;
use conquest_engine::engine::OASIS_MOVE_BONUS;
use conquest_engine::navigation::Reachability;
use conquest_engine::*;
use tracing::error;

/// Value above which a friendly hero is worth walking to.
pub const MEETING_THRESHOLD: f64 = 250.0;
pub const GENERAL_MEETING_CAP: f64 = 10000.0;

pub const LOSING_KINGDOM_CASTLE_BONUS: f64 = 15000.0;
pub const LOSS_CONDITION_CASTLE_BONUS: f64 = 20000.0;
pub const AI_HERO_FACTOR: f64 = 0.8;

/// Own castles below this visit value are not worth a detour.
pub const CASTLE_VISIT_THRESHOLD: f64 = 500.0;

/// Per-role share of a hero's strength a joining troop must exceed.
pub fn joining_ratio(role: Role) -> f64 {
    match role {
        Role::Scout | Role::Courier => 0.02,
        Role::Hunter => 0.05,
        Role::Fighter => 0.1,
        Role::Champion => 0.15,
    }
}

/// Strength a free troop must exceed before it is worth collecting.
pub fn joining_threshold(hero: &Hero, monster: Monster) -> f64 {
    let threshold = hero.army_strength() * joining_ratio(hero.role);
    if hero.army.has_monster(monster) {
        threshold / 2.0
    } else {
        threshold
    }
}

/// Morale and luck ladders share one shape.
pub fn spirit_value(level: i8, penalty: f64, below_neutral: f64) -> f64 {
    if level >= MORALE_MAX {
        -penalty
    } else if level == MORALE_GREAT {
        -4000.0
    } else if level == MORALE_GOOD {
        -2000.0
    } else if level == MORALE_NORMAL {
        50.0
    } else {
        below_neutral
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CastleWeights {
    pub per_building: f64,
    pub base: f64,
    /// Applied to an enemy castle with nobody inside.
    pub defenceless: f64,
    /// Applied to an own castle that must be held.
    pub own: f64,
}

pub const GENERAL_CASTLE: CastleWeights = CastleWeights { per_building: 150.0, base: 3000.0, defenceless: 1.25, own: 1.25 };
pub const FIGHTER_CASTLE: CastleWeights = CastleWeights { per_building: 500.0, base: 15000.0, defenceless: 1.5, own: 1.5 };

pub struct Valuation<'a, W: WorldHost> {
    pub world: &'a W,
    pub ctx: &'a TurnContext,
    pub config: &'a PlannerConfig,
}

impl<'a, W: WorldHost> Valuation<'a, W> {
    pub fn new(world: &'a W, ctx: &'a TurnContext, config: &'a PlannerConfig) -> Self {
        Valuation { world, ctx, config }
    }

    pub fn penalty(&self) -> f64 {
        self.config.dangerous_task_penalty
    }

    /// Value of `position` as a target for `hero`, by the hero's role.
    pub fn object_value(&self, hero: &Hero, position: Position, ignore: f64, distance: u32) -> f64 {
        match hero.role {
            Role::Hunter => self.general_value(hero, position, ignore, distance),
            Role::Scout => self.scout_value(hero, position, ignore, distance),
            Role::Fighter | Role::Champion => self.fighter_value(hero, position, ignore, distance),
            Role::Courier => self.courier_value(hero, position, ignore, distance),
        }
    }

    pub(crate) fn kingdom_losing(&self) -> bool {
        self.world.kingdom(self.ctx.color).is_some_and(|k| k.is_losing())
    }

    /// Scoring reached a target the validity filter should have removed.
    pub(crate) fn forbidden(&self, position: Position, reason: &str) -> f64 {
        error!(%position, reason, "invalid target reached valuation");
        debug_assert!(false, "invalid target at {position}: {reason}");
        -self.penalty()
    }

    pub(crate) fn region_friendly_heroes(&self, position: Position) -> u32 {
        self.world
            .region_of(position)
            .and_then(|r| self.ctx.region(r))
            .map(|r| r.friendly_heroes)
            .unwrap_or(0)
    }

    pub(crate) fn guard_hit_points(&self, position: Position) -> f64 {
        self.world.map_object(position).and_then(|o| o.guard()).map(|t| t.hit_points()).unwrap_or(0) as f64
    }

    // ── Castles ────────────────────────────────────────────────────────

    pub fn castle_value(&self, hero: &Hero, castle: &Castle, weights: CastleWeights) -> f64 {
        let mut value = castle.building_value() as f64 * weights.per_building + weights.base;
        if self.kingdom_losing() {
            value += LOSING_KINGDOM_CASTLE_BONUS;
        }
        if self.world.victory().human_loss_castle == Some(castle.id) {
            value += LOSS_CONDITION_CASTLE_BONUS;
        }
        if castle.color == hero.color {
            return value * weights.own;
        }

        value = self.threatened_castles_value(hero, castle.position, value, weights);
        if castle.garrison.is_empty() && self.world.castle_guest(castle).is_none() {
            value *= weights.defenceless;
        }
        value
    }

    /// An attacker is worth at least twice each castle it threatens.
    pub(crate) fn threatened_castles_value(&self, hero: &Hero, attacker: Position, value: f64, weights: CastleWeights) -> f64 {
        if !self.ctx.ledger.is_critical(attacker) {
            return value;
        }
        self.ctx
            .ledger
            .threatened_by(attacker)
            .filter_map(|p| self.world.castle_at(p))
            .filter(|c| c.color == hero.color)
            .map(|c| self.castle_value(hero, c, weights) * 2.0)
            .fold(value, f64::max)
    }

    /// A castle in danger is worth as much as retaking it would be;
    /// otherwise it is worth what the hero can collect there.
    pub(crate) fn own_castle_value(&self, hero: &Hero, castle: &Castle, ignore: f64, weights: CastleWeights) -> f64 {
        if self.ctx.ledger.is_critical(castle.position) {
            return self.castle_value(hero, castle, weights);
        }
        let value = castle_visit_value(self.world, castle, &hero.army, self.ctx.color);
        if !self.ctx.ledger.is_priority(castle.position) && value < CASTLE_VISIT_THRESHOLD {
            return ignore;
        }
        value
    }

    // ── Heroes ─────────────────────────────────────────────────────────

    /// Whether `hero` should walk to the friendly `other`, given the stat
    /// margin that makes `hero` the one to stay put.
    pub(crate) fn should_meet(&self, hero: &Hero, other: &Hero, stat_margin: u32) -> bool {
        if hero.role.rank() > other.role.rank() {
            return false;
        }
        !(hero.role == other.role && hero.stats_value() + stat_margin > other.stats_value())
    }

    pub(crate) fn enemy_hero_value(&self, hero: &Hero, other: &Hero, base: f64, weights: CastleWeights) -> f64 {
        if self.ctx.ledger.is_critical(other.position) {
            return self.threatened_castles_value(hero, other.position, base, weights);
        }
        match self.world.castle_at(other.position) {
            Some(castle) => base + self.castle_value(hero, castle, weights),
            None if other.control == Control::Ai => base * AI_HERO_FACTOR,
            None => base,
        }
    }

    // ── General scorer ─────────────────────────────────────────────────

    pub fn general_value(&self, hero: &Hero, position: Position, ignore: f64, distance: u32) -> f64 {
        let kind = self.world.object_kind(position);
        let entry = lookup(kind);
        let penalty = self.penalty();
        let object = self.world.map_object(position);

        match entry.rule {
            Rule::Castle => {
                let Some(castle) = self.world.castle_at(position) else { return ignore };
                if castle.color == hero.color {
                    return self.own_castle_value(hero, castle, ignore, GENERAL_CASTLE);
                }
                if self.world.is_friend(self.ctx.color, castle.color) {
                    return self.forbidden(position, "allied castle");
                }
                self.castle_value(hero, castle, GENERAL_CASTLE)
            }
            Rule::Hero => {
                let Some(other) = self.world.hero_at(position) else { return ignore };
                if other.color == hero.color {
                    if !self.should_meet(hero, other, self.config.meeting_stat_margin) {
                        return ignore;
                    }
                    let value = hero.meeting_value(other);
                    return if value < MEETING_THRESHOLD { ignore } else { value.min(GENERAL_MEETING_CAP) };
                }
                if self.world.is_friend(self.ctx.color, other.color) {
                    return self.forbidden(position, "allied hero");
                }
                if self.world.victory().human_victory_hero == Some(other.id) {
                    return self.forbidden(position, "protected hero");
                }
                self.enemy_hero_value(hero, other, entry.base, GENERAL_CASTLE)
            }
            Rule::Monster => entry.base + self.guard_hit_points(position) / 100.0,
            Rule::Mine => match object {
                Some(MapObject::Mine { resource, owner }) => {
                    if self.world.is_friend(self.ctx.color, *owner) {
                        return ignore;
                    }
                    mine_daily_income(*resource) as f64 * resource_priority(self.ctx, *resource, true)
                }
                _ => ignore,
            },
            Rule::Artifact => match object {
                Some(MapObject::Artifact { value }) => entry.base * *value as f64,
                _ => ignore,
            },
            Rule::ResourcePile => match object {
                Some(MapObject::Resource { resource, .. }) => {
                    pile_estimate(*resource) as f64 * resource_priority(self.ctx, *resource, false)
                }
                _ => ignore,
            },
            Rule::TreasureChest => entry.base * resource_priority(self.ctx, Resource::Gold, false),
            Rule::Campfire => match object {
                Some(MapObject::Campfire { resource, .. }) => {
                    entry.base * resource_priority(self.ctx, Resource::Gold, false)
                        + resource_priority(self.ctx, *resource, false)
                }
                _ => ignore,
            },
            Rule::Morale => {
                if hero.army.all_undead() {
                    return 0.0;
                }
                spirit_value(hero.morale, penalty, 100.0)
            }
            Rule::Luck => spirit_value(hero.luck, penalty, 100.0),
            Rule::FreeDwelling => match object {
                Some(MapObject::FreeDwelling(troop)) if troop.count > 0 => {
                    let strength = troop.strength();
                    if strength > joining_threshold(hero, troop.monster) {
                        strength
                    } else {
                        ignore
                    }
                }
                _ => ignore,
            },
            Rule::RecruitDwelling => match object {
                Some(MapObject::RecruitDwelling(troop)) => {
                    let funds = self.world.kingdom(self.ctx.color).map(|k| k.funds).unwrap_or_default();
                    let count = funds.times(&Funds::gold(troop.monster.def().gold_cost)).min(troop.count);
                    if count == 0 {
                        return -penalty;
                    }
                    Troop::new(troop.monster, count).strength()
                }
                _ => ignore,
            },
            Rule::SpellPoints { double } => {
                let full = if double {
                    hero.spell_points * 2 >= hero.max_spell_points()
                } else {
                    hero.spell_points >= hero.max_spell_points()
                };
                if !hero.has_spellbook || full {
                    return -penalty;
                }
                if hero.is_potent_spellcaster() {
                    entry.base
                } else {
                    0.0
                }
            }
            Rule::ObservationTower => {
                let radius = match object {
                    Some(MapObject::ObservationTower { radius }) => *radius,
                    _ => return ignore,
                };
                let revealed = self.world.fog_reveal_count(self.ctx.color, position, radius);
                if revealed == 0 {
                    -penalty
                } else {
                    revealed as f64
                }
            }
            Rule::Flat => entry.base,
            Rule::OncePerHero => {
                if hero.has_visited(position) {
                    -penalty
                } else {
                    entry.base
                }
            }
            Rule::Oasis => {
                let value = OASIS_MOVE_BONUS as f64 - 2.0 * distance as f64;
                if hero.has_visited(position) || value < 0.0 {
                    -penalty
                } else {
                    value
                }
            }
            Rule::Useless => -penalty,
            Rule::Nothing => ignore,
        }
    }

    // ── Adjustments ────────────────────────────────────────────────────

    /// Penalty for walking into a region that holds a stronger army.
    pub fn region_threat_penalty(&self, hero: &Hero, position: Position) -> f64 {
        let threat = self
            .world
            .region_of(position)
            .and_then(|r| self.ctx.region(r))
            .map(|r| r.highest_threat)
            .unwrap_or(-1.0);
        if hero.army_strength() >= threat {
            return 0.0;
        }
        let sheltered = self
            .world
            .castle_at(position)
            .is_some_and(|c| c.color == hero.color || c.garrison.is_empty());
        if sheltered {
            self.penalty() / 2.0
        } else {
            self.penalty()
        }
    }
}

/// Distance discount. A path longer than today's movement counts its
/// remainder double; the modified distance `d` then costs `d·log10(d)`.
pub fn discount(value: f64, distance: u32, move_points: u32, modifier: f64, day: u32) -> f64 {
    let distance = if distance > move_points { move_points + (distance - move_points) * 2 } else { distance };
    scale_with_distance_and_time(value, distance, modifier, day)
}

pub fn scale_with_distance_and_time(value: f64, distance: u32, modifier: f64, day: u32) -> f64 {
    if distance == 0 {
        return value;
    }
    let time = 1.0 - (day as f64 * 0.0001).min(0.5);
    let d = distance as f64 * modifier * time;
    value - d * d.log10()
}

// ── Enemy strike zones ─────────────────────────────────────────────────

/// One enemy hero's reach for the rest of this turn.
#[derive(Debug, Clone)]
pub struct EnemyReach {
    pub position: Position,
    pub strength: f64,
    /// Tiles closer than this can be struck tomorrow.
    pub threshold: u32,
    pub reach: Reachability,
}

/// Where visible enemy heroes can strike, measured once per scheduler pass.
#[derive(Debug, Clone, Default)]
pub struct ThreatField {
    pub enemies: Vec<EnemyReach>,
}

impl ThreatField {
    pub fn build<W: WorldHost>(world: &W, ctx: &TurnContext, config: &PlannerConfig) -> Self {
        let enemies = ctx
            .enemy_armies
            .values()
            .filter_map(|army| army.hero.and_then(|id| world.hero(id)))
            .filter(|h| h.alive)
            .map(|enemy| EnemyReach {
                position: enemy.position,
                strength: enemy.army_strength(),
                threshold: enemy.max_move_points + 2 * SLOWEST_MOVE_PENALTY,
                reach: world.reachability(enemy, config.enemy_knobs()),
            })
            .collect();
        ThreatField { enemies }
    }

    /// Summed danger at `position` for a hero of `strength`.
    pub fn penalty_at(&self, position: Position, strength: f64, small_advantage: f64, penalty: f64) -> f64 {
        self.enemies
            .iter()
            .filter(|e| strength * small_advantage < e.strength)
            .filter_map(|e| {
                let distance = if e.position == position { 0 } else { e.reach.distance(position) };
                if e.position != position && (distance == 0 || distance > e.threshold) {
                    return None;
                }
                Some(penalty * (2.0 - distance as f64 / e.threshold.max(1) as f64))
            })
            .sum()
    }
}
