// ═══════════════════════════════════════════════════════════════════════
// Role Scorers — fighter, courier and scout views of the map
//
// Fighters chase armies and castles and treat everything else as a
// side errand. Couriers ferry troops and pick up what lies near the
// road. Scouts explore, so a hut teaching scouting or logistics is worth
// a detour. Anything a role does not single out is scored by the
// general scorer.
// ═══════════════════════════════════════════════════════════════════════

use crate::development::castle_visit_value;
use crate::host::WorldHost;
use crate::table::{lookup, CourierTier, Rule};
use crate::valuation::{spirit_value, Valuation, CASTLE_VISIT_THRESHOLD, FIGHTER_CASTLE, MEETING_THRESHOLD};
use conquest_engine::*;

pub const FIGHTER_MEETING_CAP: f64 = 5000.0;
pub const FIGHTER_ENEMY_HERO: f64 = 12000.0;
pub const FIGHTER_SHARED_MONSTER: f64 = 4000.0;
pub const FIGHTER_SHARED_PICKUP: f64 = 100.0;

pub const COURIER_MONSTER_BASE: f64 = 500.0;

pub const SCOUT_SKILL_FACTOR: f64 = 3.0;

/// Courier target thresholds.
pub const COURIER_MEETING_MIN: f64 = 500.0;
pub const COURIER_CHAMPION_FACTOR: f64 = 2.5;
pub const COURIER_CASTLE_MIN: f64 = 250.0;

impl<'a, W: WorldHost> Valuation<'a, W> {
    // ── Fighter and champion ───────────────────────────────────────────

    pub fn fighter_value(&self, hero: &Hero, position: Position, ignore: f64, distance: u32) -> f64 {
        let kind = self.world.object_kind(position);
        let entry = lookup(kind);
        let shared_region = self.region_friendly_heroes(position) > 1;

        match kind {
            ObjectKind::Castle => {
                let Some(castle) = self.world.castle_at(position) else { return ignore };
                if castle.color == hero.color {
                    if self.ctx.ledger.is_critical(position) {
                        return self.castle_value(hero, castle, FIGHTER_CASTLE);
                    }
                    let value = castle_visit_value(self.world, castle, &hero.army, self.ctx.color);
                    if !self.ctx.ledger.is_priority(position) && value < CASTLE_VISIT_THRESHOLD {
                        return ignore;
                    }
                    return value / 2.0;
                }
                if self.world.is_friend(self.ctx.color, castle.color) {
                    return self.forbidden(position, "allied castle");
                }
                self.castle_value(hero, castle, FIGHTER_CASTLE)
            }
            ObjectKind::Hero => {
                let Some(other) = self.world.hero_at(position) else { return ignore };
                if other.color == hero.color {
                    if !self.should_meet(hero, other, self.config.fighter_meeting_stat_margin) {
                        return ignore;
                    }
                    let value = hero.meeting_value(other);
                    return if value < MEETING_THRESHOLD { ignore } else { value.min(FIGHTER_MEETING_CAP) };
                }
                if self.world.is_friend(self.ctx.color, other.color) {
                    return self.forbidden(position, "allied hero");
                }
                if self.world.victory().human_victory_hero == Some(other.id) {
                    return self.forbidden(position, "protected hero");
                }
                self.enemy_hero_value(hero, other, FIGHTER_ENEMY_HERO, FIGHTER_CASTLE)
            }
            ObjectKind::Monster => {
                let base = if shared_region { FIGHTER_SHARED_MONSTER } else { entry.base };
                base + self.guard_hit_points(position) / 100.0
            }
            ObjectKind::Resource | ObjectKind::Campfire | ObjectKind::TreasureChest if shared_region => FIGHTER_SHARED_PICKUP,
            ObjectKind::ObservationTower => self.general_value(hero, position, ignore, distance) / 2.0,
            ObjectKind::Temple => {
                if hero.army.all_undead() {
                    return 0.0;
                }
                spirit_value(hero.morale, self.penalty(), 200.0)
            }
            _ => match (entry.rule, entry.fighter) {
                // Spell point refills keep their fullness checks
                (Rule::SpellPoints { .. }, Some(value)) => {
                    let general = self.general_value(hero, position, ignore, distance);
                    if general > 0.0 {
                        value
                    } else {
                        general
                    }
                }
                (Rule::OncePerHero, Some(value)) if !hero.has_visited(position) => value,
                (Rule::Flat | Rule::Artifact, Some(value)) => match self.world.map_object(position) {
                    Some(MapObject::Artifact { value: worth }) => value * *worth as f64,
                    _ => value,
                },
                _ => self.general_value(hero, position, ignore, distance),
            },
        }
    }

    // ── Courier ────────────────────────────────────────────────────────

    pub fn courier_value(&self, hero: &Hero, position: Position, ignore: f64, distance: u32) -> f64 {
        let kind = self.world.object_kind(position);
        match kind {
            ObjectKind::Hero => {
                let Some(other) = self.world.hero_at(position) else { return ignore };
                if other.color == hero.color {
                    return ignore;
                }
                if !self.ctx.ledger.is_critical(position) && !self.world.is_friend(self.ctx.color, other.color) {
                    return CourierTier::TenTiles.value();
                }
                self.general_value(hero, position, ignore, distance)
            }
            ObjectKind::Monster => COURIER_MONSTER_BASE + self.guard_hit_points(position) / 100.0,
            ObjectKind::Mine => match self.world.map_object(position) {
                Some(MapObject::Mine { owner, .. }) if self.world.is_friend(self.ctx.color, *owner) => ignore,
                Some(MapObject::Mine { resource: Resource::Gold, .. }) => CourierTier::TenTiles.value(),
                Some(MapObject::Mine { .. }) => CourierTier::FiveTiles.value(),
                _ => ignore,
            },
            ObjectKind::MagicWell | ObjectKind::ArtesianSpring => {
                let general = self.general_value(hero, position, ignore, distance);
                match lookup(kind).courier {
                    Some(tier) if general > 0.0 => tier.value(),
                    _ => general,
                }
            }
            _ => match lookup(kind).courier {
                Some(tier) => tier.value(),
                None => self.general_value(hero, position, ignore, distance),
            },
        }
    }

    /// Where a courier should carry its army: the best friendly hero to
    /// hand troops to, or else the most rewarding empty own castle.
    pub fn courier_main_target(&self, hero: &Hero, distance: impl Fn(Position) -> u32, lowest: f64) -> Option<Position> {
        let mut best: Option<(f64, Position)> = None;
        for id in self.world.kingdom_heroes(self.ctx.color) {
            let Some(other) = self.world.hero(id) else { continue };
            if other.id == hero.id || matches!(other.role, Role::Courier | Role::Scout) {
                continue;
            }
            let dist = distance(other.position);
            if dist == 0 || hero.met_heroes.contains(&other.id) {
                continue;
            }
            let mut value = hero.meeting_value(other);
            if value < COURIER_MEETING_MIN {
                continue;
            }
            if other.role == Role::Champion {
                value *= COURIER_CHAMPION_FACTOR;
            }
            value -= dist as f64;
            if value > best.map_or(lowest, |b| b.0) {
                best = Some((value, other.position));
            }
        }
        if let Some((_, position)) = best {
            return Some(position);
        }

        for id in self.world.kingdom_castles(self.ctx.color) {
            let Some(castle) = self.world.castle(id) else { continue };
            if self.world.castle_guest(castle).is_some() {
                continue;
            }
            let dist = distance(castle.position);
            if dist == 0 {
                continue;
            }
            let mut value = castle_visit_value(self.world, castle, &hero.army, self.ctx.color);
            if value < COURIER_CASTLE_MIN {
                continue;
            }
            let safety = self.ctx.safety(self.world.region_of(castle.position));
            if safety > 100 {
                value *= 2.0;
            } else if safety < 0 {
                value /= 2.0;
            }
            value -= dist as f64;
            if value > best.map_or(lowest, |b| b.0) {
                best = Some((value, castle.position));
            }
        }
        best.map(|(_, position)| position)
    }

    // ── Scout ──────────────────────────────────────────────────────────

    pub fn scout_value(&self, hero: &Hero, position: Position, ignore: f64, distance: u32) -> f64 {
        let value = self.general_value(hero, position, ignore, distance);
        match self.world.map_object(position) {
            Some(MapObject::WitchsHut(Skill::Scouting | Skill::Logistics)) if value > 0.0 => value * SCOUT_SKILL_FACTOR,
            _ => value,
        }
    }
}
