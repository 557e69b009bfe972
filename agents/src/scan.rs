// ═══════════════════════════════════════════════════════════════════════
// Threat Scanner — one pass over the map at the start of a kingdom turn
//
// Fills the turn context with everything the kingdom can currently see:
// action objects, enemy armies, and per-region castle, hero, monster and
// fog counts.
// ═══════════════════════════════════════════════════════════════════════

use crate::context::{EnemyArmy, TurnContext};
use crate::host::WorldHost;
use conquest_engine::{Color, ObjectKind, Position, Skill, BASE_MOVE_POINTS};
use tracing::{debug, warn};

/// Enemy army standing on a tile, if the tile holds one that matters to
/// `color`. Stationary patrol heroes and neutral castles are harmless.
pub fn enemy_army_on_tile<W: WorldHost>(world: &W, color: Color, position: Position) -> Option<EnemyArmy> {
    match world.object_kind(position) {
        ObjectKind::Hero => {
            let hero = world.hero_at(position)?;
            let owner = hero.color?;
            if world.is_friend(color, Some(owner)) || hero.is_stationary_patrol() {
                return None;
            }
            // Rough estimate: a hero in a castle fights together with its garrison
            let garrison = world.castle_at(position).map(|c| c.garrison.strength()).unwrap_or(0.0);
            Some(EnemyArmy {
                position,
                strength: hero.army_strength() + garrison,
                move_points: hero.max_move_points.max(1),
                color: owner,
                hero: Some(hero.id),
            })
        }
        ObjectKind::Castle => {
            let castle = world.castle_at(position)?;
            let owner = castle.color?;
            if world.is_friend(color, Some(owner)) {
                return None;
            }
            if !castle.is_castle() && !castle.can_build_castle() {
                return None;
            }
            Some(EnemyArmy {
                position,
                strength: castle.garrison.strength(),
                move_points: BASE_MOVE_POINTS,
                color: owner,
                hero: None,
            })
        }
        _ => None,
    }
}

pub fn scan_world<W: WorldHost>(world: &W, ctx: &mut TurnContext) {
    let color = ctx.color;

    for idx in 0..world.map_size() {
        let position = Position(idx as u32);
        let Some(region) = world.region_of(position) else { continue };
        if ctx.region(region).is_none() {
            warn!(region = region.0, "tile refers to an unknown region");
            continue;
        }

        if !ctx.reveal_all && world.is_fog(position, color) {
            if let Some(stats) = ctx.region_mut(region) {
                stats.fog_count += 1;
            }
            continue;
        }

        let kind = world.object_kind(position);
        if !kind.is_action_object() {
            continue;
        }
        ctx.objects.set(position, kind);

        let mut base_kind = kind;
        if kind == ObjectKind::Hero {
            if let Some(hero) = world.hero_at(position) {
                let Some(stats) = ctx.region_mut(region) else { continue };
                if hero.color == Some(color) && hero.patrol.is_none() {
                    stats.friendly_heroes += 1;
                    let wisdom = hero.skills.level(Skill::Wisdom) + 2;
                    stats.spell_level = stats.spell_level.max(wisdom);
                } else if !world.is_friend(color, hero.color) {
                    stats.enemy_heroes += 1;
                }
            }
            base_kind = world.object_kind_under_hero(position);
        }

        if base_kind == ObjectKind::Castle {
            if let (Some(castle), Some(stats)) = (world.castle_at(position), ctx.regions.get_mut(region.index())) {
                if world.is_friend(color, castle.color) {
                    stats.friendly_castles += 1;
                } else if castle.color.is_some() {
                    stats.enemy_castles += 1;
                }
            }
        }

        if kind == ObjectKind::Monster {
            let strength = world.tile_army_strength(position);
            if let Some(stats) = ctx.region_mut(region) {
                stats.add_monster(strength);
            }
        }

        if let Some(army) = enemy_army_on_tile(world, color, position) {
            if let Some(stats) = ctx.region_mut(region) {
                stats.raise_threat(army.strength);
            }
            ctx.enemy_armies.insert(position, army);
        }
    }

    debug!(
        %color,
        objects = ctx.objects.len(),
        threats = ctx.enemy_armies.len(),
        "map scanned"
    );
}
