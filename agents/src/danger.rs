// ═══════════════════════════════════════════════════════════════════════
// Castle Danger — which castles can be taken by a visible enemy soon
//
// Every (enemy army, own castle) pair is measured with the castle
// owner's fog and the attacker's optimistic pathfinder settings. A
// threat a few days out counts for less: its strength decays for every
// day beyond the first.
// ═══════════════════════════════════════════════════════════════════════

use crate::config::PlannerConfig;
use crate::context::{AICastle, EnemyArmy, TurnContext};
use crate::host::WorldHost;
use crate::scan::enemy_army_on_tile;
use conquest_engine::navigation::Traveller;
use conquest_engine::{Castle, CastleId, Position, FASTEST_MOVE_PENALTY};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use tracing::{debug, trace};

/// Margin by which `army` endangers `castle`, or `None` when it does not.
pub fn castle_threat<W: WorldHost>(world: &W, config: &PlannerConfig, castle: &Castle, army: &EnemyArmy) -> Option<f64> {
    let limit = config.threat_distance_limit;
    if world.approximate_distance(army.position, castle.position) * FASTEST_MOVE_PENALTY > limit {
        return None;
    }

    // Measured as the castle owner sees the map; our own heroes do not block
    let traveller = Traveller {
        origin: army.position,
        viewer: castle.color,
        color: Some(army.color),
        strength: army.strength,
        ignore_heroes_of: castle.color,
    };
    let distance = world.distance_for_army(&traveller, castle.position, config.enemy_knobs());
    if distance == 0 || distance >= limit {
        return None;
    }

    let days = distance.div_ceil(army.move_points.max(1));
    if days > config.max_days_to_reach {
        return None;
    }
    let strength = (1..days).fold(army.strength, |s, _| s * config.daily_threat_decay);

    let defence = world.garrison_strength(castle);
    if defence < strength {
        return Some(strength - defence);
    }
    if let Some(guest) = world.castle_guest(castle) {
        let limit = strength * config.advantage.small;
        if guest.army_strength() <= limit {
            return Some((limit - guest.army_strength()).max(f64::MIN_POSITIVE));
        }
    }
    None
}

/// Link `army` to every castle it endangers. Returns those castles.
fn link_army<W: WorldHost>(world: &W, ctx: &mut TurnContext, config: &PlannerConfig, army: &EnemyArmy) -> Vec<CastleId> {
    let mut endangered = Vec::new();
    for id in world.kingdom_castles(ctx.color) {
        let Some(castle) = world.castle(id) else { continue };
        if let Some(margin) = castle_threat(world, config, castle, army) {
            trace!(castle = id.0, attacker = army.position.0, margin, "castle threatened");
            ctx.ledger.link_threat(army.position, castle.position, margin);
            endangered.push(id);
        }
    }
    endangered
}

/// Recompute the set of castles in danger from all visible enemy armies.
pub fn find_castles_in_danger<W: WorldHost>(world: &W, ctx: &mut TurnContext, config: &PlannerConfig) -> BTreeSet<CastleId> {
    let armies: Vec<EnemyArmy> = ctx.enemy_armies.values().copied().collect();
    let mut in_danger = BTreeSet::new();
    for army in &armies {
        in_danger.extend(link_army(world, ctx, config, army));
    }
    if !in_danger.is_empty() {
        debug!(color = %ctx.color, castles = in_danger.len(), "castles in danger");
    }
    ctx.castles_in_danger = in_danger.clone();
    in_danger
}

/// Re-link one castle against every known enemy army.
pub fn update_priority_for_castle<W: WorldHost>(world: &W, ctx: &mut TurnContext, config: &PlannerConfig, castle: CastleId) {
    let Some(castle) = world.castle(castle) else { return };
    let armies: Vec<EnemyArmy> = ctx.enemy_armies.values().copied().collect();
    for army in &armies {
        if let Some(margin) = castle_threat(world, config, castle, army) {
            ctx.ledger.link_threat(army.position, castle.position, margin);
        }
    }
}

/// Re-assess whatever enemy army stands on `position` now.
pub fn update_priority_attack_target<W: WorldHost>(world: &W, ctx: &mut TurnContext, config: &PlannerConfig, position: Position) {
    match enemy_army_on_tile(world, ctx.color, position) {
        Some(army) => {
            ctx.enemy_armies.insert(position, army);
            link_army(world, ctx, config, &army);
        }
        None => {
            ctx.enemy_armies.remove(&position);
        }
    }
}

// ── Castle ordering ────────────────────────────────────────────────────

pub fn build_castle_list<W: WorldHost>(world: &W, ctx: &TurnContext) -> Vec<AICastle> {
    let mut list: Vec<AICastle> = world
        .kingdom_castles(ctx.color)
        .into_iter()
        .filter_map(|id| world.castle(id))
        .map(|castle| AICastle {
            id: castle.id,
            position: castle.position,
            under_threat: ctx.castles_in_danger.contains(&castle.id),
            safety: ctx.safety(world.region_of(castle.position)),
            build_value: castle.building_value(),
        })
        .collect();
    list.sort_by(castle_order);
    list
}

/// Threatened castles first. Safe castles by descending safety; threatened
/// ones by building value relative to safety, with the lowest safety first.
pub fn castle_order(left: &AICastle, right: &AICastle) -> Ordering {
    match (left.under_threat, right.under_threat) {
        (false, false) => right.safety.cmp(&left.safety),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (true, true) => {
            let group = |c: &AICastle| c.safety.signum();
            group(left).cmp(&group(right)).then_with(|| {
                let ratio = |c: &AICastle| {
                    if c.safety == 0 {
                        c.build_value as f64
                    } else {
                        c.build_value as f64 / c.safety as f64
                    }
                };
                ratio(right).total_cmp(&ratio(left))
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u32, under_threat: bool, safety: i32, build_value: u32) -> AICastle {
        AICastle { id: CastleId(id), position: Position(id), under_threat, safety, build_value }
    }

    #[test]
    fn threatened_castles_come_first() {
        let mut list = vec![entry(0, false, 100, 5), entry(1, true, 100, 5), entry(2, false, 150, 5)];
        list.sort_by(castle_order);
        let ids: Vec<u32> = list.iter().map(|c| c.id.0).collect();
        assert_eq!(ids, vec![1, 2, 0]);
    }

    #[test]
    fn threatened_castles_weigh_value_against_safety() {
        let mut list = vec![entry(0, true, 100, 4), entry(1, true, 50, 4), entry(2, true, -50, 1)];
        list.sort_by(castle_order);
        let ids: Vec<u32> = list.iter().map(|c| c.id.0).collect();
        assert_eq!(ids, vec![2, 1, 0]);
    }
}
