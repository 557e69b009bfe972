// ═══════════════════════════════════════════════════════════════════════
// Tactical Seam — what the planner hands to a battle-level AI
//
// The strategic planner never drives a battle itself. It forwards the
// arena and the acting unit to a `TacticalPlanner` and returns whatever
// actions come back. `StrikeWeakest` is the built-in implementation.
// ═══════════════════════════════════════════════════════════════════════

use conquest_engine::Troop;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Attacker,
    Defender,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub fn distance(self, other: Cell) -> u32 {
        (self.x - other.x).unsigned_abs().max((self.y - other.y).unsigned_abs())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleUnit {
    pub id: u32,
    pub side: Side,
    pub troop: Troop,
    pub cell: Cell,
    /// Whether this unit strikes from afar.
    pub ranged: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub width: i32,
    pub height: i32,
    pub units: Vec<BattleUnit>,
}

impl Arena {
    pub fn unit(&self, id: u32) -> Option<&BattleUnit> {
        self.units.iter().find(|u| u.id == id)
    }

    pub fn enemies_of<'a>(&'a self, unit: &'a BattleUnit) -> impl Iterator<Item = &'a BattleUnit> + 'a {
        self.units.iter().filter(move |u| u.side != unit.side && u.troop.count > 0)
    }

    pub fn is_free(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.width && cell.y < self.height && self.units.iter().all(|u| u.cell != cell)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleAction {
    Move { unit: u32, to: Cell },
    Attack { unit: u32, target: u32 },
    Shoot { unit: u32, target: u32 },
    Defend { unit: u32 },
}

pub trait TacticalPlanner: Send + Sync {
    fn battle_turn(&mut self, arena: &Arena, acting: u32) -> Vec<BattleAction>;
}

/// Shoot or strike the weakest enemy in reach, otherwise close in on the
/// nearest one.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrikeWeakest;

impl TacticalPlanner for StrikeWeakest {
    fn battle_turn(&mut self, arena: &Arena, acting: u32) -> Vec<BattleAction> {
        let Some(unit) = arena.unit(acting) else { return Vec::new() };
        let speed = unit.troop.monster.def().speed as u32;

        let weakest = arena
            .enemies_of(unit)
            .filter(|e| unit.ranged || unit.cell.distance(e.cell) <= speed + 1)
            .min_by(|a, b| a.troop.strength().total_cmp(&b.troop.strength()).then(a.id.cmp(&b.id)));
        if let Some(target) = weakest {
            if unit.ranged {
                return vec![BattleAction::Shoot { unit: acting, target: target.id }];
            }
            let mut actions = Vec::new();
            if unit.cell.distance(target.cell) > 1 {
                if let Some(cell) = approach(arena, unit.cell, target.cell, speed) {
                    actions.push(BattleAction::Move { unit: acting, to: cell });
                }
            }
            actions.push(BattleAction::Attack { unit: acting, target: target.id });
            return actions;
        }

        let nearest = arena.enemies_of(unit).min_by_key(|e| (unit.cell.distance(e.cell), e.id));
        match nearest.and_then(|e| approach(arena, unit.cell, e.cell, speed)) {
            Some(cell) => vec![BattleAction::Move { unit: acting, to: cell }],
            None => vec![BattleAction::Defend { unit: acting }],
        }
    }
}

/// Free cell within `speed` of `from` that ends closest to `toward`.
fn approach(arena: &Arena, from: Cell, toward: Cell, speed: u32) -> Option<Cell> {
    let reach = speed as i32;
    (-reach..=reach)
        .flat_map(|dx| (-reach..=reach).map(move |dy| Cell { x: from.x + dx, y: from.y + dy }))
        .filter(|&c| c != from && arena.is_free(c))
        .min_by_key(|&c| (c.distance(toward), c))
        .filter(|c| c.distance(toward) < from.distance(toward))
}

#[cfg(test)]
mod tests {
    use super::*;
    use conquest_engine::Monster;

    fn unit(id: u32, side: Side, monster: Monster, count: u32, x: i32, ranged: bool) -> BattleUnit {
        BattleUnit { id, side, troop: Troop::new(monster, count), cell: Cell { x, y: 0 }, ranged }
    }

    fn arena(units: Vec<BattleUnit>) -> Arena {
        Arena { width: 11, height: 9, units }
    }

    #[test]
    fn archers_shoot_the_weakest_enemy() {
        let field = arena(vec![
            unit(0, Side::Attacker, Monster::Archer, 10, 0, true),
            unit(1, Side::Defender, Monster::Swordsman, 5, 10, false),
            unit(2, Side::Defender, Monster::Peasant, 5, 9, false),
        ]);
        assert_eq!(StrikeWeakest.battle_turn(&field, 0), vec![BattleAction::Shoot { unit: 0, target: 2 }]);
    }

    #[test]
    fn melee_closes_in_when_nothing_is_in_reach() {
        let field = arena(vec![
            unit(0, Side::Attacker, Monster::Peasant, 10, 0, false),
            unit(1, Side::Defender, Monster::Peasant, 5, 10, false),
        ]);
        match StrikeWeakest.battle_turn(&field, 0).as_slice() {
            [BattleAction::Move { unit: 0, to }] => assert!(to.distance(Cell { x: 10, y: 0 }) < 10),
            other => panic!("unexpected actions {other:?}"),
        }
    }

    #[test]
    fn unknown_unit_does_nothing() {
        assert!(StrikeWeakest.battle_turn(&Arena::default(), 3).is_empty());
    }
}
