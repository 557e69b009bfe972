// ═══════════════════════════════════════════════════════════════════════
// Turn Context — per-turn working state of one AI kingdom
//
// Everything here is rebuilt when a kingdom turn starts and dropped when
// it ends. Nothing in it survives into the next turn.
// ═══════════════════════════════════════════════════════════════════════

use crate::ledger::PriorityLedger;
use conquest_engine::navigation::PathKnobs;
use conquest_engine::{CastleId, Color, HeroId, ObjectKind, Position, RegionId, Resource};
use std::collections::{BTreeMap, BTreeSet};

// ── Regions ────────────────────────────────────────────────────────────

/// Default mage guild target for a region without wise heroes.
pub const DEFAULT_SPELL_LEVEL: u8 = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct RegionStats {
    pub friendly_castles: u32,
    pub enemy_castles: u32,
    pub friendly_heroes: u32,
    pub enemy_heroes: u32,
    /// Strongest single enemy army seen; -1 when none.
    pub highest_threat: f64,
    pub average_monster: f64,
    pub monster_count: u32,
    pub fog_count: u32,
    pub safety_factor: i32,
    pub spell_level: u8,
    pub evaluated: bool,
}

impl Default for RegionStats {
    fn default() -> Self {
        RegionStats {
            friendly_castles: 0,
            enemy_castles: 0,
            friendly_heroes: 0,
            enemy_heroes: 0,
            highest_threat: -1.0,
            average_monster: 0.0,
            monster_count: 0,
            fog_count: 0,
            safety_factor: 0,
            spell_level: DEFAULT_SPELL_LEVEL,
            evaluated: false,
        }
    }
}

impl RegionStats {
    pub fn add_monster(&mut self, strength: f64) {
        self.monster_count += 1;
        self.average_monster += (strength - self.average_monster) / self.monster_count as f64;
    }

    pub fn raise_threat(&mut self, strength: f64) {
        if strength > self.highest_threat {
            self.highest_threat = strength;
        }
    }
}

// ── Threats ────────────────────────────────────────────────────────────

/// An enemy hero or enemy castle garrison visible this turn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyArmy {
    pub position: Position,
    pub strength: f64,
    pub move_points: u32,
    pub color: Color,
    pub hero: Option<HeroId>,
}

// ── Known objects ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndexObject {
    pub position: Position,
    pub kind: ObjectKind,
}

/// Action objects the kingdom knows about, sorted by position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectIndex {
    objects: Vec<IndexObject>,
}

impl ObjectIndex {
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndexObject> {
        self.objects.iter()
    }

    pub fn kind_at(&self, position: Position) -> Option<ObjectKind> {
        self.objects
            .binary_search_by_key(&position, |o| o.position)
            .ok()
            .map(|i| self.objects[i].kind)
    }

    pub fn contains(&self, object: &IndexObject) -> bool {
        self.kind_at(object.position) == Some(object.kind)
    }

    /// Insert, replace or (for `ObjectKind::None`) drop the entry at `position`.
    pub fn set(&mut self, position: Position, kind: ObjectKind) {
        match self.objects.binary_search_by_key(&position, |o| o.position) {
            Ok(i) if kind.is_action_object() => self.objects[i].kind = kind,
            Ok(i) => {
                self.objects.remove(i);
            }
            Err(i) if kind.is_action_object() => self.objects.insert(i, IndexObject { position, kind }),
            Err(_) => {}
        }
    }

    pub fn clear(&mut self) {
        self.objects.clear();
    }
}

// ── Castles and heroes ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AICastle {
    pub id: CastleId,
    pub position: Position,
    pub under_threat: bool,
    pub safety: i32,
    pub build_value: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeroToMove {
    pub hero: HeroId,
    pub patrol_center: Option<Position>,
    pub patrol_radius: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetEntry {
    pub resource: Resource,
    pub missing: i32,
    pub priority: bool,
    pub recurring: bool,
}

impl BudgetEntry {
    pub fn new(resource: Resource) -> Self {
        BudgetEntry { resource, missing: 0, priority: false, recurring: false }
    }
}

// ── Turn context ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct TurnContext {
    pub color: Color,
    pub regions: Vec<RegionStats>,
    pub enemy_armies: BTreeMap<Position, EnemyArmy>,
    pub objects: ObjectIndex,
    pub ledger: PriorityLedger,
    pub castles: Vec<AICastle>,
    pub castles_in_danger: BTreeSet<CastleId>,
    pub budget: Vec<BudgetEntry>,
    /// The whole map was revealed by a spell this turn.
    pub reveal_all: bool,
    /// Pathfinder settings of the current scheduler pass.
    pub knobs: PathKnobs,
}

impl TurnContext {
    pub fn new(color: Color, region_count: usize) -> Self {
        TurnContext {
            color,
            regions: vec![RegionStats::default(); region_count],
            enemy_armies: BTreeMap::new(),
            objects: ObjectIndex::default(),
            ledger: PriorityLedger::default(),
            castles: Vec::new(),
            castles_in_danger: BTreeSet::new(),
            budget: Resource::ALL.iter().map(|&r| BudgetEntry::new(r)).collect(),
            reveal_all: false,
            knobs: PathKnobs::default(),
        }
    }

    pub fn region(&self, id: RegionId) -> Option<&RegionStats> {
        self.regions.get(id.index())
    }

    pub fn region_mut(&mut self, id: RegionId) -> Option<&mut RegionStats> {
        self.regions.get_mut(id.index())
    }

    pub fn safety(&self, id: Option<RegionId>) -> i32 {
        id.and_then(|r| self.region(r)).map(|r| r.safety_factor).unwrap_or(0)
    }

    pub fn budget_for(&self, resource: Resource) -> Option<&BudgetEntry> {
        self.budget.iter().find(|b| b.resource == resource)
    }

    pub fn castle_entry(&self, id: CastleId) -> Option<&AICastle> {
        self.castles.iter().find(|c| c.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_index_stays_sorted() {
        let mut index = ObjectIndex::default();
        index.set(Position(40), ObjectKind::Monster);
        index.set(Position(3), ObjectKind::Mine);
        index.set(Position(17), ObjectKind::Hero);
        let positions: Vec<u32> = index.iter().map(|o| o.position.0).collect();
        assert_eq!(positions, vec![3, 17, 40]);

        index.set(Position(17), ObjectKind::Castle);
        assert_eq!(index.kind_at(Position(17)), Some(ObjectKind::Castle));

        index.set(Position(3), ObjectKind::None);
        assert_eq!(index.len(), 2);
        assert_eq!(index.kind_at(Position(3)), None);
    }

    #[test]
    fn monster_average_is_running_mean() {
        let mut stats = RegionStats::default();
        stats.add_monster(10.0);
        stats.add_monster(30.0);
        assert!((stats.average_monster - 20.0).abs() < 1e-9);
        assert_eq!(stats.highest_threat, -1.0);
        stats.raise_threat(5.0);
        stats.raise_threat(2.0);
        assert_eq!(stats.highest_threat, 5.0);
    }
}
