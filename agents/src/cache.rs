// ═══════════════════════════════════════════════════════════════════════
// Strength Cache — memoized monster strength per tile
//
// Monster stacks only change when someone fights them, so their
// strength is computed once and kept until a hero acts on the tile.
// The cache lives across scheduler passes and is cleared when the
// kingdom's turn starts.
// ═══════════════════════════════════════════════════════════════════════

use crate::host::WorldHost;
use conquest_engine::{ObjectKind, Position};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct StrengthCache {
    entries: HashMap<Position, f64>,
}

impl StrengthCache {
    pub fn get_or_insert_with(&mut self, position: Position, compute: impl FnOnce() -> f64) -> f64 {
        *self.entries.entry(position).or_insert_with(compute)
    }

    pub fn get(&self, position: Position) -> Option<f64> {
        self.entries.get(&position).copied()
    }

    pub fn invalidate(&mut self, position: Position) {
        self.entries.remove(&position);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Strength of whatever defends `position`. Monster tiles go through the cache.
pub fn target_army_strength<W: WorldHost>(world: &W, cache: &mut StrengthCache, position: Position, kind: ObjectKind) -> f64 {
    if kind == ObjectKind::Monster {
        return cache.get_or_insert_with(position, || world.tile_army_strength(position));
    }
    world.tile_army_strength(position)
}
