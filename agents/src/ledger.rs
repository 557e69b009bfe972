// ═══════════════════════════════════════════════════════════════════════
// Priority Ledger — strategic tasks keyed by map position
//
// An ATTACK task sits on an enemy army or castle and lists the friendly
// castles it threatens. A DEFEND task sits on a friendly castle and lists
// its attackers. Both sides always name each other; every mutator below
// updates them together and drops a linked task once its list empties.
// REINFORCE tasks stand alone and carry no links.
// ═══════════════════════════════════════════════════════════════════════

use conquest_engine::Position;
use std::collections::{BTreeMap, BTreeSet};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Attack,
    Defend,
    Reinforce,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriorityTask {
    pub kind: TaskKind,
    /// Largest margin by which a threat exceeds a defence.
    pub threat_level: f64,
    pub secondaries: BTreeSet<Position>,
}

impl PriorityTask {
    fn new(kind: TaskKind) -> Self {
        PriorityTask { kind, threat_level: 0.0, secondaries: BTreeSet::new() }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriorityLedger {
    tasks: BTreeMap<Position, PriorityTask>,
}

impl PriorityLedger {
    pub fn get(&self, position: Position) -> Option<&PriorityTask> {
        self.tasks.get(&position)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Position, &PriorityTask)> {
        self.tasks.iter()
    }

    /// Any task at all.
    pub fn is_priority(&self, position: Position) -> bool {
        self.tasks.contains_key(&position)
    }

    /// ATTACK or DEFEND.
    pub fn is_critical(&self, position: Position) -> bool {
        matches!(self.kind_at(position), Some(TaskKind::Attack | TaskKind::Defend))
    }

    pub fn kind_at(&self, position: Position) -> Option<TaskKind> {
        self.tasks.get(&position).map(|t| t.kind)
    }

    /// Castles threatened by an attacker (empty unless it holds an ATTACK task).
    pub fn threatened_by(&self, attacker: Position) -> impl Iterator<Item = Position> + '_ {
        self.tasks
            .get(&attacker)
            .filter(|t| t.kind == TaskKind::Attack)
            .into_iter()
            .flat_map(|t| t.secondaries.iter().copied())
    }

    /// Record that `attacker` endangers the castle at `castle` by `margin`.
    pub fn link_threat(&mut self, attacker: Position, castle: Position, margin: f64) {
        if attacker == castle {
            return;
        }
        // A stale task of another kind on either tile is superseded
        if self.kind_at(attacker).is_some_and(|k| k != TaskKind::Attack) {
            self.remove(attacker);
        }
        if self.kind_at(castle) == Some(TaskKind::Attack) {
            self.remove(castle);
        }

        let attack = self.tasks.entry(attacker).or_insert_with(|| PriorityTask::new(TaskKind::Attack));
        attack.threat_level = attack.threat_level.max(margin);
        attack.secondaries.insert(castle);

        let defend = self.tasks.entry(castle).or_insert_with(|| PriorityTask::new(TaskKind::Defend));
        defend.kind = TaskKind::Defend;
        defend.threat_level = defend.threat_level.max(margin);
        defend.secondaries.insert(attacker);
        trace!(attacker = attacker.0, castle = castle.0, margin, "threat linked");
    }

    /// Ask nearby heroes to gather in a castle. Returns false when the
    /// castle already has a task.
    pub fn add_reinforce(&mut self, castle: Position) -> bool {
        if self.tasks.contains_key(&castle) {
            return false;
        }
        self.tasks.insert(castle, PriorityTask::new(TaskKind::Reinforce));
        true
    }

    /// Drop an ATTACK task and detach it from every castle it threatened.
    pub fn remove_attack(&mut self, attacker: Position) {
        let Some(task) = self.tasks.remove(&attacker) else { return };
        if task.kind != TaskKind::Attack {
            self.tasks.insert(attacker, task);
            return;
        }
        for castle in task.secondaries {
            self.detach(castle, attacker, TaskKind::Defend);
        }
    }

    /// Drop a DEFEND or REINFORCE task and detach it from its attackers.
    pub fn complete_task(&mut self, castle: Position) {
        let Some(task) = self.tasks.remove(&castle) else { return };
        if task.kind == TaskKind::Attack {
            self.tasks.insert(castle, task);
            return;
        }
        for attacker in task.secondaries {
            self.detach(attacker, castle, TaskKind::Attack);
        }
    }

    /// Remove whatever task sits at `position`.
    pub fn remove(&mut self, position: Position) {
        match self.kind_at(position) {
            Some(TaskKind::Attack) => self.remove_attack(position),
            Some(_) => self.complete_task(position),
            None => {}
        }
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    fn detach(&mut self, owner: Position, link: Position, kind: TaskKind) {
        let Some(task) = self.tasks.get_mut(&owner) else { return };
        if task.kind != kind {
            return;
        }
        task.secondaries.remove(&link);
        if task.secondaries.is_empty() {
            self.tasks.remove(&owner);
        }
    }

    /// Verify the two-sided linking. Returns the first violation found.
    pub fn check_invariants(&self) -> Result<(), String> {
        for (&position, task) in &self.tasks {
            let expected_back = match task.kind {
                TaskKind::Reinforce => {
                    if !task.secondaries.is_empty() {
                        return Err(format!("reinforce task at {position} has links"));
                    }
                    continue;
                }
                TaskKind::Attack => TaskKind::Defend,
                TaskKind::Defend => TaskKind::Attack,
            };
            if task.secondaries.is_empty() {
                return Err(format!("{:?} task at {position} has no links", task.kind));
            }
            for other in &task.secondaries {
                match self.tasks.get(other) {
                    Some(back) if back.kind == expected_back && back.secondaries.contains(&position) => {}
                    _ => return Err(format!("{:?} task at {position} links {other} without a back-reference", task.kind)),
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENEMY: Position = Position(10);
    const OTHER_ENEMY: Position = Position(11);
    const CASTLE: Position = Position(50);
    const OTHER_CASTLE: Position = Position(60);

    #[test]
    fn link_creates_both_sides_with_max_margin() {
        let mut ledger = PriorityLedger::default();
        ledger.link_threat(ENEMY, CASTLE, 100.0);
        ledger.link_threat(OTHER_ENEMY, CASTLE, 300.0);
        ledger.link_threat(ENEMY, CASTLE, 50.0);

        let defend = ledger.get(CASTLE).unwrap();
        assert_eq!(defend.kind, TaskKind::Defend);
        assert_eq!(defend.threat_level, 300.0);
        assert_eq!(defend.secondaries.len(), 2);
        assert_eq!(ledger.get(ENEMY).unwrap().threat_level, 100.0);
        assert!(ledger.check_invariants().is_ok());
    }

    #[test]
    fn removing_attacker_cascades() {
        let mut ledger = PriorityLedger::default();
        ledger.link_threat(ENEMY, CASTLE, 1.0);
        ledger.link_threat(ENEMY, OTHER_CASTLE, 1.0);
        ledger.link_threat(OTHER_ENEMY, OTHER_CASTLE, 1.0);

        ledger.remove_attack(ENEMY);
        assert!(ledger.get(CASTLE).is_none());
        assert_eq!(ledger.get(OTHER_CASTLE).unwrap().secondaries.len(), 1);
        assert!(ledger.check_invariants().is_ok());
    }

    #[test]
    fn completing_defence_cascades() {
        let mut ledger = PriorityLedger::default();
        ledger.link_threat(ENEMY, CASTLE, 1.0);
        ledger.complete_task(CASTLE);
        assert!(ledger.is_empty());
    }

    #[test]
    fn reinforce_only_on_free_castles() {
        let mut ledger = PriorityLedger::default();
        ledger.link_threat(ENEMY, CASTLE, 1.0);
        assert!(!ledger.add_reinforce(CASTLE));
        assert!(ledger.add_reinforce(OTHER_CASTLE));
        assert!(ledger.is_priority(OTHER_CASTLE));
        assert!(!ledger.is_critical(OTHER_CASTLE));
        assert!(ledger.is_critical(ENEMY));

        // A threat arriving later upgrades the reinforce task
        ledger.link_threat(OTHER_ENEMY, OTHER_CASTLE, 2.0);
        assert_eq!(ledger.kind_at(OTHER_CASTLE), Some(TaskKind::Defend));
        assert!(ledger.check_invariants().is_ok());
    }

    #[test]
    fn wrong_kind_removals_are_ignored() {
        let mut ledger = PriorityLedger::default();
        ledger.link_threat(ENEMY, CASTLE, 1.0);
        ledger.remove_attack(CASTLE);
        ledger.complete_task(ENEMY);
        assert_eq!(ledger.len(), 2);
        assert!(ledger.check_invariants().is_ok());
    }
}
