// ═══════════════════════════════════════════════════════════════════════
// Armies — troop stacks and combat-strength arithmetic
// ═══════════════════════════════════════════════════════════════════════

use crate::economy::Funds;
use crate::monsters::Monster;
use serde::{Deserialize, Serialize};

/// Number of stack slots in any army.
pub const ARMY_SLOTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Troop {
    pub monster: Monster,
    pub count: u32,
}

impl Troop {
    pub fn new(monster: Monster, count: u32) -> Self {
        Troop { monster, count }
    }

    pub fn strength(&self) -> f64 {
        self.monster.strength() * self.count as f64
    }

    pub fn hit_points(&self) -> u32 {
        self.monster.def().hit_points * self.count
    }

    pub fn cost(&self) -> Funds {
        Funds::gold(self.monster.def().gold_cost * self.count)
    }

    pub fn is_valid(&self) -> bool {
        self.count > 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Army {
    pub troops: Vec<Troop>,
}

impl Army {
    pub fn new(troops: Vec<Troop>) -> Self {
        let mut army = Army::default();
        for troop in troops {
            army.join(troop);
        }
        army
    }

    pub fn strength(&self) -> f64 {
        self.troops.iter().map(Troop::strength).sum()
    }

    pub fn total_hit_points(&self) -> u32 {
        self.troops.iter().map(Troop::hit_points).sum()
    }

    pub fn total_count(&self) -> u32 {
        self.troops.iter().map(|t| t.count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.troops.iter().all(|t| t.count == 0)
    }

    pub fn has_monster(&self, monster: Monster) -> bool {
        self.troops.iter().any(|t| t.monster == monster && t.count > 0)
    }

    /// Every slot is taken by a distinct monster: nothing new can join.
    pub fn is_full_and_all_unique(&self) -> bool {
        self.troops.len() >= ARMY_SLOTS
    }

    pub fn can_join(&self, monster: Monster) -> bool {
        self.has_monster(monster) || self.troops.len() < ARMY_SLOTS
    }

    pub fn all_undead(&self) -> bool {
        !self.troops.is_empty() && self.troops.iter().all(|t| t.monster.is_undead())
    }

    /// Merge a troop into a matching stack or a free slot.
    pub fn join(&mut self, troop: Troop) -> bool {
        if troop.count == 0 {
            return true;
        }
        if let Some(stack) = self.troops.iter_mut().find(|t| t.monster == troop.monster) {
            stack.count += troop.count;
            return true;
        }
        if self.troops.len() < ARMY_SLOTS {
            self.troops.push(troop);
            return true;
        }
        false
    }

    /// Strength `self` would gain by absorbing the best troops of `other`.
    pub fn reinforcement_value(&self, other: &Army) -> f64 {
        let mut merged = self.clone();
        let mut incoming = other.troops.clone();
        incoming.sort_by(|a, b| b.strength().total_cmp(&a.strength()));
        for troop in incoming {
            if !merged.join(troop) {
                // Swap out the weakest stack if the incoming one is stronger
                if let Some((idx, weakest)) = merged
                    .troops
                    .iter()
                    .enumerate()
                    .min_by(|a, b| a.1.strength().total_cmp(&b.1.strength()))
                {
                    if weakest.strength() < troop.strength() {
                        merged.troops[idx] = troop;
                    }
                }
            }
        }
        merged.strength() - self.strength()
    }

    /// Index of the slowest stack, weakest first among equals.
    pub fn slowest_troop(&self) -> Option<usize> {
        self.troops
            .iter()
            .enumerate()
            .filter(|(_, t)| t.count > 0)
            .min_by(|a, b| {
                a.1.monster
                    .def()
                    .speed
                    .cmp(&b.1.monster.def().speed)
                    .then(a.1.strength().total_cmp(&b.1.strength()))
            })
            .map(|(i, _)| i)
    }

    pub fn weakest_troop(&self) -> Option<usize> {
        self.troops
            .iter()
            .enumerate()
            .filter(|(_, t)| t.count > 0)
            .min_by(|a, b| a.1.strength().total_cmp(&b.1.strength()))
            .map(|(i, _)| i)
    }

    /// Strongest stacks first.
    pub fn sort_strongest_first(&mut self) {
        self.troops.sort_by(|a, b| b.strength().total_cmp(&a.strength()));
    }

    pub fn take(&mut self, index: usize) -> Option<Troop> {
        (index < self.troops.len()).then(|| self.troops.remove(index))
    }

    /// Remove a share of every stack after a battle.
    pub fn apply_losses(&mut self, ratio: f64) {
        let ratio = ratio.clamp(0.0, 1.0);
        for troop in &mut self.troops {
            let lost = (troop.count as f64 * ratio).ceil() as u32;
            troop.count = troop.count.saturating_sub(lost);
        }
        self.troops.retain(|t| t.count > 0);
    }
}

/// Outcome of an auto-resolved battle between two strengths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BattleOutcome {
    pub attacker_wins: bool,
    /// Share of the winner's troops lost.
    pub winner_losses: f64,
}

pub fn resolve_battle(attacker: f64, defender: f64) -> BattleOutcome {
    if attacker > defender {
        BattleOutcome { attacker_wins: true, winner_losses: loss_ratio(defender, attacker) }
    } else {
        BattleOutcome { attacker_wins: false, winner_losses: loss_ratio(attacker, defender) }
    }
}

fn loss_ratio(loser: f64, winner: f64) -> f64 {
    if winner <= 0.0 {
        return 0.0;
    }
    (loser / winner).powf(1.5) * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_merges_same_monster() {
        let mut army = Army::new(vec![Troop::new(Monster::Archer, 5)]);
        assert!(army.join(Troop::new(Monster::Archer, 3)));
        assert_eq!(army.troops.len(), 1);
        assert_eq!(army.total_count(), 8);
    }

    #[test]
    fn full_army_rejects_new_monster() {
        let mut army = Army::new(vec![
            Troop::new(Monster::Peasant, 1),
            Troop::new(Monster::Archer, 1),
            Troop::new(Monster::Pikeman, 1),
            Troop::new(Monster::Swordsman, 1),
            Troop::new(Monster::Cavalry, 1),
        ]);
        assert!(army.is_full_and_all_unique());
        assert!(!army.join(Troop::new(Monster::Dragon, 1)));
        assert!(army.join(Troop::new(Monster::Archer, 2)));
    }

    #[test]
    fn reinforcement_value_is_strength_gain() {
        let receiver = Army::new(vec![Troop::new(Monster::Paladin, 2)]);
        let giver = Army::new(vec![Troop::new(Monster::Archer, 10)]);
        let gain = receiver.reinforcement_value(&giver);
        assert!((gain - giver.strength()).abs() < 1e-9);
    }

    #[test]
    fn losses_remove_empty_stacks() {
        let mut army = Army::new(vec![Troop::new(Monster::Peasant, 1), Troop::new(Monster::Dragon, 4)]);
        army.apply_losses(0.5);
        assert_eq!(army.troops.len(), 1);
        assert_eq!(army.troops[0].count, 2);
    }

    #[test]
    fn stronger_attacker_wins() {
        let outcome = resolve_battle(100.0, 25.0);
        assert!(outcome.attacker_wins);
        assert!(outcome.winner_losses < 0.1);
        assert!(!resolve_battle(10.0, 10.0).attacker_wins);
    }
}
