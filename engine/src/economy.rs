// ═══════════════════════════════════════════════════════════════════════
// Economy — funds, income and building costs
// ═══════════════════════════════════════════════════════════════════════

use crate::types::*;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Funds {
    pub wood: i32,
    pub mercury: i32,
    pub ore: i32,
    pub sulfur: i32,
    pub crystal: i32,
    pub gems: i32,
    pub gold: i32,
}

impl Funds {
    pub fn gold(amount: u32) -> Self {
        Funds { gold: amount as i32, ..Funds::default() }
    }

    pub fn of(resource: Resource, amount: u32) -> Self {
        let mut funds = Funds::default();
        *funds.get_mut(resource) = amount as i32;
        funds
    }

    pub fn starting() -> Self {
        Funds { wood: 20, mercury: 5, ore: 20, sulfur: 5, crystal: 5, gems: 5, gold: 7500 }
    }

    pub fn get(&self, resource: Resource) -> i32 {
        match resource {
            Resource::Wood => self.wood,
            Resource::Mercury => self.mercury,
            Resource::Ore => self.ore,
            Resource::Sulfur => self.sulfur,
            Resource::Crystal => self.crystal,
            Resource::Gems => self.gems,
            Resource::Gold => self.gold,
        }
    }

    pub fn get_mut(&mut self, resource: Resource) -> &mut i32 {
        match resource {
            Resource::Wood => &mut self.wood,
            Resource::Mercury => &mut self.mercury,
            Resource::Ore => &mut self.ore,
            Resource::Sulfur => &mut self.sulfur,
            Resource::Crystal => &mut self.crystal,
            Resource::Gems => &mut self.gems,
            Resource::Gold => &mut self.gold,
        }
    }

    /// Payment check: every resource is at least as large as in `cost`.
    pub fn covers(&self, cost: &Funds) -> bool {
        Resource::ALL.iter().all(|&r| self.get(r) >= cost.get(r))
    }

    /// Per-resource shortfall to pay `cost`.
    pub fn missing(&self, cost: &Funds) -> Funds {
        let mut result = Funds::default();
        for r in Resource::ALL {
            *result.get_mut(r) = (cost.get(r) - self.get(r)).max(0);
        }
        result
    }

    pub fn is_empty(&self) -> bool {
        Resource::ALL.iter().all(|&r| self.get(r) <= 0)
    }

    /// How many times `unit` fits into these funds.
    pub fn times(&self, unit: &Funds) -> u32 {
        Resource::ALL
            .iter()
            .filter(|&&r| unit.get(r) > 0)
            .map(|&r| (self.get(r).max(0) / unit.get(r)) as u32)
            .min()
            .unwrap_or(0)
    }
}

impl Add for Funds {
    type Output = Funds;
    fn add(mut self, rhs: Funds) -> Funds {
        self += rhs;
        self
    }
}

impl AddAssign for Funds {
    fn add_assign(&mut self, rhs: Funds) {
        for r in Resource::ALL {
            *self.get_mut(r) += rhs.get(r);
        }
    }
}

impl Sub for Funds {
    type Output = Funds;
    fn sub(mut self, rhs: Funds) -> Funds {
        self -= rhs;
        self
    }
}

impl SubAssign for Funds {
    fn sub_assign(&mut self, rhs: Funds) {
        for r in Resource::ALL {
            *self.get_mut(r) -= rhs.get(r);
        }
    }
}

impl Mul<u32> for Funds {
    type Output = Funds;
    fn mul(mut self, rhs: u32) -> Funds {
        for r in Resource::ALL {
            *self.get_mut(r) *= rhs as i32;
        }
        self
    }
}

// ── Costs ──────────────────────────────────────────────────────────────

pub const HERO_RECRUIT_COST: u32 = 2500;

pub fn building_cost(building: Building) -> Funds {
    let gold = |g: u32| Funds::gold(g);
    match building {
        Building::Well => gold(500),
        Building::Tavern => gold(500) + Funds::of(Resource::Wood, 5),
        Building::Statue => gold(1250) + Funds::of(Resource::Ore, 5),
        Building::Marketplace => gold(500) + Funds::of(Resource::Wood, 5),
        Building::Castle => gold(5000) + Funds::of(Resource::Wood, 20) + Funds::of(Resource::Ore, 20),
        Building::Dwelling1 => gold(200),
        Building::Dwelling2 => gold(1000) + Funds::of(Resource::Wood, 5),
        Building::Dwelling3 => gold(2000) + Funds::of(Resource::Ore, 5) + Funds::of(Resource::Wood, 5),
        Building::Dwelling4 => gold(3000) + Funds::of(Resource::Ore, 10) + Funds::of(Resource::Crystal, 2),
        Building::MageGuild1 => gold(2000) + Funds::of(Resource::Wood, 5) + Funds::of(Resource::Ore, 5),
        Building::MageGuild2 => gold(1000) + Funds::of(Resource::Mercury, 4) + Funds::of(Resource::Gems, 4),
        Building::MageGuild3 => gold(1000) + Funds::of(Resource::Sulfur, 6) + Funds::of(Resource::Crystal, 6),
        Building::LeftTurret | Building::RightTurret => gold(1500) + Funds::of(Resource::Ore, 5),
        Building::Moat => gold(750),
        Building::Captain => gold(500),
    }
}

/// Buildings that must exist before `building` can be bought.
pub fn building_requirements(building: Building) -> &'static [Building] {
    match building {
        Building::Dwelling2 | Building::Dwelling3 => &[Building::Dwelling1],
        Building::Dwelling4 => &[Building::Dwelling3],
        Building::MageGuild2 => &[Building::MageGuild1],
        Building::MageGuild3 => &[Building::MageGuild2],
        Building::LeftTurret | Building::RightTurret | Building::Moat => &[Building::Castle],
        _ => &[],
    }
}

pub fn mine_daily_income(resource: Resource) -> u32 {
    match resource {
        Resource::Gold => 1000,
        Resource::Wood | Resource::Ore => 2,
        _ => 1,
    }
}

pub fn castle_daily_income(castle: &Castle) -> Funds {
    let mut gold = if castle.is_castle() { 1000 } else { 250 };
    if castle.has(Building::Statue) {
        gold += 250;
    }
    Funds::gold(gold)
}

pub fn kingdom_daily_income(state: &GameState, color: Color) -> Funds {
    let mut income = Funds::default();
    if let Some(kingdom) = state.kingdom(color) {
        for castle in kingdom.castles.iter().filter_map(|&id| state.castle(id)) {
            income += castle_daily_income(castle);
        }
    }
    for tile in &state.map.tiles {
        if let MapObject::Mine { resource, owner: Some(owner) } = tile.object {
            if owner == color {
                income += Funds::of(resource, mine_daily_income(resource));
            }
        }
    }
    income
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_check_and_shortfall() {
        let funds = Funds::gold(1000) + Funds::of(Resource::Wood, 3);
        let cost = building_cost(Building::Tavern);
        assert!(!funds.covers(&cost));
        let missing = funds.missing(&cost);
        assert_eq!(missing.wood, 2);
        assert_eq!(missing.gold, 0);
    }

    #[test]
    fn times_counts_affordable_units() {
        let funds = Funds::gold(1000);
        assert_eq!(funds.times(&Funds::gold(300)), 3);
        assert_eq!(Funds::default().times(&Funds::gold(300)), 0);
    }
}
