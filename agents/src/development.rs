// ═══════════════════════════════════════════════════════════════════════
// Castle Development — what each castle builds and hires every turn
//
// A castle under threat hires everything it can afford and then spends
// on fortifications. A safe castle works through a fixed build order:
// a well, the income buildings, dwellings from the top tier down, the
// mage guild up to what the region's heroes can learn, and finally
// fortifications while the treasury is comfortably full.
//
// Orders are lists of (building, funds multiplier). A building is only
// bought while the kingdom holds `multiplier` times its cost, so cheap
// essentials go first and luxuries wait for a surplus.
// ═══════════════════════════════════════════════════════════════════════

use crate::host::WorldHost;
use conquest_engine::economy::building_cost;
use conquest_engine::{Army, Building, Castle, CastleId, Color, Funds, HeroId, Result, Role, Troop};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOrder {
    pub building: Building,
    pub multiplier: u32,
}

const fn order(building: Building, multiplier: u32) -> BuildOrder {
    BuildOrder { building, multiplier }
}

pub const INCOME_STRUCTURES: &[BuildOrder] = &[
    order(Building::Castle, 1),
    order(Building::Statue, 1),
    order(Building::Marketplace, 1),
];

pub const BUILD_ORDER: &[BuildOrder] = &[
    order(Building::Castle, 2),
    order(Building::Statue, 1),
    order(Building::Marketplace, 1),
    order(Building::Dwelling4, 1),
    order(Building::Dwelling3, 2),
    order(Building::Dwelling2, 3),
    order(Building::Dwelling1, 4),
    order(Building::MageGuild1, 2),
    order(Building::Tavern, 5),
    order(Building::MageGuild2, 3),
    order(Building::MageGuild3, 4),
];

pub const MAGE_GUILD_UPGRADES: &[BuildOrder] = &[order(Building::MageGuild2, 2), order(Building::MageGuild3, 2)];

pub const DEFENSIVE_STRUCTURES: &[BuildOrder] = &[
    order(Building::LeftTurret, 1),
    order(Building::RightTurret, 1),
    order(Building::Moat, 1),
    order(Building::Captain, 1),
];

pub const SUPPORTING_STRUCTURES: &[BuildOrder] = &[order(Building::MageGuild1, 1), order(Building::Tavern, 1)];

/// Multiplier on defensive orders while the castle is not threatened.
pub const PEACETIME_DEFENCE_MULTIPLIER: u32 = 10;

/// Day after which a castle without a well gets one before anything else.
pub const WELL_DAY: u32 = 6;

/// Region safety at or below which a guest leaves troops behind.
pub const GARRISON_SAFETY_LIMIT: i32 = 100;

/// Try `orders` in sequence; stop at the first purchase.
fn build_first<W: WorldHost>(world: &mut W, castle: CastleId, orders: &[BuildOrder], multiplier: u32) -> Result<bool> {
    for entry in orders {
        if world.build(castle, entry.building, entry.multiplier * multiplier)? {
            debug!(castle = castle.0, building = ?entry.building, "castle developed");
            return Ok(true);
        }
    }
    Ok(false)
}

/// One day of peacetime development for a castle.
pub fn castle_development<W: WorldHost>(world: &mut W, castle: CastleId, safety: i32, spell_level: u8) -> Result<bool> {
    let day = world.day();
    let Some(state) = world.castle(castle) else { return Ok(false) };
    let needs_well = state.is_castle() && !state.has(Building::Well);
    let guild_behind = state.mage_guild_level() < spell_level;

    if needs_well && day > WELL_DAY {
        return world.build(castle, Building::Well, 1);
    }
    if build_first(world, castle, INCOME_STRUCTURES, 1)? || build_first(world, castle, BUILD_ORDER, 1)? {
        return Ok(true);
    }
    if guild_behind && safety > 0 && build_first(world, castle, MAGE_GUILD_UPGRADES, 1)? {
        return Ok(true);
    }
    if build_first(world, castle, DEFENSIVE_STRUCTURES, PEACETIME_DEFENCE_MULTIPLIER)? {
        return Ok(true);
    }
    build_first(world, castle, SUPPORTING_STRUCTURES, PEACETIME_DEFENCE_MULTIPLIER)
}

/// Spend the castle's turn. A threatened castle hires first and fortifies
/// with whatever gold is left; a safe one develops and then hires.
pub fn castle_turn<W: WorldHost>(world: &mut W, castle: CastleId, defensive: bool, safety: i32, spell_level: u8) -> Result<()> {
    if defensive {
        let hired = world.recruit_in_castle(castle)?;
        let manned = world.castle(castle).is_some_and(|c| !c.garrison.is_empty());
        if manned {
            build_first(world, castle, DEFENSIVE_STRUCTURES, 1)?;
        }
        trace!(castle = castle.0, hired, "defensive castle turn");
        return Ok(());
    }
    castle_development(world, castle, safety, spell_level)?;
    world.recruit_in_castle(castle)?;
    Ok(())
}

// ── Castle worth ───────────────────────────────────────────────────────

/// Troops the kingdom could hire right now, highest tier first.
pub fn affordable_troops(castle: &Castle, funds: &Funds) -> Vec<Troop> {
    let mut available = castle.available.clone();
    available.sort_by(|a, b| b.monster.def().level.cmp(&a.monster.def().level));
    let mut funds = *funds;
    let mut hired = Vec::new();
    for troop in available {
        let unit = Funds::gold(troop.monster.def().gold_cost);
        let count = funds.times(&unit).min(troop.count);
        if count == 0 {
            continue;
        }
        funds -= unit * count;
        hired.push(Troop::new(troop.monster, count));
    }
    hired
}

/// Strength a hero would gain by collecting the garrison plus everything
/// the castle can hire.
pub fn castle_visit_value<W: WorldHost>(world: &W, castle: &Castle, hero: &Army, color: Color) -> f64 {
    let funds = world.kingdom(color).map(|k| k.funds).unwrap_or_default();
    let mut offered = castle.garrison.troops.clone();
    offered.extend(affordable_troops(castle, &funds));
    hero.reinforcement_value(&Army { troops: offered })
}

/// How much army a freshly hired hero could pick up here.
pub fn castle_recruitment_value(castle: &Castle) -> f64 {
    castle.garrison.strength() + castle.available.iter().map(Troop::strength).sum::<f64>()
}

/// Cost of the first build-order building this castle still lacks and
/// could start, if the kingdom cannot pay for it.
pub fn next_unaffordable_building(castle: &Castle, funds: &Funds) -> Option<(Building, Funds)> {
    BUILD_ORDER
        .iter()
        .map(|o| o.building)
        .filter(|&b| !castle.has(b))
        .filter(|&b| conquest_engine::economy::building_requirements(b).iter().all(|&r| castle.has(r)))
        .map(|b| (b, building_cost(b)))
        .find(|(_, cost)| !funds.covers(cost))
}

// ── Guest heroes ───────────────────────────────────────────────────────

/// Which of a guest's stacks should stay behind to hold the castle, and
/// whether only half of it.
pub fn troop_to_leave(army: &Army, role: Role) -> Option<(usize, bool)> {
    if army.troops.len() < 2 {
        return None;
    }
    let ratio = if role.is_fighter() { 20.0 } else { 10.0 };
    let share = army.strength() / ratio;

    let slowest = army.slowest_troop()?;
    if army.troops[slowest].strength() <= share {
        return Some((slowest, false));
    }
    if role.is_fighter() {
        return None;
    }
    let weakest = army.weakest_troop()?;
    (army.troops[weakest].strength() <= share).then_some((weakest, true))
}

/// Hand the castle's garrison and fresh recruits to its guest hero. In
/// an exposed castle a weak stack stays behind so the walls are manned.
pub fn reinforce_hero_in_castle<W: WorldHost>(world: &mut W, hero: HeroId, castle: CastleId, safety: i32) -> Result<()> {
    world.reinforce_hero_in_castle(hero)?;
    world.recruit_in_castle(castle)?;
    world.reinforce_hero_in_castle(hero)?;

    let leave = match (world.hero(hero), world.castle(castle)) {
        (Some(h), Some(c)) if c.is_castle() && safety <= GARRISON_SAFETY_LIMIT && c.garrison.is_empty() => {
            troop_to_leave(&h.army, h.role).map(|(index, half)| {
                let count = h.army.troops[index].count;
                (index, if half { count / 2 } else { count })
            })
        }
        _ => None,
    };
    if let Some((index, count)) = leave {
        trace!(hero = hero.0, castle = castle.0, count, "troop left in garrison");
        world.move_troop_to_garrison(hero, index, count)?;
    }
    world.optimize_army(hero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use conquest_engine::Monster;

    fn army(troops: &[(Monster, u32)]) -> Army {
        Army::new(troops.iter().map(|&(m, c)| Troop::new(m, c)).collect())
    }

    #[test]
    fn single_stack_never_stays_behind() {
        let solo = army(&[(Monster::Peasant, 10)]);
        assert_eq!(troop_to_leave(&solo, Role::Hunter), None);
    }

    #[test]
    fn weak_slow_stack_stays_behind() {
        let mixed = army(&[(Monster::Peasant, 1), (Monster::Cavalry, 20)]);
        let slowest = mixed.slowest_troop().unwrap();
        assert_eq!(troop_to_leave(&mixed, Role::Fighter), Some((slowest, false)));
    }

    #[test]
    fn fighters_keep_strong_stacks() {
        let even = army(&[(Monster::Peasant, 50), (Monster::Archer, 10)]);
        let slowest = even.slowest_troop().unwrap();
        assert!(even.troops[slowest].strength() > even.strength() / 20.0);
        assert_eq!(troop_to_leave(&even, Role::Fighter), None);
    }

    #[test]
    fn affordable_troops_respect_funds_and_tiers() {
        let castle = Castle {
            id: CastleId(0),
            name: "Keep".into(),
            color: None,
            position: conquest_engine::Position(0),
            buildings: Default::default(),
            garrison: Army::default(),
            available: vec![Troop::new(Monster::Peasant, 30), Troop::new(Monster::Cavalry, 10)],
            built_today: false,
        };
        let cavalry_cost = Monster::Cavalry.def().gold_cost;
        let hired = affordable_troops(&castle, &Funds::gold(cavalry_cost * 2));
        assert_eq!(hired, vec![Troop::new(Monster::Cavalry, 2)]);
    }

    #[test]
    fn build_order_lists_each_building_once() {
        let mut seen = std::collections::BTreeSet::new();
        assert!(BUILD_ORDER.iter().all(|o| seen.insert(o.building)));
    }
}
