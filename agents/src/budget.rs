// ═══════════════════════════════════════════════════════════════════════
// Budget — which resources the kingdom is short of, and what they are worth
//
// Each castle wants the next building of its build order. Whatever the
// treasury lacks for it is flagged as a priority, and a rare resource
// wanted by several castles at once is flagged as a recurring need.
// Valuation reads these flags to favour the mines and piles that close
// the gap.
// ═══════════════════════════════════════════════════════════════════════

use crate::context::TurnContext;
use crate::development::next_unaffordable_building;
use crate::host::WorldHost;
use conquest_engine::{Funds, Resource};
use std::collections::BTreeMap;
use tracing::debug;

pub const RECURRING_MODIFIER: f64 = 1.5;
pub const PRIORITY_MODIFIER: f64 = 2.0;

/// Castles that must share a rare shortfall before it counts as recurring.
pub const RECURRING_CASTLES: u32 = 2;

/// Worth of one unit of a resource picked up from a pile.
pub fn pile_priority(resource: Resource) -> f64 {
    match resource {
        Resource::Gold => 1.0,
        Resource::Wood | Resource::Ore => 125.0,
        _ => 250.0,
    }
}

/// Worth of one unit of daily mine income.
pub fn mine_priority(resource: Resource) -> f64 {
    match resource {
        Resource::Gold => 2.0,
        Resource::Wood | Resource::Ore => 1000.0,
        _ => 2000.0,
    }
}

/// Typical size of a pile, used before the pile is picked up.
pub fn pile_estimate(resource: Resource) -> u32 {
    match resource {
        Resource::Gold => 750,
        Resource::Wood | Resource::Ore => 7,
        _ => 4,
    }
}

/// Rebuild the budget from the current castles and treasury.
pub fn compute_budget<W: WorldHost>(world: &W, ctx: &mut TurnContext) {
    let funds = world.kingdom(ctx.color).map(|k| k.funds).unwrap_or_default();
    let mut wanted_by: BTreeMap<Resource, u32> = BTreeMap::new();

    for entry in &mut ctx.budget {
        entry.missing = 0;
        entry.priority = false;
        entry.recurring = false;
    }

    for id in world.kingdom_castles(ctx.color) {
        let Some(castle) = world.castle(id) else { continue };
        let Some((building, cost)) = next_unaffordable_building(castle, &funds) else { continue };
        let shortfall = funds.missing(&cost);
        for resource in Resource::ALL {
            let missing = shortfall.get(resource);
            if missing <= 0 {
                continue;
            }
            *wanted_by.entry(resource).or_default() += 1;
            if let Some(entry) = ctx.budget.iter_mut().find(|b| b.resource == resource) {
                entry.missing = entry.missing.max(missing);
                entry.priority = true;
            }
        }
        debug!(castle = id.0, ?building, "saving up");
    }

    for entry in &mut ctx.budget {
        let castles = wanted_by.get(&entry.resource).copied().unwrap_or(0);
        entry.recurring = entry.resource.is_rare() && castles >= RECURRING_CASTLES;
    }
}

fn budget_modifier(ctx: &TurnContext, resource: Resource) -> f64 {
    let mut modifier = 1.0;
    if let Some(entry) = ctx.budget_for(resource) {
        if entry.recurring {
            modifier *= RECURRING_MODIFIER;
        }
        if entry.priority {
            modifier *= PRIORITY_MODIFIER;
        }
    }
    modifier
}

/// Value of one unit of `resource`, from a mine or from a pile.
pub fn resource_priority(ctx: &TurnContext, resource: Resource, from_mine: bool) -> f64 {
    let base = if from_mine { mine_priority(resource) } else { pile_priority(resource) };
    base * budget_modifier(ctx, resource)
}

/// Pile value of a bundle of resources.
pub fn funds_value(ctx: &TurnContext, funds: &Funds) -> f64 {
    Resource::ALL
        .iter()
        .map(|&r| funds.get(r).max(0) as f64 * resource_priority(ctx, r, false))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use conquest_engine::Color;

    #[test]
    fn flags_compound() {
        let mut ctx = TurnContext::new(Color::Red, 1);
        assert_eq!(resource_priority(&ctx, Resource::Crystal, false), 250.0);

        for entry in ctx.budget.iter_mut().filter(|b| b.resource == Resource::Crystal) {
            entry.priority = true;
            entry.recurring = true;
        }
        assert_eq!(resource_priority(&ctx, Resource::Crystal, false), 250.0 * 1.5 * 2.0);
        assert_eq!(resource_priority(&ctx, Resource::Crystal, true), 2000.0 * 1.5 * 2.0);
        assert_eq!(resource_priority(&ctx, Resource::Gold, true), 2.0);
    }

    #[test]
    fn funds_value_ignores_debts() {
        let ctx = TurnContext::new(Color::Red, 1);
        let mut funds = Funds::gold(400) + Funds::of(Resource::Wood, 2);
        funds.ore = -5;
        assert_eq!(funds_value(&ctx, &funds), 400.0 + 250.0);
    }
}
