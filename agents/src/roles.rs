// ═══════════════════════════════════════════════════════════════════════
// Hero Roles — split a kingdom's heroes into strategic archetypes
//
// With four or more free heroes the kingdom gets a champion (best
// stats), a courier (weakest army) and, if enough remain, a scout. The
// rest hunt, except armies more than three times the median strength,
// which become fighters.
// ═══════════════════════════════════════════════════════════════════════

use crate::host::WorldHost;
use conquest_engine::{Color, HeroId, Role};
use tracing::debug;

/// What role assignment needs to know about a hero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeroStanding {
    pub id: HeroId,
    pub strength: f64,
    pub stats: u32,
    pub on_patrol: bool,
}

pub const FIGHTER_MEDIAN_FACTOR: f64 = 3.0;

/// Pure role split. `pivotal` is the hero whose survival decides the game.
pub fn assign_roles(heroes: &[HeroStanding], pivotal: Option<HeroId>) -> Vec<(HeroId, Role)> {
    let mut roles = Vec::with_capacity(heroes.len());
    if heroes.len() == 1 {
        let role = if pivotal == Some(heroes[0].id) { Role::Champion } else { Role::Hunter };
        roles.push((heroes[0].id, role));
        return roles;
    }

    let mut free: Vec<HeroStanding> = Vec::new();
    for hero in heroes {
        if hero.on_patrol {
            roles.push((hero.id, Role::Fighter));
        } else {
            free.push(*hero);
        }
    }
    if free.is_empty() {
        return roles;
    }

    if free.len() > 3 {
        if pivotal.is_none() {
            let best = free
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.stats.cmp(&b.1.stats).then(b.0.cmp(&a.0)))
                .map(|(i, _)| i);
            if let Some(i) = best {
                roles.push((free.remove(i).id, Role::Champion));
            }
        }

        sort_strongest_first(&mut free);
        if let Some(courier) = free.pop() {
            roles.push((courier.id, Role::Courier));
        }
        if free.len() > 2 {
            if let Some(scout) = free.pop() {
                roles.push((scout.id, Role::Scout));
            }
        }
    }

    sort_strongest_first(&mut free);
    let median = free[free.len() / 2].strength;
    for hero in &free {
        let role = if pivotal == Some(hero.id) {
            Role::Champion
        } else if hero.strength > median * FIGHTER_MEDIAN_FACTOR {
            Role::Fighter
        } else {
            Role::Hunter
        };
        roles.push((hero.id, role));
    }
    roles
}

fn sort_strongest_first(heroes: &mut [HeroStanding]) {
    heroes.sort_by(|a, b| b.strength.total_cmp(&a.strength));
}

/// Assign and store roles for every living hero of `color`.
pub fn set_hero_roles<W: WorldHost>(world: &mut W, color: Color) {
    let standings: Vec<HeroStanding> = world
        .kingdom_heroes(color)
        .into_iter()
        .filter_map(|id| world.hero(id))
        .map(|h| HeroStanding { id: h.id, strength: h.army_strength(), stats: h.stats_value(), on_patrol: h.patrol.is_some() })
        .collect();
    let pivotal = world.victory().human_victory_hero;

    for (id, role) in assign_roles(&standings, pivotal) {
        let changed = world.hero(id).is_some_and(|h| h.role != role);
        if changed {
            debug!(hero = id.0, %role, "role assigned");
        }
        world.set_hero_role(id, role);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hero(id: u32, strength: f64, stats: u32) -> HeroStanding {
        HeroStanding { id: HeroId(id), strength, stats, on_patrol: false }
    }

    fn role_of(roles: &[(HeroId, Role)], id: u32) -> Role {
        roles.iter().find(|(h, _)| h.0 == id).map(|(_, r)| *r).unwrap()
    }

    #[test]
    fn single_hero_hunts_unless_pivotal() {
        assert_eq!(assign_roles(&[hero(0, 10.0, 4)], None), vec![(HeroId(0), Role::Hunter)]);
        assert_eq!(assign_roles(&[hero(0, 10.0, 4)], Some(HeroId(0))), vec![(HeroId(0), Role::Champion)]);
    }

    #[test]
    fn patrol_heroes_fight() {
        let mut patrol = hero(1, 5.0, 4);
        patrol.on_patrol = true;
        let roles = assign_roles(&[hero(0, 10.0, 4), patrol], None);
        assert_eq!(role_of(&roles, 1), Role::Fighter);
        assert_eq!(role_of(&roles, 0), Role::Hunter);
    }

    #[test]
    fn two_heroes_split_by_median() {
        // Median of [100, 20] sorted descending is element 1 = 20
        let roles = assign_roles(&[hero(0, 100.0, 4), hero(1, 20.0, 4)], None);
        assert_eq!(role_of(&roles, 0), Role::Fighter);
        assert_eq!(role_of(&roles, 1), Role::Hunter);
    }
}
