// ═══════════════════════════════════════════════════════════════════════
// Hero Turn Scheduler — pick the best (hero, target) pair, move, repeat
//
// Every pass scores every idle hero against every known object under a
// sequence of pathfinder relaxations and moves the single best pair.
// When nothing scores at all, one hero that may be standing in a
// corridor steps aside. The loop ends when no hero can move or one full
// pass finds nothing to do.
// ═══════════════════════════════════════════════════════════════════════

use crate::cache::StrengthCache;
use crate::context::HeroToMove;
use crate::host::WorldHost;
use crate::planner::{Planner, TurnSummary};
use crate::table::lookup;
use crate::valuation::{discount, ThreatField, Valuation};
use conquest_engine::engine::MoveReport;
use conquest_engine::navigation::{path_cost, PathKnobs, Reachability, Step};
use conquest_engine::*;
use rand::seq::SliceRandom;
use tracing::{debug, trace, warn};

/// Movement it takes for new territory to become the main goal, in days.
pub fn fog_intensification_timeout(role: Role) -> u32 {
    match role {
        Role::Scout => 30,
        Role::Hunter => 90,
        Role::Fighter | Role::Champion => 60,
        Role::Courier => 120,
    }
}

/// Base value of uncovering fog before intensification.
pub fn fog_discovery_value(role: Role, base: f64) -> f64 {
    match role {
        Role::Scout => 0.0,
        Role::Courier => base * 2.0,
        _ => base,
    }
}

/// Push fog discovery up the longer the game runs when it leads into
/// new territory.
pub fn intensify_fog_value(value: f64, day: u32, period: u32) -> f64 {
    if value < 0.0 {
        if day > period {
            0.0
        } else {
            value / 2.0 * (period - day) as f64 / period as f64
        }
    } else {
        value + (1000.0 * day as f64 / period as f64).min(1000.0)
    }
}

/// Take the teleport only when it at least halves the walk, or when
/// there is no walk at all.
pub fn prefer_teleport(direct: u32, teleport: u32) -> bool {
    teleport != 0 && (direct == 0 || teleport * 2 <= direct)
}

/// Movement cost to `to` and whether it goes through a teleport.
pub fn distance_to<W: WorldHost>(world: &W, hero: &Hero, reach: &Reachability, knobs: PathKnobs, to: Position) -> (u32, bool) {
    let direct = reach.distance(to);
    if !hero.knows_dimension_door {
        return (direct, false);
    }
    let teleport = path_cost(&world.teleport_path(hero, to, knobs));
    if prefer_teleport(direct, teleport) {
        (teleport, true)
    } else {
        (direct, false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetChoice {
    pub hero: HeroId,
    pub position: Position,
    pub value: f64,
    pub distance: u32,
    pub teleport: bool,
}

/// Everything one hero's target search needs besides the world.
pub struct TargetSearch<'s> {
    pub hero: &'s Hero,
    pub reach: &'s Reachability,
    pub knobs: PathKnobs,
    pub field: &'s ThreatField,
    /// Courier hand-over target found before the search.
    pub main_target: Option<Position>,
}

/// Best target for one hero, or the fog-discovery tile when no object
/// scores higher.
pub fn priority_target<W: WorldHost>(valuation: &Valuation<W>, cache: &mut StrengthCache, search: &TargetSearch) -> Option<TargetChoice> {
    let world = valuation.world;
    let hero = search.hero;
    let lowest = -(SLOWEST_MOVE_PENALTY as f64) * world.map_size() as f64;
    let move_points = hero.move_points;
    let day = world.day();
    let penalty = valuation.penalty();
    let small = valuation.config.advantage.small;
    let strength = hero.army_strength();

    let adjust = |position: Position, value: f64, distance: u32, modifier: f64| {
        let own_castle_in_reach = world.castle_at(position).is_some_and(|c| c.color == hero.color) && distance <= move_points;
        let threat = if own_castle_in_reach { 0.0 } else { search.field.penalty_at(position, strength, small, penalty) };
        discount(value - threat, distance, move_points, modifier, day)
    };

    let mut best: Option<TargetChoice> = None;
    let mut best_value = lowest;
    if let Some(position) = search.main_target {
        let (distance, teleport) = distance_to(world, hero, search.reach, search.knobs, position);
        best = Some(TargetChoice { hero: hero.id, position, value: 0.0, distance, teleport });
        best_value = 0.0;
    }

    for object in valuation.ctx.objects.iter() {
        let (distance, teleport) = distance_to(world, hero, search.reach, search.knobs, object.position);
        if distance == 0 || !valuation.is_valid_target(cache, hero, object.position, distance) {
            continue;
        }
        if let Some(patrol) = hero.patrol {
            if world.approximate_distance(patrol.center, object.position) > patrol.radius {
                continue;
            }
        }

        let mut value = valuation.object_value(hero, object.position, lowest, distance);
        value -= valuation.region_threat_penalty(hero, object.position);
        let value = adjust(object.position, value, distance, lookup(object.kind).distance_modifier);
        trace!(hero = hero.id.0, position = object.position.0, kind = %object.kind, value, "object scored");

        if value > best_value {
            best_value = value;
            best = Some(TargetChoice { hero: hero.id, position: object.position, value, distance, teleport });
        }
    }

    let fog = world.fog_discovery_tile(hero, search.reach).filter(|(position, _)| match hero.patrol {
        Some(patrol) => world.approximate_distance(patrol.center, *position) <= patrol.radius,
        None => true,
    });
    let Some((fog_tile, expansion)) = fog else { return best };

    let (distance, teleport) = distance_to(world, hero, search.reach, search.knobs, fog_tile);
    let mut fog_value = fog_discovery_value(hero.role, valuation.config.fog_discovery_base);
    if expansion {
        fog_value = intensify_fog_value(fog_value, day, fog_intensification_timeout(hero.role));
    }
    fog_value -= valuation.region_threat_penalty(hero, fog_tile);
    let fog_value = adjust(fog_tile, fog_value, distance, 1.0);
    let fog_choice = TargetChoice { hero: hero.id, position: fog_tile, value: fog_value, distance, teleport };

    match best {
        Some(choice) if fog_value <= choice.value => Some(choice),
        _ => {
            trace!(hero = hero.id.0, position = fog_tile.0, value = fog_value, "scouting fog");
            Some(fog_choice)
        }
    }
}

// ── Hero collection ────────────────────────────────────────────────────

pub fn can_still_move(hero: &Hero) -> bool {
    hero.alive && !hero.sleeper && !hero.is_stationary_patrol() && hero.move_points >= FASTEST_MOVE_PENALTY
}

pub fn collect_idle_heroes<W: WorldHost>(world: &W, color: Color) -> Vec<HeroToMove> {
    world
        .kingdom_heroes(color)
        .into_iter()
        .filter_map(|id| world.hero(id))
        .filter(|h| can_still_move(h))
        .map(|h| HeroToMove {
            hero: h.id,
            patrol_center: h.patrol.map(|p| p.center),
            patrol_radius: h.patrol.map(|p| p.radius).unwrap_or(0),
        })
        .collect()
}

/// Result of one scheduler run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerOutcome {
    pub moves: usize,
    /// Heroes were left with movement but nothing worth doing.
    pub out_of_tasks: bool,
}

// ── Main loop ──────────────────────────────────────────────────────────

impl Planner {
    pub(crate) fn heroes_turn<W: WorldHost>(&mut self, world: &mut W, summary: &mut TurnSummary) -> Result<SchedulerOutcome> {
        let mut idle = collect_idle_heroes(world, self.ctx.color);
        let mut total = idle.len();
        let mut moves = 0;
        let baseline = self.ctx.knobs;

        while !idle.is_empty() {
            if moves >= self.config.max_moves_per_turn {
                warn!(color = %self.ctx.color, moves, "move cap reached, ending hero turn");
                break;
            }

            let choice = self.select_target(world, &idle);
            let moved_hero = match choice {
                Some(choice) => {
                    debug!(
                        hero = choice.hero.0,
                        target = choice.position.0,
                        value = choice.value,
                        distance = choice.distance,
                        teleport = choice.teleport,
                        "target selected"
                    );
                    self.execute_move(world, choice.hero, choice.position, choice.teleport)?
                }
                None => match self.relieve_deadlock(world, &idle)? {
                    Some(step) => step,
                    None => break,
                },
            };
            self.ctx.knobs = baseline;
            moves += 1;

            if let Some(released) = moved_hero.released {
                if world.hero(released).is_some_and(can_still_move) {
                    idle.push(HeroToMove { hero: released, patrol_center: None, patrol_radius: 0 });
                    total += 1;
                }
            }
            idle.retain(|h| {
                if h.hero == moved_hero.hero && !moved_hero.progressed {
                    debug!(hero = h.hero.0, "no progress, hero done for the turn");
                    return false;
                }
                world.hero(h.hero).is_some_and(can_still_move)
            });

            let done = total - idle.len();
            summary.progress.push((done * 100 / total.max(1)) as u8);
        }

        summary.moves += moves;
        Ok(SchedulerOutcome { moves, out_of_tasks: !idle.is_empty() })
    }

    /// Globally best pair under the first relaxation that yields any.
    pub(crate) fn select_target<W: WorldHost>(&mut self, world: &mut W, idle: &[HeroToMove]) -> Option<TargetChoice> {
        let losing = world.kingdom(self.ctx.color).is_some_and(|k| k.is_losing());
        let mut demoted = Vec::new();
        let mut best: Option<TargetChoice> = None;

        for knobs in self.config.relaxations(losing) {
            self.ctx.knobs = knobs;
            let world_ref: &W = world;
            let field = ThreatField::build(world_ref, &self.ctx, &self.config);
            let valuation = Valuation::new(world_ref, &self.ctx, &self.config);

            for entry in idle {
                let Some(original) = world_ref.hero(entry.hero) else { continue };
                let mut hero = original.clone();
                let reach = world_ref.reachability(&hero, knobs);

                let lowest = -(SLOWEST_MOVE_PENALTY as f64) * world_ref.map_size() as f64;
                let mut main_target = None;
                if hero.role == Role::Courier {
                    main_target = valuation.courier_main_target(&hero, |p| distance_to(world_ref, &hero, &reach, knobs, p).0, lowest);
                    if main_target.is_none() {
                        demoted.push(hero.id);
                        hero.role = Role::Hunter;
                    }
                }

                let search = TargetSearch { hero: &hero, reach: &reach, knobs, field: &field, main_target };
                let Some(choice) = priority_target(&valuation, &mut self.cache, &search) else { continue };
                if best.map_or(true, |b| choice.value > b.value) {
                    best = Some(choice);
                }
            }
            if best.is_some() {
                break;
            }
        }

        for id in demoted {
            debug!(hero = id.0, "courier has nothing to carry, hunting instead");
            world.set_hero_role(id, Role::Hunter);
        }
        best
    }

    /// Move one possibly-blocking hero out of the way.
    fn relieve_deadlock<W: WorldHost>(&mut self, world: &mut W, idle: &[HeroToMove]) -> Result<Option<MovedHero>> {
        let mut shuffled = idle.to_vec();
        shuffled.shuffle(&mut self.rng);
        for entry in shuffled {
            let Some(hero) = world.hero(entry.hero) else { continue };
            if world.castle_at(hero.position).is_some() || entry.patrol_center.is_some() {
                continue;
            }
            if !world.is_possibly_blocking(hero) {
                continue;
            }
            if let Some(tile) = world.nearest_open_tile(hero) {
                debug!(hero = entry.hero.0, tile = tile.0, "hero may be blocking the way, stepping aside");
                return self.execute_move(world, entry.hero, tile, false).map(Some);
            }
        }
        Ok(None)
    }

    fn execute_move<W: WorldHost>(&mut self, world: &mut W, id: HeroId, target: Position, teleport: bool) -> Result<MovedHero> {
        let hero = world.hero(id).ok_or(EngineError::HeroNotFound(id))?;
        let start = (hero.position, hero.move_points);
        let knobs = self.ctx.knobs;

        let walk = || world.reachability(hero, knobs).path_to(target);
        let mut path: Vec<Step> = if teleport { world.teleport_path(hero, target, knobs) } else { walk() };
        if path.is_empty() && teleport {
            path = walk();
        }
        if path.is_empty() {
            return Ok(MovedHero { hero: id, released: None, progressed: false });
        }

        let report = world.move_hero(id, &path)?;
        self.after_move(world, id, start.0, &report)?;

        let progressed = world
            .hero(id)
            .map_or(true, |h| !report.hero_alive || h.position != start.0 || h.move_points != start.1 || !report.actions.is_empty());
        Ok(MovedHero { hero: id, released: report.released_hero, progressed })
    }

    fn after_move<W: WorldHost>(&mut self, world: &mut W, id: HeroId, from: Position, report: &MoveReport) -> Result<()> {
        for &position in &report.revealed {
            self.reveal_fog(world, position);
        }
        for &(position, kind) in &report.actions {
            self.hero_action_complete(world, id, position, kind)?;
        }
        self.refresh_object(world, from);
        if let Some(hero) = world.hero(id).filter(|h| h.alive) {
            let position = hero.position;
            self.refresh_object(world, position);
        }
        if let Some(released) = report.released_hero.and_then(|r| world.hero(r)) {
            let position = released.position;
            self.refresh_object(world, position);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct MovedHero {
    hero: HeroId,
    released: Option<HeroId>,
    progressed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn teleport_needs_to_halve_the_walk() {
        assert!(prefer_teleport(0, 300));
        assert!(prefer_teleport(600, 300));
        assert!(!prefer_teleport(500, 300));
        assert!(!prefer_teleport(500, 0));
    }

    #[test]
    fn fog_value_by_role() {
        assert_eq!(fog_discovery_value(Role::Scout, -10000.0), 0.0);
        assert_eq!(fog_discovery_value(Role::Courier, -10000.0), -20000.0);
        assert_eq!(fog_discovery_value(Role::Fighter, -10000.0), -10000.0);
    }

    #[test]
    fn expansion_fog_intensifies_over_time() {
        // Negative values fade towards zero, then stop mattering
        assert_eq!(intensify_fog_value(-10000.0, 0, 30), -5000.0);
        assert_eq!(intensify_fog_value(-10000.0, 15, 30), -2500.0);
        assert_eq!(intensify_fog_value(-10000.0, 31, 30), 0.0);
        // Scouts reach full attention after a month
        assert_eq!(intensify_fog_value(0.0, 15, 30), 500.0);
        assert_eq!(intensify_fog_value(0.0, 90, 30), 1000.0);
    }

    #[test]
    fn stationary_patrol_and_sleepers_stay_put() {
        let mut hero = Hero::new(HeroId(0), "Ash", Some(Color::Blue), Position(0), Army::default());
        hero.move_points = BASE_MOVE_POINTS;
        assert!(can_still_move(&hero));
        hero.sleeper = true;
        assert!(!can_still_move(&hero));
        hero.sleeper = false;
        hero.patrol = Some(Patrol { center: Position(0), radius: 0 });
        assert!(!can_still_move(&hero));
        hero.patrol = None;
        hero.move_points = FASTEST_MOVE_PENALTY - 1;
        assert!(!can_still_move(&hero));
    }
}
