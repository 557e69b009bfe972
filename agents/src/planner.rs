// ═══════════════════════════════════════════════════════════════════════
// Planner — the strategic AI of one computer kingdom
//
// A kingdom turn scans the visible map, rates every region's safety,
// links threats to castles, then lets the scheduler move heroes until
// nobody has anything worth doing. Hero recruitment and weekly
// regrouping can restart that loop. Castles develop last, in danger
// order. All working state lives in the `TurnContext` and is rebuilt
// every turn.
// ═══════════════════════════════════════════════════════════════════════

use crate::agent::KingdomAi;
use crate::battle::{Arena, BattleAction, StrikeWeakest, TacticalPlanner};
use crate::budget::compute_budget;
use crate::cache::StrengthCache;
use crate::config::{ConfigError, PlannerConfig};
use crate::context::{TurnContext, DEFAULT_SPELL_LEVEL};
use crate::danger::{build_castle_list, find_castles_in_danger, update_priority_attack_target, update_priority_for_castle};
use crate::development::{castle_recruitment_value, castle_turn, reinforce_hero_in_castle};
use crate::host::WorldHost;
use crate::ledger::TaskKind;
use crate::region::evaluate_region_safety;
use crate::roles::set_hero_roles;
use crate::scan::scan_world;
use conquest_engine::economy::HERO_RECRUIT_COST;
use conquest_engine::engine::VIEW_ALL_SPELL_POINTS;
use conquest_engine::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::cmp::Reverse;
use tracing::{debug, info};

/// Days during which a kingdom with a single castle keeps a small court.
pub const EARLY_GAME_DAYS: u32 = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TurnSummary {
    pub moves: usize,
    pub recruited: usize,
    pub castles_in_danger: usize,
    /// Share of the day's heroes done moving, in percent, after each move.
    pub progress: Vec<u8>,
}

pub struct Planner {
    name: String,
    pub(crate) config: PlannerConfig,
    pub(crate) ctx: TurnContext,
    pub(crate) cache: StrengthCache,
    pub(crate) rng: ChaCha8Rng,
    tactics: Box<dyn TacticalPlanner>,
}

impl Planner {
    /// Fails when `config` holds values the planner cannot run with,
    /// however the config was built.
    pub fn new(name: &str, config: PlannerConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Ok(Planner {
            name: name.to_string(),
            config,
            ctx: TurnContext::new(Color::Blue, 0),
            cache: StrengthCache::default(),
            rng,
            tactics: Box::new(StrikeWeakest),
        })
    }

    pub fn with_tactics(mut self, tactics: Box<dyn TacticalPlanner>) -> Self {
        self.tactics = tactics;
        self
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Working state of the last turn played.
    pub fn context(&self) -> &TurnContext {
        &self.ctx
    }

    // ── Kingdom turn ───────────────────────────────────────────────────

    pub fn play_turn<W: WorldHost>(&mut self, world: &mut W, color: Color) -> Result<TurnSummary> {
        self.ctx = TurnContext::new(color, world.region_count());
        self.ctx.knobs = self.config.relaxations(false)[0];
        self.cache.clear();
        let mut summary = TurnSummary::default();

        let Some(kingdom) = world.kingdom(color) else { return Ok(summary) };
        if kingdom.lost {
            return Ok(summary);
        }
        let heroes = world.kingdom_heroes(color);
        info!(%color, day = world.day(), castles = kingdom.castles.len(), heroes = heroes.len(), "kingdom turn starts");
        for &id in &heroes {
            world.set_sleeper(id, false);
        }

        self.cast_view_all(world)?;
        scan_world(&*world, &mut self.ctx);
        self.evaluate_regions(&*world);
        compute_budget(&*world, &mut self.ctx);

        let mut castle_count;
        loop {
            let heroes = world.kingdom_heroes(color);
            for &id in &heroes {
                if let Some(position) = world.hero(id).map(|h| h.position) {
                    self.hero_action_complete(world, id, position, ObjectKind::None)?;
                }
            }

            set_hero_roles(world, color);

            find_castles_in_danger(&*world, &mut self.ctx, &self.config);
            for &id in &heroes {
                let Some(position) = world.hero(id).filter(|h| h.alive).map(|h| h.position) else { continue };
                let guarding = world.castle_at(position).is_some_and(|c| self.ctx.castles_in_danger.contains(&c.id));
                if guarding {
                    let kind = world.object_kind_under_hero(position);
                    self.hero_action_complete(world, id, position, kind)?;
                }
            }

            self.ctx.castles = build_castle_list(&*world, &self.ctx);
            castle_count = self.ctx.castles.len();

            let outcome = self.heroes_turn(world, &mut summary)?;

            if self.purchase_new_heroes(world, outcome.out_of_tasks)? {
                summary.recruited += 1;
                continue;
            }

            if outcome.out_of_tasks && world.is_last_day_of_week() {
                let mut added = false;
                for id in world.kingdom_castles(color) {
                    let Some(castle) = world.castle(id) else { continue };
                    if world.castle_guest(castle).is_none() && self.ctx.ledger.add_reinforce(castle.position) {
                        debug!(castle = id.0, "castle will gather nearby heroes for the new week");
                        added = true;
                    }
                }
                if added {
                    continue;
                }
            }
            break;
        }

        if world.kingdom_castles(color).len() != castle_count {
            self.evaluate_regions(&*world);
            find_castles_in_danger(&*world, &mut self.ctx, &self.config);
            self.ctx.castles = build_castle_list(&*world, &self.ctx);
        }

        for entry in self.ctx.castles.clone() {
            let region = world.region_of(entry.position);
            let spell_level = region.and_then(|r| self.ctx.region(r)).map_or(DEFAULT_SPELL_LEVEL, |r| r.spell_level);
            castle_turn(world, entry.id, entry.under_threat, entry.safety, spell_level)?;
        }

        for id in world.kingdom_heroes(color) {
            let in_own_castle = world
                .hero(id)
                .and_then(|h| world.castle_at(h.position))
                .is_some_and(|c| c.color == Some(color));
            if in_own_castle {
                world.move_slow_troops_to_garrison(id)?;
            }
        }

        summary.castles_in_danger = self.ctx.castles_in_danger.len();
        debug!(%color, moves = summary.moves, recruited = summary.recruited, "kingdom turn ends");
        Ok(summary)
    }

    fn evaluate_regions<W: WorldHost>(&mut self, world: &W) {
        let graph: Vec<Vec<RegionId>> = (0..world.region_count())
            .map(|i| world.region_neighbours(RegionId(i as u32)).to_vec())
            .collect();
        evaluate_region_safety(&mut self.ctx.regions, &graph, &self.config);
    }

    /// Reveal the whole map with the best caster, if anyone knows how.
    fn cast_view_all<W: WorldHost>(&mut self, world: &mut W) -> Result<()> {
        let caster = world
            .kingdom_heroes(self.ctx.color)
            .into_iter()
            .filter_map(|id| world.hero(id))
            .filter(|h| h.knows_view_all && h.has_spellbook && h.spell_points >= VIEW_ALL_SPELL_POINTS)
            .max_by_key(|h| (h.skills.level(Skill::Mysticism), Reverse(h.id)))
            .map(|h| h.id);
        if let Some(id) = caster {
            let uncovered = world.cast_view_all(id)?;
            debug!(hero = id.0, uncovered, "view-all cast");
            self.ctx.reveal_all = true;
        }
        Ok(())
    }

    // ── Host callbacks ─────────────────────────────────────────────────

    /// A tile came into view. Known objects and attack links follow it.
    pub fn reveal_fog<W: WorldHost>(&mut self, world: &W, position: Position) {
        if !world.object_kind(position).is_action_object() {
            return;
        }
        self.refresh_object(world, position);
        update_priority_attack_target(world, &mut self.ctx, &self.config, position);
    }

    /// A hero finished acting on `position`, which held `kind` before.
    pub fn hero_action_complete<W: WorldHost>(&mut self, world: &mut W, hero: HeroId, position: Position, kind: ObjectKind) -> Result<()> {
        if let Some(standing) = world.hero(hero).filter(|h| h.alive).map(|h| h.position) {
            let castle = world
                .castle_at(standing)
                .filter(|c| c.color == Some(self.ctx.color))
                .map(|c| c.id);
            match castle {
                Some(castle) => {
                    let safety = self.ctx.safety(world.region_of(standing));
                    reinforce_hero_in_castle(world, hero, castle, safety)?;
                }
                None => world.optimize_army(hero)?,
            }
        }

        self.cache.invalidate(position);
        self.update_priority_targets(world, hero, position, kind);
        self.refresh_object(&*world, position);
        Ok(())
    }

    /// Reorder troops before a fight.
    pub fn hero_pre_battle<W: WorldHost>(&mut self, world: &mut W, hero: HeroId) -> Result<()> {
        world.optimize_army(hero)
    }

    pub fn battle_turn(&mut self, arena: &Arena, acting: u32) -> Vec<BattleAction> {
        self.tactics.battle_turn(arena, acting)
    }

    pub(crate) fn refresh_object<W: WorldHost>(&mut self, world: &W, position: Position) {
        self.ctx.objects.set(position, world.object_kind(position));
    }

    fn update_priority_targets<W: WorldHost>(&mut self, world: &mut W, hero: HeroId, position: Position, kind: ObjectKind) {
        if !matches!(kind, ObjectKind::Castle | ObjectKind::Hero) {
            return;
        }
        if !self.ctx.ledger.is_priority(position) {
            // A fight can turn any tile into a threat
            self.update_tile(&*world, position, kind);
            if !self.ctx.ledger.is_priority(position) {
                return;
            }
        }

        match self.ctx.ledger.kind_at(position) {
            Some(TaskKind::Defend | TaskKind::Reinforce) => {
                let arrived = world.hero(hero).is_some_and(|h| h.alive && h.position == position);
                if !arrived {
                    self.update_tile(&*world, position, kind);
                    return;
                }
                debug!(hero = hero.0, castle = position.0, "hero stays in castle");
                world.set_sleeper(hero, true);
                self.ctx.ledger.complete_task(position);
            }
            Some(TaskKind::Attack) => {
                self.ctx.ledger.remove_attack(position);
                self.update_tile(&*world, position, kind);
            }
            None => {}
        }
    }

    fn update_tile<W: WorldHost>(&mut self, world: &W, position: Position, kind: ObjectKind) {
        let castle_tile = kind == ObjectKind::Castle || (world.hero_at(position).is_none() && world.castle_at(position).is_some());
        if castle_tile {
            match world.castle_at(position) {
                None => {
                    self.ctx.enemy_armies.remove(&position);
                }
                Some(castle) if world.is_friend(self.ctx.color, castle.color) => {
                    self.ctx.enemy_armies.remove(&position);
                    update_priority_for_castle(world, &mut self.ctx, &self.config, castle.id);
                }
                Some(_) => update_priority_attack_target(world, &mut self.ctx, &self.config, position),
            }
            return;
        }
        match world.hero_at(position) {
            None => {
                self.ctx.enemy_armies.remove(&position);
            }
            Some(other) if !world.is_friend(self.ctx.color, other.color) => {
                update_priority_attack_target(world, &mut self.ctx, &self.config, position);
            }
            Some(_) => {}
        }
    }

    // ── Hero recruitment ───────────────────────────────────────────────

    pub fn hero_limit<W: WorldHost>(&self, world: &W) -> usize {
        let castles = world.kingdom_castles(self.ctx.color).len();
        if world.day() < EARLY_GAME_DAYS && castles == 1 {
            self.config.early_hero_limit
        } else {
            (world.map_width() / self.config.map_width_per_hero) as usize + 2
        }
    }

    /// Hire a hero in the castle with the best army for sale. Returns
    /// whether a hero joined.
    pub fn purchase_new_heroes<W: WorldHost>(&mut self, world: &mut W, out_of_tasks: bool) -> Result<bool> {
        let color = self.ctx.color;
        let Some(kingdom) = world.kingdom(color) else { return Ok(false) };
        let early = world.day() < EARLY_GAME_DAYS && self.ctx.castles.len() == 1;
        let available = world
            .kingdom_heroes(color)
            .into_iter()
            .filter(|&id| world.hero(id).is_some_and(|h| h.patrol.is_none()))
            .count();
        if available >= self.hero_limit(&*world)
            || kingdom.heroes.len() >= MAX_HEROES_PER_KINGDOM
            || !kingdom.funds.covers(&Funds::gold(HERO_RECRUIT_COST))
        {
            return Ok(false);
        }

        let mut best: Option<(f64, CastleId)> = None;
        for entry in &self.ctx.castles {
            let Some(castle) = world.castle(entry.id) else { continue };
            if !castle.is_castle() || world.castle_guest(castle).is_some() {
                continue;
            }
            if available > 0 && self.ctx.castles_in_danger.contains(&castle.id) {
                continue;
            }
            let region = world.region_of(castle.position);
            let heroes_here = region.and_then(|r| self.ctx.region(r)).map_or(0, |r| r.friendly_heroes);
            if heroes_here > 1 {
                continue;
            }
            let island = region.map_or(true, |r| world.region_neighbours(r).is_empty());
            if heroes_here == 1 && (out_of_tasks || (self.ctx.castles.len() > 1 && island)) {
                continue;
            }
            let value = castle_recruitment_value(castle);
            if best.map_or(true, |(v, _)| value > v) {
                best = Some((value, castle.id));
            }
        }
        let Some((_, castle)) = best else { return Ok(false) };

        let Some(offer) = self.pick_recruit(&*world) else { return Ok(false) };
        let hero = world.recruit_hero(castle, offer)?;
        info!(hero = hero.0, castle = castle.0, %color, "hero hired");

        if early {
            world.optimize_army(hero)?;
        } else {
            let safety = world.castle(castle).map_or(0, |c| self.ctx.safety(world.region_of(c.position)));
            reinforce_hero_in_castle(world, hero, castle, safety)?;
        }
        if let Some(position) = world.hero(hero).map(|h| h.position) {
            self.refresh_object(&*world, position);
        }
        Ok(true)
    }

    /// Index of the better tavern offer, skipping the hero the human must defeat.
    fn pick_recruit<W: WorldHost>(&self, world: &W) -> Option<usize> {
        let protected = world.victory().human_victory_hero;
        world
            .kingdom(self.ctx.color)?
            .recruits
            .iter()
            .enumerate()
            .take(2)
            .filter(|&(_, &id)| Some(id) != protected)
            .filter_map(|(offer, &id)| world.hero(id).map(|h| (offer, h.recruit_value())))
            .fold(None, |best: Option<(usize, f64)>, (offer, value)| match best {
                Some((_, v)) if v >= value => best,
                _ => Some((offer, value)),
            })
            .map(|(offer, _)| offer)
    }
}

impl KingdomAi for Planner {
    fn name(&self) -> &str {
        &self.name
    }

    fn kingdom_turn(&mut self, world: &mut GameState, color: Color) -> Result<TurnSummary> {
        self.play_turn(world, color)
    }
}
