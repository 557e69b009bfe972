// ═══════════════════════════════════════════════════════════════════════
// Planner test suite — scenarios on small hand-made maps plus property
// tests over the ledger, region propagation and the strength cache
// ═══════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use crate::agent::KingdomAi;
    use crate::cache::StrengthCache;
    use crate::config::{ConfigError, PlannerConfig};
    use crate::context::{EnemyArmy, RegionStats, TurnContext};
    use crate::danger::castle_threat;
    use crate::host::WorldHost;
    use crate::ledger::{PriorityLedger, TaskKind};
    use crate::planner::Planner;
    use crate::region::{evaluate_region_safety, seed_factor, SAFETY_CONTESTED, SAFETY_ENEMY, SAFETY_OWN};
    use crate::roles::{assign_roles, HeroStanding};
    use crate::scan::scan_world;
    use crate::scheduler::collect_idle_heroes;
    use crate::table::CourierTier;
    use crate::valuation::{Valuation, GENERAL_CASTLE};
    use conquest_engine::engine::end_day;
    use conquest_engine::navigation::{PathKnobs, Traveller};
    use conquest_engine::setup::{create_scenario, ScenarioBuilder, ScenarioConfig};
    use conquest_engine::*;

    fn open_world(width: u32, height: u32) -> ScenarioBuilder {
        let mut b = ScenarioBuilder::new(width, height);
        b.kingdom(Color::Blue, Control::Ai).kingdom(Color::Red, Control::Ai).without_fog();
        b
    }

    fn scanned(state: &GameState, color: Color) -> TurnContext {
        let mut ctx = TurnContext::new(color, state.region_count());
        ctx.knobs = PlannerConfig::default().relaxations(false)[0];
        scan_world(state, &mut ctx);
        ctx
    }

    // ═════════════════════════════════════════════════════════════════════
    // HERO TURN
    // ═════════════════════════════════════════════════════════════════════

    #[test]
    fn test_hero_attacks_weaker_neutral_monster() {
        let mut b = open_world(16, 16);
        b.castle(Some(Color::Blue), 2, 2, Vec::new());
        let hero = b.hero(Color::Blue, 4, 4, vec![Troop::new(Monster::Swordsman, 20)]);
        b.object(8, 4, MapObject::Monster(Troop::new(Monster::Goblin, 3)));
        let mut state = b.build();
        let monster = state.map.position(8, 4);

        let config = PlannerConfig::default();
        let ctx = scanned(&state, Color::Blue);
        let h = state.hero(hero).unwrap();
        let reach = state.reachability(h, ctx.knobs);
        let distance = reach.distance(monster);
        assert!(distance > 0);
        let valuation = Valuation::new(&state, &ctx, &config);
        let mut cache = StrengthCache::default();
        assert!(valuation.is_valid_target(&mut cache, h, monster, distance));
        assert!(valuation.object_value(h, monster, -1.0e6, distance) >= 0.0);

        let mut planner = Planner::new("planner", config).unwrap();
        let summary = planner.play_turn(&mut state, Color::Blue).unwrap();
        assert!(summary.moves > 0);
        assert!(!matches!(state.map.tile(monster).unwrap().object, MapObject::Monster(_)));
        assert!(state.hero(hero).unwrap().alive);
    }

    #[test]
    fn test_courier_without_target_hunts() {
        let mut b = open_world(16, 16);
        b.castle(Some(Color::Blue), 2, 2, Vec::new());
        let hero = b.hero(Color::Blue, 8, 8, vec![Troop::new(Monster::Peasant, 10)]);
        let mut state = b.build();
        state.set_hero_role(hero, Role::Courier);

        let mut planner = Planner::new("planner", PlannerConfig::default()).unwrap();
        planner.ctx = scanned(&state, Color::Blue);
        let idle = collect_idle_heroes(&state, Color::Blue);
        planner.select_target(&mut state, &idle);

        assert_eq!(state.hero(hero).unwrap().role, Role::Hunter);
    }

    #[test]
    fn test_hero_in_castle_in_danger_stays() {
        let mut b = open_world(20, 6);
        let castle = b.castle(Some(Color::Blue), 2, 2, Vec::new());
        let guard = b.hero(Color::Blue, 2, 2, vec![Troop::new(Monster::Peasant, 5)]);
        b.hero(Color::Red, 8, 2, vec![Troop::new(Monster::Dragon, 5)]);
        b.object(5, 4, MapObject::TreasureChest { gold: 1000 });
        let mut state = b.build();

        let mut planner = Planner::new("planner", PlannerConfig::default()).unwrap();
        planner.play_turn(&mut state, Color::Blue).unwrap();

        let h = state.hero(guard).unwrap();
        assert_eq!(h.position, state.castle(castle).unwrap().position);
        assert!(h.sleeper);
    }

    #[test]
    fn test_lost_kingdom_does_nothing() {
        let mut b = open_world(10, 10);
        let hero = b.hero(Color::Blue, 2, 2, vec![Troop::new(Monster::Peasant, 5)]);
        b.object(5, 5, MapObject::TreasureChest { gold: 1000 });
        let mut state = b.build();
        state.kingdom_mut(Color::Blue).unwrap().lost = true;
        let start = state.hero(hero).unwrap().position;

        let summary = Planner::new("planner", PlannerConfig::default()).unwrap().play_turn(&mut state, Color::Blue).unwrap();
        assert_eq!(summary.moves, 0);
        assert_eq!(state.hero(hero).unwrap().position, start);
    }

    #[test]
    fn test_hero_recruited_in_empty_castle() {
        let mut b = open_world(16, 16);
        b.castle(Some(Color::Blue), 2, 2, Vec::new());
        b.recruits(Color::Blue, 2);
        let mut state = b.build();
        assert!(state.kingdom_heroes(Color::Blue).is_empty());

        let mut planner = Planner::new("planner", PlannerConfig::default()).unwrap();
        let summary = planner.play_turn(&mut state, Color::Blue).unwrap();
        assert!(summary.recruited >= 1);
        assert!(!state.kingdom_heroes(Color::Blue).is_empty());
    }

    #[test]
    fn test_seeded_self_play_terminates() {
        let mut state = create_scenario(&ScenarioConfig::default(), 7).unwrap();
        let mut blue = Planner::new("blue", PlannerConfig { seed: 1, ..PlannerConfig::default() }).unwrap();
        let mut red = Planner::new("red", PlannerConfig { seed: 2, ..PlannerConfig::default() }).unwrap();
        for _ in 0..10 {
            let b = blue.kingdom_turn(&mut state, Color::Blue).unwrap();
            let r = red.kingdom_turn(&mut state, Color::Red).unwrap();
            assert!(b.moves <= PlannerConfig::default().max_moves_per_turn * 8);
            assert!(r.progress.iter().all(|&p| p <= 100));
            end_day(&mut state);
        }
        assert_eq!(state.day, 11);
    }

    #[test]
    fn test_battle_hooks_delegate() {
        use crate::battle::{Arena, BattleAction, BattleUnit, Cell, Side, TacticalPlanner};

        struct AlwaysDefend;
        impl TacticalPlanner for AlwaysDefend {
            fn battle_turn(&mut self, _arena: &Arena, acting: u32) -> Vec<BattleAction> {
                vec![BattleAction::Defend { unit: acting }]
            }
        }

        let arena = Arena {
            width: 11,
            height: 9,
            units: vec![BattleUnit {
                id: 4,
                side: Side::Attacker,
                troop: Troop::new(Monster::Pikeman, 3),
                cell: Cell { x: 0, y: 4 },
                ranged: false,
            }],
        };
        let mut planner = Planner::new("planner", PlannerConfig::default()).unwrap().with_tactics(Box::new(AlwaysDefend));
        assert_eq!(planner.battle_turn(&arena, 4), vec![BattleAction::Defend { unit: 4 }]);

        let mut b = open_world(8, 8);
        let hero = b.hero(Color::Blue, 2, 2, vec![Troop::new(Monster::Peasant, 5), Troop::new(Monster::Swordsman, 2)]);
        let mut state = b.build();
        planner.hero_pre_battle(&mut state, hero).unwrap();
        let army = &state.hero(hero).unwrap().army;
        assert!(army.troops[0].strength() >= army.troops[1].strength());
    }

    // ═════════════════════════════════════════════════════════════════════
    // DANGER
    // ═════════════════════════════════════════════════════════════════════

    #[test]
    fn test_threat_counts_until_the_third_day() {
        let mut b = open_world(20, 1);
        let castle = b.castle(Some(Color::Blue), 12, 0, vec![Troop::new(Monster::Pikeman, 10)]);
        let state = b.build();
        let castle = state.castle(castle).unwrap();
        let origin = state.map.position(2, 0);
        let config = PlannerConfig::default();
        assert_eq!(config.max_days_to_reach, 3);

        let traveller = Traveller {
            origin,
            viewer: Some(Color::Blue),
            color: Some(Color::Red),
            strength: 1000.0,
            ignore_heroes_of: Some(Color::Blue),
        };
        let distance = state.distance_for_army(&traveller, castle.position, config.enemy_knobs());
        assert!(distance > 12 && distance < config.threat_distance_limit);

        // Decayed to a quarter by the third day, still above the garrison
        let defence = state.garrison_strength(castle);
        let strength = 4.0 * (defence + 0.01);
        let army = |move_points: u32| EnemyArmy { position: origin, strength, move_points, color: Color::Red, hero: None };

        let two_days = distance.div_ceil(2);
        let three_days = distance.div_ceil(3);
        let four_days = distance.div_ceil(4);
        assert_eq!(distance.div_ceil(two_days), 2);
        assert_eq!(distance.div_ceil(three_days), 3);
        assert_eq!(distance.div_ceil(four_days), 4);

        let on_second_day = castle_threat(&state, &config, castle, &army(two_days)).unwrap();
        let on_third_day = castle_threat(&state, &config, castle, &army(three_days)).unwrap();
        assert!((on_second_day - (strength / 2.0 - defence)).abs() < 1e-6);
        assert!((on_third_day - (strength / 4.0 - defence)).abs() < 1e-6);
        assert!(castle_threat(&state, &config, castle, &army(four_days)).is_none());
    }

    // ═════════════════════════════════════════════════════════════════════
    // VALUATION
    // ═════════════════════════════════════════════════════════════════════

    fn spellcaster(state: &mut GameState, hero: HeroId, power: u32, knowledge: u32, spell_points: u32) {
        let h = state.hero_mut(hero).unwrap();
        h.power = power;
        h.knowledge = knowledge;
        h.spell_points = spell_points;
        h.has_spellbook = true;
    }

    #[test]
    fn test_artesian_spring_full_at_half_its_refill() {
        let mut b = open_world(12, 12);
        b.castle(Some(Color::Blue), 2, 2, Vec::new());
        let hero = b.hero(Color::Blue, 5, 5, vec![Troop::new(Monster::Swordsman, 10)]);
        b.object(7, 5, MapObject::ArtesianSpring);
        let mut state = b.build();
        let spring = state.map.position(7, 5);
        let config = PlannerConfig::default();

        // Max 40: the spring refills to 80 but is already worth skipping at 20
        spellcaster(&mut state, hero, 4, 4, 25);
        let ctx = scanned(&state, Color::Blue);
        let valuation = Valuation::new(&state, &ctx, &config);
        let h = state.hero(hero).unwrap();
        assert_eq!(valuation.general_value(h, spring, -1.0, 200), -config.dangerous_task_penalty);

        spellcaster(&mut state, hero, 4, 4, 19);
        let valuation = Valuation::new(&state, &ctx, &config);
        let h = state.hero(hero).unwrap();
        assert_eq!(valuation.general_value(h, spring, -1.0, 200), 1500.0);
    }

    #[test]
    fn test_courier_skips_well_it_cannot_use() {
        let mut b = open_world(12, 12);
        b.castle(Some(Color::Blue), 2, 2, Vec::new());
        let hero = b.hero(Color::Blue, 5, 5, vec![Troop::new(Monster::Peasant, 10)]);
        b.object(7, 5, MapObject::MagicWell);
        let mut state = b.build();
        state.set_hero_role(hero, Role::Courier);
        let well = state.map.position(7, 5);
        let config = PlannerConfig::default();
        let ctx = scanned(&state, Color::Blue);

        spellcaster(&mut state, hero, 1, 1, 0);
        let valuation = Valuation::new(&state, &ctx, &config);
        assert_eq!(valuation.courier_value(state.hero(hero).unwrap(), well, -1.0, 200), 0.0);

        spellcaster(&mut state, hero, 4, 4, 40);
        let valuation = Valuation::new(&state, &ctx, &config);
        assert_eq!(valuation.courier_value(state.hero(hero).unwrap(), well, -1.0, 200), -config.dangerous_task_penalty);

        spellcaster(&mut state, hero, 4, 4, 0);
        let valuation = Valuation::new(&state, &ctx, &config);
        assert_eq!(valuation.courier_value(state.hero(hero).unwrap(), well, -1.0, 200), CourierTier::FiveTiles.value());

        state.hero_mut(hero).unwrap().has_spellbook = false;
        let valuation = Valuation::new(&state, &ctx, &config);
        assert_eq!(valuation.courier_value(state.hero(hero).unwrap(), well, -1.0, 200), -config.dangerous_task_penalty);
    }

    #[test]
    fn test_own_castle_weighs_more() {
        let mut b = open_world(12, 12);
        let castle = b.castle(Some(Color::Blue), 2, 2, Vec::new());
        let hero = b.hero(Color::Blue, 5, 5, vec![Troop::new(Monster::Swordsman, 10)]);
        let state = b.build();
        let config = PlannerConfig::default();
        let ctx = scanned(&state, Color::Blue);
        let valuation = Valuation::new(&state, &ctx, &config);

        let castle = state.castle(castle).unwrap();
        let plain = castle.building_value() as f64 * GENERAL_CASTLE.per_building + GENERAL_CASTLE.base;
        let value = valuation.castle_value(state.hero(hero).unwrap(), castle, GENERAL_CASTLE);
        assert!((value - plain * 1.25).abs() < 1e-9);
    }

    #[test]
    fn test_planner_refuses_unusable_config() {
        let config = PlannerConfig { island_multiplier_den: 0, ..PlannerConfig::default() };
        assert!(matches!(Planner::new("planner", config), Err(ConfigError::Invalid(_))));
        let config = PlannerConfig { map_width_per_hero: 0, ..PlannerConfig::default() };
        assert!(Planner::new("planner", config).is_err());
    }

    // ═════════════════════════════════════════════════════════════════════
    // ROLES AND REGIONS
    // ═════════════════════════════════════════════════════════════════════

    #[test]
    fn test_large_court_gets_courier_and_scout() {
        let standing = |id: u32, strength: f64, stats: u32| HeroStanding { id: HeroId(id), strength, stats, on_patrol: false };
        let heroes = [
            standing(0, 300.0, 20),
            standing(1, 1000.0, 4),
            standing(2, 200.0, 4),
            standing(3, 100.0, 4),
            standing(4, 50.0, 4),
            standing(5, 10.0, 4),
        ];
        let roles = assign_roles(&heroes, None);
        let role = |id: u32| roles.iter().find(|(h, _)| h.0 == id).map(|(_, r)| *r).unwrap();
        assert_eq!(roles.len(), 6);
        assert_eq!(role(0), Role::Champion);
        assert_eq!(role(5), Role::Courier);
        assert_eq!(role(4), Role::Scout);
        // Median of [1000, 200, 100] is 200
        assert_eq!(role(1), Role::Fighter);
        assert_eq!(role(2), Role::Hunter);
        assert_eq!(role(3), Role::Hunter);
    }

    #[test]
    fn test_region_seeds() {
        let stats = |friendly: u32, enemy: u32, threat: f64| RegionStats {
            friendly_castles: friendly,
            enemy_castles: enemy,
            highest_threat: threat,
            ..RegionStats::default()
        };
        assert_eq!(seed_factor(&stats(1, 0, -1.0)), Some(SAFETY_OWN));
        assert_eq!(seed_factor(&stats(0, 1, 500.0)), Some(SAFETY_ENEMY));
        assert_eq!(seed_factor(&stats(1, 1, -1.0)), Some(SAFETY_CONTESTED));
        assert_eq!(seed_factor(&stats(0, 0, 500.0)), Some(SAFETY_CONTESTED));
        assert_eq!(seed_factor(&stats(0, 0, -1.0)), None);
    }

    // ═════════════════════════════════════════════════════════════════════
    // PROPERTY TESTS
    // ═════════════════════════════════════════════════════════════════════

    mod props {
        use super::*;
        use proptest::prelude::*;
        use std::collections::BTreeSet;

        #[derive(Debug, Clone)]
        enum LedgerOp {
            Link(u32, u32, f64),
            RemoveAttack(u32),
            Complete(u32),
            Reinforce(u32),
        }

        fn ledger_op() -> impl Strategy<Value = LedgerOp> {
            // Attackers live on 100.., castles on 0..10 so the two never collide
            prop_oneof![
                (100u32..110, 0u32..10, 0.1f64..500.0).prop_map(|(a, c, m)| LedgerOp::Link(a, c, m)),
                (100u32..110).prop_map(LedgerOp::RemoveAttack),
                (0u32..10).prop_map(LedgerOp::Complete),
                (0u32..10).prop_map(LedgerOp::Reinforce),
            ]
        }

        fn region_graph() -> impl Strategy<Value = (Vec<RegionStats>, Vec<Vec<RegionId>>)> {
            (2usize..12).prop_flat_map(|n| {
                let seeds = prop::collection::vec((0u32..2, 0u32..2, prop::bool::ANY), n);
                let edges = prop::collection::vec((0..n, 0..n), 0..n * 2);
                (seeds, edges).prop_map(move |(seeds, edges)| {
                    let stats = seeds
                        .into_iter()
                        .map(|(f, e, threat)| RegionStats {
                            friendly_castles: f,
                            enemy_castles: e,
                            highest_threat: if threat { 300.0 } else { -1.0 },
                            ..RegionStats::default()
                        })
                        .collect();
                    let mut graph = vec![BTreeSet::new(); n];
                    for (a, b) in edges {
                        if a != b {
                            graph[a].insert(RegionId(b as u32));
                            graph[b].insert(RegionId(a as u32));
                        }
                    }
                    (stats, graph.into_iter().map(|s| s.into_iter().collect()).collect())
                })
            })
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn ledger_stays_linked(ops in prop::collection::vec(ledger_op(), 0..40)) {
                let mut ledger = PriorityLedger::default();
                for op in ops {
                    match op {
                        LedgerOp::Link(a, c, m) => ledger.link_threat(Position(a), Position(c), m),
                        LedgerOp::RemoveAttack(a) => ledger.remove_attack(Position(a)),
                        LedgerOp::Complete(c) => ledger.complete_task(Position(c)),
                        LedgerOp::Reinforce(c) => { ledger.add_reinforce(Position(c)); }
                    }
                    prop_assert!(ledger.check_invariants().is_ok(), "{:?}", ledger.check_invariants());
                }
            }

            #[test]
            fn resolving_every_attack_empties_ledger(links in prop::collection::vec((100u32..110, 0u32..10, 0.1f64..500.0), 1..30)) {
                let mut ledger = PriorityLedger::default();
                for &(a, c, m) in &links {
                    ledger.link_threat(Position(a), Position(c), m);
                }
                for (_, task) in ledger.iter() {
                    prop_assert!(!task.secondaries.is_empty());
                }
                let attackers: Vec<Position> = ledger
                    .iter()
                    .filter(|(_, t)| t.kind == TaskKind::Attack)
                    .map(|(p, _)| *p)
                    .collect();
                for attacker in attackers {
                    ledger.remove_attack(attacker);
                }
                prop_assert!(ledger.is_empty());
            }

            #[test]
            fn propagation_visits_each_region_once((mut stats, graph) in region_graph()) {
                let order = evaluate_region_safety(&mut stats, &graph, &PlannerConfig::default());
                let unique: BTreeSet<RegionId> = order.iter().copied().collect();
                prop_assert_eq!(unique.len(), order.len());
                prop_assert!(order.len() <= stats.len());
                for (i, region) in stats.iter().enumerate() {
                    if seed_factor(region).is_some() {
                        prop_assert!(unique.contains(&RegionId(i as u32)));
                    }
                }
            }

            #[test]
            fn cache_is_fresh_after_invalidation(entries in prop::collection::vec((0u32..50, 0.0f64..1.0e6), 1..30)) {
                let mut cache = StrengthCache::default();
                for &(position, strength) in &entries {
                    cache.invalidate(Position(position));
                    prop_assert_eq!(cache.get_or_insert_with(Position(position), || strength), strength);
                    prop_assert_eq!(cache.get(Position(position)), Some(strength));
                }
            }
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(8))]

            #[test]
            fn valuation_is_idempotent(seed in 0u64..500) {
                let state = create_scenario(&ScenarioConfig::default(), seed).unwrap();
                let config = PlannerConfig::default();
                let ctx = scanned(&state, Color::Blue);
                let valuation = Valuation::new(&state, &ctx, &config);
                let hero = state.hero(state.kingdoms[0].heroes[0]).unwrap();
                let reach = state.reachability(hero, PathKnobs::default());
                let mut cache = StrengthCache::default();
                for object in ctx.objects.iter() {
                    let distance = reach.distance(object.position);
                    if distance == 0 || !valuation.is_valid_target(&mut cache, hero, object.position, distance) {
                        continue;
                    }
                    let first = valuation.object_value(hero, object.position, -1.0e6, distance);
                    let second = valuation.object_value(hero, object.position, -1.0e6, distance);
                    prop_assert_eq!(first, second);
                }
            }
        }
    }
}
