// ═══════════════════════════════════════════════════════════════════════
// Engine test suite — movement, object visits, castles and the day cycle
// ═══════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use crate::army::Troop;
    use crate::economy::Funds;
    use crate::engine::*;
    use crate::monsters::Monster;
    use crate::navigation::{self, PathKnobs, Step, TELEPORT_MOVE_COST};
    use crate::setup::{create_scenario, ScenarioBuilder, ScenarioConfig};
    use crate::types::*;

    fn peasants(count: u32) -> Vec<Troop> {
        vec![Troop::new(Monster::Peasant, count)]
    }

    fn open_world(width: u32, height: u32) -> ScenarioBuilder {
        let mut b = ScenarioBuilder::new(width, height);
        b.kingdom(Color::Blue, Control::Ai).kingdom(Color::Red, Control::Ai).without_fog();
        b
    }

    fn path_to(state: &GameState, hero: HeroId, to: Position) -> Vec<Step> {
        let hero = state.hero(hero).unwrap();
        navigation::reachability(state, hero, PathKnobs::default()).path_to(to)
    }

    // ═════════════════════════════════════════════════════════════════════
    // PATHFINDING
    // ═════════════════════════════════════════════════════════════════════

    #[test]
    fn test_straight_and_diagonal_costs() {
        let mut b = open_world(10, 10);
        let hero = b.hero(Color::Blue, 0, 0, peasants(5));
        let state = b.build();
        let reach = navigation::reachability(&state, state.hero(hero).unwrap(), PathKnobs::default());
        assert_eq!(reach.distance(state.map.position(3, 0)), 300);
        assert_eq!(reach.distance(state.map.position(1, 1)), 150);
        assert_eq!(reach.distance(state.map.position(0, 0)), 0);
    }

    #[test]
    fn test_rock_blocks_movement() {
        let mut b = open_world(5, 1);
        let hero = b.hero(Color::Blue, 0, 0, peasants(5));
        b.terrain(2, 0, Terrain::Rock);
        let state = b.build();
        let reach = navigation::reachability(&state, state.hero(hero).unwrap(), PathKnobs::default());
        assert!(reach.is_reachable(state.map.position(1, 0)));
        assert!(!reach.is_reachable(state.map.position(3, 0)));
    }

    #[test]
    fn test_fog_limits_paths() {
        let mut b = ScenarioBuilder::new(20, 1);
        b.kingdom(Color::Blue, Control::Ai);
        let hero = b.hero(Color::Blue, 0, 0, peasants(5));
        let state = b.build();
        let reach = navigation::reachability(&state, state.hero(hero).unwrap(), PathKnobs::default());
        assert!(reach.is_reachable(state.map.position(2, 0)));
        assert!(!reach.is_reachable(state.map.position(5, 0)));
    }

    #[test]
    fn test_action_objects_are_not_pass_through() {
        let mut b = open_world(5, 1);
        let hero = b.hero(Color::Blue, 0, 0, peasants(5));
        b.object(2, 0, MapObject::TreasureChest { gold: 1000 });
        let state = b.build();
        let reach = navigation::reachability(&state, state.hero(hero).unwrap(), PathKnobs::default());
        assert!(reach.is_reachable(state.map.position(2, 0)));
        assert!(!reach.is_reachable(state.map.position(3, 0)));
    }

    #[test]
    fn test_guard_checked_against_advantage() {
        let mut b = open_world(6, 1);
        let hero = b.hero(Color::Blue, 0, 0, peasants(20));
        b.object(2, 0, MapObject::Monster(Troop::new(Monster::Goblin, 1)));
        b.object(4, 0, MapObject::Monster(Troop::new(Monster::Dragon, 1)));
        let state = b.build();
        let h = state.hero(hero).unwrap();
        let reach = navigation::reachability(&state, h, PathKnobs::default());
        assert!(reach.is_reachable(state.map.position(2, 0)));

        // Goblin strength is ~2.9, the hero fields ~26.6
        let cautious = PathKnobs { army_advantage: 10.0, ..PathKnobs::default() };
        let reach = navigation::reachability(&state, h, cautious);
        assert!(!reach.is_reachable(state.map.position(2, 0)));
    }

    #[test]
    fn test_teleport_lands_next_to_target() {
        let mut b = open_world(10, 3);
        let hero = b.hero(Color::Blue, 0, 0, peasants(5));
        b.object(6, 0, MapObject::Resource { resource: Resource::Gold, amount: 500 });
        let mut state = b.build();
        {
            let h = state.hero_mut(hero).unwrap();
            h.has_spellbook = true;
            h.knows_dimension_door = true;
            h.spell_points = 20;
        }
        let target = state.map.position(6, 0);
        let path = navigation::teleport_path(&state, state.hero(hero).unwrap(), target, PathKnobs::default());
        assert_eq!(path.len(), 2);
        assert!(path[0].teleport);
        assert_eq!(path[0].to, state.map.position(5, 0));
        assert_eq!(path[0].cost, TELEPORT_MOVE_COST);

        let before = state.hero(hero).unwrap().move_points;
        let report = cast_teleport(&mut state, hero, target, PathKnobs::default()).unwrap();
        assert_eq!(report.actions, vec![(target, ObjectKind::Resource)]);
        let h = state.hero(hero).unwrap();
        assert_eq!(h.position, target);
        assert_eq!(h.spell_points, 10);
        assert_eq!(h.move_points, before - TELEPORT_MOVE_COST - 100);
    }

    #[test]
    fn test_teleport_respects_spell_reserve() {
        let mut b = open_world(10, 1);
        let hero = b.hero(Color::Blue, 0, 0, peasants(5));
        let mut state = b.build();
        {
            let h = state.hero_mut(hero).unwrap();
            h.has_spellbook = true;
            h.knows_dimension_door = true;
            h.knowledge = 2;
            h.spell_points = 15;
        }
        let target = state.map.position(6, 0);
        let knobs = PathKnobs { spell_reserve: 0.5, ..PathKnobs::default() };
        assert!(navigation::teleport_path(&state, state.hero(hero).unwrap(), target, knobs).is_empty());
        assert!(!navigation::teleport_path(&state, state.hero(hero).unwrap(), target, PathKnobs::default()).is_empty());
    }

    #[test]
    fn test_corridor_hero_is_possibly_blocking() {
        let mut b = open_world(5, 3);
        let hero = b.hero(Color::Blue, 2, 1, peasants(5));
        b.terrain(2, 0, Terrain::Rock).terrain(2, 2, Terrain::Water);
        let state = b.build();
        assert!(navigation::is_possibly_blocking(&state, state.hero(hero).unwrap()));
    }

    // ═════════════════════════════════════════════════════════════════════
    // MOVEMENT & OBJECTS
    // ═════════════════════════════════════════════════════════════════════

    #[test]
    fn test_pickup_adds_funds_and_disappears() {
        let mut b = open_world(5, 1);
        let hero = b.hero(Color::Blue, 0, 0, peasants(5));
        b.object(2, 0, MapObject::Resource { resource: Resource::Gold, amount: 500 });
        let mut state = b.build();
        let target = state.map.position(2, 0);
        let path = path_to(&state, hero, target);

        let report = move_hero(&mut state, hero, &path).unwrap();
        assert!(report.hero_alive);
        assert_eq!(report.steps_taken, 2);
        assert_eq!(state.kingdom(Color::Blue).unwrap().funds.gold, 8000);
        assert_eq!(state.object_kind_under_hero(target), ObjectKind::None);
        assert_eq!(state.hero(hero).unwrap().position, target);
    }

    #[test]
    fn test_defeating_monster_clears_tile_hero_stays_adjacent() {
        let mut b = open_world(5, 1);
        let hero = b.hero(Color::Blue, 0, 0, peasants(20));
        b.object(2, 0, MapObject::Monster(Troop::new(Monster::Goblin, 3)));
        let mut state = b.build();
        let target = state.map.position(2, 0);
        let path = path_to(&state, hero, target);

        let report = move_hero(&mut state, hero, &path).unwrap();
        assert!(report.hero_alive);
        assert_eq!(state.object_kind(target), ObjectKind::None);
        assert_eq!(state.hero(hero).unwrap().position, state.map.position(1, 0));
        assert!(state.hero(hero).unwrap().army.total_count() < 20);
    }

    #[test]
    fn test_losing_battle_kills_hero_and_kingdom() {
        let mut b = open_world(5, 1);
        let hero = b.hero(Color::Blue, 1, 0, peasants(1));
        b.object(2, 0, MapObject::Monster(Troop::new(Monster::Goblin, 5)));
        let mut state = b.build();
        let step = Step { to: state.map.position(2, 0), cost: 100, teleport: false };

        let report = move_hero(&mut state, hero, &[step]).unwrap();
        assert!(!report.hero_alive);
        assert!(!state.hero(hero).unwrap().alive);
        assert!(state.kingdom(Color::Blue).unwrap().heroes.is_empty());
        assert!(state.kingdom(Color::Blue).unwrap().lost);
        assert!(state.map.tile(state.map.position(1, 0)).unwrap().hero.is_none());
    }

    #[test]
    fn test_capturing_last_castle_eliminates_kingdom() {
        let mut b = open_world(6, 6);
        let hero = b.hero(Color::Blue, 2, 3, peasants(20));
        let town = b.town(Some(Color::Red), 3, 3, Vec::new());
        let mut state = b.build();
        let target = state.castle(town).unwrap().position;
        let path = path_to(&state, hero, target);
        assert_eq!(path.len(), 1);

        move_hero(&mut state, hero, &path).unwrap();
        assert_eq!(state.castle(town).unwrap().color, Some(Color::Blue));
        assert_eq!(state.hero(hero).unwrap().position, target);
        assert!(state.kingdom(Color::Red).unwrap().lost);
        assert_eq!(winner(&state), Some(Color::Blue));
    }

    #[test]
    fn test_jail_releases_prisoner() {
        let mut b = open_world(5, 1);
        let hero = b.hero(Color::Blue, 0, 0, peasants(5));
        let prisoner = b.jailed_hero(2, 0);
        let mut state = b.build();
        let path = path_to(&state, hero, state.map.position(2, 0));

        let report = move_hero(&mut state, hero, &path).unwrap();
        assert_eq!(report.released_hero, Some(prisoner));
        assert_eq!(state.hero(prisoner).unwrap().color, Some(Color::Blue));
        assert_eq!(state.kingdom(Color::Blue).unwrap().heroes.len(), 2);
    }

    #[test]
    fn test_meeting_gives_troops_to_senior_role() {
        let mut b = open_world(5, 1);
        let fighter = b.hero(Color::Blue, 0, 0, vec![Troop::new(Monster::Paladin, 2)]);
        let courier = b.hero(
            Color::Blue,
            1,
            0,
            vec![Troop::new(Monster::Archer, 10), Troop::new(Monster::Peasant, 5)],
        );
        let mut state = b.build();
        state.hero_mut(fighter).unwrap().role = Role::Fighter;
        state.hero_mut(courier).unwrap().role = Role::Courier;
        let step = Step { to: state.map.position(1, 0), cost: 100, teleport: false };

        move_hero(&mut state, fighter, &[step]).unwrap();
        let f = state.hero(fighter).unwrap();
        let c = state.hero(courier).unwrap();
        assert!(f.army.has_monster(Monster::Archer));
        assert_eq!(c.army.troops, vec![Troop::new(Monster::Peasant, 5)]);
        assert!(f.met_heroes.contains(&courier));
        assert!(c.met_heroes.contains(&fighter));
        assert_eq!(f.position, state.map.position(0, 0));
    }

    #[test]
    fn test_temple_and_well() {
        let mut b = open_world(5, 1);
        let hero = b.hero(Color::Blue, 0, 0, peasants(5));
        b.object(1, 0, MapObject::Temple);
        let mut state = b.build();
        let step = Step { to: state.map.position(1, 0), cost: 100, teleport: false };
        move_hero(&mut state, hero, &[step]).unwrap();
        let h = state.hero(hero).unwrap();
        assert_eq!(h.morale, MORALE_GREAT);
        assert!(h.has_visited(state.map.position(1, 0)));
    }

    #[test]
    fn test_newly_revealed_object_interrupts_walk() {
        let mut b = ScenarioBuilder::new(20, 3);
        b.kingdom(Color::Blue, Control::Ai);
        let hero = b.hero(Color::Blue, 0, 0, peasants(20));
        b.object(5, 1, MapObject::Monster(Troop::new(Monster::Goblin, 1)));
        let mut state = b.build();
        let path: Vec<Step> = (1..=6)
            .map(|x| Step { to: state.map.position(x, 0), cost: 100, teleport: false })
            .collect();

        let report = move_hero(&mut state, hero, &path).unwrap();
        assert!(report.interrupted);
        assert_eq!(report.steps_taken, 3);
        assert_eq!(state.hero(hero).unwrap().position, state.map.position(3, 0));
    }

    #[test]
    fn test_move_stops_when_points_run_out() {
        let mut b = open_world(30, 1);
        let hero = b.hero(Color::Blue, 0, 0, peasants(5));
        let mut state = b.build();
        let mp = state.hero(hero).unwrap().move_points;
        let path = path_to(&state, hero, state.map.position(29, 0));
        let report = move_hero(&mut state, hero, &path).unwrap();
        assert_eq!(report.steps_taken as u32, mp / 100);
        assert!(state.hero(hero).unwrap().move_points < 100);
    }

    #[test]
    fn test_non_adjacent_step_is_rejected() {
        let mut b = open_world(5, 1);
        let hero = b.hero(Color::Blue, 0, 0, peasants(5));
        let mut state = b.build();
        let step = Step { to: state.map.position(3, 0), cost: 100, teleport: false };
        assert!(move_hero(&mut state, hero, &[step]).is_err());
    }

    // ═════════════════════════════════════════════════════════════════════
    // CASTLES & ECONOMY
    // ═════════════════════════════════════════════════════════════════════

    #[test]
    fn test_build_once_per_day_with_multiplier() {
        let mut b = open_world(5, 5);
        let castle = b.castle(Some(Color::Blue), 2, 2, Vec::new());
        let mut state = b.build();

        assert!(!build(&mut state, castle, Building::Statue, 10).unwrap());
        assert!(build(&mut state, castle, Building::Well, 1).unwrap());
        assert!(!build(&mut state, castle, Building::Tavern, 1).unwrap());
        assert_eq!(state.kingdom(Color::Blue).unwrap().funds.gold, 7000);

        end_day(&mut state);
        assert!(build(&mut state, castle, Building::Tavern, 1).unwrap());
    }

    #[test]
    fn test_building_requirements() {
        let mut b = open_world(5, 5);
        let castle = b.castle(Some(Color::Blue), 2, 2, Vec::new());
        let mut state = b.build();
        assert!(!build(&mut state, castle, Building::Dwelling2, 1).unwrap());
        assert!(build(&mut state, castle, Building::Dwelling1, 1).unwrap());
        assert_eq!(state.castle(castle).unwrap().available.len(), 1);
    }

    #[test]
    fn test_recruit_hero_replaces_offer() {
        let mut b = open_world(5, 5);
        let castle = b.castle(Some(Color::Blue), 2, 2, Vec::new());
        b.recruits(Color::Blue, 2);
        let mut state = b.build();
        let offered = state.kingdom(Color::Blue).unwrap().recruits[0];

        let hero = recruit_hero(&mut state, castle, 0).unwrap();
        assert_eq!(hero, offered);
        let kingdom = state.kingdom(Color::Blue).unwrap();
        assert_eq!(kingdom.funds.gold, 5000);
        assert_eq!(kingdom.recruits.len(), 2);
        assert_ne!(kingdom.recruits[0], offered);
        assert_eq!(state.hero(hero).unwrap().position, state.castle(castle).unwrap().position);

        // The castle now has a guest
        assert!(recruit_hero(&mut state, castle, 1).is_err());
    }

    #[test]
    fn test_recruit_in_castle_and_reinforce() {
        let mut b = open_world(5, 5);
        let castle = b.castle(Some(Color::Blue), 2, 2, Vec::new());
        let hero = b.hero(Color::Blue, 2, 2, peasants(5));
        let mut state = b.build();
        state.castle_mut(castle).unwrap().available.push(Troop::new(Monster::Archer, 4));

        let hired = recruit_in_castle(&mut state, castle).unwrap();
        assert_eq!(hired, 4);
        assert_eq!(state.kingdom(Color::Blue).unwrap().funds.gold, 7500 - 600);

        reinforce_hero_in_castle(&mut state, hero).unwrap();
        assert!(state.castle(castle).unwrap().garrison.is_empty());
        assert!(state.hero(hero).unwrap().army.has_monster(Monster::Archer));

        // Archers and peasants share speed, nothing is left behind
        assert_eq!(move_slow_troops_to_garrison(&mut state, hero).unwrap(), 0);
    }

    #[test]
    fn test_slow_troops_stay_in_garrison() {
        let mut b = open_world(5, 5);
        b.castle(Some(Color::Blue), 2, 2, Vec::new());
        let hero = b.hero(Color::Blue, 2, 2, vec![Troop::new(Monster::Wolf, 3), Troop::new(Monster::Zombie, 5)]);
        let mut state = b.build();
        let slow = state.hero(hero).unwrap().max_move_points;

        assert_eq!(move_slow_troops_to_garrison(&mut state, hero).unwrap(), 1);
        let h = state.hero(hero).unwrap();
        assert_eq!(h.army.troops, vec![Troop::new(Monster::Wolf, 3)]);
        assert!(max_move_points(h) > slow);
    }

    #[test]
    fn test_end_day_income_and_weekly_growth() {
        let mut b = open_world(5, 5);
        let castle = b.castle(Some(Color::Blue), 2, 2, Vec::new());
        let hero = b.hero(Color::Blue, 0, 0, peasants(5));
        b.object(4, 4, MapObject::Mine { resource: Resource::Ore, owner: Some(Color::Blue) });
        b.day(6);
        let mut state = b.build();
        state.castle_mut(castle).unwrap().available.push(Troop::new(Monster::Peasant, 0));
        state.hero_mut(hero).unwrap().move_points = 0;

        end_day(&mut state);
        let funds = state.kingdom(Color::Blue).unwrap().funds;
        assert_eq!(funds.gold, 8500);
        assert_eq!(funds.ore, 22);
        assert_eq!(state.day, 7);
        assert_eq!(state.hero(hero).unwrap().move_points, state.hero(hero).unwrap().max_move_points);
        assert_eq!(state.castle(castle).unwrap().available[0].count, 0);

        end_day(&mut state);
        assert_eq!(state.day_of_week(), 1);
        assert_eq!(state.castle(castle).unwrap().available[0].count, Monster::Peasant.def().weekly_growth);
    }

    #[test]
    fn test_funds_payment() {
        let funds = Funds::starting();
        assert!(funds.covers(&Funds::gold(7500)));
        assert!(!funds.covers(&Funds::gold(7501)));
    }

    // ═════════════════════════════════════════════════════════════════════
    // SCENARIOS
    // ═════════════════════════════════════════════════════════════════════

    #[test]
    fn test_scenario_week_cycle() {
        let mut state = create_scenario(&ScenarioConfig::default(), 5).unwrap();
        let start: Vec<i32> = state.kingdoms.iter().map(|k| k.funds.gold).collect();
        for _ in 0..7 {
            end_day(&mut state);
        }
        assert_eq!(state.day, 8);
        for (kingdom, before) in state.kingdoms.iter().zip(start) {
            assert!(kingdom.funds.gold > before);
        }
        assert_eq!(winner(&state), None);
    }

    #[test]
    fn test_scenario_heroes_start_next_to_castles() {
        let state = create_scenario(&ScenarioConfig::default(), 9).unwrap();
        for kingdom in &state.kingdoms {
            let castle = state.castle(kingdom.castles[0]).unwrap();
            let hero = state.hero(kingdom.heroes[0]).unwrap();
            assert_eq!(state.map.tile_distance(castle.position, hero.position), 1);
            assert!(!state.map.tile(hero.position).unwrap().is_fog(kingdom.color));
        }
    }

    // ═════════════════════════════════════════════════════════════════════
    // PROPERTIES
    // ═════════════════════════════════════════════════════════════════════

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(24))]

            #[test]
            fn path_cost_matches_distance(seed in 0u64..1000, target in 0u32..1296) {
                let state = create_scenario(&ScenarioConfig::default(), seed).unwrap();
                let hero = state.hero(state.kingdoms[0].heroes[0]).unwrap();
                let reach = navigation::reachability(&state, hero, PathKnobs::default());
                let path = reach.path_to(Position(target));
                prop_assert_eq!(navigation::path_cost(&path), reach.distance(Position(target)));
                for pair in path.windows(2) {
                    prop_assert_eq!(state.map.tile_distance(pair[0].to, pair[1].to), 1);
                    prop_assert_eq!(state.object_kind(pair[0].to), ObjectKind::None);
                }
            }

            #[test]
            fn days_never_reduce_funds(seed in 0u64..1000, days in 1u32..10) {
                let mut state = create_scenario(&ScenarioConfig::default(), seed).unwrap();
                let before: Vec<Funds> = state.kingdoms.iter().map(|k| k.funds).collect();
                for _ in 0..days {
                    end_day(&mut state);
                }
                for (kingdom, old) in state.kingdoms.iter().zip(before) {
                    prop_assert!(kingdom.funds.covers(&old));
                }
            }
        }
    }
}
