// ═══════════════════════════════════════════════════════════════════════
// World Host — everything the planner needs from the running game
//
// The planner never touches tile storage, pathfinding or army arithmetic
// directly. It reads and acts through this trait, which the engine's
// `GameState` implements. Queries take `&self`; actions take `&mut self`
// and report engine errors unchanged.
// ═══════════════════════════════════════════════════════════════════════

use conquest_engine::engine::{self, MoveReport};
use conquest_engine::map::Tile;
use conquest_engine::navigation::{self, PathKnobs, Reachability, Step, Traveller};
use conquest_engine::visibility;
use conquest_engine::*;

pub trait WorldHost {
    // ── Calendar and map ───────────────────────────────────────────────

    fn day(&self) -> u32;
    fn is_last_day_of_week(&self) -> bool;
    fn map_size(&self) -> usize;
    fn map_width(&self) -> u32;
    fn tile(&self, position: Position) -> Option<&Tile>;
    fn approximate_distance(&self, a: Position, b: Position) -> u32;

    /// Main object of a tile; a hero hides what stands below it.
    fn object_kind(&self, position: Position) -> ObjectKind;
    fn object_kind_under_hero(&self, position: Position) -> ObjectKind;
    fn map_object(&self, position: Position) -> Option<&MapObject> {
        self.tile(position).map(|t| &t.object)
    }

    fn region_of(&self, position: Position) -> Option<RegionId>;
    fn region_count(&self) -> usize;
    fn region_neighbours(&self, region: RegionId) -> &[RegionId];

    fn is_fog(&self, position: Position, color: Color) -> bool;
    fn fog_reveal_count(&self, color: Color, center: Position, radius: u32) -> u32;
    fn scouting_radius(&self, hero: &Hero) -> u32;

    // ── Entities ───────────────────────────────────────────────────────

    fn hero(&self, id: HeroId) -> Option<&Hero>;
    fn castle(&self, id: CastleId) -> Option<&Castle>;
    fn hero_at(&self, position: Position) -> Option<&Hero>;
    fn castle_at(&self, position: Position) -> Option<&Castle>;
    fn kingdom(&self, color: Color) -> Option<&Kingdom>;
    fn victory(&self) -> &VictoryConditions;
    fn is_friend(&self, color: Color, other: Option<Color>) -> bool;

    /// Castle garrison plus guest hero, with the castle's defensive bonus.
    fn garrison_strength(&self, castle: &Castle) -> f64;
    fn tile_army_strength(&self, position: Position) -> f64;

    fn kingdom_heroes(&self, color: Color) -> Vec<HeroId> {
        self.kingdom(color)
            .map(|k| k.heroes.iter().copied().filter(|&id| self.hero(id).is_some_and(|h| h.alive)).collect())
            .unwrap_or_default()
    }

    fn kingdom_castles(&self, color: Color) -> Vec<CastleId> {
        self.kingdom(color).map(|k| k.castles.clone()).unwrap_or_default()
    }

    fn castle_guest(&self, castle: &Castle) -> Option<&Hero> {
        self.hero_at(castle.position)
    }

    // ── Pathfinding ────────────────────────────────────────────────────

    fn reachability(&self, hero: &Hero, knobs: PathKnobs) -> Reachability;
    fn distance_for_army(&self, traveller: &Traveller, to: Position, knobs: PathKnobs) -> u32;
    fn teleport_path(&self, hero: &Hero, to: Position, knobs: PathKnobs) -> Vec<Step>;
    fn nearest_open_tile(&self, hero: &Hero) -> Option<Position>;
    fn is_possibly_blocking(&self, hero: &Hero) -> bool;
    fn fog_discovery_tile(&self, hero: &Hero, reach: &Reachability) -> Option<(Position, bool)>;

    // ── Hero flags ─────────────────────────────────────────────────────

    fn set_hero_role(&mut self, hero: HeroId, role: Role);
    fn set_sleeper(&mut self, hero: HeroId, sleeper: bool);

    // ── Actions ────────────────────────────────────────────────────────

    fn move_hero(&mut self, hero: HeroId, path: &[Step]) -> Result<MoveReport>;
    fn cast_view_all(&mut self, hero: HeroId) -> Result<bool>;
    fn optimize_army(&mut self, hero: HeroId) -> Result<()>;
    fn recruit_hero(&mut self, castle: CastleId, offer: usize) -> Result<HeroId>;
    fn reinforce_hero_in_castle(&mut self, hero: HeroId) -> Result<()>;
    fn move_troop_to_garrison(&mut self, hero: HeroId, index: usize, count: u32) -> Result<()>;
    fn move_slow_troops_to_garrison(&mut self, hero: HeroId) -> Result<u32>;
    fn recruit_in_castle(&mut self, castle: CastleId) -> Result<u32>;
    fn build(&mut self, castle: CastleId, building: Building, funds_multiplier: u32) -> Result<bool>;
}

impl WorldHost for GameState {
    fn day(&self) -> u32 {
        self.day
    }

    fn is_last_day_of_week(&self) -> bool {
        GameState::is_last_day_of_week(self)
    }

    fn map_size(&self) -> usize {
        self.map.size()
    }

    fn map_width(&self) -> u32 {
        self.map.width
    }

    fn tile(&self, position: Position) -> Option<&Tile> {
        self.map.tile(position)
    }

    fn approximate_distance(&self, a: Position, b: Position) -> u32 {
        self.map.approximate_distance(a, b)
    }

    fn object_kind(&self, position: Position) -> ObjectKind {
        GameState::object_kind(self, position)
    }

    fn object_kind_under_hero(&self, position: Position) -> ObjectKind {
        GameState::object_kind_under_hero(self, position)
    }

    fn region_of(&self, position: Position) -> Option<RegionId> {
        self.map.region_of(position)
    }

    fn region_count(&self) -> usize {
        self.map.regions.len()
    }

    fn region_neighbours(&self, region: RegionId) -> &[RegionId] {
        self.map.region_neighbours(region)
    }

    fn is_fog(&self, position: Position, color: Color) -> bool {
        visibility::is_fog(self, position, color)
    }

    fn fog_reveal_count(&self, color: Color, center: Position, radius: u32) -> u32 {
        visibility::fog_reveal_count(self, color, center, radius)
    }

    fn scouting_radius(&self, hero: &Hero) -> u32 {
        visibility::scouting_radius(hero)
    }

    fn hero(&self, id: HeroId) -> Option<&Hero> {
        GameState::hero(self, id)
    }

    fn castle(&self, id: CastleId) -> Option<&Castle> {
        GameState::castle(self, id)
    }

    fn hero_at(&self, position: Position) -> Option<&Hero> {
        GameState::hero_at(self, position)
    }

    fn castle_at(&self, position: Position) -> Option<&Castle> {
        GameState::castle_at(self, position)
    }

    fn kingdom(&self, color: Color) -> Option<&Kingdom> {
        GameState::kingdom(self, color)
    }

    fn victory(&self) -> &VictoryConditions {
        &self.victory
    }

    fn is_friend(&self, color: Color, other: Option<Color>) -> bool {
        GameState::is_friend(self, color, other)
    }

    fn garrison_strength(&self, castle: &Castle) -> f64 {
        GameState::garrison_strength(self, castle)
    }

    fn tile_army_strength(&self, position: Position) -> f64 {
        GameState::tile_army_strength(self, position)
    }

    fn reachability(&self, hero: &Hero, knobs: PathKnobs) -> Reachability {
        navigation::reachability(self, hero, knobs)
    }

    fn distance_for_army(&self, traveller: &Traveller, to: Position, knobs: PathKnobs) -> u32 {
        navigation::distance_for_army(self, traveller, to, knobs)
    }

    fn teleport_path(&self, hero: &Hero, to: Position, knobs: PathKnobs) -> Vec<Step> {
        navigation::teleport_path(self, hero, to, knobs)
    }

    fn nearest_open_tile(&self, hero: &Hero) -> Option<Position> {
        navigation::nearest_open_tile(self, hero)
    }

    fn is_possibly_blocking(&self, hero: &Hero) -> bool {
        navigation::is_possibly_blocking(self, hero)
    }

    fn fog_discovery_tile(&self, hero: &Hero, reach: &Reachability) -> Option<(Position, bool)> {
        navigation::fog_discovery_tile(self, hero, reach)
    }

    fn set_hero_role(&mut self, hero: HeroId, role: Role) {
        if let Some(hero) = self.hero_mut(hero) {
            hero.role = role;
        }
    }

    fn set_sleeper(&mut self, hero: HeroId, sleeper: bool) {
        if let Some(hero) = self.hero_mut(hero) {
            hero.sleeper = sleeper;
        }
    }

    fn move_hero(&mut self, hero: HeroId, path: &[Step]) -> Result<MoveReport> {
        engine::move_hero(self, hero, path)
    }

    fn cast_view_all(&mut self, hero: HeroId) -> Result<bool> {
        engine::cast_view_all(self, hero)
    }

    fn optimize_army(&mut self, hero: HeroId) -> Result<()> {
        engine::optimize_army(self, hero)
    }

    fn recruit_hero(&mut self, castle: CastleId, offer: usize) -> Result<HeroId> {
        engine::recruit_hero(self, castle, offer)
    }

    fn reinforce_hero_in_castle(&mut self, hero: HeroId) -> Result<()> {
        engine::reinforce_hero_in_castle(self, hero)
    }

    fn move_troop_to_garrison(&mut self, hero: HeroId, index: usize, count: u32) -> Result<()> {
        engine::move_troop_to_garrison(self, hero, index, count)
    }

    fn move_slow_troops_to_garrison(&mut self, hero: HeroId) -> Result<u32> {
        engine::move_slow_troops_to_garrison(self, hero)
    }

    fn recruit_in_castle(&mut self, castle: CastleId) -> Result<u32> {
        engine::recruit_in_castle(self, castle)
    }

    fn build(&mut self, castle: CastleId, building: Building, funds_multiplier: u32) -> Result<bool> {
        engine::build(self, castle, building, funds_multiplier)
    }
}
