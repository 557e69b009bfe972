// ═══════════════════════════════════════════════════════════════════════
// Game setup — seeded scenario generation and a builder for hand-made maps
// ═══════════════════════════════════════════════════════════════════════

use crate::army::{Army, Troop};
use crate::engine::max_move_points;
use crate::error::{EngineError, Result};
use crate::map::Map;
use crate::monsters::Monster;
use crate::types::*;
use crate::visibility::{reveal_all, reveal_starting_areas};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const HERO_NAMES: [&str; 16] = [
    "Aldric", "Brenna", "Cedric", "Dalia", "Edmund", "Freya", "Gareth", "Helga", "Ivor", "Jorun", "Kael", "Liora",
    "Magnus", "Nessa", "Osric", "Petra",
];

/// Creatures that roam the wilds, weakest first.
const WANDERING: [Monster; 10] = [
    Monster::Goblin,
    Monster::Sprite,
    Monster::Skeleton,
    Monster::Orc,
    Monster::Zombie,
    Monster::Wolf,
    Monster::Ogre,
    Monster::Vampire,
    Monster::Troll,
    Monster::Unicorn,
];

/// Map generation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub width: u32,
    pub height: u32,
    /// Side length of each rectangular region, border included.
    pub region_size: u32,
    /// Kingdoms in play, in turn order.
    pub kingdoms: Vec<Color>,
    /// Kingdom played by a human, if any.
    pub human: Option<Color>,
    pub neutral_castles: u32,
    pub monsters_per_region: u32,
    pub objects_per_region: u32,
    pub jails: u32,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        ScenarioConfig {
            width: 36,
            height: 36,
            region_size: 9,
            kingdoms: vec![Color::Blue, Color::Red],
            human: None,
            neutral_castles: 2,
            monsters_per_region: 2,
            objects_per_region: 3,
            jails: 1,
        }
    }
}

impl ScenarioConfig {
    /// Parse a scenario from JSON; missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: ScenarioConfig =
            serde_json::from_str(text).map_err(|e| EngineError::InvalidScenario(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.region_size < 4 {
            return Err(EngineError::InvalidScenario("region size must be at least 4".into()));
        }
        if self.width < self.region_size || self.height < self.region_size {
            return Err(EngineError::InvalidScenario("map smaller than one region".into()));
        }
        let unique: BTreeSet<Color> = self.kingdoms.iter().copied().collect();
        if self.kingdoms.is_empty() || unique.len() != self.kingdoms.len() {
            return Err(EngineError::InvalidScenario("kingdom colors must be unique and non-empty".into()));
        }
        let regions = (self.width / self.region_size) * (self.height / self.region_size);
        if self.kingdoms.len() as u32 + self.neutral_castles > regions {
            return Err(EngineError::InvalidScenario(format!("{regions} regions cannot hold every castle")));
        }
        Ok(())
    }
}

// ── Scenario generation ────────────────────────────────────────────────

/// Build a random scenario: a grid of regions separated by rock walls with
/// gaps, one castle and hero per kingdom, neutral castles, monsters and
/// objects scattered over the rest.
pub fn create_scenario(config: &ScenarioConfig, seed: u64) -> Result<GameState> {
    config.validate()?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let rs = config.region_size;
    let cols = config.width / rs;
    let rows = config.height / rs;
    let width = cols * rs;
    let height = rows * rs;

    let mut map = Map::new(width, height, Terrain::Grass);
    for y in 0..height {
        for x in 0..width {
            let idx = (y * width + x) as usize;
            let tile = &mut map.tiles[idx];
            tile.region = RegionId((y / rs) * cols + x / rs);
            tile.terrain = random_terrain(&mut rng);
            let wall_x = x % rs == rs - 1 && x + 1 < width;
            let wall_y = y % rs == rs - 1 && y + 1 < height;
            let gap_x = wall_x && y % rs == rs / 2;
            let gap_y = wall_y && x % rs == rs / 2;
            if (wall_x || wall_y) && !gap_x && !gap_y {
                tile.terrain = Terrain::Rock;
            }
        }
    }
    map.rebuild_regions();

    let mut state = GameState {
        map,
        heroes: Vec::new(),
        castles: Vec::new(),
        kingdoms: Vec::new(),
        day: 1,
        victory: VictoryConditions::default(),
        seed,
    };

    let mut regions: Vec<u32> = (0..cols * rows).collect();
    regions.shuffle(&mut rng);
    let center_of = |region: u32| {
        let (rx, ry) = (region % cols, region / cols);
        (rx * rs + (rs - 1) / 2, ry * rs + (rs - 1) / 2)
    };

    for (i, &color) in config.kingdoms.iter().enumerate() {
        let control = if config.human == Some(color) { Control::Human } else { Control::Ai };
        state.kingdoms.push(Kingdom::new(color, control));
        let (cx, cy) = center_of(regions[i]);
        let castle = add_castle(&mut state, Some(color), cx, cy, Army::default());
        if let Some(c) = state.castle_mut(castle) {
            c.buildings.extend([Building::Castle, Building::Tavern, Building::Dwelling1]);
            c.available.push(Troop::new(Monster::Peasant, Monster::Peasant.def().weekly_growth));
        }
        let army = Army::new(vec![Troop::new(Monster::Peasant, 20), Troop::new(Monster::Archer, 5)]);
        let pos = state.map.position(cx + 1, cy);
        add_hero(&mut state, Some(color), pos, army);
    }

    let neutral_end = config.kingdoms.len() + config.neutral_castles as usize;
    for &region in &regions[config.kingdoms.len()..neutral_end] {
        let (cx, cy) = center_of(region);
        let guard = WANDERING[rng.gen_range(2..6)];
        let garrison = Army::new(vec![Troop::new(guard, rng.gen_range(10..25))]);
        add_castle(&mut state, None, cx, cy, garrison);
    }

    for region in 0..cols * rows {
        let mut open: Vec<Position> = (0..state.map.size() as u32)
            .map(Position)
            .filter(|&p| state.map.region_of(p) == Some(RegionId(region)))
            .filter(|&p| state.map.tile(p).map(|t| t.is_open()).unwrap_or(false))
            .filter(|&p| !next_to_castle(&state, p))
            .collect();
        open.shuffle(&mut rng);
        let mut open = open.into_iter();

        for _ in 0..config.monsters_per_region {
            let Some(pos) = open.next() else { break };
            let tier = rng.gen_range(0..WANDERING.len());
            let count = rng.gen_range(4..16) * (WANDERING.len() - tier) as u32 / 3 + 1;
            set_object(&mut state, pos, MapObject::Monster(Troop::new(WANDERING[tier], count)));
        }
        for _ in 0..config.objects_per_region {
            let Some(pos) = open.next() else { break };
            let object = random_object(&mut rng);
            set_object(&mut state, pos, object);
        }
    }

    for _ in 0..config.jails {
        let pos = (0..state.map.size() as u32)
            .map(Position)
            .filter(|&p| state.map.tile(p).map(|t| t.is_open()).unwrap_or(false))
            .collect::<Vec<_>>()
            .choose(&mut rng)
            .copied();
        if let Some(pos) = pos {
            let prisoner = make_recruit(&mut state);
            set_object(&mut state, pos, MapObject::Jail(prisoner));
        }
    }

    for i in 0..state.kingdoms.len() {
        let offers = [make_recruit(&mut state), make_recruit(&mut state)];
        state.kingdoms[i].recruits.extend(offers);
    }

    finish(&mut state);
    Ok(state)
}

fn random_terrain(rng: &mut ChaCha8Rng) -> Terrain {
    match rng.gen_range(0..20) {
        0..=9 => Terrain::Grass,
        10..=12 => Terrain::Dirt,
        13..=14 => Terrain::Sand,
        15 => Terrain::Snow,
        16 => Terrain::Swamp,
        _ => Terrain::Road,
    }
}

fn random_object(rng: &mut ChaCha8Rng) -> MapObject {
    let resource = *Resource::ALL.choose(rng).unwrap_or(&Resource::Gold);
    match rng.gen_range(0..16) {
        0..=2 => MapObject::Resource { resource, amount: if resource == Resource::Gold { 500 } else { 5 } },
        3 => MapObject::TreasureChest { gold: 1000 },
        4 => MapObject::Campfire { resource, amount: 4, gold: 400 },
        5 => MapObject::Mine { resource, owner: None },
        6 => MapObject::Artifact { value: rng.gen_range(1..4) },
        7 => MapObject::Temple,
        8 => MapObject::FaerieRing,
        9 => MapObject::FreeDwelling(Troop::new(Monster::Sprite, rng.gen_range(3..8))),
        10 => MapObject::RecruitDwelling(Troop::new(Monster::Pikeman, rng.gen_range(4..10))),
        11 => MapObject::MagicWell,
        12 => MapObject::ObservationTower { radius: 10 },
        13 => MapObject::WitchsHut(*Skill::ALL.choose(rng).unwrap_or(&Skill::Scouting)),
        14 => MapObject::Gazebo,
        _ => MapObject::Xanadu,
    }
}

fn next_to_castle(state: &GameState, pos: Position) -> bool {
    state.map.positions_in_radius(pos, 1).any(|p| state.castle_at(p).is_some())
}

fn set_object(state: &mut GameState, pos: Position, object: MapObject) {
    if let Some(tile) = state.map.tile_mut(pos) {
        tile.object = object;
    }
}

fn add_castle(state: &mut GameState, color: Option<Color>, x: u32, y: u32, garrison: Army) -> CastleId {
    let id = CastleId(state.castles.len() as u32);
    let position = state.map.position(x, y);
    state.castles.push(Castle {
        id,
        name: format!("Castle {}", id.0 + 1),
        color,
        position,
        buildings: BTreeSet::new(),
        garrison,
        available: Vec::new(),
        built_today: false,
    });
    if let Some(tile) = state.map.tile_mut(position) {
        tile.terrain = Terrain::Road;
        tile.object = MapObject::Castle(id);
    }
    if let Some(kingdom) = color.and_then(|c| state.kingdom_mut(c)) {
        kingdom.castles.push(id);
    }
    id
}

fn add_hero(state: &mut GameState, color: Option<Color>, position: Position, army: Army) -> HeroId {
    let id = HeroId(state.heroes.len() as u32);
    let name = HERO_NAMES[id.0 as usize % HERO_NAMES.len()];
    state.heroes.push(Hero::new(id, name, color, position, army));
    if color.is_some() {
        if let Some(tile) = state.map.tile_mut(position) {
            tile.hero = Some(id);
        }
    }
    if let Some(kingdom) = color.and_then(|c| state.kingdom_mut(c)) {
        kingdom.heroes.push(id);
    }
    id
}

/// Create an unowned hero for a tavern offer or a jail cell. The stats
/// are derived from the game seed and the hero's id.
pub fn make_recruit(state: &mut GameState) -> HeroId {
    let id = HeroId(state.heroes.len() as u32);
    let mut rng = ChaCha8Rng::seed_from_u64(state.seed ^ (id.0 as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15));
    let army = Army::new(vec![
        Troop::new(Monster::Peasant, rng.gen_range(10..30)),
        Troop::new(Monster::Archer, rng.gen_range(2..6)),
    ]);
    let name = HERO_NAMES[id.0 as usize % HERO_NAMES.len()];
    let mut hero = Hero::new(id, name, None, Position(0), army);
    hero.attack = rng.gen_range(0..4);
    hero.defense = rng.gen_range(0..4);
    hero.power = rng.gen_range(1..4);
    hero.knowledge = rng.gen_range(1..4);
    if rng.gen_bool(0.4) {
        let skill = *Skill::ALL.choose(&mut rng).unwrap_or(&Skill::Logistics);
        hero.skills.set(skill, 1);
    }
    hero.has_spellbook = hero.power + hero.knowledge >= 5;
    hero.knows_dimension_door = hero.has_spellbook && rng.gen_bool(0.3);
    hero.spell_points = hero.max_spell_points();
    state.heroes.push(hero);
    id
}

fn finish(state: &mut GameState) {
    for hero in &mut state.heroes {
        hero.max_move_points = max_move_points(hero);
        hero.move_points = hero.max_move_points;
    }
    reveal_starting_areas(state);
}

// ── Builder ────────────────────────────────────────────────────────────

/// Hand-made maps for tests and demos. Everything starts as open grass in
/// region 0 on day 1.
pub struct ScenarioBuilder {
    state: GameState,
    clear_fog: bool,
}

impl ScenarioBuilder {
    pub fn new(width: u32, height: u32) -> Self {
        ScenarioBuilder {
            state: GameState {
                map: Map::new(width, height, Terrain::Grass),
                heroes: Vec::new(),
                castles: Vec::new(),
                kingdoms: Vec::new(),
                day: 1,
                victory: VictoryConditions::default(),
                seed: 0,
            },
            clear_fog: false,
        }
    }

    pub fn pos(&self, x: u32, y: u32) -> Position {
        self.state.map.position(x, y)
    }

    pub fn seed(&mut self, seed: u64) -> &mut Self {
        self.state.seed = seed;
        self
    }

    pub fn day(&mut self, day: u32) -> &mut Self {
        self.state.day = day;
        self
    }

    /// Remove all fog for every kingdom when built.
    pub fn without_fog(&mut self) -> &mut Self {
        self.clear_fog = true;
        self
    }

    pub fn kingdom(&mut self, color: Color, control: Control) -> &mut Self {
        self.state.kingdoms.push(Kingdom::new(color, control));
        self
    }

    pub fn funds(&mut self, color: Color, funds: crate::economy::Funds) -> &mut Self {
        if let Some(kingdom) = self.state.kingdom_mut(color) {
            kingdom.funds = funds;
        }
        self
    }

    pub fn terrain(&mut self, x: u32, y: u32, terrain: Terrain) -> &mut Self {
        let pos = self.pos(x, y);
        if let Some(tile) = self.state.map.tile_mut(pos) {
            tile.terrain = terrain;
        }
        self
    }

    /// Assign every tile in the inclusive rectangle to `region`.
    pub fn region(&mut self, x0: u32, y0: u32, x1: u32, y1: u32, region: RegionId) -> &mut Self {
        for y in y0..=y1 {
            for x in x0..=x1 {
                let pos = self.pos(x, y);
                if let Some(tile) = self.state.map.tile_mut(pos) {
                    tile.region = region;
                }
            }
        }
        self
    }

    pub fn object(&mut self, x: u32, y: u32, object: MapObject) -> &mut Self {
        let pos = self.pos(x, y);
        set_object(&mut self.state, pos, object);
        self
    }

    /// A fully built castle.
    pub fn castle(&mut self, color: Option<Color>, x: u32, y: u32, garrison: Vec<Troop>) -> CastleId {
        let id = add_castle(&mut self.state, color, x, y, Army::new(garrison));
        if let Some(castle) = self.state.castle_mut(id) {
            castle.buildings.insert(Building::Castle);
        }
        id
    }

    /// A town without the castle building.
    pub fn town(&mut self, color: Option<Color>, x: u32, y: u32, garrison: Vec<Troop>) -> CastleId {
        add_castle(&mut self.state, color, x, y, Army::new(garrison))
    }

    pub fn hero(&mut self, color: Color, x: u32, y: u32, army: Vec<Troop>) -> HeroId {
        let pos = self.pos(x, y);
        add_hero(&mut self.state, Some(color), pos, Army::new(army))
    }

    /// A hero waiting in a jail at (x, y).
    pub fn jailed_hero(&mut self, x: u32, y: u32) -> HeroId {
        let id = make_recruit(&mut self.state);
        self.object(x, y, MapObject::Jail(id));
        id
    }

    /// Add tavern offers to a kingdom.
    pub fn recruits(&mut self, color: Color, count: usize) -> &mut Self {
        for _ in 0..count {
            let id = make_recruit(&mut self.state);
            if let Some(kingdom) = self.state.kingdom_mut(color) {
                kingdom.recruits.push(id);
            }
        }
        self
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn build(&mut self) -> GameState {
        let mut state = self.state.clone();
        state.map.rebuild_regions();
        finish(&mut state);
        if self.clear_fog {
            for color in state.kingdoms.iter().map(|k| k.color).collect::<Vec<_>>() {
                reveal_all(&mut state, color);
            }
        }
        state
    }
}
