// ═══════════════════════════════════════════════════════════════════════
// Core types — kingdoms, positions, heroes, castles and map objects
// ═══════════════════════════════════════════════════════════════════════

use crate::army::{Army, Troop};
use crate::economy::Funds;
use crate::map::Map;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ── Identifiers ────────────────────────────────────────────────────────

/// Tile index into the map (row-major).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position(pub u32);

impl Position {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegionId(pub u32);

impl RegionId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HeroId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CastleId(pub u32);

// ── Enums ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Color {
    Blue,
    Green,
    Red,
    Yellow,
    Orange,
    Purple,
}

impl Color {
    pub const ALL: [Color; 6] = [
        Color::Blue,
        Color::Green,
        Color::Red,
        Color::Yellow,
        Color::Orange,
        Color::Purple,
    ];

    /// Bit used in per-tile fog masks.
    pub fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Color::Blue => write!(f, "Blue"),
            Color::Green => write!(f, "Green"),
            Color::Red => write!(f, "Red"),
            Color::Yellow => write!(f, "Yellow"),
            Color::Orange => write!(f, "Orange"),
            Color::Purple => write!(f, "Purple"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Control {
    Human,
    Ai,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Resource {
    Wood,
    Mercury,
    Ore,
    Sulfur,
    Crystal,
    Gems,
    Gold,
}

impl Resource {
    pub const ALL: [Resource; 7] = [
        Resource::Wood,
        Resource::Mercury,
        Resource::Ore,
        Resource::Sulfur,
        Resource::Crystal,
        Resource::Gems,
        Resource::Gold,
    ];

    pub fn is_rare(self) -> bool {
        !matches!(self, Resource::Wood | Resource::Ore | Resource::Gold)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terrain {
    Road,
    Grass,
    Dirt,
    Sand,
    Snow,
    Swamp,
    Water,
    Rock,
}

/// Cheapest per-tile movement cost on any terrain.
pub const FASTEST_MOVE_PENALTY: u32 = 75;
/// Most expensive per-tile movement cost on passable terrain.
pub const SLOWEST_MOVE_PENALTY: u32 = 175;

impl Terrain {
    /// Movement points spent to enter a tile; `None` for impassable terrain.
    pub fn move_cost(self) -> Option<u32> {
        match self {
            Terrain::Road => Some(FASTEST_MOVE_PENALTY),
            Terrain::Grass => Some(100),
            Terrain::Dirt => Some(110),
            Terrain::Sand => Some(125),
            Terrain::Snow => Some(150),
            Terrain::Swamp => Some(SLOWEST_MOVE_PENALTY),
            Terrain::Water | Terrain::Rock => None,
        }
    }

    pub fn is_passable(self) -> bool {
        self.move_cost().is_some()
    }
}

/// Strategic archetype of an AI hero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Hunter,
    Scout,
    Courier,
    Fighter,
    Champion,
}

impl Role {
    pub const ALL: [Role; 5] = [Role::Hunter, Role::Scout, Role::Courier, Role::Fighter, Role::Champion];

    /// Seniority used when two friendly heroes decide who hands over troops.
    pub fn rank(self) -> u8 {
        match self {
            Role::Courier => 0,
            Role::Scout => 1,
            Role::Hunter => 2,
            Role::Fighter => 3,
            Role::Champion => 4,
        }
    }

    pub fn is_fighter(self) -> bool {
        matches!(self, Role::Fighter | Role::Champion)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Hunter => write!(f, "Hunter"),
            Role::Scout => write!(f, "Scout"),
            Role::Courier => write!(f, "Courier"),
            Role::Fighter => write!(f, "Fighter"),
            Role::Champion => write!(f, "Champion"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Skill {
    Wisdom,
    Mysticism,
    Scouting,
    Logistics,
    Pathfinding,
}

impl Skill {
    pub const ALL: [Skill; 5] = [
        Skill::Wisdom,
        Skill::Mysticism,
        Skill::Scouting,
        Skill::Logistics,
        Skill::Pathfinding,
    ];
}

/// Highest level of any secondary skill (expert).
pub const SKILL_LEVEL_MAX: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SecondarySkills {
    levels: [u8; 5],
}

impl SecondarySkills {
    pub fn level(&self, skill: Skill) -> u8 {
        self.levels[skill as usize]
    }

    pub fn set(&mut self, skill: Skill, level: u8) {
        self.levels[skill as usize] = level.min(SKILL_LEVEL_MAX);
    }

    pub fn total(&self) -> u32 {
        self.levels.iter().map(|&l| l as u32).sum()
    }
}

/// Morale and luck share the same -3..=3 scale.
pub const MORALE_MAX: i8 = 3;
pub const MORALE_GREAT: i8 = 2;
pub const MORALE_GOOD: i8 = 1;
pub const MORALE_NORMAL: i8 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Building {
    Well,
    Tavern,
    Statue,
    Marketplace,
    Castle,
    Dwelling1,
    Dwelling2,
    Dwelling3,
    Dwelling4,
    MageGuild1,
    MageGuild2,
    MageGuild3,
    LeftTurret,
    RightTurret,
    Moat,
    Captain,
}

impl Building {
    pub fn is_dwelling(self) -> bool {
        matches!(
            self,
            Building::Dwelling1 | Building::Dwelling2 | Building::Dwelling3 | Building::Dwelling4
        )
    }

    pub fn mage_guild_level(self) -> u8 {
        match self {
            Building::MageGuild1 => 1,
            Building::MageGuild2 => 2,
            Building::MageGuild3 => 3,
            _ => 0,
        }
    }
}

// ── Map objects ────────────────────────────────────────────────────────

/// Closed set of action-object categories the AI reasons about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    None,
    Castle,
    Hero,
    Monster,
    Resource,
    TreasureChest,
    Campfire,
    Mine,
    Artifact,
    Temple,
    FaerieRing,
    FreeDwelling,
    RecruitDwelling,
    MagicWell,
    ArtesianSpring,
    ObservationTower,
    Jail,
    Xanadu,
    WitchsHut,
    Gazebo,
    Pyramid,
    Oasis,
    Sign,
    Obelisk,
}

impl ObjectKind {
    /// Every action-object category (excludes `None`).
    pub const ALL: [ObjectKind; 23] = [
        ObjectKind::Castle,
        ObjectKind::Hero,
        ObjectKind::Monster,
        ObjectKind::Resource,
        ObjectKind::TreasureChest,
        ObjectKind::Campfire,
        ObjectKind::Mine,
        ObjectKind::Artifact,
        ObjectKind::Temple,
        ObjectKind::FaerieRing,
        ObjectKind::FreeDwelling,
        ObjectKind::RecruitDwelling,
        ObjectKind::MagicWell,
        ObjectKind::ArtesianSpring,
        ObjectKind::ObservationTower,
        ObjectKind::Jail,
        ObjectKind::Xanadu,
        ObjectKind::WitchsHut,
        ObjectKind::Gazebo,
        ObjectKind::Pyramid,
        ObjectKind::Oasis,
        ObjectKind::Sign,
        ObjectKind::Obelisk,
    ];

    pub fn is_action_object(self) -> bool {
        self != ObjectKind::None
    }

    /// Objects that disappear once visited.
    pub fn is_pickup(self) -> bool {
        matches!(
            self,
            ObjectKind::Resource | ObjectKind::TreasureChest | ObjectKind::Campfire | ObjectKind::Artifact
        )
    }

    /// Objects whose tile must be fought for.
    pub fn is_guarded(self) -> bool {
        matches!(self, ObjectKind::Monster | ObjectKind::Pyramid)
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Payload of the static object standing on a tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MapObject {
    None,
    Castle(CastleId),
    Monster(Troop),
    Resource { resource: Resource, amount: u32 },
    TreasureChest { gold: u32 },
    Campfire { resource: Resource, amount: u32, gold: u32 },
    Mine { resource: Resource, owner: Option<Color> },
    Artifact { value: u32 },
    Temple,
    FaerieRing,
    FreeDwelling(Troop),
    RecruitDwelling(Troop),
    MagicWell,
    ArtesianSpring,
    ObservationTower { radius: u32 },
    Jail(HeroId),
    Xanadu,
    WitchsHut(Skill),
    Gazebo,
    Pyramid(Troop),
    Oasis,
    Sign,
    Obelisk,
}

impl MapObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            MapObject::None => ObjectKind::None,
            MapObject::Castle(_) => ObjectKind::Castle,
            MapObject::Monster(_) => ObjectKind::Monster,
            MapObject::Resource { .. } => ObjectKind::Resource,
            MapObject::TreasureChest { .. } => ObjectKind::TreasureChest,
            MapObject::Campfire { .. } => ObjectKind::Campfire,
            MapObject::Mine { .. } => ObjectKind::Mine,
            MapObject::Artifact { .. } => ObjectKind::Artifact,
            MapObject::Temple => ObjectKind::Temple,
            MapObject::FaerieRing => ObjectKind::FaerieRing,
            MapObject::FreeDwelling(_) => ObjectKind::FreeDwelling,
            MapObject::RecruitDwelling(_) => ObjectKind::RecruitDwelling,
            MapObject::MagicWell => ObjectKind::MagicWell,
            MapObject::ArtesianSpring => ObjectKind::ArtesianSpring,
            MapObject::ObservationTower { .. } => ObjectKind::ObservationTower,
            MapObject::Jail(_) => ObjectKind::Jail,
            MapObject::Xanadu => ObjectKind::Xanadu,
            MapObject::WitchsHut(_) => ObjectKind::WitchsHut,
            MapObject::Gazebo => ObjectKind::Gazebo,
            MapObject::Pyramid(_) => ObjectKind::Pyramid,
            MapObject::Oasis => ObjectKind::Oasis,
            MapObject::Sign => ObjectKind::Sign,
            MapObject::Obelisk => ObjectKind::Obelisk,
        }
    }

    /// The army guarding this object, if any.
    pub fn guard(&self) -> Option<&Troop> {
        match self {
            MapObject::Monster(troop) | MapObject::Pyramid(troop) => Some(troop),
            _ => None,
        }
    }
}

// ── Heroes ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patrol {
    pub center: Position,
    pub radius: u32,
}

/// Fresh daily movement of a hero without logistics or artifacts.
pub const BASE_MOVE_POINTS: u32 = 1500;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hero {
    pub id: HeroId,
    pub name: String,
    /// `None` while jailed or waiting in the tavern pool.
    pub color: Option<Color>,
    pub control: Control,
    pub position: Position,
    pub army: Army,

    pub attack: u32,
    pub defense: u32,
    pub power: u32,
    pub knowledge: u32,
    pub skills: SecondarySkills,
    pub experience: u32,
    pub artifact_value: u32,
    pub morale: i8,
    pub luck: i8,

    pub move_points: u32,
    pub max_move_points: u32,
    pub spell_points: u32,
    pub has_spellbook: bool,
    pub knows_dimension_door: bool,
    pub knows_view_all: bool,

    pub role: Role,
    pub sleeper: bool,
    pub patrol: Option<Patrol>,
    pub met_heroes: BTreeSet<HeroId>,
    pub visited: BTreeSet<Position>,
    pub alive: bool,
}

impl Hero {
    pub fn new(id: HeroId, name: &str, color: Option<Color>, position: Position, army: Army) -> Self {
        Hero {
            id,
            name: name.to_string(),
            color,
            control: Control::Ai,
            position,
            army,
            attack: 1,
            defense: 1,
            power: 1,
            knowledge: 1,
            skills: SecondarySkills::default(),
            experience: 0,
            artifact_value: 0,
            morale: MORALE_NORMAL,
            luck: MORALE_NORMAL,
            move_points: BASE_MOVE_POINTS,
            max_move_points: BASE_MOVE_POINTS,
            spell_points: 10,
            has_spellbook: false,
            knows_dimension_door: false,
            knows_view_all: false,
            role: Role::Hunter,
            sleeper: false,
            patrol: None,
            met_heroes: BTreeSet::new(),
            visited: BTreeSet::new(),
            alive: true,
        }
    }

    pub fn max_spell_points(&self) -> u32 {
        self.knowledge * 10
    }

    /// Combat strength of the army including the hero's primary stats.
    pub fn army_strength(&self) -> f64 {
        self.army.strength() * (1.0 + 0.05 * (self.attack + self.defense) as f64)
    }

    /// Natural stats only; experience and artifacts do not count.
    pub fn stats_value(&self) -> u32 {
        self.attack + self.defense + self.power + self.knowledge + self.skills.total()
    }

    pub fn is_potent_spellcaster(&self) -> bool {
        self.has_spellbook && self.power + self.knowledge >= 6
    }

    /// Value of handing this hero's army over to `receiving`.
    pub fn meeting_value(&self, receiving: &Hero) -> f64 {
        receiving.army.reinforcement_value(&self.army) + self.artifact_value as f64 * 2.0 * SKILL_VALUE
    }

    pub fn recruit_value(&self) -> f64 {
        self.army_strength() + (self.artifact_value as f64 * 2.0 + self.stats_value() as f64) * SKILL_VALUE
    }

    pub fn is_stationary_patrol(&self) -> bool {
        matches!(self.patrol, Some(Patrol { radius: 0, .. }))
    }

    pub fn has_visited(&self, position: Position) -> bool {
        self.visited.contains(&position)
    }
}

/// Worth of a single stat point in army-strength units.
pub const SKILL_VALUE: f64 = 100.0;

// ── Castles ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Castle {
    pub id: CastleId,
    pub name: String,
    pub color: Option<Color>,
    pub position: Position,
    pub buildings: BTreeSet<Building>,
    pub garrison: Army,
    /// Troops waiting to be hired in the castle's dwellings.
    pub available: Vec<Troop>,
    pub built_today: bool,
}

impl Castle {
    /// A town becomes a castle once the castle building is bought.
    pub fn is_castle(&self) -> bool {
        self.buildings.contains(&Building::Castle)
    }

    pub fn can_build_castle(&self) -> bool {
        !self.is_castle()
    }

    pub fn has(&self, building: Building) -> bool {
        self.buildings.contains(&building)
    }

    pub fn mage_guild_level(&self) -> u8 {
        self.buildings.iter().map(|b| b.mage_guild_level()).max().unwrap_or(0)
    }

    /// Development score used to rank castles against each other.
    pub fn building_value(&self) -> u32 {
        self.buildings
            .iter()
            .map(|b| match b {
                Building::Castle => 3,
                b if b.is_dwelling() => 2,
                _ => 1,
            })
            .sum()
    }

    pub fn defensive_bonus(&self) -> f64 {
        let mut bonus = if self.is_castle() { 1.25 } else { 1.0 };
        for b in [Building::LeftTurret, Building::RightTurret, Building::Moat, Building::Captain] {
            if self.has(b) {
                bonus += 0.05;
            }
        }
        bonus
    }
}

// ── Kingdoms ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Kingdom {
    pub color: Color,
    pub control: Control,
    pub funds: Funds,
    pub heroes: Vec<HeroId>,
    pub castles: Vec<CastleId>,
    pub allies: Vec<Color>,
    /// Heroes offered in the tavern this week.
    pub recruits: Vec<HeroId>,
    pub lost: bool,
}

impl Kingdom {
    pub fn new(color: Color, control: Control) -> Self {
        Kingdom {
            color,
            control,
            funds: Funds::starting(),
            heroes: Vec::new(),
            castles: Vec::new(),
            allies: Vec::new(),
            recruits: Vec::new(),
            lost: false,
        }
    }

    /// A kingdom without castles is fighting for survival.
    pub fn is_losing(&self) -> bool {
        self.castles.is_empty()
    }
}

/// Win/loss conditions the AI must respect on behalf of the human player.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VictoryConditions {
    /// Defeating this hero wins the game for the human; AI keeps it alive.
    pub human_victory_hero: Option<HeroId>,
    /// Losing this castle loses the game for the human.
    pub human_loss_castle: Option<CastleId>,
}

pub const DAYS_PER_WEEK: u32 = 7;
pub const MAX_HEROES_PER_KINGDOM: usize = 8;

// ── Game state ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub map: Map,
    pub heroes: Vec<Hero>,
    pub castles: Vec<Castle>,
    pub kingdoms: Vec<Kingdom>,
    /// 1-based day counter.
    pub day: u32,
    pub victory: VictoryConditions,
    pub seed: u64,
}

impl GameState {
    pub fn hero(&self, id: HeroId) -> Option<&Hero> {
        self.heroes.get(id.0 as usize)
    }

    pub fn hero_mut(&mut self, id: HeroId) -> Option<&mut Hero> {
        self.heroes.get_mut(id.0 as usize)
    }

    pub fn castle(&self, id: CastleId) -> Option<&Castle> {
        self.castles.get(id.0 as usize)
    }

    pub fn castle_mut(&mut self, id: CastleId) -> Option<&mut Castle> {
        self.castles.get_mut(id.0 as usize)
    }

    pub fn kingdom(&self, color: Color) -> Option<&Kingdom> {
        self.kingdoms.iter().find(|k| k.color == color)
    }

    pub fn kingdom_mut(&mut self, color: Color) -> Option<&mut Kingdom> {
        self.kingdoms.iter_mut().find(|k| k.color == color)
    }

    pub fn hero_at(&self, position: Position) -> Option<&Hero> {
        self.map.tile(position)?.hero.and_then(|id| self.hero(id))
    }

    pub fn castle_at(&self, position: Position) -> Option<&Castle> {
        match self.map.tile(position)?.object {
            MapObject::Castle(id) => self.castle(id),
            _ => None,
        }
    }

    /// The hero standing in a castle, if any.
    pub fn castle_guest(&self, castle: &Castle) -> Option<&Hero> {
        self.hero_at(castle.position)
    }

    /// Main object kind of a tile: a hero on top hides what is under it.
    pub fn object_kind(&self, position: Position) -> ObjectKind {
        match self.map.tile(position) {
            Some(tile) if tile.hero.is_some() => ObjectKind::Hero,
            Some(tile) => tile.object.kind(),
            None => ObjectKind::None,
        }
    }

    pub fn object_kind_under_hero(&self, position: Position) -> ObjectKind {
        self.map.tile(position).map(|t| t.object.kind()).unwrap_or(ObjectKind::None)
    }

    /// Same color or allied.
    pub fn is_friend(&self, color: Color, other: Option<Color>) -> bool {
        match other {
            Some(other) if other == color => true,
            Some(other) => self.kingdom(color).map(|k| k.allies.contains(&other)).unwrap_or(false),
            None => false,
        }
    }

    pub fn is_last_day_of_week(&self) -> bool {
        self.day % DAYS_PER_WEEK == 0
    }

    /// Day within the current week, 1..=7.
    pub fn day_of_week(&self) -> u32 {
        (self.day - 1) % DAYS_PER_WEEK + 1
    }

    /// Defending strength of a castle: garrison plus guest hero.
    pub fn garrison_strength(&self, castle: &Castle) -> f64 {
        let guest = self.castle_guest(castle).map(|h| h.army_strength()).unwrap_or(0.0);
        (castle.garrison.strength() + guest) * castle.defensive_bonus()
    }

    /// Total strength of whatever army occupies a tile.
    pub fn tile_army_strength(&self, position: Position) -> f64 {
        let Some(tile) = self.map.tile(position) else { return 0.0 };
        if let Some(hero) = tile.hero.and_then(|id| self.hero(id)) {
            return match self.castle_at(position) {
                Some(castle) => self.garrison_strength(castle),
                None => hero.army_strength(),
            };
        }
        match &tile.object {
            MapObject::Castle(id) => self.castle(*id).map(|c| self.garrison_strength(c)).unwrap_or(0.0),
            other => other.guard().map(|t| t.strength()).unwrap_or(0.0),
        }
    }

    pub fn living_heroes(&self, color: Color) -> impl Iterator<Item = &Hero> {
        self.kingdom(color)
            .map(|k| k.heroes.as_slice())
            .unwrap_or(&[])
            .iter()
            .filter_map(move |&id| self.hero(id))
            .filter(|h| h.alive)
    }
}
