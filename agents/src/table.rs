// ═══════════════════════════════════════════════════════════════════════
// Object Table — static scoring data for every action-object category
//
// `entry()` is an exhaustive match, so a new category cannot be added to
// the engine without a scoring row here. The rows are materialized into
// an array the first time they are needed and indexed by category.
// ═══════════════════════════════════════════════════════════════════════

use conquest_engine::ObjectKind;
use std::sync::OnceLock;

/// Flat courier values, named after roughly how far a courier would
/// walk for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourierTier {
    TwoTiles,
    FiveTiles,
    TenTiles,
}

impl CourierTier {
    pub fn value(self) -> f64 {
        match self {
            CourierTier::TwoTiles => 500.0,
            CourierTier::FiveTiles => 1400.0,
            CourierTier::TenTiles => 3000.0,
        }
    }
}

/// How the general scorer turns a category into a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Castle,
    Hero,
    Monster,
    Mine,
    Artifact,
    ResourcePile,
    TreasureChest,
    Campfire,
    Morale,
    Luck,
    FreeDwelling,
    RecruitDwelling,
    /// Refills spell points; `double` restores up to twice the maximum.
    SpellPoints { double: bool },
    ObservationTower,
    /// Worth the base value every time.
    Flat,
    /// Worth the base value until this hero has been there.
    OncePerHero,
    Oasis,
    /// Nothing an AI hero can use.
    Useless,
    /// Placeholder for an empty tile.
    Nothing,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectEntry {
    pub kind: ObjectKind,
    pub rule: Rule,
    pub base: f64,
    /// Multiplies the path distance before discounting.
    pub distance_modifier: f64,
    /// Flat fighter value replacing `base`.
    pub fighter: Option<f64>,
    pub courier: Option<CourierTier>,
}

const fn row(kind: ObjectKind, rule: Rule, base: f64, distance_modifier: f64) -> ObjectEntry {
    ObjectEntry { kind, rule, base, distance_modifier, fighter: None, courier: None }
}

const fn with_fighter(entry: ObjectEntry, value: f64) -> ObjectEntry {
    ObjectEntry { fighter: Some(value), ..entry }
}

const fn with_courier(entry: ObjectEntry, tier: CourierTier) -> ObjectEntry {
    ObjectEntry { courier: Some(tier), ..entry }
}

pub fn entry(kind: ObjectKind) -> ObjectEntry {
    use CourierTier::*;
    use ObjectKind as K;
    match kind {
        K::None => row(kind, Rule::Nothing, 0.0, 1.0),
        K::Castle => row(kind, Rule::Castle, 3000.0, 0.8),
        K::Hero => with_courier(row(kind, Rule::Hero, 5000.0, 0.9), TenTiles),
        K::Monster => row(kind, Rule::Monster, 1000.0, 1.0),
        K::Resource => with_courier(row(kind, Rule::ResourcePile, 0.0, 0.95), TwoTiles),
        K::TreasureChest => with_courier(row(kind, Rule::TreasureChest, 1500.0, 0.95), TwoTiles),
        K::Campfire => with_courier(row(kind, Rule::Campfire, 400.0, 0.95), TwoTiles),
        K::Mine => with_courier(row(kind, Rule::Mine, 0.0, 0.9), FiveTiles),
        K::Artifact => with_courier(with_fighter(row(kind, Rule::Artifact, 1000.0, 0.9), 1500.0), TwoTiles),
        K::Temple => row(kind, Rule::Morale, 0.0, 1.1),
        K::FaerieRing => row(kind, Rule::Luck, 0.0, 1.1),
        K::FreeDwelling => row(kind, Rule::FreeDwelling, 0.0, 1.0),
        K::RecruitDwelling => row(kind, Rule::RecruitDwelling, 0.0, 1.0),
        K::MagicWell => with_courier(with_fighter(row(kind, Rule::SpellPoints { double: false }, 1500.0, 1.0), 2000.0), FiveTiles),
        K::ArtesianSpring => with_courier(with_fighter(row(kind, Rule::SpellPoints { double: true }, 1500.0, 1.0), 2000.0), FiveTiles),
        K::ObservationTower => row(kind, Rule::ObservationTower, 0.0, 1.0),
        K::Jail => row(kind, Rule::Flat, 3000.0, 1.0),
        K::Xanadu => with_courier(with_fighter(row(kind, Rule::Flat, 3000.0, 1.0), 3500.0), FiveTiles),
        K::WitchsHut => with_courier(with_fighter(row(kind, Rule::OncePerHero, 500.0, 1.0), 1250.0), FiveTiles),
        K::Gazebo => row(kind, Rule::OncePerHero, 1000.0, 1.0),
        K::Pyramid => with_fighter(row(kind, Rule::Flat, 1500.0, 1.0), 10000.0),
        K::Oasis => row(kind, Rule::Oasis, 0.0, 1.0),
        K::Sign => row(kind, Rule::Useless, 0.0, 1.0),
        K::Obelisk => row(kind, Rule::Useless, 0.0, 1.0),
    }
}

const TABLE_SIZE: usize = ObjectKind::ALL.len() + 1;

static TABLE: OnceLock<[ObjectEntry; TABLE_SIZE]> = OnceLock::new();

/// Scoring row of a category.
pub fn lookup(kind: ObjectKind) -> &'static ObjectEntry {
    let table = TABLE.get_or_init(|| {
        let mut rows = [entry(ObjectKind::None); TABLE_SIZE];
        for kind in ObjectKind::ALL {
            rows[kind as usize] = entry(kind);
        }
        rows
    });
    &table[kind as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category_has_its_own_row() {
        for kind in ObjectKind::ALL {
            let row = lookup(kind);
            assert_eq!(row.kind, kind);
            assert_ne!(row.rule, Rule::Nothing, "{kind} has no scoring rule");
            assert!(row.distance_modifier > 0.0);
        }
    }

    #[test]
    fn distance_modifiers_by_category() {
        assert_eq!(lookup(ObjectKind::Castle).distance_modifier, 0.8);
        assert_eq!(lookup(ObjectKind::Mine).distance_modifier, 0.9);
        assert_eq!(lookup(ObjectKind::Campfire).distance_modifier, 0.95);
        assert_eq!(lookup(ObjectKind::FaerieRing).distance_modifier, 1.1);
        assert_eq!(lookup(ObjectKind::Oasis).distance_modifier, 1.0);
    }

    #[test]
    fn courier_tiers_are_ordered() {
        assert!(CourierTier::TwoTiles.value() < CourierTier::FiveTiles.value());
        assert!(CourierTier::FiveTiles.value() < CourierTier::TenTiles.value());
    }
}
