// ═══════════════════════════════════════════════════════════════════════
// Monster definitions — static stat table for every creature
// ═══════════════════════════════════════════════════════════════════════

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Monster {
    Peasant,
    Archer,
    Pikeman,
    Swordsman,
    Cavalry,
    Paladin,
    Goblin,
    Orc,
    Wolf,
    Ogre,
    Troll,
    Skeleton,
    Zombie,
    Vampire,
    Sprite,
    Unicorn,
    Phoenix,
    Dragon,
}

/// Static creature stats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonsterDef {
    pub name: &'static str,
    pub level: u8,
    pub hit_points: u32,
    pub attack: u32,
    pub defense: u32,
    pub damage: (u32, u32),
    pub speed: u8,
    pub gold_cost: u32,
    pub weekly_growth: u32,
    pub undead: bool,
}

const fn def(
    name: &'static str,
    level: u8,
    hit_points: u32,
    attack: u32,
    defense: u32,
    damage: (u32, u32),
    speed: u8,
    gold_cost: u32,
    weekly_growth: u32,
    undead: bool,
) -> MonsterDef {
    MonsterDef { name, level, hit_points, attack, defense, damage, speed, gold_cost, weekly_growth, undead }
}

pub static MONSTERS: [MonsterDef; 18] = [
    def("Peasant", 1, 1, 1, 1, (1, 1), 2, 20, 12, false),
    def("Archer", 2, 10, 5, 3, (2, 3), 2, 150, 8, false),
    def("Pikeman", 2, 15, 5, 9, (3, 4), 3, 200, 6, false),
    def("Swordsman", 3, 25, 7, 9, (4, 6), 3, 250, 4, false),
    def("Cavalry", 4, 30, 10, 9, (5, 10), 5, 300, 3, false),
    def("Paladin", 5, 50, 11, 12, (10, 20), 4, 600, 2, false),
    def("Goblin", 1, 3, 3, 1, (1, 2), 3, 40, 10, false),
    def("Orc", 2, 10, 3, 4, (2, 3), 2, 140, 8, false),
    def("Wolf", 3, 20, 6, 2, (3, 5), 6, 200, 5, false),
    def("Ogre", 4, 40, 9, 5, (4, 6), 2, 300, 3, false),
    def("Troll", 5, 40, 10, 5, (5, 7), 3, 600, 2, false),
    def("Skeleton", 1, 4, 4, 3, (2, 3), 3, 75, 8, true),
    def("Zombie", 2, 15, 5, 2, (2, 3), 1, 150, 6, true),
    def("Vampire", 4, 30, 8, 6, (5, 7), 4, 500, 3, true),
    def("Sprite", 1, 2, 4, 2, (1, 2), 4, 50, 8, false),
    def("Unicorn", 4, 40, 10, 9, (7, 14), 4, 500, 2, false),
    def("Phoenix", 5, 100, 12, 10, (20, 40), 6, 1500, 1, false),
    def("Dragon", 6, 200, 12, 12, (25, 50), 4, 3000, 1, false),
];

impl Monster {
    pub const ALL: [Monster; 18] = [
        Monster::Peasant,
        Monster::Archer,
        Monster::Pikeman,
        Monster::Swordsman,
        Monster::Cavalry,
        Monster::Paladin,
        Monster::Goblin,
        Monster::Orc,
        Monster::Wolf,
        Monster::Ogre,
        Monster::Troll,
        Monster::Skeleton,
        Monster::Zombie,
        Monster::Vampire,
        Monster::Sprite,
        Monster::Unicorn,
        Monster::Phoenix,
        Monster::Dragon,
    ];

    pub fn def(self) -> &'static MonsterDef {
        &MONSTERS[self as usize]
    }

    /// Combat strength of a single creature.
    pub fn strength(self) -> f64 {
        let d = self.def();
        let avg_damage = (d.damage.0 + d.damage.1) as f64 / 2.0;
        let stat_factor = 1.0 + 0.05 * (d.attack + d.defense) as f64;
        let speed_factor = 1.0 + 0.05 * d.speed as f64;
        (d.hit_points as f64 * avg_damage).sqrt() * stat_factor * speed_factor
    }

    pub fn is_undead(self) -> bool {
        self.def().undead
    }

    /// Monsters a castle can hire, one per dwelling tier.
    pub fn castle_lineup(tier: u8) -> Monster {
        match tier {
            1 => Monster::Peasant,
            2 => Monster::Archer,
            3 => Monster::Swordsman,
            _ => Monster::Cavalry,
        }
    }
}

impl std::fmt::Display for Monster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.def().name)
    }
}
