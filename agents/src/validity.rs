// ═══════════════════════════════════════════════════════════════════════
// Target Validity — whether a hero may pick an object at all
//
// Runs before valuation. Allied property, the hero the human must
// defeat, objects that give this hero nothing, and fights the hero
// cannot win under the current danger multiplier are all filtered here.
// ═══════════════════════════════════════════════════════════════════════

use crate::cache::{target_army_strength, StrengthCache};
use crate::host::WorldHost;
use crate::valuation::{joining_threshold, Valuation};
use conquest_engine::engine::OASIS_MOVE_BONUS;
use conquest_engine::*;

impl<'a, W: WorldHost> Valuation<'a, W> {
    /// Strength multiplier a fight must clear right now.
    fn danger_multiplier(&self) -> f64 {
        if self.kingdom_losing() {
            1.0
        } else {
            self.ctx.knobs.army_advantage
        }
    }

    fn can_beat(&self, hero: &Hero, defender: f64) -> bool {
        hero.army_strength() > defender * self.danger_multiplier()
    }

    fn castle_is_valid(&self, hero: &Hero, castle: &Castle) -> bool {
        if castle.color == hero.color {
            return match self.world.castle_guest(castle) {
                None => true,
                Some(guest) => guest.id != hero.id && guest.army_strength() < hero.army_strength(),
            };
        }
        if self.world.is_friend(self.ctx.color, castle.color) {
            return false;
        }
        let guest = self.world.castle_guest(castle);
        if guest.is_some_and(|g| self.world.victory().human_victory_hero == Some(g.id)) {
            return false;
        }
        self.can_beat(hero, self.world.garrison_strength(castle))
    }

    pub fn is_valid_target(&self, cache: &mut StrengthCache, hero: &Hero, position: Position, distance: u32) -> bool {
        if position == hero.position {
            return false;
        }
        let kind = self.world.object_kind(position);
        let object = self.world.map_object(position);
        let visited = hero.has_visited(position);

        match kind {
            ObjectKind::None | ObjectKind::Sign | ObjectKind::Obelisk => false,
            ObjectKind::Resource | ObjectKind::TreasureChest | ObjectKind::Campfire | ObjectKind::Artifact => true,
            ObjectKind::Castle => self.world.castle_at(position).is_some_and(|c| self.castle_is_valid(hero, c)),
            ObjectKind::Hero => {
                let Some(other) = self.world.hero_at(position) else { return false };
                if other.color == hero.color {
                    return !hero.met_heroes.contains(&other.id) && self.world.castle_at(position).is_none();
                }
                if self.world.is_friend(self.ctx.color, other.color) {
                    return false;
                }
                if self.world.victory().human_victory_hero == Some(other.id) {
                    return false;
                }
                match self.world.castle_at(position) {
                    Some(castle) => self.castle_is_valid(hero, castle),
                    None => self.can_beat(hero, other.army_strength()),
                }
            }
            ObjectKind::Monster => {
                let strength = target_army_strength(self.world, cache, position, kind);
                self.can_beat(hero, strength)
            }
            ObjectKind::Pyramid => {
                let guard = object.and_then(|o| o.guard()).map(|t| t.strength()).unwrap_or(0.0);
                !visited && hero.army_strength() > guard * self.config.advantage.large
            }
            ObjectKind::Mine => match object {
                Some(MapObject::Mine { owner, .. }) => !self.world.is_friend(self.ctx.color, *owner),
                _ => false,
            },
            ObjectKind::Temple => !visited && hero.morale < MORALE_MAX && !hero.army.all_undead(),
            ObjectKind::FaerieRing => !visited && hero.luck < MORALE_MAX,
            ObjectKind::ObservationTower => match object {
                Some(MapObject::ObservationTower { radius }) => {
                    self.world.fog_reveal_count(self.ctx.color, position, *radius) > 0
                }
                _ => false,
            },
            ObjectKind::Gazebo | ObjectKind::Xanadu | ObjectKind::WitchsHut => !visited,
            ObjectKind::Oasis => !visited && 2 * distance < OASIS_MOVE_BONUS,
            ObjectKind::MagicWell => !visited && hero.has_spellbook && hero.spell_points < hero.max_spell_points(),
            ObjectKind::ArtesianSpring => hero.has_spellbook && hero.spell_points < hero.max_spell_points() * 2,
            ObjectKind::FreeDwelling => match object {
                Some(MapObject::FreeDwelling(troop)) => {
                    troop.count > 0
                        && hero.army.can_join(troop.monster)
                        && troop.strength() > joining_threshold(hero, troop.monster)
                }
                _ => false,
            },
            ObjectKind::RecruitDwelling => match object {
                Some(MapObject::RecruitDwelling(troop)) => {
                    let funds = self.world.kingdom(self.ctx.color).map(|k| k.funds).unwrap_or_default();
                    let count = funds.times(&Funds::gold(troop.monster.def().gold_cost)).min(troop.count);
                    count > 0
                        && hero.army.can_join(troop.monster)
                        && Troop::new(troop.monster, count).strength() > joining_threshold(hero, troop.monster)
                }
                _ => false,
            },
            ObjectKind::Jail => self.world.kingdom_heroes(self.ctx.color).len() < MAX_HEROES_PER_KINGDOM,
        }
    }
}
