//! Card catalog: the weapon, power-up and ammo-tile definitions for a match
//!
//! The catalog is handed to the match controller at construction time, so a
//! match owns the definitions it plays with.

use crate::core::{
    AmmoColor, AmmoCost, AmmoTile, Area, CardId, EffectDef, EffectGraph, EffectStep, PowerUpCard,
    PowerUpKind, TargetRule, TargetSpec, WeaponCard, WeaponEffects, WeaponId,
};
use crate::{EngineError, Result};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

#[derive(Debug, Clone)]
pub struct CardCatalog {
    weapons: Vec<WeaponCard>,
    index: FxHashMap<WeaponId, usize>,
    power_ups: Vec<PowerUpCard>,
    ammo_tiles: Vec<AmmoTile>,
}

impl CardCatalog {
    /// Build a catalog, rejecting duplicate weapons and effect graphs
    /// without a base effect.
    pub fn new(
        weapons: Vec<WeaponCard>,
        power_ups: Vec<PowerUpCard>,
        ammo_tiles: Vec<AmmoTile>,
    ) -> Result<Self> {
        let mut index = FxHashMap::default();
        for (i, weapon) in weapons.iter().enumerate() {
            if index.insert(weapon.id.clone(), i).is_some() {
                return Err(EngineError::Config(format!("duplicate weapon '{}'", weapon.id)));
            }
            if let WeaponEffects::Graph(graph) = &weapon.effects {
                if graph.base().is_none() {
                    return Err(EngineError::Config(format!(
                        "weapon '{}' has no base effect",
                        weapon.id
                    )));
                }
            }
        }
        Ok(CardCatalog {
            weapons,
            index,
            power_ups,
            ammo_tiles,
        })
    }

    /// The stock card set
    pub fn standard() -> Result<Self> {
        Self::new(standard_weapons()?, standard_power_ups(), standard_ammo_tiles())
    }

    pub fn weapon(&self, id: &WeaponId) -> Option<&WeaponCard> {
        self.index.get(id).map(|i| &self.weapons[*i])
    }

    pub fn weapons(&self) -> &[WeaponCard] {
        &self.weapons
    }

    pub fn weapon_ids(&self) -> Vec<WeaponId> {
        self.weapons.iter().map(|w| w.id.clone()).collect()
    }

    pub fn power_ups(&self) -> &[PowerUpCard] {
        &self.power_ups
    }

    pub fn ammo_tiles(&self) -> &[AmmoTile] {
        &self.ammo_tiles
    }
}

fn weapon(id: &str, name: &str, color: AmmoColor, reload: &str, effects: WeaponEffects) -> WeaponCard {
    WeaponCard {
        id: WeaponId::from(id),
        name: name.to_string(),
        color,
        reload_cost: AmmoCost::from_string(reload),
        effects,
    }
}

fn visible(max: u8) -> TargetSpec {
    TargetSpec::up_to(TargetRule::Visible, max)
}

fn standard_weapons() -> Result<Vec<WeaponCard>> {
    use AmmoColor::*;
    use TargetRule::*;

    let lock_rifle = EffectGraph::new()
        .with_base(EffectDef::new("basic", "basic effect", "").strike(2, 1, visible(1)))?
        .with_optional(
            EffectDef::new("second_lock", "with second lock", "R")
                .strike(0, 1, TargetSpec::one(FreshVisible)),
            &["basic"],
        )?;

    let machine_gun = EffectGraph::new()
        .with_base(EffectDef::new("basic", "basic effect", "").strike(1, 0, visible(2)))?
        .with_optional(
            EffectDef::new("focus_shot", "with focus shot", "Y")
                .strike(1, 0, TargetSpec::one(PreviousTarget)),
            &["basic"],
        )?
        .with_optional(
            EffectDef::new("turret_tripod", "with turret tripod", "B")
                .strike(1, 0, TargetSpec::one(FreshVisible)),
            &["basic"],
        )?;

    let thor = EffectGraph::new()
        .with_base(EffectDef::new("basic", "basic effect", "").strike(2, 0, visible(1)))?
        .with_optional(
            EffectDef::new("chain_reaction", "with chain reaction", "B")
                .strike(1, 0, TargetSpec::one(FreshVisible)),
            &["basic"],
        )?
        .with_optional(
            EffectDef::new("high_voltage", "with high voltage", "B")
                .strike(2, 0, TargetSpec::one(FreshVisible)),
            &["chain_reaction"],
        )?;

    let plasma_gun = EffectGraph::new()
        .with_base(EffectDef::new("basic", "basic effect", "").strike(2, 0, visible(1)))?
        .with_optional(
            EffectDef::new("phase_glide", "with phase glide", "").step(EffectStep::MoveSelf { max: 2 }),
            &[],
        )?
        .with_optional(
            EffectDef::new("charged_shot", "with charged shot", "B")
                .strike(1, 0, TargetSpec::one(PreviousTarget)),
            &["basic"],
        )?;

    let cyberblade = EffectGraph::new()
        .with_base(
            EffectDef::new("basic", "basic effect", "").strike(2, 0, TargetSpec::one(SameSquare)),
        )?
        .with_optional(
            EffectDef::new("shadowstep", "with shadowstep", "").step(EffectStep::MoveSelf { max: 1 }),
            &[],
        )?
        .with_optional(
            EffectDef::new("slice_and_dice", "with slice and dice", "Y")
                .strike(2, 0, TargetSpec::one(FreshSameSquare)),
            &["basic"],
        )?;

    let grenade_launcher = EffectGraph::new()
        .with_base(
            EffectDef::new("basic", "basic effect", "")
                .strike(1, 0, visible(1))
                .step(EffectStep::PushTarget { max: 1 }),
        )?
        .with_optional(
            EffectDef::new("extra_grenade", "with extra grenade", "R").step(EffectStep::StrikeArea {
                damage: 1,
                marks: 0,
                area: Area::VisibleSquare,
            }),
            &["basic"],
        )?;

    let area = |id: &str, name: &str, cost: &str, damage: u8| {
        EffectDef::new(id, name, cost).step(EffectStep::StrikeArea {
            damage,
            marks: 0,
            area: Area::OwnSquare,
        })
    };

    Ok(vec![
        weapon("lock_rifle", "Lock Rifle", Blue, "BB", WeaponEffects::Graph(lock_rifle)),
        weapon("machine_gun", "Machine Gun", Blue, "BR", WeaponEffects::Graph(machine_gun)),
        weapon("thor", "T.H.O.R.", Blue, "BR", WeaponEffects::Graph(thor)),
        weapon("plasma_gun", "Plasma Gun", Blue, "BY", WeaponEffects::Graph(plasma_gun)),
        weapon(
            "whisper",
            "Whisper",
            Blue,
            "BBY",
            WeaponEffects::modes(vec![EffectDef::new("basic", "effect", "")
                .strike(3, 1, TargetSpec::one(VisibleAtLeast(2)))])?,
        ),
        weapon(
            "electroscythe",
            "Electroscythe",
            Blue,
            "B",
            WeaponEffects::modes(vec![
                area("basic", "basic mode", "", 1),
                area("reaper", "in reaper mode", "BR", 2),
            ])?,
        ),
        weapon(
            "heatseeker",
            "Heatseeker",
            Red,
            "RRY",
            WeaponEffects::modes(vec![EffectDef::new("basic", "effect", "")
                .strike(3, 0, TargetSpec::one(NotVisible))])?,
        ),
        weapon(
            "grenade_launcher",
            "Grenade Launcher",
            Red,
            "R",
            WeaponEffects::Graph(grenade_launcher),
        ),
        weapon(
            "shotgun",
            "Shotgun",
            Yellow,
            "YY",
            WeaponEffects::modes(vec![
                EffectDef::new("basic", "basic mode", "")
                    .strike(3, 0, TargetSpec::one(SameSquare))
                    .step(EffectStep::PushTarget { max: 1 }),
                EffectDef::new("long_barrel", "in long barrel mode", "")
                    .strike(2, 0, TargetSpec::one(AtDistance(1))),
            ])?,
        ),
        weapon(
            "sledgehammer",
            "Sledgehammer",
            Yellow,
            "Y",
            WeaponEffects::modes(vec![
                EffectDef::new("basic", "basic mode", "").strike(2, 0, TargetSpec::one(SameSquare)),
                EffectDef::new("pulverize", "in pulverize mode", "R")
                    .strike(3, 0, TargetSpec::one(SameSquare))
                    .step(EffectStep::PushTarget { max: 2 }),
            ])?,
        ),
        weapon(
            "zx2",
            "ZX-2",
            Yellow,
            "YR",
            WeaponEffects::modes(vec![
                EffectDef::new("basic", "basic mode", "").strike(1, 2, visible(1)),
                EffectDef::new("scanner", "in scanner mode", "").strike(0, 1, visible(3)),
            ])?,
        ),
        weapon("cyberblade", "Cyberblade", Yellow, "YR", WeaponEffects::Graph(cyberblade)),
    ])
}

fn standard_power_ups() -> Vec<PowerUpCard> {
    let mut cards = Vec::with_capacity(24);
    let mut next = 0;
    for kind in PowerUpKind::ALL {
        for color in AmmoColor::ALL {
            for _ in 0..2 {
                cards.push(PowerUpCard {
                    id: CardId::new(next),
                    kind,
                    color,
                });
                next += 1;
            }
        }
    }
    cards
}

fn standard_ammo_tiles() -> Vec<AmmoTile> {
    use AmmoColor::*;
    // (cubes, power-up, copies)
    let layout: [(&[AmmoColor], bool, usize); 12] = [
        (&[Yellow, Blue, Blue], false, 3),
        (&[Yellow, Red, Red], false, 3),
        (&[Red, Blue, Blue], false, 3),
        (&[Red, Yellow, Yellow], false, 3),
        (&[Blue, Yellow, Yellow], false, 3),
        (&[Blue, Red, Red], false, 3),
        (&[Red, Red], true, 2),
        (&[Blue, Blue], true, 2),
        (&[Yellow, Yellow], true, 2),
        (&[Red, Blue], true, 4),
        (&[Red, Yellow], true, 4),
        (&[Blue, Yellow], true, 4),
    ];

    let mut tiles = Vec::with_capacity(36);
    let mut next = 0;
    for (cubes, power_up, copies) in layout {
        for _ in 0..copies {
            tiles.push(AmmoTile {
                id: CardId::new(next),
                ammo: SmallVec::from_slice(cubes),
                power_up,
            });
            next += 1;
        }
    }
    tiles
}
