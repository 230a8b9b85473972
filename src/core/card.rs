//! Card definitions: weapons, power-ups and ammo tiles

use crate::core::{AmmoColor, AmmoCost, CardId, WeaponEffects, WeaponId};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Single-use power-up cards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    /// While shooting: pay one cube for +1 damage on a target you hit
    TargetingScope,
    /// On your turn: move another player up to 2 squares in one direction
    Newton,
    /// When damaged: mark the shooter if you can see them
    TagbackGrenade,
    /// On your turn: move anywhere
    Teleporter,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 4] = [
        PowerUpKind::TargetingScope,
        PowerUpKind::Newton,
        PowerUpKind::TagbackGrenade,
        PowerUpKind::Teleporter,
    ];

    /// Can this be played from the turn menu?
    pub fn usable_on_own_turn(&self) -> bool {
        matches!(self, PowerUpKind::Newton | PowerUpKind::Teleporter)
    }

    pub fn name(&self) -> &'static str {
        match self {
            PowerUpKind::TargetingScope => "Targeting Scope",
            PowerUpKind::Newton => "Newton",
            PowerUpKind::TagbackGrenade => "Tagback Grenade",
            PowerUpKind::Teleporter => "Teleporter",
        }
    }
}

impl fmt::Display for PowerUpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerUpCard {
    pub id: CardId,
    pub kind: PowerUpKind,
    pub color: AmmoColor,
}

impl fmt::Display for PowerUpCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.kind, self.color)
    }
}

/// Ammo tile lying on an ammo square
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmmoTile {
    pub id: CardId,
    pub ammo: SmallVec<[AmmoColor; 3]>,
    /// Tile also grants a power-up draw
    pub power_up: bool,
}

impl fmt::Display for AmmoTile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for color in &self.ammo {
            write!(f, "{}", color)?;
        }
        if self.power_up {
            write!(f, "+P")?;
        }
        Ok(())
    }
}

/// Weapon definition
#[derive(Debug, Clone)]
pub struct WeaponCard {
    pub id: WeaponId,
    pub name: String,
    /// Color of the pre-loaded cube, not paid on purchase
    pub color: AmmoColor,
    pub reload_cost: AmmoCost,
    pub effects: WeaponEffects,
}

impl WeaponCard {
    pub fn purchase_cost(&self) -> AmmoCost {
        self.reload_cost.without_one(self.color)
    }
}

/// A weapon in a player's hand
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedWeapon {
    pub id: WeaponId,
    pub loaded: bool,
}

impl OwnedWeapon {
    /// Bought weapons arrive loaded
    pub fn loaded(id: WeaponId) -> Self {
        OwnedWeapon { id, loaded: true }
    }
}
