//! Player representation

use crate::core::{
    ActionCard, AmmoPool, OwnedWeapon, PlayerBoard, PlayerId, PlayerName, PowerUpCard, PowerUpKind,
    WeaponId,
};
use serde::{Deserialize, Serialize};

/// Power-ups a player may hold at once
pub const MAX_POWER_UPS: usize = 3;

/// Weapons a player may hold at once
pub const MAX_WEAPONS: usize = 3;

/// Represents a player in the match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Seat, also the turn order
    pub id: PlayerId,

    pub name: PlayerName,

    pub score: u32,

    /// Kills performed over the whole match
    pub kills: u32,

    /// Overkills performed over the whole match
    pub overkills: u32,

    pub action_card: ActionCard,

    pub ammo: AmmoPool,

    pub weapons: Vec<OwnedWeapon>,

    pub power_ups: Vec<PowerUpCard>,

    pub board: PlayerBoard,

    /// False once the player disconnected or was removed
    pub connected: bool,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<PlayerName>) -> Self {
        Player {
            id,
            name: name.into(),
            score: 0,
            kills: 0,
            overkills: 0,
            action_card: ActionCard::regular(),
            ammo: AmmoPool::starting(),
            weapons: Vec::with_capacity(MAX_WEAPONS),
            power_ups: Vec::with_capacity(MAX_POWER_UPS),
            board: PlayerBoard::new(),
            connected: true,
        }
    }

    pub fn add_points(&mut self, points: u32) {
        self.score += points;
    }

    pub fn power_ups_full(&self) -> bool {
        self.power_ups.len() >= MAX_POWER_UPS
    }

    pub fn weapons_full(&self) -> bool {
        self.weapons.len() >= MAX_WEAPONS
    }

    pub fn has_power_up(&self, kind: PowerUpKind) -> bool {
        self.power_ups.iter().any(|p| p.kind == kind)
    }

    /// Remove and return the power-up at `index`
    pub fn take_power_up(&mut self, index: usize) -> Option<PowerUpCard> {
        if index < self.power_ups.len() {
            Some(self.power_ups.remove(index))
        } else {
            None
        }
    }

    pub fn loaded_weapons(&self) -> Vec<WeaponId> {
        self.weapons
            .iter()
            .filter(|w| w.loaded)
            .map(|w| w.id.clone())
            .collect()
    }

    pub fn unloaded_weapons(&self) -> Vec<WeaponId> {
        self.weapons
            .iter()
            .filter(|w| !w.loaded)
            .map(|w| w.id.clone())
            .collect()
    }

    pub fn set_loaded(&mut self, weapon: &WeaponId, loaded: bool) -> bool {
        match self.weapons.iter_mut().find(|w| &w.id == weapon) {
            Some(w) => {
                w.loaded = loaded;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AmmoColor, CardId};

    #[test]
    fn test_new_player() {
        let player = Player::new(PlayerId::new(0), "Sprog");
        assert_eq!(player.score, 0);
        assert_eq!(player.ammo, AmmoPool::starting());
        assert!(player.connected);
        assert!(player.weapons.is_empty());
    }

    #[test]
    fn test_weapon_loading() {
        let mut player = Player::new(PlayerId::new(0), "Sprog");
        player.weapons.push(OwnedWeapon::loaded(WeaponId::from("whisper")));
        player.weapons.push(OwnedWeapon {
            id: WeaponId::from("thor"),
            loaded: false,
        });
        assert_eq!(player.loaded_weapons(), vec![WeaponId::from("whisper")]);
        assert!(player.set_loaded(&WeaponId::from("thor"), true));
        assert!(player.unloaded_weapons().is_empty());
        assert!(!player.set_loaded(&WeaponId::from("zx2"), true));
    }

    #[test]
    fn test_power_up_inventory() {
        let mut player = Player::new(PlayerId::new(1), "Dozer");
        for i in 0..MAX_POWER_UPS {
            player.power_ups.push(PowerUpCard {
                id: CardId::new(i as u32),
                kind: PowerUpKind::Newton,
                color: AmmoColor::Red,
            });
        }
        assert!(player.power_ups_full());
        assert!(player.has_power_up(PowerUpKind::Newton));
        assert!(!player.has_power_up(PowerUpKind::Teleporter));
        assert_eq!(player.take_power_up(0).map(|c| c.id), Some(CardId::new(0)));
        assert!(player.take_power_up(5).is_none());
    }
}
