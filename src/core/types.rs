//! Strongly-typed wrappers for game concepts
//!
//! Newtypes keep player seats, card instances, weapon definitions and effect
//! identifiers from being mixed up with each other or with bare integers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Seat of a player in the match (0-based, also the turn order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(u32);

impl PlayerId {
    pub fn new(id: u32) -> Self {
        PlayerId(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Identity of a physical card (power-up or ammo tile) inside a stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardId(u32);

impl CardId {
    pub fn new(id: u32) -> Self {
        CardId(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Weapon definition key (e.g. "lock_rifle")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeaponId(String);

impl WeaponId {
    pub fn new(s: impl Into<String>) -> Self {
        WeaponId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WeaponId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for WeaponId {
    fn from(s: &str) -> Self {
        WeaponId(s.to_string())
    }
}

/// Effect key, unique within one weapon (e.g. "basic", "second_lock")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectId(String);

impl EffectId {
    pub fn new(s: impl Into<String>) -> Self {
        EffectId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EffectId {
    fn from(s: &str) -> Self {
        EffectId(s.to_string())
    }
}

/// Player name (distinct from other string types)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerName(String);

impl PlayerName {
    pub fn new(s: impl Into<String>) -> Self {
        PlayerName(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PlayerName {
    fn from(s: String) -> Self {
        PlayerName(s)
    }
}

impl From<&str> for PlayerName {
    fn from(s: &str) -> Self {
        PlayerName(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id() {
        let id = PlayerId::new(2);
        assert_eq!(id.index(), 2);
        assert_eq!(id.to_string(), "P2");
        assert!(PlayerId::new(1) < id);
    }

    #[test]
    fn test_weapon_and_effect_ids() {
        let weapon = WeaponId::from("lock_rifle");
        assert_eq!(weapon.as_str(), "lock_rifle");
        let effect = EffectId::new("second_lock");
        assert_eq!(effect.to_string(), "second_lock");
    }

    #[test]
    fn test_player_name() {
        let name = PlayerName::new("Violet");
        assert_eq!(name.as_str(), "Violet");
    }
}
