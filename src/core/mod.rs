//! Core game types: plain data with no knowledge of turns or players' channels

pub mod action;
pub mod ammo;
pub mod card;
pub mod catalog;
pub mod effects;
pub mod player;
pub mod player_board;
pub mod types;

pub use action::{Action, ActionCard, ActionCardKind, BasicStep};
pub use ammo::{AmmoColor, AmmoCost, AmmoPool, PaymentError, MAX_AMMO_PER_COLOR};
pub use card::{AmmoTile, OwnedWeapon, PowerUpCard, PowerUpKind, WeaponCard};
pub use catalog::CardCatalog;
pub use effects::{Area, EffectDef, EffectGraph, EffectStep, TargetRule, TargetSpec, WeaponEffects};
pub use player::{Player, MAX_POWER_UPS, MAX_WEAPONS};
pub use player_board::{
    BoardError, BoardSide, PlayerBoard, FRENZY_POINTS, KILL_THRESHOLD, OVERKILL_THRESHOLD,
    REGULAR_POINTS,
};
pub use types::{CardId, EffectId, PlayerId, PlayerName, WeaponId};
