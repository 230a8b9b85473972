//! Adrenaline match engine
//!
//! Runs matches of the Adrenaline board game: turn flow, action and weapon
//! resolution, scoring and the final frenzy. Players are reached through
//! [`choice::PlayerChannel`]s, so the same engine serves remote clients,
//! bots and scripted tests.

pub mod bots;
pub mod choice;
pub mod core;
pub mod error;
pub mod game;
pub mod map;
pub mod simulate;
pub mod stacks;

pub use error::{EngineError, Result};
