//! Match state, turn structure and the controllers that drive them

pub mod actions;
pub mod config;
pub mod effects;
pub mod events;
pub mod factory;
pub mod logger;
pub mod match_controller;
pub mod payment;
pub mod power_ups;
pub mod score;
pub mod spawn;
pub mod state;
pub mod turn;
pub mod turn_controller;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{MatchConfig, MAX_PLAYERS, MAX_SKULLS, MIN_PLAYERS, MIN_SKULLS};
pub use events::{EndReason, EventBus, MatchEvent, MatchResult, MatchSnapshot, PlayerSnapshot, Standing};
pub use factory::{PowerUpContext, Resolution, Resolver, ResolverFactory};
pub use logger::{LogEntry, MatchLogger, OutputFormat, OutputMode, VerbosityLevel};
pub use match_controller::{MatchController, MatchHandle};
pub use score::ScoreManager;
pub use state::{Match, TokenKind, TrackToken};
pub use turn::{PlayerTurn, TurnState};
pub use turn_controller::{TurnController, TurnOption};
