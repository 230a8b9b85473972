//! Match configuration

use crate::game::VerbosityLevel;
use crate::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const MIN_SKULLS: u8 = 5;
pub const MAX_SKULLS: u8 = 8;
pub const MIN_PLAYERS: usize = 3;
pub const MAX_PLAYERS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Stock board layout
    pub board_id: u8,
    /// Kill-track capacity before frenzy starts
    pub skulls: u8,
    /// Time for a whole turn
    pub turn_timeout: Duration,
    /// Time a damaged player gets to answer with a tagback grenade
    pub revenge_timeout: Duration,
    /// Time for a single choice request (None waits forever)
    pub choice_timeout: Option<Duration>,
    /// Time a player gets to acknowledge a state update
    pub ack_timeout: Duration,
    /// End the match after this many turns
    pub max_turns: Option<u32>,
    /// End the match when fewer players stay connected
    pub min_players: usize,
    /// Seed for card stack shuffles
    pub seed: u64,
    pub verbosity: VerbosityLevel,
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig {
            board_id: 1,
            skulls: MAX_SKULLS,
            turn_timeout: Duration::from_secs(120),
            revenge_timeout: Duration::from_secs(15),
            choice_timeout: Some(Duration::from_secs(60)),
            ack_timeout: Duration::from_secs(5),
            max_turns: None,
            min_players: MIN_PLAYERS,
            seed: 0,
            verbosity: VerbosityLevel::Normal,
        }
    }
}

impl MatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_board(mut self, board_id: u8) -> Self {
        self.board_id = board_id;
        self
    }

    pub fn with_skulls(mut self, skulls: u8) -> Self {
        self.skulls = skulls;
        self
    }

    pub fn with_turn_timeout(mut self, timeout: Duration) -> Self {
        self.turn_timeout = timeout;
        self
    }

    pub fn with_revenge_timeout(mut self, timeout: Duration) -> Self {
        self.revenge_timeout = timeout;
        self
    }

    pub fn with_choice_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.choice_timeout = timeout;
        self
    }

    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = Some(max_turns);
        self
    }

    pub fn with_min_players(mut self, min_players: usize) -> Self {
        self.min_players = min_players;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_verbosity(mut self, verbosity: VerbosityLevel) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_SKULLS..=MAX_SKULLS).contains(&self.skulls) {
            return Err(EngineError::Config(format!(
                "skulls must be between {} and {}, got {}",
                MIN_SKULLS, MAX_SKULLS, self.skulls
            )));
        }
        if self.min_players == 0 || self.min_players > MAX_PLAYERS {
            return Err(EngineError::Config(format!(
                "min_players must be between 1 and {}, got {}",
                MAX_PLAYERS, self.min_players
            )));
        }
        if self.turn_timeout.is_zero() || self.revenge_timeout.is_zero() {
            return Err(EngineError::Config("timeouts must be positive".to_string()));
        }
        if self.max_turns == Some(0) {
            return Err(EngineError::Config("max_turns must be positive".to_string()));
        }
        Ok(())
    }

    /// Check a roster size against the configuration
    pub fn validate_roster(&self, players: usize) -> Result<()> {
        if !(self.min_players.max(1)..=MAX_PLAYERS).contains(&players) {
            return Err(EngineError::Config(format!(
                "a match needs {} to {} players, got {}",
                self.min_players, MAX_PLAYERS, players
            )));
        }
        Ok(())
    }
}
