//! Error types for the Adrenaline engine

use crate::core::BoardError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Caller error: acting out of turn, acting on an invalid board state,
    /// or moving a turn backwards. Fatal to the call.
    #[error("Rule violation: {0}")]
    RuleViolation(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Entity not found: {0}")]
    EntityNotFound(u32),

    #[error("Invalid choice: {0}")]
    InvalidChoice(String),

    /// The hosting process asked the engine thread to stop.
    /// Never swallowed: every layer re-raises it after local cleanup.
    #[error("Engine interrupted")]
    Interrupted,

    #[error("Match thread panicked")]
    WorkerPanicked,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Player board error: {0}")]
    Board(#[from] BoardError),
}

impl EngineError {
    pub fn is_interrupted(&self) -> bool {
        matches!(self, EngineError::Interrupted)
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
