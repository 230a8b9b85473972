//! The player channel: everything the engine can say to, or ask of, a player

use crate::choice::{ChoiceHandle, ChoiceOutcome, TimerCallback};
use crate::core::PlayerId;
use crate::game::{MatchResult, MatchSnapshot};
use crate::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Which screen the player's view should show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scene {
    Board,
    /// The player was damaged and may answer with a tagback grenade
    Revenge,
    Results,
}

/// State pushed to a player that must be acknowledged
#[derive(Debug, Clone, Serialize)]
pub enum StateUpdate {
    Snapshot(Arc<MatchSnapshot>),
    Finished(Arc<MatchResult>),
}

/// Channel to one remote (or simulated) player.
///
/// Implementations are shared between the engine thread and the transport
/// threads, so every method takes `&self`.
pub trait PlayerChannel: Send + Sync {
    fn player(&self) -> PlayerId;

    /// Ask a question. The handle blocks on `get()` until answered, cancelled
    /// or timed out. A disconnected channel returns a cancelled handle.
    fn send_choice_request(&self, prompt: &str, options: &[String], optional: bool) -> ChoiceHandle;

    fn show_message(&self, text: &str, severity: Severity);

    /// Start (or restart) this player's timer
    fn start_timer(&self, duration: Duration, on_expire: TimerCallback);

    fn stop_timer(&self);

    fn select_scene(&self, scene: Scene);

    /// Push an update and wait until the player acknowledged it
    fn update_sync(&self, update: StateUpdate) -> Result<()>;

    /// Cancel every pending request of this player
    fn cancel_pending(&self);

    /// The hosting process is stopping: every pending and future request
    /// fails with `Interrupted`
    fn interrupt(&self);

    fn is_connected(&self) -> bool;
}

/// Ask `channel` to pick one of `options` and map the answer back to the value.
///
/// An empty option list is answered with no selection without asking.
pub fn ask<T: Clone + fmt::Display>(
    channel: &dyn PlayerChannel,
    prompt: &str,
    options: &[T],
    optional: bool,
) -> Result<ChoiceOutcome<Option<T>>> {
    if options.is_empty() {
        return Ok(ChoiceOutcome::Answered(None));
    }
    let labels: Vec<String> = options.iter().map(|o| o.to_string()).collect();
    let outcome = channel.send_choice_request(prompt, &labels, optional).get()?;
    Ok(outcome.map(|choice| choice.and_then(|i| options.get(i).cloned())))
}

/// Like [`ask`] for a mandatory choice: a timeout picks the first option.
/// Cancellation is passed through. Asking with no options is a caller error.
pub fn ask_required<T: Clone + fmt::Display>(
    channel: &dyn PlayerChannel,
    prompt: &str,
    options: &[T],
) -> Result<ChoiceOutcome<T>> {
    let Some(first) = options.first() else {
        return Err(EngineError::RuleViolation(format!(
            "'{}' offered no options",
            prompt
        )));
    };
    Ok(match ask(channel, prompt, options, false)? {
        ChoiceOutcome::Answered(Some(value)) => ChoiceOutcome::Answered(value),
        ChoiceOutcome::Cancelled => ChoiceOutcome::Cancelled,
        ChoiceOutcome::Answered(None) | ChoiceOutcome::TimedOut => {
            ChoiceOutcome::Answered(first.clone())
        }
    })
}
