//! Automated players
//!
//! A bot sits on the transport side of a [`RemotePlayer`]: it reads the
//! outbound stream on its own thread, answers choice requests with its
//! strategy and acknowledges every state update.

pub mod random;
pub mod zero;

pub use random::RandomBot;
pub use zero::ZeroBot;

use crate::choice::{Outbound, PlayerChannel, RemotePlayer};
use crate::Result;
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc;

/// How a bot picks among the options of a request
pub trait Strategy: Send {
    /// Index of the picked option, or None to decline an optional request
    fn choose(&mut self, prompt: &str, options: &[String], optional: bool) -> Option<usize>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum BotKind {
    Zero,
    Random,
}

impl BotKind {
    /// Build the strategy for one seat
    pub fn strategy(self, seed: u64) -> Box<dyn Strategy> {
        match self {
            BotKind::Zero => Box::new(ZeroBot),
            BotKind::Random => Box::new(RandomBot::with_seed(seed)),
        }
    }
}

/// Drive `player` with `strategy` until its outbound stream closes.
///
/// The bot holds the player weakly so the stream closes once the match and
/// the caller let go of it.
pub fn spawn_bot(
    player: &Arc<RemotePlayer>,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    mut strategy: Box<dyn Strategy>,
) -> Result<JoinHandle<()>> {
    let weak: Weak<RemotePlayer> = Arc::downgrade(player);
    let name = format!("bot-{}", player.player());
    let handle = thread::Builder::new().name(name).spawn(move || {
        while let Some(message) = outbound.blocking_recv() {
            let Some(player) = weak.upgrade() else {
                break;
            };
            match message {
                Outbound::ChoiceRequest {
                    id,
                    prompt,
                    options,
                    optional,
                } => {
                    let choice = strategy
                        .choose(&prompt, &options, optional)
                        .filter(|i| *i < options.len());
                    let choice = if choice.is_none() && !optional && !options.is_empty() {
                        Some(0)
                    } else {
                        choice
                    };
                    let _ = player.answer(id, choice);
                }
                Outbound::Update { id, .. } => {
                    player.acknowledge(id);
                }
                _ => {}
            }
        }
    })?;
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::choice::{ChoiceOutcome, StateUpdate};
    use crate::core::PlayerId;
    use crate::game::MatchResult;
    use std::time::Duration;

    fn remote() -> (Arc<RemotePlayer>, mpsc::UnboundedReceiver<Outbound>) {
        RemotePlayer::new(PlayerId::new(0), Some(Duration::from_secs(5)), Duration::from_secs(5))
    }

    #[test]
    fn test_bot_answers_and_acknowledges() {
        let (player, rx) = remote();
        let bot = spawn_bot(&player, rx, Box::new(ZeroBot)).unwrap();

        let handle = player.send_choice_request("pick", &["a".into(), "b".into()], false);
        assert_eq!(handle.get().unwrap(), ChoiceOutcome::Answered(Some(0)));
        player
            .update_sync(StateUpdate::Finished(Arc::new(MatchResult::default())))
            .unwrap();
        assert_eq!(player.pending_count(), 0);

        drop(player);
        bot.join().unwrap();
    }

    struct Declining;

    impl Strategy for Declining {
        fn choose(&mut self, _prompt: &str, _options: &[String], _optional: bool) -> Option<usize> {
            None
        }
    }

    #[test]
    fn test_mandatory_requests_are_never_declined() {
        let (player, rx) = remote();
        let bot = spawn_bot(&player, rx, Box::new(Declining)).unwrap();

        let handle = player.send_choice_request("pick", &["a".into()], false);
        assert_eq!(handle.get().unwrap(), ChoiceOutcome::Answered(Some(0)));
        let handle = player.send_choice_request("maybe", &["a".into()], true);
        assert_eq!(handle.get().unwrap(), ChoiceOutcome::Answered(None));

        drop(player);
        bot.join().unwrap();
    }
}
