//! Spawning and respawning
//!
//! The player draws power-ups and discards one of their hand; the discarded
//! card's color picks the spawn point.

use crate::choice::{ask_required, ChoiceOutcome};
use crate::core::{PlayerId, PowerUpCard};
use crate::game::{Match, MatchEvent, Resolution};
use crate::{EngineError, Result};

/// Power-ups drawn for the first spawn of a match
pub const INITIAL_SPAWN_DRAW: usize = 2;

/// Power-ups drawn when respawning after a death
pub const RESPAWN_DRAW: usize = 1;

/// Draw `draw` power-ups and let `player` discard one to spawn.
///
/// A cancelled choice discards the first drawn card and still places the
/// player, then reports `Cancelled`.
pub fn spawn(game: &mut Match, player: PlayerId, draw: usize) -> Result<Resolution> {
    let mut options: Vec<PowerUpCard> = Vec::with_capacity(draw + 3);
    for _ in 0..draw {
        if let Some(card) = game.draw_power_up() {
            options.push(card);
        }
    }
    options.extend(game.player(player)?.power_ups.iter().copied());
    let Some(first) = options.first().copied() else {
        return Err(EngineError::RuleViolation(format!(
            "{} has no power-up to spawn with",
            player
        )));
    };

    let channel = game.channel(player)?;
    let (discarded, resolution) = match ask_required(
        channel.as_ref(),
        "Discard a power-up: its color is where you spawn",
        &options,
    )? {
        ChoiceOutcome::Answered(card) => (card, Resolution::Completed),
        _ => (first, Resolution::Cancelled),
    };

    let hand: Vec<PowerUpCard> = options.into_iter().filter(|c| c.id != discarded.id).collect();
    game.player_mut(player)?.power_ups = hand;
    game.discard_power_up(discarded);

    let square = game.board().spawn_point(discarded.color).ok_or_else(|| {
        EngineError::RuleViolation(format!("no {} spawn point on this board", discarded.color))
    })?;
    game.board_mut().place(player, square)?;
    game.events().publish(MatchEvent::Spawned { player, square });
    game.logger()
        .turn(&format!("{} spawns at {}", player, square));
    Ok(resolution)
}
