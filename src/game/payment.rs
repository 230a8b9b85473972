//! Ammo payment at the resolver boundary

use crate::choice::Severity;
use crate::core::{AmmoCost, PlayerId};
use crate::game::Match;
use crate::game::logger::log_verbose;
use crate::Result;

/// Pay `cost` for `what`. When the player cannot pay they get one message
/// and nothing is deducted.
pub fn pay_or_notify(game: &mut Match, player: PlayerId, cost: &AmmoCost, what: &str) -> Result<bool> {
    if cost.is_free() {
        return Ok(true);
    }
    match game.player_mut(player)?.ammo.pay(cost) {
        Ok(()) => {
            log_verbose!(game.logger(), action, "{} pays {} for {}", player, cost, what);
            Ok(true)
        }
        Err(err) => {
            game.notify(player, &format!("Cannot use {}: {}", what, err), Severity::Warning);
            Ok(false)
        }
    }
}
