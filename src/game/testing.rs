//! Shared fixtures for the game module's unit tests

use crate::choice::{PlayerChannel, Scripted, ScriptedChannel};
use crate::core::{CardCatalog, PlayerId, PlayerName};
use crate::game::{Match, MatchConfig};
use crate::map::SquareId;
use std::sync::Arc;

/// A match on board 1 with one scripted channel per script
pub(crate) fn scripted_match(scripts: Vec<Vec<Scripted>>) -> (Match, Vec<Arc<ScriptedChannel>>) {
    scripted_match_with(MatchConfig::default(), scripts)
}

pub(crate) fn scripted_match_with(
    config: MatchConfig,
    scripts: Vec<Vec<Scripted>>,
) -> (Match, Vec<Arc<ScriptedChannel>>) {
    let channels: Vec<Arc<ScriptedChannel>> = scripts
        .into_iter()
        .enumerate()
        .map(|(i, script)| Arc::new(ScriptedChannel::new(PlayerId::new(i as u32), script)))
        .collect();
    let roster = channels
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let channel: Arc<dyn PlayerChannel> = c.clone();
            (PlayerName::new(format!("player{}", i)), channel)
        })
        .collect();
    let catalog = Arc::new(CardCatalog::standard().unwrap());
    let game = Match::new(config, catalog, roster).unwrap();
    (game, channels)
}

pub(crate) fn p(n: u32) -> PlayerId {
    PlayerId::new(n)
}

pub(crate) fn sq(n: u32) -> SquareId {
    SquareId::new(n)
}

/// Put players on squares
pub(crate) fn place(game: &mut Match, at: &[(u32, u32)]) {
    for (player, square) in at {
        game.board_mut().place(p(*player), sq(*square)).unwrap();
    }
}
