//! Match controller
//!
//! The top-level loop: pick the next player, refill the board, play the turn,
//! then score, respawn and check for frenzy. After every turn each connected
//! player receives an immutable snapshot of the match.

use crate::choice::{PlayerChannel, Scene, StateUpdate};
use crate::core::{ActionCard, PlayerId};
use crate::game::score::ScoreManager;
use crate::game::spawn::{spawn, RESPAWN_DRAW};
use crate::game::turn_controller::TurnController;
use crate::game::{EndReason, Match, MatchEvent, MatchResult, PlayerTurn};
use crate::{EngineError, Result};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

pub struct MatchController {
    game: Match,
    /// Seat whose turn comes next outside frenzy
    cursor: usize,
    /// Players still owed their frenzy turn, in order
    frenzy_queue: VecDeque<PlayerId>,
    stop: Arc<AtomicBool>,
}

impl MatchController {
    pub fn new(game: Match) -> Self {
        MatchController {
            game,
            cursor: 0,
            frenzy_queue: VecDeque::new(),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn game(&self) -> &Match {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut Match {
        &mut self.game
    }

    pub fn into_game(self) -> Match {
        self.game
    }

    /// Flag checked between turns; setting it ends the loop with `Interrupted`
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Run the match to the end
    pub fn run(&mut self) -> Result<MatchResult> {
        let reason = loop {
            if self.stop.load(Ordering::SeqCst) {
                return Err(EngineError::Interrupted);
            }
            self.game.refresh_connections();
            if self.game.connected_players() < self.game.config().min_players {
                break EndReason::NotEnoughPlayers;
            }
            if let Some(max) = self.game.config().max_turns {
                if self.game.turn_number() >= max {
                    break EndReason::TurnLimit;
                }
            }
            let Some(owner) = self.next_player() else {
                break EndReason::Completed;
            };
            self.play_turn(owner)?;
        };
        self.finish(reason)
    }

    /// Play one turn for `owner` with all of its end-of-turn bookkeeping
    pub fn play_turn(&mut self, owner: PlayerId) -> Result<PlayerTurn> {
        self.game.refill_board();
        let turn = TurnController::run(&mut self.game, owner)?;
        self.end_of_turn(owner)?;
        self.fan_out()?;
        Ok(turn)
    }

    /// Next connected player, or None once every frenzy turn was played
    fn next_player(&mut self) -> Option<PlayerId> {
        if self.game.is_frenzy() {
            while let Some(player) = self.frenzy_queue.pop_front() {
                if self.is_connected(player) {
                    return Some(player);
                }
            }
            return None;
        }
        let seats = self.game.players().len();
        for _ in 0..seats {
            let player = PlayerId::new(self.cursor as u32);
            self.cursor = (self.cursor + 1) % seats;
            if self.is_connected(player) {
                return Some(player);
            }
        }
        None
    }

    fn is_connected(&self, player: PlayerId) -> bool {
        self.game.player(player).map(|p| p.connected).unwrap_or(false)
    }

    fn end_of_turn(&mut self, owner: PlayerId) -> Result<()> {
        ScoreManager::per_turn(&mut self.game)?;
        self.respawn_dead()?;

        if !self.game.is_frenzy() && self.game.kill_tokens() >= self.game.skulls() as usize {
            self.game.start_frenzy(owner);
            let seats = self.game.players().len() as u32;
            self.frenzy_queue = (1..=seats)
                .map(|offset| PlayerId::new((owner.as_u32() + offset) % seats))
                .collect();
        }
        Ok(())
    }

    /// Reset dead boards and bring their owners back
    fn respawn_dead(&mut self) -> Result<()> {
        let frenzy = self.game.is_frenzy();
        let dead: Vec<PlayerId> = self
            .game
            .players()
            .iter()
            .filter(|p| p.board.is_dead())
            .map(|p| p.id)
            .collect();

        for player_id in dead {
            let player = self.game.player_mut(player_id)?;
            if player.board.reset().is_err() {
                continue;
            }
            if frenzy {
                // A board already on its frenzy side stays there
                let _ = player.board.flip_to_frenzy();
            } else {
                player.action_card = ActionCard::regular();
            }
            self.game.board_mut().remove(player_id);
            if self.is_connected(player_id) {
                spawn(&mut self.game, player_id, RESPAWN_DRAW)?;
            }
        }
        Ok(())
    }

    /// Push the current snapshot to every connected player
    fn fan_out(&mut self) -> Result<()> {
        let snapshot = Arc::new(self.game.snapshot());
        for channel in self.connected_channels() {
            channel.update_sync(StateUpdate::Snapshot(Arc::clone(&snapshot)))?;
        }
        Ok(())
    }

    fn connected_channels(&self) -> Vec<Arc<dyn PlayerChannel>> {
        self.game
            .channels()
            .iter()
            .filter(|c| self.is_connected(c.player()) && c.is_connected())
            .cloned()
            .collect()
    }

    fn finish(&mut self, reason: EndReason) -> Result<MatchResult> {
        ScoreManager::final_scoring(&mut self.game)?;
        let result = self.game.result(reason);
        self.game.events().publish(MatchEvent::MatchEnded { reason });
        self.game.logger().minimal(&format!(
            "Match over after {} turns ({:?}), winner {}",
            result.turns_played,
            reason,
            result
                .winner()
                .map(|w| w.to_string())
                .unwrap_or_else(|| "none".to_string())
        ));

        let shared = Arc::new(result.clone());
        for channel in self.connected_channels() {
            channel.select_scene(Scene::Results);
            channel.update_sync(StateUpdate::Finished(Arc::clone(&shared)))?;
        }
        Ok(result)
    }

    /// Run the match on its own thread
    pub fn spawn(self) -> Result<MatchHandle> {
        let channels = self.game.channels().to_vec();
        let stop = self.stop_flag();
        let mut controller = self;
        let thread = thread::Builder::new()
            .name("match-engine".to_string())
            .spawn(move || controller.run())?;
        Ok(MatchHandle {
            thread,
            channels,
            stop,
        })
    }
}

/// A match running on its worker thread
pub struct MatchHandle {
    thread: JoinHandle<Result<MatchResult>>,
    channels: Vec<Arc<dyn PlayerChannel>>,
    stop: Arc<AtomicBool>,
}

impl MatchHandle {
    /// Ask the match to stop: pending and future choices fail with `Interrupted`
    pub fn shutdown(&self) {
        self.stop.store(true, Ordering::SeqCst);
        for channel in &self.channels {
            channel.interrupt();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    pub fn join(self) -> Result<MatchResult> {
        self.thread.join().map_err(|_| EngineError::WorkerPanicked)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::choice::Scripted;
    use crate::core::BoardSide;
    use crate::game::testing::{p, place, scripted_match, scripted_match_with};
    use crate::game::logger::category;
    use crate::game::MatchConfig;

    #[test]
    fn test_turn_limit_ends_the_match() {
        let config = MatchConfig::default().with_max_turns(6);
        let (game, channels) = scripted_match_with(config, vec![vec![], vec![], vec![]]);
        let mut controller = MatchController::new(game);
        let result = controller.run().unwrap();

        assert_eq!(result.end_reason, EndReason::TurnLimit);
        assert_eq!(result.turns_played, 6);
        for channel in &channels {
            // Six snapshots plus the final result
            assert_eq!(channel.updates(), 7);
            assert_eq!(channel.scenes().last(), Some(&Scene::Results));
        }
    }

    #[test]
    fn test_disconnects_end_the_match() {
        let (game, _channels) = scripted_match(vec![vec![Scripted::Disconnect], vec![], vec![]]);
        let mut controller = MatchController::new(game);
        let result = controller.run().unwrap();
        assert_eq!(result.end_reason, EndReason::NotEnoughPlayers);
        assert_eq!(result.turns_played, 1);
    }

    #[test]
    fn test_dead_player_respawns() {
        let (game, _channels) = scripted_match(vec![vec![], vec![], vec![]]);
        let mut controller = MatchController::new(game);
        {
            let game = controller.game_mut();
            game.logger_mut().enable_capture();
            place(game, &[(0, 5), (1, 5), (2, 6)]);
            game.apply_damage(p(0), p(1), 11).unwrap();
        }
        controller.play_turn(p(2)).unwrap();

        let game = controller.game();
        let scoring = game.logger().messages_in(category::SCORE);
        assert_eq!(scoring.first().map(String::as_str), Some("P0 killed P1"));
        let victim = game.player(p(1)).unwrap();
        assert_eq!(victim.board.damage_count(), 0);
        assert_eq!(victim.board.deaths(), 1);
        assert_eq!(victim.power_ups.len(), 0);
        let at = game.board().position(p(1)).unwrap();
        assert!(game.board().square(at).unwrap().is_spawn());
        assert_eq!(game.player(p(0)).unwrap().kills, 1);
        assert_eq!(game.kill_tokens(), 1);
    }

    #[test]
    fn test_frenzy_gives_everyone_one_more_turn() {
        let config = MatchConfig::default().with_skulls(5);
        let (game, _channels) = scripted_match_with(config, vec![vec![], vec![], vec![]]);
        let mut controller = MatchController::new(game);
        {
            let game = controller.game_mut();
            place(game, &[(0, 5), (1, 5), (2, 6)]);
            for _ in 0..5 {
                game.push_token(p(0), crate::game::TokenKind::Kill);
            }
        }
        controller.play_turn(p(1)).unwrap();
        assert!(controller.game().is_frenzy());
        assert_eq!(
            controller.frenzy_queue,
            VecDeque::from(vec![p(2), p(0), p(1)])
        );
        assert_eq!(
            controller.game().player(p(0)).unwrap().board.side(),
            BoardSide::Frenzy
        );

        let result = controller.run().unwrap();
        assert_eq!(result.end_reason, EndReason::Completed);
        assert_eq!(result.turns_played, 4);
    }

    #[test]
    fn test_shutdown_interrupts_the_worker() {
        let (game, _channels) = scripted_match(vec![vec![], vec![], vec![]]);
        let controller = MatchController::new(game);
        controller.stop.store(true, Ordering::SeqCst);
        let handle = controller.spawn().unwrap();
        let err = handle.join().unwrap_err();
        assert!(err.is_interrupted());
    }
}
