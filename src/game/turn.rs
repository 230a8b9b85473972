//! A single player turn: state, remaining actions and damaged players

use crate::core::{Action, ActionCard, PlayerId};
use crate::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// Turn states. `Selecting` and `Busy` share a rank, so a turn may bounce
/// between them but never go back to `InitialSpawn` or leave `Over`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnState {
    /// The owner has no position yet and must spawn first
    InitialSpawn,
    /// Choosing between action, power-up and end of turn
    Selecting,
    /// An action or power-up is being resolved
    Busy,
    Over,
}

impl TurnState {
    pub fn rank(&self) -> u8 {
        match self {
            TurnState::InitialSpawn => 0,
            TurnState::Selecting | TurnState::Busy => 1,
            TurnState::Over => 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerTurn {
    owner: PlayerId,
    state: TurnState,
    remaining_actions: u8,
    /// Players damaged during this turn, in the order they were first hit
    damaged: Vec<PlayerId>,
    /// Every state entered, for auditing
    visited: Vec<TurnState>,
}

impl PlayerTurn {
    pub fn new(owner: PlayerId, max_actions: u8, needs_spawn: bool) -> Self {
        let state = if needs_spawn {
            TurnState::InitialSpawn
        } else {
            TurnState::Selecting
        };
        PlayerTurn {
            owner,
            state,
            remaining_actions: max_actions,
            damaged: Vec::new(),
            visited: vec![state],
        }
    }

    pub fn owner(&self) -> PlayerId {
        self.owner
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn remaining_actions(&self) -> u8 {
        self.remaining_actions
    }

    pub fn damaged(&self) -> &[PlayerId] {
        &self.damaged
    }

    pub fn visited(&self) -> &[TurnState] {
        &self.visited
    }

    pub fn is_over(&self) -> bool {
        self.state == TurnState::Over
    }

    /// Move to `next`. Going to a lower-ranked state is a rule violation.
    pub fn transition(&mut self, next: TurnState) -> Result<()> {
        if next.rank() < self.state.rank() {
            return Err(EngineError::RuleViolation(format!(
                "turn of {} cannot go from {:?} back to {:?}",
                self.owner, self.state, next
            )));
        }
        if next != self.state {
            self.state = next;
            self.visited.push(next);
        }
        Ok(())
    }

    /// End the turn no matter where it is
    pub fn force_over(&mut self) {
        if self.state != TurnState::Over {
            self.state = TurnState::Over;
            self.visited.push(TurnState::Over);
        }
    }

    pub fn record_damaged(&mut self, player: PlayerId) {
        if !self.damaged.contains(&player) {
            self.damaged.push(player);
        }
    }

    /// Bookkeeping after an action attempt; `performed` is None when the
    /// player declined or the action did not complete.
    pub fn after_action(&mut self, performed: Option<&Action>, card: &ActionCard) -> Result<()> {
        match performed {
            Some(action) if card.is_final(action) => {
                self.remaining_actions = 0;
                self.transition(TurnState::Over)
            }
            Some(_) => {
                self.remaining_actions = self.remaining_actions.saturating_sub(1);
                self.transition(TurnState::Selecting)?;
                if self.remaining_actions == 0 && card.final_action.is_none() {
                    self.transition(TurnState::Over)?;
                }
                Ok(())
            }
            None if self.remaining_actions == 0 => self.transition(TurnState::Over),
            None => self.transition(TurnState::Selecting),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ActionCardKind;

    fn p0() -> PlayerId {
        PlayerId::new(0)
    }

    #[test]
    fn test_regular_turn_runs_into_final_action() {
        let card = ActionCard::regular();
        let mut turn = PlayerTurn::new(p0(), card.max_actions, false);
        let run = card.actions[0].clone();

        turn.transition(TurnState::Busy).unwrap();
        turn.after_action(Some(&run), &card).unwrap();
        assert_eq!(turn.remaining_actions(), 1);
        assert_eq!(turn.state(), TurnState::Selecting);

        turn.after_action(Some(&run), &card).unwrap();
        assert_eq!(turn.remaining_actions(), 0);
        // The reload final action is still to come
        assert_eq!(turn.state(), TurnState::Selecting);

        let reload = card.final_action.clone().unwrap();
        turn.after_action(Some(&reload), &card).unwrap();
        assert!(turn.is_over());
    }

    #[test]
    fn test_final_action_ends_turn_early() {
        let card = ActionCard::regular();
        let mut turn = PlayerTurn::new(p0(), card.max_actions, false);
        let reload = card.final_action.clone().unwrap();
        turn.after_action(Some(&reload), &card).unwrap();
        assert_eq!(turn.remaining_actions(), 0);
        assert!(turn.is_over());
    }

    #[test]
    fn test_no_final_action_ends_on_last_action() {
        let card = ActionCard::of_kind(ActionCardKind::FrenzySingle);
        let mut turn = PlayerTurn::new(p0(), card.max_actions, false);
        let grab = card.actions[1].clone();
        turn.after_action(Some(&grab), &card).unwrap();
        assert!(turn.is_over());
    }

    #[test]
    fn test_declining() {
        let card = ActionCard::regular();
        let mut turn = PlayerTurn::new(p0(), card.max_actions, false);
        turn.after_action(None, &card).unwrap();
        assert_eq!(turn.state(), TurnState::Selecting);
        assert_eq!(turn.remaining_actions(), 2);

        let run = card.actions[0].clone();
        turn.after_action(Some(&run), &card).unwrap();
        turn.after_action(Some(&run), &card).unwrap();
        turn.after_action(None, &card).unwrap();
        assert!(turn.is_over());
    }

    #[test]
    fn test_transitions_are_monotonic() {
        let mut turn = PlayerTurn::new(p0(), 2, true);
        assert_eq!(turn.state(), TurnState::InitialSpawn);
        turn.transition(TurnState::Selecting).unwrap();
        turn.transition(TurnState::Busy).unwrap();
        turn.transition(TurnState::Selecting).unwrap();
        assert!(turn.transition(TurnState::InitialSpawn).is_err());
        turn.force_over();
        assert!(turn.transition(TurnState::Selecting).is_err());

        let ranks: Vec<u8> = turn.visited().iter().map(|s| s.rank()).collect();
        assert!(ranks.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_damaged_order_is_first_hit() {
        let mut turn = PlayerTurn::new(p0(), 2, false);
        turn.record_damaged(PlayerId::new(2));
        turn.record_damaged(PlayerId::new(1));
        turn.record_damaged(PlayerId::new(2));
        assert_eq!(turn.damaged(), &[PlayerId::new(2), PlayerId::new(1)]);
    }
}
