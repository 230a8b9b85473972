//! Turn controller
//!
//! Drives one player's turn: spawn if needed, then offer actions, power-ups
//! and end-of-turn until the turn is over. A cancelled choice anywhere ends
//! the turn cleanly; interruption propagates to the caller.

use crate::choice::{ask, ChoiceOutcome, TimerGuard};
use crate::core::{Action, PlayerId, PowerUpCard};
use crate::game::actions::spend_power_up;
use crate::game::logger::log_verbose;
use crate::game::spawn::{spawn, INITIAL_SPAWN_DRAW};
use crate::game::{
    Match, MatchEvent, PlayerTurn, PowerUpContext, Resolution, ResolverFactory, TurnState,
};
use crate::{EngineError, Result};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One entry of the turn menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOption {
    EndTurn,
    Act(Action),
    UsePowerUp,
}

impl fmt::Display for TurnOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnOption::EndTurn => write!(f, "end turn"),
            TurnOption::Act(action) => write!(f, "{}", action),
            TurnOption::UsePowerUp => write!(f, "use power-up"),
        }
    }
}

/// How the turn loop stopped
enum LoopEnd {
    Finished,
    Cancelled,
}

pub struct TurnController;

impl TurnController {
    /// Play a whole turn for `owner` and return it once over
    pub fn run(game: &mut Match, owner: PlayerId) -> Result<PlayerTurn> {
        game.begin_turn(owner)?;
        let turn_number = game.turn_number();
        game.events().publish(MatchEvent::TurnStarted {
            turn: turn_number,
            player: owner,
        });
        game.logger()
            .turn(&format!("Turn {}: {}", turn_number, owner));

        let channel = game.channel(owner)?;
        let expired = Arc::new(AtomicBool::new(false));
        let end = {
            let on_expire = {
                let channel = Arc::clone(&channel);
                let expired = Arc::clone(&expired);
                Box::new(move || {
                    expired.store(true, Ordering::SeqCst);
                    channel.cancel_pending();
                })
            };
            let _timer = TimerGuard::start(channel.as_ref(), game.config().turn_timeout, on_expire);
            Self::turn_loop(game, owner, &expired)?
        };

        if let LoopEnd::Cancelled = end {
            if expired.load(Ordering::SeqCst) {
                game.logger().turn(&format!("{} ran out of time", owner));
            } else {
                game.logger()
                    .turn(&format!("{} left during their turn", owner));
            }
            if let Some(turn) = game.current_turn_mut() {
                turn.force_over();
            }
        }

        game.events().publish(MatchEvent::TurnEnded {
            turn: turn_number,
            player: owner,
        });
        game.take_turn()
            .ok_or_else(|| EngineError::RuleViolation("turn vanished while running".to_string()))
    }

    fn state(game: &Match) -> Result<TurnState> {
        game.current_turn()
            .map(|t| t.state())
            .ok_or_else(|| EngineError::RuleViolation("no turn in progress".to_string()))
    }

    fn transition(game: &mut Match, next: TurnState) -> Result<()> {
        match game.current_turn_mut() {
            Some(turn) => turn.transition(next),
            None => Err(EngineError::RuleViolation("no turn in progress".to_string())),
        }
    }

    fn turn_loop(game: &mut Match, owner: PlayerId, expired: &AtomicBool) -> Result<LoopEnd> {
        loop {
            // The timer may fire while nothing is pending
            if expired.load(Ordering::SeqCst) {
                return Ok(LoopEnd::Cancelled);
            }
            match Self::state(game)? {
                TurnState::InitialSpawn => {
                    if spawn(game, owner, INITIAL_SPAWN_DRAW)? == Resolution::Cancelled {
                        return Ok(LoopEnd::Cancelled);
                    }
                    Self::transition(game, TurnState::Selecting)?;
                }
                TurnState::Selecting => {
                    if Self::select(game, owner)? == Resolution::Cancelled {
                        return Ok(LoopEnd::Cancelled);
                    }
                }
                TurnState::Busy => Self::transition(game, TurnState::Selecting)?,
                TurnState::Over => return Ok(LoopEnd::Finished),
            }
        }
    }

    /// Build the menu for the current state of the turn
    fn menu(game: &Match, owner: PlayerId) -> Result<Vec<TurnOption>> {
        let remaining = game.current_turn().map(|t| t.remaining_actions()).unwrap_or(0);
        let player = game.player(owner)?;
        let mut options = vec![TurnOption::EndTurn];
        options.extend(
            player
                .action_card
                .available(remaining)
                .into_iter()
                .map(|a| TurnOption::Act(a.clone())),
        );
        if player.power_ups.iter().any(|c| c.kind.usable_on_own_turn()) {
            options.push(TurnOption::UsePowerUp);
        }
        Ok(options)
    }

    /// One round of the Selecting state
    fn select(game: &mut Match, owner: PlayerId) -> Result<Resolution> {
        let options = Self::menu(game, owner)?;
        let channel = game.channel(owner)?;
        let picked = match ask(channel.as_ref(), "What do you want to do?", &options, false)? {
            ChoiceOutcome::Answered(Some(option)) => option,
            ChoiceOutcome::Cancelled => return Ok(Resolution::Cancelled),
            ChoiceOutcome::Answered(None) | ChoiceOutcome::TimedOut => TurnOption::EndTurn,
        };
        log_verbose!(game.logger(), choice, "{} picks {}", owner, picked);

        match picked {
            TurnOption::EndTurn => {
                Self::transition(game, TurnState::Over)?;
                Ok(Resolution::Completed)
            }
            TurnOption::Act(action) => {
                let card = game.player(owner)?.action_card.clone();
                Self::transition(game, TurnState::Busy)?;
                let resolution = ResolverFactory::for_action(&action).resolve(game, owner)?;
                let performed = match resolution {
                    Resolution::Completed => Some(&action),
                    Resolution::NotCompleted => None,
                    Resolution::Cancelled => return Ok(Resolution::Cancelled),
                };
                if performed.is_some() {
                    game.events().publish(MatchEvent::ActionPerformed {
                        player: owner,
                        action: action.name.clone(),
                    });
                }
                match game.current_turn_mut() {
                    Some(turn) => turn.after_action(performed, &card)?,
                    None => return Err(EngineError::RuleViolation("no turn in progress".to_string())),
                }
                Ok(resolution)
            }
            TurnOption::UsePowerUp => {
                Self::transition(game, TurnState::Busy)?;
                let resolution = Self::use_power_up(game, owner)?;
                if resolution != Resolution::Cancelled {
                    Self::transition(game, TurnState::Selecting)?;
                }
                Ok(resolution)
            }
        }
    }

    fn use_power_up(game: &mut Match, owner: PlayerId) -> Result<Resolution> {
        let usable: Vec<PowerUpCard> = game
            .player(owner)?
            .power_ups
            .iter()
            .filter(|c| c.kind.usable_on_own_turn())
            .copied()
            .collect();
        let channel = game.channel(owner)?;
        let card = match ask(channel.as_ref(), "Use which power-up?", &usable, true)? {
            ChoiceOutcome::Answered(Some(card)) => card,
            ChoiceOutcome::Cancelled => return Ok(Resolution::Cancelled),
            _ => return Ok(Resolution::NotCompleted),
        };
        let Some(mut resolver) = ResolverFactory::for_power_up(card.kind, PowerUpContext::OwnTurn) else {
            return Ok(Resolution::NotCompleted);
        };
        let resolution = resolver.resolve(game, owner)?;
        if resolution.is_completed() {
            spend_power_up(game, owner, card)?;
        }
        Ok(resolution)
    }
}
