//! Power-up resolvers
//!
//! Each power-up checks its own precondition first. When it does not hold the
//! player gets one message and the card is not used. The caller discards the
//! card only after a completed resolution.

use crate::choice::{ask, ask_required, ChoiceOutcome, Severity};
use crate::core::{AmmoCost, PlayerId};
use crate::game::effects::push_destinations;
use crate::game::logger::log_verbose;
use crate::game::payment::pay_or_notify;
use crate::game::{Match, Resolution, Resolver};
use crate::map::SquareId;
use crate::Result;

/// Move yourself to any square
pub struct TeleporterResolver;

impl Resolver for TeleporterResolver {
    fn resolve(&mut self, game: &mut Match, user: PlayerId) -> Result<Resolution> {
        let Some(from) = game.board().position(user) else {
            game.notify(user, "Teleporter: you are not on the board", Severity::Warning);
            return Ok(Resolution::NotCompleted);
        };
        let squares: Vec<SquareId> = game
            .board()
            .squares()
            .into_iter()
            .filter(|sq| *sq != from)
            .collect();
        let channel = game.channel(user)?;
        match ask(channel.as_ref(), "Teleport to", &squares, true)? {
            ChoiceOutcome::Answered(Some(to)) => {
                game.board_mut().place(user, to)?;
                log_verbose!(game.logger(), action, "{} teleports to {}", user, to);
                Ok(Resolution::Completed)
            }
            ChoiceOutcome::Cancelled => Ok(Resolution::Cancelled),
            _ => Ok(Resolution::NotCompleted),
        }
    }
}

/// Move another player up to two squares in one direction
pub struct NewtonResolver;

const NEWTON_RANGE: u8 = 2;

impl Resolver for NewtonResolver {
    fn resolve(&mut self, game: &mut Match, user: PlayerId) -> Result<Resolution> {
        let victims: Vec<PlayerId> = game
            .player_ids()
            .into_iter()
            .filter(|p| *p != user)
            .filter(|p| {
                game.board()
                    .position(*p)
                    .is_some_and(|at| !push_destinations(game, at, NEWTON_RANGE).is_empty())
            })
            .collect();
        if victims.is_empty() {
            game.notify(user, "Newton: nobody can be moved", Severity::Warning);
            return Ok(Resolution::NotCompleted);
        }

        let channel = game.channel(user)?;
        let victim = match ask(channel.as_ref(), "Move which player?", &victims, true)? {
            ChoiceOutcome::Answered(Some(victim)) => victim,
            ChoiceOutcome::Cancelled => return Ok(Resolution::Cancelled),
            _ => return Ok(Resolution::NotCompleted),
        };
        let Some(at) = game.board().position(victim) else {
            return Ok(Resolution::NotCompleted);
        };
        let squares = push_destinations(game, at, NEWTON_RANGE);
        match ask_required(channel.as_ref(), "Move them to", &squares)? {
            ChoiceOutcome::Answered(to) => {
                game.board_mut().place(victim, to)?;
                log_verbose!(game.logger(), action, "{} moves {} to {}", user, victim, to);
                Ok(Resolution::Completed)
            }
            _ => Ok(Resolution::Cancelled),
        }
    }
}

/// Pay one cube of any color for one extra damage on a player just hit
pub struct ScopeResolver {
    damaged: Vec<PlayerId>,
    hit: Vec<PlayerId>,
}

impl ScopeResolver {
    pub fn new(damaged: Vec<PlayerId>) -> Self {
        ScopeResolver {
            damaged,
            hit: Vec::new(),
        }
    }
}

impl Resolver for ScopeResolver {
    fn resolve(&mut self, game: &mut Match, user: PlayerId) -> Result<Resolution> {
        let cost = AmmoCost::from_string("*");
        if self.damaged.is_empty() {
            game.notify(user, "Targeting Scope: no target was hit", Severity::Warning);
            return Ok(Resolution::NotCompleted);
        }
        if !game.player(user)?.ammo.can_pay(&cost) {
            game.notify(user, "Targeting Scope: no ammo to pay with", Severity::Warning);
            return Ok(Resolution::NotCompleted);
        }

        let channel = game.channel(user)?;
        let target = match ask(channel.as_ref(), "Targeting Scope: extra damage on", &self.damaged, true)? {
            ChoiceOutcome::Answered(Some(target)) => target,
            ChoiceOutcome::Cancelled => return Ok(Resolution::Cancelled),
            _ => return Ok(Resolution::NotCompleted),
        };
        if !pay_or_notify(game, user, &cost, "Targeting Scope")? {
            return Ok(Resolution::NotCompleted);
        }
        if game.apply_damage(user, target, 1)? > 0 {
            self.hit.push(target);
        }
        Ok(Resolution::Completed)
    }

    fn damaged(&self) -> &[PlayerId] {
        &self.hit
    }
}

/// Mark the shooter who just damaged you, if you can see them
pub struct TagbackResolver {
    shooter: PlayerId,
}

impl TagbackResolver {
    pub fn new(shooter: PlayerId) -> Self {
        TagbackResolver { shooter }
    }
}

impl Resolver for TagbackResolver {
    fn resolve(&mut self, game: &mut Match, user: PlayerId) -> Result<Resolution> {
        let board = game.board();
        let sees = match (board.position(user), board.position(self.shooter)) {
            (Some(from), Some(to)) => board.can_see(from, to),
            _ => false,
        };
        if !sees {
            game.notify(
                user,
                &format!("Tagback Grenade: you cannot see {}", self.shooter),
                Severity::Warning,
            );
            return Ok(Resolution::NotCompleted);
        }
        game.apply_marks(user, self.shooter, 1)?;
        Ok(Resolution::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::choice::Scripted;
    use crate::core::AmmoPool;
    use crate::game::testing::{p, place, scripted_match, sq};

    #[test]
    fn test_teleporter_moves_anywhere() {
        let (mut game, _channels) = scripted_match(vec![vec![Scripted::label("S11")], vec![], vec![]]);
        place(&mut game, &[(0, 0)]);
        let resolution = TeleporterResolver.resolve(&mut game, p(0)).unwrap();
        assert_eq!(resolution, Resolution::Completed);
        assert_eq!(game.board().position(p(0)), Some(sq(11)));
    }

    #[test]
    fn test_newton_pushes_in_a_line() {
        let (mut game, _channels) = scripted_match(vec![
            vec![Scripted::label("P1"), Scripted::label("S6")],
            vec![],
            vec![],
        ]);
        place(&mut game, &[(0, 0), (1, 4)]);
        assert_eq!(NewtonResolver.resolve(&mut game, p(0)).unwrap(), Resolution::Completed);
        assert_eq!(game.board().position(p(1)), Some(sq(6)));
    }

    #[test]
    fn test_newton_without_victims() {
        let (mut game, channels) = scripted_match(vec![vec![], vec![], vec![]]);
        place(&mut game, &[(0, 0)]);
        assert_eq!(NewtonResolver.resolve(&mut game, p(0)).unwrap(), Resolution::NotCompleted);
        assert_eq!(channels[0].messages().len(), 1);
    }

    #[test]
    fn test_scope_needs_ammo() {
        let (mut game, channels) = scripted_match(vec![vec![Scripted::Pick(0)], vec![], vec![]]);
        game.player_mut(p(0)).unwrap().ammo = AmmoPool::new();
        let mut scope = ScopeResolver::new(vec![p(1)]);
        assert_eq!(scope.resolve(&mut game, p(0)).unwrap(), Resolution::NotCompleted);
        assert_eq!(channels[0].messages().len(), 1);
        assert!(channels[0].prompts().is_empty());
    }

    #[test]
    fn test_scope_adds_damage() {
        let (mut game, _channels) = scripted_match(vec![vec![Scripted::Pick(0)], vec![], vec![]]);
        let mut scope = ScopeResolver::new(vec![p(2)]);
        assert_eq!(scope.resolve(&mut game, p(0)).unwrap(), Resolution::Completed);
        assert_eq!(game.player(p(2)).unwrap().board.damage_count(), 1);
        assert_eq!(game.player(p(0)).unwrap().ammo.total(), 2);
        assert_eq!(scope.damaged(), &[p(2)]);
    }

    #[test]
    fn test_tagback_requires_sight() {
        let (mut game, channels) = scripted_match(vec![vec![], vec![], vec![]]);
        place(&mut game, &[(0, 0), (1, 11)]);
        let mut tagback = TagbackResolver::new(p(0));
        assert_eq!(tagback.resolve(&mut game, p(1)).unwrap(), Resolution::NotCompleted);
        assert_eq!(channels[1].messages().len(), 1);

        place(&mut game, &[(1, 1)]);
        assert_eq!(tagback.resolve(&mut game, p(1)).unwrap(), Resolution::Completed);
        assert_eq!(game.player(p(0)).unwrap().board.marks_from(p(1)), 1);
    }
}
