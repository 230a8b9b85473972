//! Weapon effect resolution
//!
//! Two strategies pick which effects of a weapon run: [`ModeResolver`] for
//! mutually exclusive firing modes and [`GraphResolver`] for a base effect
//! with optional follow-ups. Both hand each chosen effect to an
//! [`EffectRunner`]; [`EffectExecutor`] is the runner that targets, pays and
//! applies damage.

use crate::choice::{ask, ask_required, ChoiceOutcome, Severity};
use crate::core::{Area, EffectDef, EffectGraph, EffectId, EffectStep, PlayerId, TargetRule, TargetSpec};
use crate::game::logger::log_verbose;
use crate::game::{Match, Resolution, Resolver};
use crate::map::SquareId;
use crate::{EngineError, Result};
use smallvec::SmallVec;

/// How running one effect ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectOutcome {
    Done,
    /// Could not run; carries the reason shown to the player
    Failed(String),
    Cancelled,
}

/// Runs a single effect for a shooter
pub trait EffectRunner {
    fn run(&mut self, game: &mut Match, user: PlayerId, effect: &EffectDef) -> Result<EffectOutcome>;

    /// Players damaged so far, in first-hit order
    fn damaged(&self) -> &[PlayerId];
}

/// Exactly one of several firing modes runs
pub struct ModeResolver<R> {
    modes: Vec<EffectDef>,
    runner: R,
}

impl<R: EffectRunner> ModeResolver<R> {
    pub fn new(modes: Vec<EffectDef>, runner: R) -> Self {
        ModeResolver { modes, runner }
    }
}

impl<R: EffectRunner> Resolver for ModeResolver<R> {
    fn resolve(&mut self, game: &mut Match, user: PlayerId) -> Result<Resolution> {
        let mode = match self.modes.as_slice() {
            [] => return Ok(Resolution::NotCompleted),
            [only] => only.clone(),
            modes => {
                let channel = game.channel(user)?;
                match ask_required(channel.as_ref(), "Choose a firing mode", modes)? {
                    ChoiceOutcome::Answered(mode) => mode,
                    _ => return Ok(Resolution::Cancelled),
                }
            }
        };

        log_verbose!(game.logger(), choice, "{} fires {}", user, mode.name);
        match self.runner.run(game, user, &mode)? {
            EffectOutcome::Done => Ok(Resolution::Completed),
            EffectOutcome::Failed(reason) => {
                game.notify(user, &reason, Severity::Warning);
                Ok(Resolution::NotCompleted)
            }
            EffectOutcome::Cancelled => Ok(Resolution::Cancelled),
        }
    }

    fn damaged(&self) -> &[PlayerId] {
        self.runner.damaged()
    }
}

/// Base effect plus optional effects unlocked by prerequisites
pub struct GraphResolver<R> {
    graph: EffectGraph,
    runner: R,
}

impl<R: EffectRunner> GraphResolver<R> {
    pub fn new(graph: EffectGraph, runner: R) -> Self {
        GraphResolver { graph, runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }
}

impl<R: EffectRunner> Resolver for GraphResolver<R> {
    fn resolve(&mut self, game: &mut Match, user: PlayerId) -> Result<Resolution> {
        let channel = game.channel(user)?;
        let mut completed: Vec<EffectId> = Vec::new();

        loop {
            let eligible: Vec<EffectDef> =
                self.graph.eligible(&completed).into_iter().cloned().collect();
            if eligible.is_empty() {
                break;
            }
            let pending_base = eligible.iter().find(|e| self.graph.is_base(&e.id));

            let selected = match pending_base {
                Some(base) if eligible.len() == 1 => base.clone(),
                _ => {
                    let optional = pending_base.is_none();
                    match ask(channel.as_ref(), "Choose an effect", &eligible, optional)? {
                        ChoiceOutcome::Answered(Some(effect)) => effect,
                        ChoiceOutcome::Cancelled => return Ok(Resolution::Cancelled),
                        ChoiceOutcome::Answered(None) | ChoiceOutcome::TimedOut => match pending_base {
                            Some(base) => base.clone(),
                            None => break,
                        },
                    }
                }
            };

            log_verbose!(game.logger(), choice, "{} uses {}", user, selected.name);
            match self.runner.run(game, user, &selected)? {
                EffectOutcome::Done => completed.push(selected.id),
                EffectOutcome::Cancelled => return Ok(Resolution::Cancelled),
                EffectOutcome::Failed(reason) => {
                    game.notify(user, &reason, Severity::Warning);
                    if self.graph.is_base(&selected.id) {
                        return Ok(Resolution::NotCompleted);
                    }
                }
            }
        }

        let fired = self.graph.base().is_some_and(|base| completed.contains(base));
        Ok(if fired {
            Resolution::Completed
        } else {
            Resolution::NotCompleted
        })
    }

    fn damaged(&self) -> &[PlayerId] {
        self.runner.damaged()
    }
}

/// Runs effects for one weapon firing. Hits are remembered across the
/// effects of the same firing for the follow-up target rules.
pub struct EffectExecutor {
    weapon: String,
    /// Every player hit so far, first hit first
    hit: Vec<PlayerId>,
    damaged: Vec<PlayerId>,
    last_target: Option<PlayerId>,
}

impl EffectExecutor {
    pub fn new(weapon: impl Into<String>) -> Self {
        EffectExecutor {
            weapon: weapon.into(),
            hit: Vec::new(),
            damaged: Vec::new(),
            last_target: None,
        }
    }

    fn candidates(&self, game: &Match, user: PlayerId, rule: TargetRule) -> Result<Vec<PlayerId>> {
        let board = game.board();
        let Some(from) = board.position(user) else {
            return Ok(Vec::new());
        };
        let mut found = Vec::new();
        for other in game.player_ids() {
            if other == user {
                continue;
            }
            let Some(at) = board.position(other) else {
                continue;
            };
            let visible = board.can_see(from, at);
            let fresh = !self.hit.contains(&other);
            let keep = match rule {
                TargetRule::Visible => visible,
                TargetRule::NotVisible => !visible,
                TargetRule::VisibleAtLeast(n) => {
                    visible && board.distance(from, at).is_some_and(|d| d >= n)
                }
                TargetRule::AtDistance(n) => board.distance(from, at) == Some(n),
                TargetRule::SameSquare => at == from,
                TargetRule::PreviousTarget => !fresh,
                TargetRule::FreshVisible => visible && fresh,
                TargetRule::FreshSameSquare => at == from && fresh,
            };
            if keep {
                found.push(other);
            }
        }
        Ok(found)
    }

    /// Ask for up to `spec.max` distinct targets; the first is mandatory
    fn choose_targets(
        &self,
        game: &Match,
        user: PlayerId,
        spec: TargetSpec,
        mut pool: Vec<PlayerId>,
    ) -> Result<ChoiceOutcome<SmallVec<[PlayerId; 3]>>> {
        let channel = game.channel(user)?;
        let mut chosen: SmallVec<[PlayerId; 3]> = SmallVec::new();
        while (chosen.len() as u8) < spec.max && !pool.is_empty() {
            let target = if chosen.is_empty() {
                match ask_required(channel.as_ref(), "Choose a target", &pool)? {
                    ChoiceOutcome::Answered(target) => target,
                    _ => return Ok(ChoiceOutcome::Cancelled),
                }
            } else {
                match ask(channel.as_ref(), "Choose another target", &pool, true)? {
                    ChoiceOutcome::Answered(Some(target)) => target,
                    ChoiceOutcome::Cancelled => return Ok(ChoiceOutcome::Cancelled),
                    _ => break,
                }
            };
            pool.retain(|p| *p != target);
            chosen.push(target);
        }
        Ok(ChoiceOutcome::Answered(chosen))
    }

    /// Squares (other than the user's) that can be targeted by an area step
    fn area_squares(&self, game: &Match, user: PlayerId, area: Area) -> Vec<SquareId> {
        let board = game.board();
        let Some(from) = board.position(user) else {
            return Vec::new();
        };
        let occupied = |sq: &SquareId| board.players_at(*sq).iter().any(|p| *p != user);
        match area {
            Area::OwnSquare => Some(from).into_iter().filter(occupied).collect(),
            Area::VisibleSquare => board
                .squares()
                .into_iter()
                .filter(|sq| board.can_see(from, *sq))
                .filter(occupied)
                .collect(),
        }
    }

    fn strike(&mut self, game: &mut Match, user: PlayerId, target: PlayerId, damage: u8, marks: u8) -> Result<()> {
        if damage > 0 && game.apply_damage(user, target, damage)? > 0 && !self.damaged.contains(&target) {
            self.damaged.push(target);
        }
        if marks > 0 {
            game.apply_marks(user, target, marks)?;
        }
        if !self.hit.contains(&target) {
            self.hit.push(target);
        }
        self.last_target = Some(target);
        Ok(())
    }

    fn pay(&self, game: &mut Match, user: PlayerId, effect: &EffectDef) -> Result<Option<EffectOutcome>> {
        if effect.cost.is_free() {
            return Ok(None);
        }
        match game.player_mut(user)?.ammo.pay(&effect.cost) {
            Ok(()) => Ok(None),
            Err(err) => Ok(Some(EffectOutcome::Failed(format!(
                "{} {}: {}",
                self.weapon, effect.name, err
            )))),
        }
    }

    fn run_step(&mut self, game: &mut Match, user: PlayerId, step: &EffectStep, first: bool, effect: &EffectDef) -> Result<Option<EffectOutcome>> {
        let channel = game.channel(user)?;
        match step {
            EffectStep::Strike { damage, marks, targets } => {
                let pool = self.candidates(game, user, targets.rule)?;
                if pool.is_empty() {
                    return Ok(first.then(|| {
                        EffectOutcome::Failed(format!("{} {}: no valid target", self.weapon, effect.name))
                    }));
                }
                let chosen = match self.choose_targets(game, user, *targets, pool)? {
                    ChoiceOutcome::Answered(chosen) => chosen,
                    _ => return Ok(Some(EffectOutcome::Cancelled)),
                };
                if first {
                    if let Some(failure) = self.pay(game, user, effect)? {
                        return Ok(Some(failure));
                    }
                }
                for target in chosen {
                    self.strike(game, user, target, *damage, *marks)?;
                }
            }
            EffectStep::StrikeArea { damage, marks, area } => {
                let squares = self.area_squares(game, user, *area);
                if squares.is_empty() {
                    return Ok(first.then(|| {
                        EffectOutcome::Failed(format!("{} {}: nobody to hit", self.weapon, effect.name))
                    }));
                }
                let square = match ask_required(channel.as_ref(), "Choose a square to hit", &squares)? {
                    ChoiceOutcome::Answered(square) => square,
                    _ => return Ok(Some(EffectOutcome::Cancelled)),
                };
                if first {
                    if let Some(failure) = self.pay(game, user, effect)? {
                        return Ok(Some(failure));
                    }
                }
                let targets: Vec<PlayerId> = game
                    .board()
                    .players_at(square)
                    .into_iter()
                    .filter(|p| *p != user)
                    .collect();
                for target in targets {
                    self.strike(game, user, target, *damage, *marks)?;
                }
            }
            EffectStep::MoveSelf { max } => {
                if first {
                    if let Some(failure) = self.pay(game, user, effect)? {
                        return Ok(Some(failure));
                    }
                }
                let Some(from) = game.board().position(user) else {
                    return Err(EngineError::RuleViolation(format!("{} is not on the board", user)));
                };
                let squares: Vec<SquareId> = game
                    .board()
                    .reachable(from, *max)
                    .into_iter()
                    .filter(|sq| *sq != from)
                    .collect();
                match ask(channel.as_ref(), "Move to", &squares, true)? {
                    ChoiceOutcome::Answered(Some(to)) => game.board_mut().place(user, to)?,
                    ChoiceOutcome::Cancelled => return Ok(Some(EffectOutcome::Cancelled)),
                    _ => {}
                }
            }
            EffectStep::PushTarget { max } => {
                let Some(target) = self.last_target else {
                    return Ok(None);
                };
                let Some(at) = game.board().position(target) else {
                    return Ok(None);
                };
                let squares = push_destinations(game, at, *max);
                match ask(channel.as_ref(), "Push the target to", &squares, true)? {
                    ChoiceOutcome::Answered(Some(to)) => game.board_mut().place(target, to)?,
                    ChoiceOutcome::Cancelled => return Ok(Some(EffectOutcome::Cancelled)),
                    _ => {}
                }
            }
        }
        Ok(None)
    }
}

/// Squares reachable by moving straight from `at` in one direction
pub(crate) fn push_destinations(game: &Match, at: SquareId, max: u8) -> Vec<SquareId> {
    let mut squares = Vec::new();
    for direction in crate::map::Direction::ALL {
        for square in game.board().line(at, direction, max) {
            if !squares.contains(&square) {
                squares.push(square);
            }
        }
    }
    squares
}

impl EffectRunner for EffectExecutor {
    fn run(&mut self, game: &mut Match, user: PlayerId, effect: &EffectDef) -> Result<EffectOutcome> {
        if effect.steps.is_empty() {
            if let Some(failure) = self.pay(game, user, effect)? {
                return Ok(failure);
            }
            return Ok(EffectOutcome::Done);
        }
        for (i, step) in effect.steps.iter().enumerate() {
            if let Some(outcome) = self.run_step(game, user, step, i == 0, effect)? {
                return Ok(outcome);
            }
        }
        Ok(EffectOutcome::Done)
    }

    fn damaged(&self) -> &[PlayerId] {
        &self.damaged
    }
}
