//! Resolver construction
//!
//! The turn controller and the shoot action never name concrete resolver
//! types: they ask the factory for a resolver wired for an action, a basic
//! step, a weapon or a power-up, and only use the [`Resolver`] capability.

use crate::core::{Action, BasicStep, PlayerId, PowerUpKind, WeaponCard, WeaponEffects};
use crate::game::actions::{
    ActionResolver, GrabResolver, MoveResolver, ReloadResolver, ShootResolver,
};
use crate::game::effects::{EffectExecutor, GraphResolver, ModeResolver};
use crate::game::power_ups::{NewtonResolver, ScopeResolver, TagbackResolver, TeleporterResolver};
use crate::game::Match;
use crate::Result;
use serde::{Deserialize, Serialize};

/// How a resolver ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    Completed,
    /// Declined or failed; the player has been told why if it failed
    NotCompleted,
    /// A choice was cancelled (the player went away); unwinds to the turn boundary
    Cancelled,
}

impl Resolution {
    pub fn is_completed(&self) -> bool {
        matches!(self, Resolution::Completed)
    }
}

/// One-shot executor of an action, step, weapon or power-up
pub trait Resolver {
    fn resolve(&mut self, game: &mut Match, user: PlayerId) -> Result<Resolution>;

    /// Players who took damage, in the order they were first hit
    fn damaged(&self) -> &[PlayerId] {
        &[]
    }
}

/// When a power-up is being played
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PowerUpContext {
    /// From the turn menu
    OwnTurn,
    /// Right after firing, with the players hit by the shot
    WhileShooting { damaged: Vec<PlayerId> },
    /// In the revenge window after `shooter` damaged the user
    Revenge { shooter: PlayerId },
}

pub struct ResolverFactory;

impl ResolverFactory {
    pub fn for_action(action: &Action) -> Box<dyn Resolver> {
        Box::new(ActionResolver::new(action.clone()))
    }

    pub fn for_step(step: BasicStep) -> Box<dyn Resolver> {
        match step {
            BasicStep::Move(max) => Box::new(MoveResolver::new(max)),
            BasicStep::Grab => Box::new(GrabResolver),
            BasicStep::Reload => Box::new(ReloadResolver),
            BasicStep::Shoot => Box::new(ShootResolver),
        }
    }

    pub fn for_weapon(weapon: &WeaponCard) -> Box<dyn Resolver> {
        let executor = EffectExecutor::new(weapon.name.clone());
        match &weapon.effects {
            WeaponEffects::Modes(modes) => Box::new(ModeResolver::new(modes.clone(), executor)),
            WeaponEffects::Graph(graph) => Box::new(GraphResolver::new(graph.clone(), executor)),
        }
    }

    /// None when the power-up cannot be played in this context
    pub fn for_power_up(kind: PowerUpKind, context: PowerUpContext) -> Option<Box<dyn Resolver>> {
        match (kind, context) {
            (PowerUpKind::Teleporter, PowerUpContext::OwnTurn) => Some(Box::new(TeleporterResolver)),
            (PowerUpKind::Newton, PowerUpContext::OwnTurn) => Some(Box::new(NewtonResolver)),
            (PowerUpKind::TargetingScope, PowerUpContext::WhileShooting { damaged }) => {
                Some(Box::new(ScopeResolver::new(damaged)))
            }
            (PowerUpKind::TagbackGrenade, PowerUpContext::Revenge { shooter }) => {
                Some(Box::new(TagbackResolver::new(shooter)))
            }
            _ => None,
        }
    }
}
