//! Weapon effect definitions
//!
//! A weapon either offers mutually exclusive firing modes or a dependency
//! graph of one mandatory base effect plus optional effects, each optional
//! effect declaring which effects must have completed before it.

use crate::core::{AmmoCost, EffectId};
use crate::{EngineError, Result};
use smallvec::SmallVec;
use std::fmt;

/// Which players an effect step may pick as targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetRule {
    /// Any player the shooter can see
    Visible,
    /// Any player the shooter cannot see
    NotVisible,
    /// A visible player at least this many moves away
    VisibleAtLeast(u8),
    /// A player exactly this many moves away
    AtDistance(u8),
    /// A player on the shooter's square
    SameSquare,
    /// A player already hit during this firing
    PreviousTarget,
    /// A visible player not yet hit during this firing
    FreshVisible,
    /// A player on the shooter's square not yet hit during this firing
    FreshSameSquare,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSpec {
    pub rule: TargetRule,
    /// Up to this many distinct targets (at least one is required)
    pub max: u8,
}

impl TargetSpec {
    pub fn one(rule: TargetRule) -> Self {
        TargetSpec { rule, max: 1 }
    }

    pub fn up_to(rule: TargetRule, max: u8) -> Self {
        TargetSpec { rule, max }
    }
}

/// Area hit by area effects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Area {
    /// Everyone else on the shooter's square
    OwnSquare,
    /// Everyone on one square the shooter can see (chosen), other than the shooter
    VisibleSquare,
}

/// One step of an effect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectStep {
    /// Damage and/or mark chosen targets
    Strike {
        damage: u8,
        marks: u8,
        targets: TargetSpec,
    },
    /// Damage and/or mark everyone in an area
    StrikeArea { damage: u8, marks: u8, area: Area },
    /// Move the shooter up to `max` squares
    MoveSelf { max: u8 },
    /// Push the last target hit up to `max` squares in one direction
    PushTarget { max: u8 },
}

/// A single effect (firing mode or graph node)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectDef {
    pub id: EffectId,
    pub name: String,
    /// Extra cost paid when the effect runs
    pub cost: AmmoCost,
    pub steps: SmallVec<[EffectStep; 2]>,
}

impl EffectDef {
    pub fn new(id: &str, name: &str, cost: &str) -> Self {
        EffectDef {
            id: EffectId::from(id),
            name: name.to_string(),
            cost: AmmoCost::from_string(cost),
            steps: SmallVec::new(),
        }
    }

    pub fn step(mut self, step: EffectStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn strike(self, damage: u8, marks: u8, targets: TargetSpec) -> Self {
        self.step(EffectStep::Strike {
            damage,
            marks,
            targets,
        })
    }
}

impl fmt::Display for EffectDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cost.is_free() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} [{}]", self.name, self.cost)
        }
    }
}

/// Dependency graph of weapon effects
#[derive(Debug, Clone, Default)]
pub struct EffectGraph {
    effects: Vec<EffectDef>,
    prerequisites: Vec<SmallVec<[EffectId; 2]>>,
    base: Option<EffectId>,
}

impl EffectGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an effect. The mandatory base must declare no prerequisites and
    /// only one base may exist; prerequisites must name effects added earlier.
    pub fn add(&mut self, def: EffectDef, requires: &[&str], mandatory: bool) -> Result<()> {
        if self.effect(&def.id).is_some() {
            return Err(EngineError::Config(format!("duplicate effect '{}'", def.id)));
        }
        if mandatory {
            if !requires.is_empty() {
                return Err(EngineError::Config(format!(
                    "base effect '{}' cannot declare prerequisites",
                    def.id
                )));
            }
            if let Some(existing) = &self.base {
                return Err(EngineError::Config(format!(
                    "base effect '{}' added but '{}' is already the base",
                    def.id, existing
                )));
            }
            self.base = Some(def.id.clone());
        }
        let mut deps = SmallVec::new();
        for req in requires {
            let req = EffectId::from(*req);
            if self.effect(&req).is_none() {
                return Err(EngineError::Config(format!(
                    "effect '{}' requires unknown effect '{}'",
                    def.id, req
                )));
            }
            deps.push(req);
        }
        self.effects.push(def);
        self.prerequisites.push(deps);
        Ok(())
    }

    pub fn with_base(mut self, def: EffectDef) -> Result<Self> {
        self.add(def, &[], true)?;
        Ok(self)
    }

    pub fn with_optional(mut self, def: EffectDef, requires: &[&str]) -> Result<Self> {
        self.add(def, requires, false)?;
        Ok(self)
    }

    pub fn effect(&self, id: &EffectId) -> Option<&EffectDef> {
        self.effects.iter().find(|e| &e.id == id)
    }

    pub fn effects(&self) -> &[EffectDef] {
        &self.effects
    }

    pub fn base(&self) -> Option<&EffectId> {
        self.base.as_ref()
    }

    pub fn is_base(&self, id: &EffectId) -> bool {
        self.base.as_ref() == Some(id)
    }

    /// Effects not yet completed whose prerequisites are all completed
    pub fn eligible(&self, completed: &[EffectId]) -> Vec<&EffectDef> {
        self.effects
            .iter()
            .zip(&self.prerequisites)
            .filter(|(def, deps)| {
                !completed.contains(&def.id) && deps.iter().all(|d| completed.contains(d))
            })
            .map(|(def, _)| def)
            .collect()
    }
}

/// How a weapon's effects are resolved
#[derive(Debug, Clone)]
pub enum WeaponEffects {
    /// Mutually exclusive firing modes: exactly one runs
    Modes(Vec<EffectDef>),
    /// Base effect plus optional effects with prerequisites
    Graph(EffectGraph),
}

impl WeaponEffects {
    pub fn modes(modes: Vec<EffectDef>) -> Result<Self> {
        if modes.is_empty() {
            return Err(EngineError::Config("weapon declares no firing modes".to_string()));
        }
        Ok(WeaponEffects::Modes(modes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strike(id: &str) -> EffectDef {
        EffectDef::new(id, id, "").strike(1, 0, TargetSpec::one(TargetRule::Visible))
    }

    #[test]
    fn test_second_base_is_rejected() {
        let mut graph = EffectGraph::new();
        graph.add(strike("basic"), &[], true).unwrap();
        let err = graph.add(strike("other"), &[], true).unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn test_base_with_prerequisites_is_rejected() {
        let mut graph = EffectGraph::new();
        graph.add(strike("glide"), &[], false).unwrap();
        let err = graph.add(strike("basic"), &["glide"], true).unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
        assert!(graph.base().is_none());
    }

    #[test]
    fn test_unknown_prerequisite_is_rejected() {
        let err = EffectGraph::new()
            .with_optional(strike("focus"), &["basic"])
            .unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn test_eligibility_follows_prerequisites() {
        let graph = EffectGraph::new()
            .with_base(strike("basic"))
            .and_then(|g| g.with_optional(strike("glide"), &[]))
            .and_then(|g| g.with_optional(strike("chain"), &["basic"]))
            .and_then(|g| g.with_optional(strike("voltage"), &["chain"]))
            .unwrap();

        let ids = |done: &[EffectId]| -> Vec<String> {
            graph
                .eligible(done)
                .iter()
                .map(|e| e.id.to_string())
                .collect()
        };

        assert_eq!(ids(&[]), vec!["basic", "glide"]);
        assert_eq!(ids(&[EffectId::from("basic")]), vec!["glide", "chain"]);
        assert_eq!(
            ids(&[EffectId::from("basic"), EffectId::from("chain")]),
            vec!["glide", "voltage"]
        );
        assert!(graph.is_base(&EffectId::from("basic")));
    }

    #[test]
    fn test_empty_modes_rejected() {
        assert!(WeaponEffects::modes(Vec::new()).is_err());
    }
}
