//! Actions and action cards
//!
//! An action is an ordered list of basic steps. The action card a player
//! holds decides which actions they may pick, how many main actions a turn
//! allows and which action (if any) is the extra "final" action.

use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};
use std::fmt;

/// Damage needed for the first adrenaline card
pub const ADRENALINE_1_DAMAGE: usize = 3;

/// Damage needed for the second adrenaline card
pub const ADRENALINE_2_DAMAGE: usize = 6;

/// One step of an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BasicStep {
    /// Move up to this many squares
    Move(u8),
    Grab,
    Reload,
    Shoot,
}

impl fmt::Display for BasicStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BasicStep::Move(n) => write!(f, "move {}", n),
            BasicStep::Grab => write!(f, "grab"),
            BasicStep::Reload => write!(f, "reload"),
            BasicStep::Shoot => write!(f, "shoot"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    pub steps: SmallVec<[BasicStep; 3]>,
}

impl Action {
    pub fn new(name: &str, steps: &[BasicStep]) -> Self {
        Action {
            name: name.to_string(),
            steps: SmallVec::from_slice(steps),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (", self.name)?;
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", step)?;
        }
        write!(f, ")")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionCardKind {
    Regular,
    Adrenaline1,
    Adrenaline2,
    /// Frenzy card for players acting before the first player
    FrenzyDouble,
    /// Frenzy card for the first player and those after
    FrenzySingle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCard {
    pub kind: ActionCardKind,
    pub max_actions: u8,
    pub actions: Vec<Action>,
    pub final_action: Option<Action>,
}

impl ActionCard {
    pub fn of_kind(kind: ActionCardKind) -> Self {
        use BasicStep::*;
        let reload = Some(Action::new("reload", &[Reload]));
        match kind {
            ActionCardKind::Regular => ActionCard {
                kind,
                max_actions: 2,
                actions: vec![
                    Action::new("run", &[Move(3)]),
                    Action::new("grab", &[Move(1), Grab]),
                    Action::new("shoot", &[Shoot]),
                ],
                final_action: reload,
            },
            ActionCardKind::Adrenaline1 => ActionCard {
                kind,
                max_actions: 2,
                actions: vec![
                    Action::new("run", &[Move(3)]),
                    Action::new("grab", &[Move(2), Grab]),
                    Action::new("shoot", &[Shoot]),
                ],
                final_action: reload,
            },
            ActionCardKind::Adrenaline2 => ActionCard {
                kind,
                max_actions: 2,
                actions: vec![
                    Action::new("run", &[Move(3)]),
                    Action::new("grab", &[Move(2), Grab]),
                    Action::new("shoot", &[Move(1), Shoot]),
                ],
                final_action: reload,
            },
            ActionCardKind::FrenzyDouble => ActionCard {
                kind,
                max_actions: 2,
                actions: vec![
                    Action::new("shoot", &[Move(1), Reload, Shoot]),
                    Action::new("run", &[Move(4)]),
                    Action::new("grab", &[Move(2), Grab]),
                ],
                final_action: None,
            },
            ActionCardKind::FrenzySingle => ActionCard {
                kind,
                max_actions: 1,
                actions: vec![
                    Action::new("shoot", &[Move(2), Reload, Shoot]),
                    Action::new("grab", &[Move(3), Grab]),
                ],
                final_action: None,
            },
        }
    }

    pub fn regular() -> Self {
        Self::of_kind(ActionCardKind::Regular)
    }

    /// Card matching a damage count outside frenzy
    pub fn for_damage(damage: usize) -> Self {
        if damage >= ADRENALINE_2_DAMAGE {
            Self::of_kind(ActionCardKind::Adrenaline2)
        } else if damage >= ADRENALINE_1_DAMAGE {
            Self::of_kind(ActionCardKind::Adrenaline1)
        } else {
            Self::regular()
        }
    }

    pub fn is_frenzy(&self) -> bool {
        matches!(
            self.kind,
            ActionCardKind::FrenzyDouble | ActionCardKind::FrenzySingle
        )
    }

    pub fn is_final(&self, action: &Action) -> bool {
        self.final_action.as_ref() == Some(action)
    }

    /// Actions selectable with `remaining` main actions left. The final action
    /// is only offered once the main actions are used up.
    pub fn available(&self, remaining: u8) -> SmallVec<[&Action; 4]> {
        if remaining > 0 {
            self.actions.iter().collect()
        } else {
            match &self.final_action {
                Some(action) => smallvec![action],
                None => SmallVec::new(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_for_damage() {
        assert_eq!(ActionCard::for_damage(0).kind, ActionCardKind::Regular);
        assert_eq!(ActionCard::for_damage(3).kind, ActionCardKind::Adrenaline1);
        assert_eq!(ActionCard::for_damage(5).kind, ActionCardKind::Adrenaline1);
        assert_eq!(ActionCard::for_damage(6).kind, ActionCardKind::Adrenaline2);
    }

    #[test]
    fn test_final_action_offered_last() {
        let card = ActionCard::regular();
        assert_eq!(card.available(2).len(), 3);
        let last = card.available(0);
        assert_eq!(last.len(), 1);
        assert!(card.is_final(last[0]));

        let frenzy = ActionCard::of_kind(ActionCardKind::FrenzySingle);
        assert!(frenzy.is_frenzy());
        assert!(frenzy.available(0).is_empty());
    }

    #[test]
    fn test_action_display() {
        let card = ActionCard::of_kind(ActionCardKind::Adrenaline2);
        assert_eq!(card.actions[2].to_string(), "shoot (move 1, shoot)");
    }
}
