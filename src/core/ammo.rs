//! Ammo cubes, costs and the per-player ammo pool

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Maximum cubes of a single color a player may hold
pub const MAX_AMMO_PER_COLOR: u8 = 3;

/// Ammo cube colors (also used for spawn points and power-up colors)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AmmoColor {
    Red,
    Blue,
    Yellow,
}

impl AmmoColor {
    pub const ALL: [AmmoColor; 3] = [AmmoColor::Red, AmmoColor::Blue, AmmoColor::Yellow];
}

impl fmt::Display for AmmoColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmmoColor::Red => write!(f, "R"),
            AmmoColor::Blue => write!(f, "B"),
            AmmoColor::Yellow => write!(f, "Y"),
        }
    }
}

/// An ammo cost (e.g. "RRB" = 2 red + 1 blue, "*" = one cube of any color)
/// Copy-eligible since it's just 4 u8 fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AmmoCost {
    pub red: u8,
    pub blue: u8,
    pub yellow: u8,
    /// Cubes of any color
    pub any: u8,
}

impl AmmoCost {
    pub fn free() -> Self {
        Self::default()
    }

    /// Parse a cost string like "RRB" or "Y*"
    pub fn from_string(s: &str) -> Self {
        let mut cost = AmmoCost::default();
        for c in s.chars() {
            match c {
                'R' => cost.red += 1,
                'B' => cost.blue += 1,
                'Y' => cost.yellow += 1,
                '*' => cost.any += 1,
                _ => {} // Ignore other characters
            }
        }
        cost
    }

    pub fn single(color: AmmoColor) -> Self {
        let mut cost = AmmoCost::default();
        *cost.amount_mut(color) += 1;
        cost
    }

    pub fn amount(&self, color: AmmoColor) -> u8 {
        match color {
            AmmoColor::Red => self.red,
            AmmoColor::Blue => self.blue,
            AmmoColor::Yellow => self.yellow,
        }
    }

    fn amount_mut(&mut self, color: AmmoColor) -> &mut u8 {
        match color {
            AmmoColor::Red => &mut self.red,
            AmmoColor::Blue => &mut self.blue,
            AmmoColor::Yellow => &mut self.yellow,
        }
    }

    /// Total number of cubes
    pub fn cubes(&self) -> u8 {
        self.red + self.blue + self.yellow + self.any
    }

    pub fn is_free(&self) -> bool {
        self.cubes() == 0
    }

    /// The same cost with one cube of `color` removed (purchase cost of a weapon)
    pub fn without_one(&self, color: AmmoColor) -> Self {
        let mut cost = *self;
        let slot = cost.amount_mut(color);
        *slot = slot.saturating_sub(1);
        cost
    }
}

impl fmt::Display for AmmoCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_free() {
            return write!(f, "free");
        }
        for color in AmmoColor::ALL {
            for _ in 0..self.amount(color) {
                write!(f, "{}", color)?;
            }
        }
        for _ in 0..self.any {
            write!(f, "*")?;
        }
        Ok(())
    }
}

/// Payment failures. These are expected gameplay outcomes, not engine errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    #[error("not enough ammo to pay {cost}")]
    InsufficientAmmo { cost: AmmoCost },
}

/// Ammo held by a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AmmoPool {
    pub red: u8,
    pub blue: u8,
    pub yellow: u8,
}

impl AmmoPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starting ammo: one cube of each color
    pub fn starting() -> Self {
        AmmoPool {
            red: 1,
            blue: 1,
            yellow: 1,
        }
    }

    pub fn amount(&self, color: AmmoColor) -> u8 {
        match color {
            AmmoColor::Red => self.red,
            AmmoColor::Blue => self.blue,
            AmmoColor::Yellow => self.yellow,
        }
    }

    fn amount_mut(&mut self, color: AmmoColor) -> &mut u8 {
        match color {
            AmmoColor::Red => &mut self.red,
            AmmoColor::Blue => &mut self.blue,
            AmmoColor::Yellow => &mut self.yellow,
        }
    }

    /// Add one cube, returns false if that color is already full
    pub fn add(&mut self, color: AmmoColor) -> bool {
        let slot = self.amount_mut(color);
        if *slot >= MAX_AMMO_PER_COLOR {
            return false;
        }
        *slot += 1;
        true
    }

    pub fn total(&self) -> u8 {
        self.red + self.blue + self.yellow
    }

    /// Colors used to cover the "any" part of a cost, most abundant first
    fn any_plan(&self, cost: &AmmoCost) -> Option<AmmoPool> {
        let mut rest = AmmoPool {
            red: self.red.checked_sub(cost.red)?,
            blue: self.blue.checked_sub(cost.blue)?,
            yellow: self.yellow.checked_sub(cost.yellow)?,
        };
        for _ in 0..cost.any {
            let color = AmmoColor::ALL
                .into_iter()
                .filter(|c| rest.amount(*c) > 0)
                .max_by_key(|c| rest.amount(*c))?;
            *rest.amount_mut(color) -= 1;
        }
        Some(rest)
    }

    pub fn can_pay(&self, cost: &AmmoCost) -> bool {
        self.any_plan(cost).is_some()
    }

    /// Pay a cost atomically: either everything is deducted or nothing is
    pub fn pay(&mut self, cost: &AmmoCost) -> Result<(), PaymentError> {
        match self.any_plan(cost) {
            Some(rest) => {
                *self = rest;
                Ok(())
            }
            None => Err(PaymentError::InsufficientAmmo { cost: *cost }),
        }
    }
}

impl fmt::Display for AmmoPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{} B{} Y{}", self.red, self.blue, self.yellow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_parsing() {
        let cost = AmmoCost::from_string("RRB*");
        assert_eq!(cost.red, 2);
        assert_eq!(cost.blue, 1);
        assert_eq!(cost.yellow, 0);
        assert_eq!(cost.any, 1);
        assert_eq!(cost.cubes(), 4);
        assert_eq!(cost.to_string(), "RRB*");
    }

    #[test]
    fn test_purchase_cost() {
        let reload = AmmoCost::from_string("BBY");
        let purchase = reload.without_one(AmmoColor::Blue);
        assert_eq!(purchase, AmmoCost::from_string("BY"));
        assert_eq!(AmmoCost::single(AmmoColor::Red).without_one(AmmoColor::Red), AmmoCost::free());
    }

    #[test]
    fn test_pool_cap() {
        let mut pool = AmmoPool::starting();
        assert!(pool.add(AmmoColor::Red));
        assert!(pool.add(AmmoColor::Red));
        assert!(!pool.add(AmmoColor::Red));
        assert_eq!(pool.red, MAX_AMMO_PER_COLOR);
    }

    #[test]
    fn test_payment_is_atomic() {
        let mut pool = AmmoPool::starting();
        let err = pool.pay(&AmmoCost::from_string("RR")).unwrap_err();
        assert_eq!(
            err,
            PaymentError::InsufficientAmmo {
                cost: AmmoCost::from_string("RR")
            }
        );
        assert_eq!(pool, AmmoPool::starting());

        pool.pay(&AmmoCost::from_string("RB")).unwrap();
        assert_eq!(pool.total(), 1);
        assert_eq!(pool.yellow, 1);
    }

    #[test]
    fn test_any_uses_most_abundant_color() {
        let mut pool = AmmoPool {
            red: 1,
            blue: 3,
            yellow: 0,
        };
        pool.pay(&AmmoCost::from_string("*")).unwrap();
        assert_eq!(pool.blue, 2);
        assert!(!AmmoPool::new().can_pay(&AmmoCost::from_string("*")));
    }
}
