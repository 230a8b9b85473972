//! Board collaborator: squares, player positions and geometric queries
//!
//! The rules engine only talks to the [`Board`] trait. [`GridBoard`] is the
//! room-and-door grid used by the stock layouts.

pub mod grid;

pub use grid::GridBoard;

use crate::core::{AmmoColor, AmmoTile, PlayerId, WeaponId};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Weapons displayed on a spawn square once refilled
pub const SPAWN_DISPLAY_SIZE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SquareId(u32);

impl SquareId {
    pub fn new(id: u32) -> Self {
        SquareId(id)
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SquareId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Row and column offset of one step
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::North => (-1, 0),
            Direction::East => (0, 1),
            Direction::South => (1, 0),
            Direction::West => (0, -1),
        }
    }
}

/// What a square offers to the grab action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SquareKind {
    Ammo { tile: Option<AmmoTile> },
    Spawn {
        color: AmmoColor,
        weapons: Vec<WeaponId>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Square {
    pub id: SquareId,
    pub row: u8,
    pub col: u8,
    /// Room letter from the layout
    pub room: char,
    pub kind: SquareKind,
}

impl Square {
    pub fn is_spawn(&self) -> bool {
        matches!(self.kind, SquareKind::Spawn { .. })
    }
}

/// Geometric queries and player positions consumed by the rules engine
pub trait Board: Send {
    fn square(&self, id: SquareId) -> Option<&Square>;

    fn square_mut(&mut self, id: SquareId) -> Option<&mut Square>;

    /// Every square on the board
    fn squares(&self) -> Vec<SquareId>;

    fn position(&self, player: PlayerId) -> Option<SquareId>;

    /// Put a player on a square (placing or moving)
    fn place(&mut self, player: PlayerId, square: SquareId) -> Result<()>;

    /// Take a player off the board (death)
    fn remove(&mut self, player: PlayerId);

    fn players_at(&self, square: SquareId) -> Vec<PlayerId>;

    fn spawn_point(&self, color: AmmoColor) -> Option<SquareId>;

    /// Squares reachable in at most `steps` moves, including `from`
    fn reachable(&self, from: SquareId, steps: u8) -> Vec<SquareId>;

    /// Moves needed to walk from `a` to `b`
    fn distance(&self, a: SquareId, b: SquareId) -> Option<u8>;

    fn can_see(&self, from: SquareId, to: SquareId) -> bool;

    /// Squares reached walking straight from `from`, up to `max` moves, nearest first
    fn line(&self, from: SquareId, direction: Direction, max: u8) -> Vec<SquareId>;

    /// The listed players standing where `from` can see
    fn visible_players(&self, from: SquareId, players: &[PlayerId]) -> Vec<PlayerId> {
        players
            .iter()
            .copied()
            .filter(|p| self.position(*p).is_some_and(|sq| self.can_see(from, sq)))
            .collect()
    }
}

/// Build a board from a layout id
pub fn board_for(board_id: u8) -> Result<Box<dyn Board>> {
    Ok(Box::new(GridBoard::layout(board_id)?))
}
