//! Room-and-door grid board
//!
//! Squares of the same room are always connected; squares of different rooms
//! are connected only through a door. A player sees every square of their own
//! room plus every square of a room reached through a door of their square.

use crate::core::{AmmoColor, PlayerId};
use crate::map::{Board, Direction, Square, SquareId, SquareKind};
use crate::{EngineError, Result};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

/// Stock layout: rows of room letters ('.' is no square), spawn squares and doors
struct Layout {
    rows: &'static [&'static str],
    spawns: &'static [(u8, u8, AmmoColor)],
    doors: &'static [((u8, u8), (u8, u8))],
}

const LAYOUT_1: Layout = Layout {
    rows: &["BBB.", "RRRY", ".WWY"],
    spawns: &[
        (0, 2, AmmoColor::Blue),
        (1, 0, AmmoColor::Red),
        (2, 3, AmmoColor::Yellow),
    ],
    doors: &[
        ((0, 0), (1, 0)),
        ((0, 2), (1, 2)),
        ((1, 2), (1, 3)),
        ((1, 1), (2, 1)),
        ((2, 2), (2, 3)),
    ],
};

const LAYOUT_2: Layout = Layout {
    rows: &["BBBG", "RRYY", ".WYY"],
    spawns: &[
        (0, 2, AmmoColor::Blue),
        (1, 0, AmmoColor::Red),
        (2, 3, AmmoColor::Yellow),
    ],
    doors: &[
        ((0, 0), (1, 0)),
        ((0, 2), (0, 3)),
        ((0, 3), (1, 3)),
        ((1, 1), (2, 1)),
        ((2, 1), (2, 2)),
    ],
};

#[derive(Debug, Clone)]
pub struct GridBoard {
    rows: u8,
    cols: u8,
    cells: Vec<Option<Square>>,
    doors: FxHashSet<(SquareId, SquareId)>,
    positions: FxHashMap<PlayerId, SquareId>,
}

impl GridBoard {
    /// Build one of the stock layouts (ids 1 and 2)
    pub fn layout(board_id: u8) -> Result<Self> {
        match board_id {
            1 => Self::build(&LAYOUT_1),
            2 => Self::build(&LAYOUT_2),
            other => Err(EngineError::Config(format!("unknown board id {}", other))),
        }
    }

    fn build(layout: &Layout) -> Result<Self> {
        let rows = layout.rows.len() as u8;
        let cols = layout.rows.first().map(|r| r.len()).unwrap_or(0) as u8;
        let mut cells = Vec::with_capacity(rows as usize * cols as usize);

        for (r, line) in layout.rows.iter().enumerate() {
            if line.len() != cols as usize {
                return Err(EngineError::Config(format!("layout row {} has the wrong width", r)));
            }
            for (c, room) in line.chars().enumerate() {
                if room == '.' {
                    cells.push(None);
                    continue;
                }
                cells.push(Some(Square {
                    id: SquareId::new((r * cols as usize + c) as u32),
                    row: r as u8,
                    col: c as u8,
                    room,
                    kind: SquareKind::Ammo { tile: None },
                }));
            }
        }

        let mut board = GridBoard {
            rows,
            cols,
            cells,
            doors: FxHashSet::default(),
            positions: FxHashMap::default(),
        };

        for (row, col, color) in layout.spawns {
            let id = board
                .id_at(*row as i32, *col as i32)
                .ok_or_else(|| EngineError::Config(format!("spawn ({}, {}) is off the board", row, col)))?;
            if let Some(square) = board.square_mut(id) {
                square.kind = SquareKind::Spawn {
                    color: *color,
                    weapons: Vec::new(),
                };
            }
        }

        for (a, b) in layout.doors {
            let a = board.id_at(a.0 as i32, a.1 as i32);
            let b = board.id_at(b.0 as i32, b.1 as i32);
            match (a, b) {
                (Some(a), Some(b)) => {
                    board.doors.insert((a.min(b), a.max(b)));
                }
                _ => return Err(EngineError::Config("door is off the board".to_string())),
            }
        }

        Ok(board)
    }

    fn id_at(&self, row: i32, col: i32) -> Option<SquareId> {
        if row < 0 || col < 0 || row >= self.rows as i32 || col >= self.cols as i32 {
            return None;
        }
        let index = row as usize * self.cols as usize + col as usize;
        self.cells[index].as_ref().map(|s| s.id)
    }

    fn room_of(&self, id: SquareId) -> Option<char> {
        self.square(id).map(|s| s.room)
    }

    fn has_door(&self, a: SquareId, b: SquareId) -> bool {
        self.doors.contains(&(a.min(b), a.max(b)))
    }

    /// One step from `from` in `direction`, if no wall is in the way
    fn step(&self, from: SquareId, direction: Direction) -> Option<SquareId> {
        let square = self.square(from)?;
        let (dr, dc) = direction.delta();
        let next = self.id_at(square.row as i32 + dr, square.col as i32 + dc)?;
        let same_room = self.room_of(next) == Some(square.room);
        if same_room || self.has_door(from, next) {
            Some(next)
        } else {
            None
        }
    }

    fn neighbors(&self, from: SquareId) -> impl Iterator<Item = SquareId> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(move |d| self.step(from, d))
    }

    /// Breadth-first distances from `from`, stopping at `limit` moves
    fn distances(&self, from: SquareId, limit: u8) -> FxHashMap<SquareId, u8> {
        let mut seen = FxHashMap::default();
        if self.square(from).is_none() {
            return seen;
        }
        let mut queue = VecDeque::new();
        seen.insert(from, 0);
        queue.push_back(from);
        while let Some(current) = queue.pop_front() {
            let dist = seen[&current];
            if dist == limit {
                continue;
            }
            for next in self.neighbors(current) {
                if !seen.contains_key(&next) {
                    seen.insert(next, dist + 1);
                    queue.push_back(next);
                }
            }
        }
        seen
    }
}

impl Board for GridBoard {
    fn square(&self, id: SquareId) -> Option<&Square> {
        self.cells.get(id.index()).and_then(|c| c.as_ref())
    }

    fn square_mut(&mut self, id: SquareId) -> Option<&mut Square> {
        self.cells.get_mut(id.index()).and_then(|c| c.as_mut())
    }

    fn squares(&self) -> Vec<SquareId> {
        self.cells.iter().flatten().map(|s| s.id).collect()
    }

    fn position(&self, player: PlayerId) -> Option<SquareId> {
        self.positions.get(&player).copied()
    }

    fn place(&mut self, player: PlayerId, square: SquareId) -> Result<()> {
        if self.square(square).is_none() {
            return Err(EngineError::RuleViolation(format!(
                "cannot place {} on missing square {}",
                player, square
            )));
        }
        self.positions.insert(player, square);
        Ok(())
    }

    fn remove(&mut self, player: PlayerId) {
        self.positions.remove(&player);
    }

    fn players_at(&self, square: SquareId) -> Vec<PlayerId> {
        let mut players: Vec<PlayerId> = self
            .positions
            .iter()
            .filter(|(_, sq)| **sq == square)
            .map(|(p, _)| *p)
            .collect();
        players.sort();
        players
    }

    fn spawn_point(&self, color: AmmoColor) -> Option<SquareId> {
        self.cells.iter().flatten().find_map(|s| match &s.kind {
            SquareKind::Spawn { color: c, .. } if *c == color => Some(s.id),
            _ => None,
        })
    }

    fn reachable(&self, from: SquareId, steps: u8) -> Vec<SquareId> {
        let mut squares: Vec<SquareId> = self.distances(from, steps).into_keys().collect();
        squares.sort();
        squares
    }

    fn distance(&self, a: SquareId, b: SquareId) -> Option<u8> {
        self.distances(a, u8::MAX).get(&b).copied()
    }

    fn can_see(&self, from: SquareId, to: SquareId) -> bool {
        let (Some(from_room), Some(to_room)) = (self.room_of(from), self.room_of(to)) else {
            return false;
        };
        if from_room == to_room {
            return true;
        }
        self.neighbors(from)
            .any(|n| self.has_door(from, n) && self.room_of(n) == Some(to_room))
    }

    fn line(&self, from: SquareId, direction: Direction, max: u8) -> Vec<SquareId> {
        let mut squares = Vec::new();
        let mut current = from;
        for _ in 0..max {
            match self.step(current, direction) {
                Some(next) => {
                    squares.push(next);
                    current = next;
                }
                None => break,
            }
        }
        squares
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(board: &GridBoard, row: i32, col: i32) -> SquareId {
        board.id_at(row, col).unwrap()
    }

    #[test]
    fn test_unknown_layout() {
        assert!(matches!(GridBoard::layout(9), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_spawn_points() {
        let board = GridBoard::layout(1).unwrap();
        assert_eq!(board.spawn_point(AmmoColor::Blue), Some(sq(&board, 0, 2)));
        assert_eq!(board.spawn_point(AmmoColor::Red), Some(sq(&board, 1, 0)));
        assert_eq!(board.spawn_point(AmmoColor::Yellow), Some(sq(&board, 2, 3)));
        assert_eq!(board.squares().len(), 10);
    }

    #[test]
    fn test_walls_block_movement() {
        let board = GridBoard::layout(1).unwrap();
        // (0,1) and (1,1) are different rooms with no door
        assert_eq!(board.step(sq(&board, 0, 1), Direction::South), None);
        // door between (0,2) and (1,2)
        assert_eq!(
            board.step(sq(&board, 0, 2), Direction::South),
            Some(sq(&board, 1, 2))
        );
        assert_eq!(board.distance(sq(&board, 0, 1), sq(&board, 1, 1)), Some(3));
    }

    #[test]
    fn test_reachable_includes_origin() {
        let board = GridBoard::layout(1).unwrap();
        let from = sq(&board, 1, 0);
        assert_eq!(board.reachable(from, 0), vec![from]);
        let one = board.reachable(from, 1);
        assert!(one.contains(&sq(&board, 0, 0)));
        assert!(one.contains(&sq(&board, 1, 1)));
        assert_eq!(one.len(), 3);
    }

    #[test]
    fn test_visibility_through_doors() {
        let board = GridBoard::layout(1).unwrap();
        let red_corner = sq(&board, 1, 2);
        // own room
        assert!(board.can_see(red_corner, sq(&board, 1, 0)));
        // blue room through the door at (0,2)
        assert!(board.can_see(red_corner, sq(&board, 0, 0)));
        // yellow room through the door at (1,3)
        assert!(board.can_see(red_corner, sq(&board, 2, 3)));
        // white room has no door from this square
        assert!(!board.can_see(red_corner, sq(&board, 2, 1)));
    }

    #[test]
    fn test_line_stops_at_walls() {
        let board = GridBoard::layout(1).unwrap();
        let line = board.line(sq(&board, 1, 0), Direction::East, 3);
        assert_eq!(
            line,
            vec![sq(&board, 1, 1), sq(&board, 1, 2), sq(&board, 1, 3)]
        );
        assert!(board.line(sq(&board, 0, 1), Direction::South, 2).is_empty());
    }

    #[test]
    fn test_positions() {
        let mut board = GridBoard::layout(2).unwrap();
        let p0 = PlayerId::new(0);
        let p1 = PlayerId::new(1);
        let spot = sq(&board, 1, 1);
        board.place(p1, spot).unwrap();
        board.place(p0, spot).unwrap();
        assert_eq!(board.players_at(spot), vec![p0, p1]);
        board.remove(p0);
        assert_eq!(board.position(p0), None);
        assert!(board.place(p0, SquareId::new(8)).is_err());
        assert_eq!(board.visible_players(sq(&board, 1, 0), &[p0, p1]), vec![p1]);
    }
}
