//! Player board: damage track, marks and death bookkeeping

use crate::core::PlayerId;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Damage count at which a board dies
pub const KILL_THRESHOLD: usize = 11;

/// Damage count at which a death becomes an overkill (also the damage cap)
pub const OVERKILL_THRESHOLD: usize = 12;

/// Marks a single shooter can have on one board
pub const MAX_MARKS_PER_SHOOTER: u8 = 3;

/// Points for the regular side, best contributor first
pub const REGULAR_POINTS: [u32; 6] = [8, 6, 4, 2, 1, 1];

/// Points for the frenzy side
pub const FRENZY_POINTS: [u32; 4] = [2, 1, 1, 1];

/// Which side of the board is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoardSide {
    Regular,
    Frenzy,
}

/// Invalid transitions on a player board. End-of-turn sweeps skip the
/// offending player instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("board is not dead")]
    NotDead,
    #[error("board still carries damage")]
    CarriesDamage,
    #[error("board already shows the frenzy side")]
    AlreadyFrenzy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerBoard {
    /// Damage markers in the order they were dealt; each entry is the shooter
    damage: Vec<PlayerId>,
    marks: FxHashMap<PlayerId, u8>,
    deaths: u32,
    side: BoardSide,
}

impl PlayerBoard {
    pub fn new() -> Self {
        PlayerBoard {
            damage: Vec::with_capacity(OVERKILL_THRESHOLD),
            marks: FxHashMap::default(),
            deaths: 0,
            side: BoardSide::Regular,
        }
    }

    /// Add damage from `shooter`. The shooter's marks on this board convert
    /// into extra damage. Returns how many markers were actually placed.
    pub fn add_damage(&mut self, shooter: PlayerId, amount: u8) -> u8 {
        if amount == 0 {
            return 0;
        }
        let converted = self.marks.remove(&shooter).unwrap_or(0);
        let wanted = (amount + converted) as usize;
        let room = OVERKILL_THRESHOLD - self.damage.len();
        let placed = wanted.min(room);
        self.damage.extend(std::iter::repeat(shooter).take(placed));
        placed as u8
    }

    /// Add marks from `shooter`, capped per shooter. Returns marks placed.
    pub fn add_marks(&mut self, shooter: PlayerId, amount: u8) -> u8 {
        let current = self.marks.entry(shooter).or_insert(0);
        let placed = amount.min(MAX_MARKS_PER_SHOOTER - *current);
        *current += placed;
        if *current == 0 {
            self.marks.remove(&shooter);
        }
        placed
    }

    pub fn damage(&self) -> &[PlayerId] {
        &self.damage
    }

    pub fn damage_count(&self) -> usize {
        self.damage.len()
    }

    pub fn marks_from(&self, shooter: PlayerId) -> u8 {
        self.marks.get(&shooter).copied().unwrap_or(0)
    }

    pub fn total_marks(&self) -> u32 {
        self.marks.values().map(|m| *m as u32).sum()
    }

    pub fn is_dead(&self) -> bool {
        self.damage.len() >= KILL_THRESHOLD
    }

    pub fn is_overkilled(&self) -> bool {
        self.damage.len() >= OVERKILL_THRESHOLD
    }

    /// Shooter of the killing blow
    pub fn killer(&self) -> Option<PlayerId> {
        self.damage.get(KILL_THRESHOLD - 1).copied()
    }

    /// Shooter of the overkill blow
    pub fn overkiller(&self) -> Option<PlayerId> {
        self.damage.get(OVERKILL_THRESHOLD - 1).copied()
    }

    pub fn first_blood(&self) -> Option<PlayerId> {
        self.damage.first().copied()
    }

    /// Damage dealt by each shooter, in order of their first damage marker
    pub fn contributions(&self) -> Vec<(PlayerId, usize)> {
        let mut tally: Vec<(PlayerId, usize)> = Vec::new();
        for shooter in &self.damage {
            match tally.iter_mut().find(|(p, _)| p == shooter) {
                Some((_, count)) => *count += 1,
                None => tally.push((*shooter, 1)),
            }
        }
        tally
    }

    pub fn deaths(&self) -> u32 {
        self.deaths
    }

    pub fn side(&self) -> BoardSide {
        self.side
    }

    /// Regular boards award a first-blood point, frenzy boards do not
    pub fn awards_first_blood(&self) -> bool {
        self.side == BoardSide::Regular
    }

    /// Point values for this board, already shifted by the death count
    pub fn point_values(&self) -> Vec<u32> {
        let table: &[u32] = match self.side {
            BoardSide::Regular => &REGULAR_POINTS,
            BoardSide::Frenzy => &FRENZY_POINTS,
        };
        table.iter().skip(self.deaths as usize).copied().collect()
    }

    /// Clear the damage of a dead board and count the death. Marks survive.
    pub fn reset(&mut self) -> Result<(), BoardError> {
        if !self.is_dead() {
            return Err(BoardError::NotDead);
        }
        self.damage.clear();
        self.deaths += 1;
        Ok(())
    }

    /// Flip to the frenzy side. Only clean boards can flip; the death
    /// count restarts with the new point table.
    pub fn flip_to_frenzy(&mut self) -> Result<(), BoardError> {
        if self.side == BoardSide::Frenzy {
            return Err(BoardError::AlreadyFrenzy);
        }
        if !self.damage.is_empty() {
            return Err(BoardError::CarriesDamage);
        }
        self.side = BoardSide::Frenzy;
        self.deaths = 0;
        Ok(())
    }
}

impl Default for PlayerBoard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(n: u32) -> PlayerId {
        PlayerId::new(n)
    }

    #[test]
    fn test_damage_and_death() {
        let mut board = PlayerBoard::new();
        assert_eq!(board.add_damage(p(1), 5), 5);
        assert_eq!(board.add_damage(p(2), 5), 5);
        assert!(!board.is_dead());
        assert_eq!(board.add_damage(p(3), 1), 1);
        assert!(board.is_dead());
        assert!(!board.is_overkilled());
        assert_eq!(board.killer(), Some(p(3)));
        assert_eq!(board.overkiller(), None);
        assert_eq!(board.first_blood(), Some(p(1)));
    }

    #[test]
    fn test_damage_is_capped() {
        let mut board = PlayerBoard::new();
        board.add_damage(p(1), 10);
        assert_eq!(board.add_damage(p(2), 5), 2);
        assert_eq!(board.damage_count(), OVERKILL_THRESHOLD);
        assert_eq!(board.overkiller(), Some(p(2)));
        assert_eq!(board.add_damage(p(3), 1), 0);
    }

    #[test]
    fn test_marks_convert_on_damage() {
        let mut board = PlayerBoard::new();
        assert_eq!(board.add_marks(p(1), 2), 2);
        assert_eq!(board.add_marks(p(1), 2), 1);
        assert_eq!(board.marks_from(p(1)), MAX_MARKS_PER_SHOOTER);

        // Marks alone never convert
        assert_eq!(board.add_damage(p(1), 0), 0);
        assert_eq!(board.marks_from(p(1)), 3);

        assert_eq!(board.add_damage(p(1), 1), 4);
        assert_eq!(board.marks_from(p(1)), 0);
        assert_eq!(board.damage_count(), 4);
    }

    #[test]
    fn test_contributions_keep_first_damage_order() {
        let mut board = PlayerBoard::new();
        board.add_damage(p(2), 1);
        board.add_damage(p(1), 3);
        board.add_damage(p(2), 2);
        assert_eq!(board.contributions(), vec![(p(2), 3), (p(1), 3)]);
    }

    #[test]
    fn test_reset_requires_death() {
        let mut board = PlayerBoard::new();
        board.add_damage(p(1), 4);
        assert_eq!(board.reset(), Err(BoardError::NotDead));
        assert_eq!(board.damage_count(), 4);

        board.add_damage(p(1), 7);
        board.add_marks(p(2), 1);
        assert_eq!(board.reset(), Ok(()));
        assert_eq!(board.damage_count(), 0);
        assert_eq!(board.deaths(), 1);
        assert_eq!(board.marks_from(p(2)), 1);
        assert_eq!(board.point_values(), vec![6, 4, 2, 1, 1]);
    }

    #[test]
    fn test_flip_to_frenzy() {
        let mut board = PlayerBoard::new();
        board.add_damage(p(1), 1);
        assert_eq!(board.flip_to_frenzy(), Err(BoardError::CarriesDamage));

        let mut clean = PlayerBoard::new();
        assert_eq!(clean.flip_to_frenzy(), Ok(()));
        assert_eq!(clean.side(), BoardSide::Frenzy);
        assert!(!clean.awards_first_blood());
        assert_eq!(clean.point_values(), FRENZY_POINTS.to_vec());
        assert_eq!(clean.flip_to_frenzy(), Err(BoardError::AlreadyFrenzy));
    }
}
