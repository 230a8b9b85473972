//! Card stacks (ammo tiles, weapons, power-ups)
//!
//! A stack keeps a draw pile and a discard pile. Drawing from an empty draw
//! pile shuffles the discards back in first, so callers never draw from an
//! exhausted stack while discards exist.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardStack<T> {
    /// Top of the stack is the end of the vector
    draw_pile: Vec<T>,
    discard_pile: Vec<T>,
    rng: ChaCha12Rng,
}

impl<T> CardStack<T> {
    /// Build a shuffled stack from `cards`
    pub fn new(cards: Vec<T>, seed: u64) -> Self {
        let mut stack = CardStack {
            draw_pile: cards,
            discard_pile: Vec::new(),
            rng: ChaCha12Rng::seed_from_u64(seed),
        };
        stack.draw_pile.shuffle(&mut stack.rng);
        stack
    }

    /// Draw the top card, reshuffling the discards if the draw pile is empty.
    /// Returns None only when both piles are empty.
    pub fn draw(&mut self) -> Option<T> {
        if self.draw_pile.is_empty() {
            self.reshuffle();
        }
        self.draw_pile.pop()
    }

    pub fn discard(&mut self, card: T) {
        self.discard_pile.push(card);
    }

    fn reshuffle(&mut self) {
        self.draw_pile.append(&mut self.discard_pile);
        self.draw_pile.shuffle(&mut self.rng);
    }

    /// Cards left in the draw pile
    pub fn len(&self) -> usize {
        self.draw_pile.len()
    }

    pub fn is_empty(&self) -> bool {
        self.draw_pile.is_empty() && self.discard_pile.is_empty()
    }

    pub fn discarded(&self) -> usize {
        self.discard_pile.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_reshuffles_discards() {
        let mut stack = CardStack::new(vec![1, 2], 7);
        let a = stack.draw().unwrap();
        let b = stack.draw().unwrap();
        assert_eq!(stack.len(), 0);

        stack.discard(a);
        stack.discard(b);
        assert_eq!(stack.discarded(), 2);

        let mut again = vec![stack.draw().unwrap(), stack.draw().unwrap()];
        again.sort();
        assert_eq!(again, vec![1, 2]);
        assert_eq!(stack.draw(), None);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_same_seed_same_order() {
        let mut a = CardStack::new((0..20).collect(), 42);
        let mut b = CardStack::new((0..20).collect(), 42);
        for _ in 0..20 {
            assert_eq!(a.draw(), b.draw());
        }
    }
}
