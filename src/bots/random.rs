//! Random bot for baseline play and match simulations

use crate::bots::Strategy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Picks uniformly among the options. Optional requests are declined as if
/// declining were one more option.
pub struct RandomBot {
    rng: StdRng,
}

impl RandomBot {
    pub fn new() -> Self {
        RandomBot {
            rng: StdRng::from_entropy(),
        }
    }

    /// Seeded bot for reproducible simulations
    pub fn with_seed(seed: u64) -> Self {
        RandomBot {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomBot {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for RandomBot {
    fn choose(&mut self, _prompt: &str, options: &[String], optional: bool) -> Option<usize> {
        if options.is_empty() {
            return None;
        }
        let slots = options.len() + usize::from(optional);
        let pick = self.rng.gen_range(0..slots);
        (pick < options.len()).then_some(pick)
    }
}
