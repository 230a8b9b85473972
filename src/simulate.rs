//! Bot-only match simulations
//!
//! Runs many matches in parallel with rayon. Every seat is a [`RemotePlayer`]
//! driven by a bot thread, so the engine runs exactly as it would against
//! remote clients.

use crate::bots::{spawn_bot, BotKind};
use crate::choice::{PlayerChannel, RemotePlayer};
use crate::core::{CardCatalog, PlayerId, PlayerName};
use crate::game::{EndReason, Match, MatchConfig, MatchController, MatchResult, VerbosityLevel};
use crate::{EngineError, Result};
use parking_lot::Mutex;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What to simulate
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub matches: usize,
    /// Stop starting new matches after this long
    pub deadline: Option<Duration>,
    pub players: usize,
    pub bot: BotKind,
    /// Base configuration; each match derives its own seed from it
    pub match_config: MatchConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            matches: 10,
            deadline: None,
            players: 3,
            bot: BotKind::Random,
            match_config: MatchConfig::default()
                .with_max_turns(200)
                .with_verbosity(VerbosityLevel::Silent),
        }
    }
}

/// Aggregate statistics over a batch of matches
#[derive(Debug, Default, Clone, Serialize)]
pub struct SimulationReport {
    pub matches: usize,
    pub failed: usize,
    /// Wins per seat, indexed by player id
    pub wins: Vec<usize>,
    pub end_reasons: FxHashMap<String, usize>,
    pub total_turns: u64,
    pub total_points: u64,
    pub elapsed_ms: u128,
}

impl SimulationReport {
    fn record(&mut self, result: &MatchResult) {
        self.matches += 1;
        if let Some(winner) = result.winner() {
            if let Some(wins) = self.wins.get_mut(winner.index()) {
                *wins += 1;
            }
        }
        *self
            .end_reasons
            .entry(format!("{:?}", result.end_reason))
            .or_insert(0) += 1;
        self.total_turns += u64::from(result.turns_played);
        self.total_points += result.standings.iter().map(|s| u64::from(s.score)).sum::<u64>();
    }

    pub fn average_turns(&self) -> f64 {
        if self.matches == 0 {
            0.0
        } else {
            self.total_turns as f64 / self.matches as f64
        }
    }

    pub fn completed(&self) -> usize {
        self.end_reasons
            .get(&format!("{:?}", EndReason::Completed))
            .copied()
            .unwrap_or(0)
    }
}

/// Seed for match `index`, spread out so neighbouring matches differ
fn match_seed(base: u64, index: usize) -> u64 {
    base.wrapping_add((index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Play one match between bots and return its result
pub fn play_bot_match(
    catalog: Arc<CardCatalog>,
    config: MatchConfig,
    players: usize,
    bot: BotKind,
) -> Result<MatchResult> {
    let mut remotes = Vec::with_capacity(players);
    let mut bots = Vec::with_capacity(players);
    for seat in 0..players {
        let id = PlayerId::new(seat as u32);
        let (remote, outbound) = RemotePlayer::new(id, config.choice_timeout, config.ack_timeout);
        let strategy = bot.strategy(config.seed.wrapping_add(seat as u64 + 1));
        bots.push(spawn_bot(&remote, outbound, strategy)?);
        remotes.push(remote);
    }

    let roster = remotes
        .iter()
        .enumerate()
        .map(|(seat, remote)| {
            let channel: Arc<dyn PlayerChannel> = remote.clone();
            (PlayerName::new(format!("bot{}", seat)), channel)
        })
        .collect();
    let result = Match::new(config, catalog, roster).and_then(|game| MatchController::new(game).run());

    // The bots stop once the last strong reference to their player is gone
    drop(remotes);
    for handle in bots {
        handle.join().map_err(|_| EngineError::WorkerPanicked)?;
    }
    result
}

/// Run a batch of bot matches in parallel
pub fn run_simulation(config: &SimulationConfig) -> Result<SimulationReport> {
    let catalog = Arc::new(CardCatalog::standard()?);
    let report = Mutex::new(SimulationReport {
        wins: vec![0; config.players],
        ..Default::default()
    });
    let start = Instant::now();
    let deadline = config.deadline.map(|d| start + d);

    (0..config.matches).into_par_iter().for_each(|index| {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            return;
        }
        let match_config = config
            .match_config
            .clone()
            .with_seed(match_seed(config.match_config.seed, index));
        let outcome = play_bot_match(Arc::clone(&catalog), match_config, config.players, config.bot);
        let mut report = report.lock();
        match outcome {
            Ok(result) => report.record(&result),
            Err(_) => report.failed += 1,
        }
    });

    let mut report = report.into_inner();
    report.elapsed_ms = start.elapsed().as_millis();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_bots_reach_the_turn_limit() {
        let config = SimulationConfig {
            matches: 2,
            bot: BotKind::Zero,
            match_config: MatchConfig::default()
                .with_max_turns(9)
                .with_verbosity(VerbosityLevel::Silent),
            ..Default::default()
        };
        let report = run_simulation(&config).unwrap();
        assert_eq!(report.matches, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(report.total_turns, 18);
        assert_eq!(report.end_reasons.get("TurnLimit"), Some(&2));
    }

    #[test]
    fn test_seeds_differ_per_match() {
        assert_ne!(match_seed(0, 1), match_seed(0, 2));
        assert_eq!(match_seed(5, 0), 5);
    }
}
