//! Performance benchmarks for the Adrenaline engine
//!
//! Two levels:
//!
//! 1. **Scoring** - board payouts and killshot bonuses on synthetic data
//! 2. **Match** - whole bot matches, channel round trips included

use adrenaline_engine::{
    bots::BotKind,
    core::{CardCatalog, PlayerBoard, PlayerId},
    game::{
        score::{board_payout, distribute, killshot_bonus},
        MatchConfig, VerbosityLevel,
    },
    simulate::play_bot_match,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use std::time::Duration;

/// A dead board with damage from `shooters` players, round robin
fn dead_board(shooters: u32) -> PlayerBoard {
    let mut board = PlayerBoard::new();
    let mut i = 0;
    while !board.is_dead() {
        board.add_damage(PlayerId::new(1 + i % shooters), 1);
        i += 1;
    }
    board
}

fn bench_scoring(c: &mut Criterion) {
    let mut group = c.benchmark_group("scoring");

    for shooters in [1u32, 2, 4] {
        let board = dead_board(shooters);
        group.bench_with_input(BenchmarkId::new("board_payout", shooters), &board, |b, board| {
            b.iter(|| board_payout(black_box(board)))
        });
    }

    let contributions: Vec<(PlayerId, usize)> =
        (0..5).map(|i| (PlayerId::new(i), (i as usize % 3) + 1)).collect();
    group.bench_function("distribute_ties", |b| {
        b.iter(|| distribute(black_box(&contributions), black_box(&[8, 6, 4, 2, 1, 1]), None))
    });

    let tokens: Vec<(PlayerId, u32, usize)> =
        (0..5).map(|i| (PlayerId::new(i), 3 - i % 3, i as usize)).collect();
    group.bench_function("killshot_bonus", |b| b.iter(|| killshot_bonus(black_box(&tokens))));

    group.finish();
}

fn bench_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("bot_match");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(20));

    let catalog = Arc::new(CardCatalog::standard().expect("stock catalog"));
    for seed in [1u64, 42] {
        group.bench_with_input(BenchmarkId::new("random", seed), &seed, |b, &seed| {
            b.iter(|| {
                let config = MatchConfig::default()
                    .with_seed(seed)
                    .with_max_turns(60)
                    .with_verbosity(VerbosityLevel::Silent);
                play_bot_match(Arc::clone(&catalog), config, 3, BotKind::Random)
                    .expect("match should finish")
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_scoring, bench_match);
criterion_main!(benches);
