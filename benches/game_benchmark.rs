//! Benchmarks for running complete games.
//!
//! Covers the full simulated game loop and board generation.

#![allow(missing_docs)]

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use monster_hunt::game::Board;
use monster_hunt::simulation::{SimConfig, run_game};
use monster_hunt::RngDice;

fn bench_single_game(c: &mut Criterion) {
    let two = SimConfig {
        players: 2,
        ..SimConfig::default()
    };
    c.bench_function("single_game_2p", |b| {
        b.iter(|| {
            let result = run_game(black_box(42), black_box(&two));
            black_box(result)
        });
    });

    let four = SimConfig::default();
    c.bench_function("single_game_4p", |b| {
        b.iter(|| {
            let result = run_game(black_box(42), black_box(&four));
            black_box(result)
        });
    });
}

fn bench_game_batch(c: &mut Criterion) {
    let sim = SimConfig::default();
    c.bench_function("batch_10_games_4p", |b| {
        b.iter(|| {
            for seed in 0..10 {
                let result = run_game(black_box(seed), black_box(&sim));
                black_box(result).ok();
            }
        });
    });
}

fn bench_board_generation(c: &mut Criterion) {
    let mut dice = RngDice::seeded(7);
    c.bench_function("board_generate_15", |b| {
        b.iter(|| {
            let board = Board::generate(black_box(15), black_box(15), &mut dice);
            black_box(board)
        });
    });
}

criterion_group!(
    benches,
    bench_single_game,
    bench_game_batch,
    bench_board_generation
);
criterion_main!(benches);
