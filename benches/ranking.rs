//! Benchmarks for ranking and recompute
//!
//! Measures assign_ranks on a large group and a full recompute of a closed
//! final round.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{Rng, SeedableRng};

use guess_round::game::coordinator::GroupCoordinator;
use guess_round::game::ranking::{assign_ranks, RankEntry};
use guess_round::game::recompute::recompute;
use guess_round::game::registry::GroupMember;
use guess_round::game::state::PlayerId;
use guess_round::game::target::FixedTargets;

fn members(n: u8) -> Vec<GroupMember> {
    (1..=n)
        .map(|i| GroupMember {
            player_id: PlayerId::new([i; 16]),
            id_in_group: i as u32,
            display_name: format!("Player {}", i),
        })
        .collect()
}

fn bench_assign_ranks(c: &mut Criterion) {
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    let entries: Vec<RankEntry> = (0..200u32)
        .map(|i| RankEntry {
            player_id: PlayerId::new([(i % 256) as u8; 16]),
            order: i + 1,
            value: rng.gen_range(0..=100),
        })
        .collect();

    c.bench_function("assign_ranks_200", |b| {
        b.iter(|| black_box(assign_ranks(black_box(&entries))))
    });
}

fn bench_recompute_final_round(c: &mut Criterion) {
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);
    let group = members(50);
    let mut coord = GroupCoordinator::new(1, group.clone(), 3, Arc::new(FixedTargets::new(50)));

    for round in 1..=3 {
        coord.start_round(round).unwrap();
        for member in &group {
            coord.submit(member.player_id, rng.gen_range(0..=100)).unwrap();
        }
    }

    let rounds = coord.rounds();
    let (prior, last) = rounds.split_at(2);

    c.bench_function("recompute_final_round_50", |b| {
        b.iter(|| black_box(recompute(black_box(&last[0]), prior, 3)))
    });
}

criterion_group!(benches, bench_assign_ranks, bench_recompute_final_round);
criterion_main!(benches);
