use criterion::{criterion_group, criterion_main, Criterion};
use rebound::models::User;
use rebound::services::matchmaking::{overlap_score, select_by_overlap};
use std::hint::black_box;

const TAGS: &[&str] = &[
    "Failed interview",
    "Burnout",
    "Rejected promotion",
    "Imposter syndrome",
    "Injury setback",
    "Lost motivation",
    "Failed exam",
    "Funding rejected",
];

fn user(i: usize, tag_count: usize) -> User {
    let now = chrono::Utc::now();
    User {
        id: format!("user-{}", i),
        username: format!("Bench_User_{}", i),
        category: "General".to_string(),
        goal: "Keep going".to_string(),
        failures: (0..tag_count)
            .map(|t| TAGS[(i + t) % TAGS.len()].to_string())
            .collect(),
        failure_description: None,
        severity: None,
        points: 0,
        badges: vec![],
        learning_style: None,
        availability: None,
        accountability_style: None,
        linkedin_url: None,
        last_active: now,
        created_at: now,
    }
}

fn benchmark_candidate_scoring(c: &mut Criterion) {
    let requester = user(0, 4);
    let small: Vec<User> = (1..=50).map(|i| user(i, 3)).collect();
    let large: Vec<User> = (1..=5000).map(|i| user(i, 5)).collect();

    let mut group = c.benchmark_group("candidate_scoring");

    group.bench_function("overlap_score_pair", |b| {
        b.iter(|| overlap_score(black_box(&requester.failures), black_box(&large[0].failures)))
    });

    group.bench_function("select_50_candidates", |b| {
        b.iter(|| select_by_overlap(black_box(&requester), black_box(&small)))
    });

    group.bench_function("select_5000_candidates", |b| {
        b.iter(|| select_by_overlap(black_box(&requester), black_box(&large)))
    });

    group.finish();
}

criterion_group!(benches, benchmark_candidate_scoring);
criterion_main!(benches);
