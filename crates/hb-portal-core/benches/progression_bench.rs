//! # Progression Benchmarks
//!
//! Run with: `cargo bench -p hb-portal-core`

use chrono::{DateTime, Utc};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use hb_portal_core::{
    Catalog, Dashboard, MemoryStore, NewMission, NewTask, ProgressionEngine, TaskId, Track,
    TraineeId, seed_demo,
};
use std::hint::black_box;

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// Demo data plus one extra mission with `tasks` self-complete tasks.
fn store_with_tasks(tasks: usize) -> (MemoryStore, Vec<TaskId>) {
    let mut store = MemoryStore::new();
    seed_demo(&mut store, epoch()).expect("seed");
    let mission = Catalog::create_mission(
        &mut store,
        NewMission {
            title: "Service rush".into(),
            description: String::new(),
            stage: None,
            active_from: None,
            active_to: None,
            total_xp_reward: 0,
        },
    )
    .expect("mission");

    let ids = (0..tasks)
        .map(|_| {
            Catalog::add_task(
                &mut store,
                NewTask {
                    mission_id: mission.id.clone(),
                    title: "Plate up".into(),
                    description: String::new(),
                    track: Track::StallOps,
                    xp_reward: 20,
                    auto_complete: true,
                },
            )
            .expect("task")
            .id
        })
        .collect();
    (store, ids)
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_compute_level(c: &mut Criterion) {
    c.bench_function("compute_level", |b| {
        b.iter(|| {
            for xp in (0..3000u64).step_by(7) {
                black_box(ProgressionEngine::compute_level(black_box(xp)));
            }
        });
    });
}

fn bench_complete_mission(c: &mut Criterion) {
    let mut group = c.benchmark_group("complete_mission");
    let trainee = TraineeId::new("trainee-1");

    for size in [5, 50, 200].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter_batched(
                || store_with_tasks(size),
                |(mut store, tasks)| {
                    for task in &tasks {
                        let _ = ProgressionEngine::record_task_completion(
                            &mut store, &trainee, task, false, epoch(),
                        );
                    }
                    black_box(store)
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_home_summary(c: &mut Criterion) {
    let (mut store, tasks) = store_with_tasks(100);
    let trainee = TraineeId::new("trainee-1");
    for task in tasks.iter().step_by(2) {
        let _ = ProgressionEngine::record_task_completion(&mut store, &trainee, task, false, epoch());
    }

    c.bench_function("home_summary", |b| {
        b.iter(|| black_box(Dashboard::home_summary(&store, &trainee, epoch())));
    });
}

criterion_group!(
    benches,
    bench_compute_level,
    bench_complete_mission,
    bench_home_summary
);
criterion_main!(benches);
