//! # Property-Based Tests
//!
//! Invariants of the progression rules checked with proptest.

use chrono::{DateTime, Utc};
use hb_portal_core::primitives::XP_THRESHOLDS;
use hb_portal_core::{
    Badge, BadgeId, MemoryStore, Mission, MissionId, MissionStatus, MissionTask, PortalStore,
    ProgressionEngine, Stage, TaskId, Track, Trainee, TraineeId, snapshot_from_bytes,
    snapshot_to_bytes,
};
use proptest::collection::vec;
use proptest::prelude::*;
use std::collections::BTreeSet;

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

fn track_strategy() -> impl Strategy<Value = Track> {
    prop_oneof![
        Just(Track::Kitchen),
        Just(Track::StallOps),
        Just(Track::LifeMindset),
        "[a-z]{3,8}".prop_map(Track::from),
    ]
}

/// One trainee and one mission with `n` self-complete tasks.
fn store_with_tasks(n: usize) -> MemoryStore {
    let mut store = MemoryStore::new();
    store
        .save_trainee(Trainee::new(
            TraineeId::new("t1"),
            "Aisha Tan",
            None,
            Stage::Orientation,
            epoch(),
        ))
        .expect("save");
    store
        .save_mission(Mission {
            id: MissionId::new("m1"),
            title: "Orientation Day".into(),
            description: String::new(),
            stage: Some(Stage::Orientation),
            active_from: None,
            active_to: None,
            total_xp_reward: 0,
        })
        .expect("save");
    for i in 0..n {
        store
            .save_task(MissionTask {
                id: TaskId::new(format!("task-{:03}", i)),
                mission_id: MissionId::new("m1"),
                title: format!("Task {}", i),
                description: String::new(),
                track: Track::Kitchen,
                xp_reward: 10,
                auto_complete: true,
            })
            .expect("save");
    }
    store
        .add_badge(Badge {
            id: BadgeId::new("badge-1"),
            name: "First Mission Complete".into(),
            description: String::new(),
            icon: None,
        })
        .expect("add");
    store
}

proptest! {
    /// More XP never means a lower level.
    #[test]
    fn compute_level_monotonic(a in any::<u64>(), b in any::<u64>()) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(ProgressionEngine::compute_level(lo) <= ProgressionEngine::compute_level(hi));
    }

    /// Levels stay within 1..=number of thresholds.
    #[test]
    fn compute_level_in_range(xp in any::<u64>()) {
        let level = ProgressionEngine::compute_level(xp);
        prop_assert!(level >= 1);
        prop_assert!(level as usize <= XP_THRESHOLDS.len());
    }

    /// Progress percent never exceeds 100 and the next threshold is above
    /// xp unless the ladder is exhausted.
    #[test]
    fn level_progress_bounded(xp in 0u64..10_000) {
        let progress = ProgressionEngine::level_progress(xp);
        prop_assert!(progress.percent <= 100);
        if !progress.max_level {
            prop_assert!(progress.next_threshold > xp);
        }
    }

    /// Crediting XP never lowers any counter.
    #[test]
    fn credit_is_monotonic(
        awards in vec((track_strategy(), 0u64..1000), 0..40)
    ) {
        let mut trainee = Trainee::new(TraineeId::new("t1"), "Marcus Lim", None, Stage::Orientation, epoch());
        for (track, xp) in awards {
            let before = trainee.clone();
            trainee.credit(&track, xp);
            prop_assert!(trainee.overall_xp >= before.overall_xp);
            prop_assert!(trainee.kitchen_xp >= before.kitchen_xp);
            prop_assert!(trainee.stall_ops_xp >= before.stall_ops_xp);
            prop_assert!(trainee.life_mindset_xp >= before.life_mindset_xp);
        }
    }

    /// Completing any sequence of tasks, with repeats, credits each task
    /// exactly once.
    #[test]
    fn repeated_completion_credits_once(
        picks in vec(0usize..6, 1..30)
    ) {
        let mut store = store_with_tasks(6);
        let trainee = TraineeId::new("t1");
        let mut distinct = BTreeSet::new();

        for pick in picks {
            let task = TaskId::new(format!("task-{:03}", pick));
            let outcome = ProgressionEngine::record_task_completion(&mut store, &trainee, &task, false, epoch())
                .expect("complete");
            let first_time = distinct.insert(pick);
            prop_assert_eq!(outcome.already_completed, !first_time);
        }

        let xp = store.require_trainee(&trainee).expect("get").overall_xp;
        prop_assert_eq!(xp, 10 * distinct.len() as u64);
    }

    /// Mission status: completed iff all tasks done, not started iff none.
    #[test]
    fn mission_status_tracks_completion_count(total in 0usize..8, done in 0usize..8) {
        let done = done.min(total);
        let mut store = store_with_tasks(total);
        let trainee = TraineeId::new("t1");
        for i in 0..done {
            let task = TaskId::new(format!("task-{:03}", i));
            ProgressionEngine::record_task_completion(&mut store, &trainee, &task, false, epoch())
                .expect("complete");
        }

        let progress = ProgressionEngine::recompute_mission_progress(&mut store, &trainee, &MissionId::new("m1"))
            .expect("recompute");
        prop_assert_eq!(progress.completed_tasks, done);
        prop_assert_eq!(progress.total_tasks, total);
        prop_assert_eq!(progress.status == MissionStatus::NotStarted, done == 0);
        prop_assert_eq!(progress.status == MissionStatus::Completed, done > 0 && done == total);
    }

    /// Evaluating badges any number of times never duplicates an award.
    #[test]
    fn badge_awards_never_duplicate(rounds in 1usize..10) {
        let mut store = store_with_tasks(1);
        let trainee = TraineeId::new("t1");
        ProgressionEngine::record_task_completion(&mut store, &trainee, &TaskId::new("task-000"), false, epoch())
            .expect("complete");

        for _ in 0..rounds {
            let awarded = ProgressionEngine::evaluate_badges(&mut store, &trainee, epoch()).expect("evaluate");
            prop_assert!(awarded.is_empty());
        }
        // First completion and Orientation.
        prop_assert_eq!(store.list_badges_for_trainee(&trainee).expect("list").len(), 2);
    }

    /// Snapshot bytes survive decode and re-encode unchanged.
    #[test]
    fn snapshot_bytes_stable(picks in vec(0usize..4, 0..10)) {
        let mut store = store_with_tasks(4);
        let trainee = TraineeId::new("t1");
        for pick in picks {
            let task = TaskId::new(format!("task-{:03}", pick));
            ProgressionEngine::record_task_completion(&mut store, &trainee, &task, pick % 2 == 0, epoch())
                .expect("complete");
        }

        let bytes = snapshot_to_bytes(&store.snapshot().expect("snapshot")).expect("encode");
        let decoded = snapshot_from_bytes(&bytes).expect("decode");
        prop_assert_eq!(snapshot_to_bytes(&decoded).expect("encode"), bytes);
    }
}
