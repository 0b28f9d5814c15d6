//! # Snapshot Import
//!
//! Merges a [`PortalSnapshot`] into a store that may already hold progress.
//!
//! Catalog records (missions, tasks, badges) and support requests are
//! upserted by id. Trainee state is reconciled instead of copied:
//! - XP counters of a stored trainee never go down; each task the import
//!   completes for them credits its reward once
//! - A completed task stays completed
//! - Mission progress is derived again from task progress, never copied
//! - Badge rules are evaluated for every trainee the import touched

use crate::progression::ProgressionEngine;
use crate::store::{PortalSnapshot, PortalStore};
use crate::{MissionId, PortalError, TaskProgress, TaskStatus, Trainee, TraineeId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Counts reported by [`SnapshotImport::merge`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    /// Trainees not present before the import.
    pub trainees_added: usize,
    /// Stored trainees whose profile was updated.
    pub trainees_updated: usize,
    pub missions: usize,
    pub tasks: usize,
    /// Tasks completed by the import that were not completed before.
    pub tasks_completed: usize,
    /// Progress records left out because their trainee or task is unknown.
    pub progress_skipped: usize,
    /// (trainee, mission) pairs whose progress was derived again.
    pub missions_recomputed: usize,
    /// Badge awards inserted, from the snapshot or from rule evaluation.
    pub badges_awarded: usize,
    pub support_requests: usize,
    pub announcements: usize,
}

/// Stateless merge of snapshots into a store.
pub struct SnapshotImport;

impl SnapshotImport {
    /// Merge `snapshot` into `store`.
    ///
    /// A snapshot merged into an empty store reproduces it. `at` stamps
    /// badges awarded by rule evaluation.
    pub fn merge<S: PortalStore + ?Sized>(
        store: &mut S,
        snapshot: PortalSnapshot,
        at: DateTime<Utc>,
    ) -> Result<ImportReport, PortalError> {
        let mut report = ImportReport {
            missions: snapshot.missions.len(),
            tasks: snapshot.tasks.len(),
            support_requests: snapshot.support_requests.len(),
            announcements: snapshot.announcements.len(),
            ..ImportReport::default()
        };

        // -- catalog ----------------------------------------------------------

        for badge in snapshot.badges {
            store.add_badge(badge)?;
        }
        for mission in snapshot.missions {
            store.save_mission(mission)?;
        }
        let mut changed_missions = BTreeSet::new();
        for task in snapshot.tasks {
            if let Some(previous) = store.get_task(&task.id)?
                && previous.mission_id != task.mission_id
            {
                changed_missions.insert(previous.mission_id);
            }
            changed_missions.insert(task.mission_id.clone());
            store.save_task(task)?;
        }

        // -- trainees ---------------------------------------------------------

        let mut added = BTreeSet::new();
        let mut touched: BTreeSet<TraineeId> = BTreeSet::new();
        for incoming in snapshot.trainees {
            touched.insert(incoming.id.clone());
            match store.get_trainee(&incoming.id)? {
                Some(stored) => {
                    store.save_trainee(Self::merged_profile(stored, incoming))?;
                    report.trainees_updated += 1;
                }
                None => {
                    added.insert(incoming.id.clone());
                    store.save_trainee(incoming)?;
                    report.trainees_added += 1;
                }
            }
        }

        // -- task progress ----------------------------------------------------

        let mut pairs: BTreeSet<(TraineeId, MissionId)> = BTreeSet::new();
        for incoming in snapshot.task_progress {
            let (Some(mut trainee), Some(task)) = (
                store.get_trainee(&incoming.trainee_id)?,
                store.get_task(&incoming.task_id)?,
            ) else {
                report.progress_skipped += 1;
                continue;
            };
            touched.insert(trainee.id.clone());
            pairs.insert((trainee.id.clone(), task.mission_id.clone()));

            let stored = store.get_task_progress(&trainee.id, &task.id)?;
            if !Self::replaces(stored.as_ref(), &incoming) {
                continue;
            }
            let completes = incoming.is_completed();
            store.save_task_progress(incoming)?;
            if completes {
                report.tasks_completed += 1;
                if !added.contains(&trainee.id) {
                    ProgressionEngine::award_task_xp(&mut trainee, &task);
                    store.save_trainee(trainee)?;
                }
            }
        }

        for progress in snapshot.mission_progress {
            pairs.insert((progress.trainee_id, progress.mission_id));
        }

        for award in snapshot.trainee_badges {
            if store.get_trainee(&award.trainee_id)?.is_none() {
                continue;
            }
            touched.insert(award.trainee_id.clone());
            if store.award_badge(award)? {
                report.badges_awarded += 1;
            }
        }

        // -- derived state ----------------------------------------------------

        if !changed_missions.is_empty() {
            for trainee in store.list_trainees()? {
                for progress in store.list_mission_progress_for_trainee(&trainee.id)? {
                    if changed_missions.contains(&progress.mission_id) {
                        pairs.insert((trainee.id.clone(), progress.mission_id));
                    }
                }
            }
        }

        for (trainee_id, mission_id) in &pairs {
            if store.get_trainee(trainee_id)?.is_none() || store.get_mission(mission_id)?.is_none() {
                continue;
            }
            ProgressionEngine::recompute_mission_progress(store, trainee_id, mission_id)?;
            touched.insert(trainee_id.clone());
            report.missions_recomputed += 1;
        }

        for trainee_id in &touched {
            if store.get_trainee(trainee_id)?.is_some() {
                report.badges_awarded += ProgressionEngine::evaluate_badges(store, trainee_id, at)?.len();
            }
        }

        // -- support and announcements ----------------------------------------

        for request in snapshot.support_requests {
            store.save_support_request(request)?;
        }
        for announcement in snapshot.announcements {
            store.save_announcement(announcement)?;
        }

        Ok(report)
    }

    /// Profile fields from the snapshot, counters from the store.
    ///
    /// The stage never moves back.
    fn merged_profile(stored: Trainee, incoming: Trainee) -> Trainee {
        Trainee {
            name: incoming.name,
            cohort: incoming.cohort,
            current_stage: stored.current_stage.max(incoming.current_stage),
            created_at: stored.created_at.min(incoming.created_at),
            ..stored
        }
    }

    /// Whether an incoming progress record may overwrite the stored one.
    fn replaces(stored: Option<&TaskProgress>, incoming: &TaskProgress) -> bool {
        match (stored.map(|p| p.status), incoming.status) {
            (None, _) => true,
            (Some(TaskStatus::Completed), _) => false,
            (Some(_), TaskStatus::Completed | TaskStatus::PendingApproval) => true,
            (Some(_), TaskStatus::NotStarted) => false,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seed_demo;
    use crate::{BadgeId, MemoryStore, MissionStatus, TaskId};

    fn epoch() -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH
    }

    fn seeded() -> MemoryStore {
        let mut store = MemoryStore::new();
        seed_demo(&mut store, epoch()).expect("seed");
        store
    }

    fn complete(store: &mut MemoryStore, trainee: &str, task: &str) {
        let trainee = TraineeId::new(trainee);
        let task = TaskId::new(task);
        let requires_approval = store.require_task(&task).expect("task").requires_approval();
        ProgressionEngine::record_task_completion(store, &trainee, &task, requires_approval, epoch())
            .expect("complete");
        if requires_approval {
            ProgressionEngine::complete_task_with_approval(store, &trainee, &task, "admin", epoch())
                .expect("approve");
        }
    }

    #[test]
    fn merge_into_empty_store_reproduces_snapshot() {
        let mut source = seeded();
        complete(&mut source, "trainee-2", "task-4");
        complete(&mut source, "trainee-2", "task-5");
        let snapshot = source.snapshot().expect("snapshot");

        let mut target = MemoryStore::new();
        let report = SnapshotImport::merge(&mut target, snapshot.clone(), epoch()).expect("merge");

        assert_eq!(target.snapshot().expect("snapshot"), snapshot);
        assert_eq!(report.trainees_added, 2);
        assert_eq!(report.tasks_completed, 2);
    }

    #[test]
    fn merge_keeps_local_progress_and_completes_mission() {
        let mut local = seeded();
        complete(&mut local, "trainee-1", "task-1");
        complete(&mut local, "trainee-1", "task-3");
        let before = local.require_trainee(&TraineeId::new("trainee-1")).expect("get");
        assert_eq!(before.overall_xp, 300);

        let mut remote = seeded();
        complete(&mut remote, "trainee-1", "task-2");
        let snapshot = remote.snapshot().expect("snapshot");

        let report = SnapshotImport::merge(&mut local, snapshot, epoch()).expect("merge");
        assert_eq!(report.tasks_completed, 1);

        let trainee_id = TraineeId::new("trainee-1");
        for task in ["task-1", "task-2", "task-3"] {
            let progress = local
                .get_task_progress(&trainee_id, &TaskId::new(task))
                .expect("get")
                .expect("progress");
            assert!(progress.is_completed(), "{task} should stay completed");
        }

        let mission = local
            .get_mission_progress(&trainee_id, &MissionId::new("mission-1"))
            .expect("get")
            .expect("progress");
        assert_eq!(mission.status, MissionStatus::Completed);
        assert_eq!(mission.completed_tasks, 3);

        let after = local.require_trainee(&trainee_id).expect("get");
        assert_eq!(after.overall_xp, 340);
        assert!(after.kitchen_xp >= before.kitchen_xp);
        assert!(after.stall_ops_xp >= before.stall_ops_xp);
        assert_eq!(after.life_mindset_xp, before.life_mindset_xp + 40);

        let badges: Vec<BadgeId> = local
            .list_badges_for_trainee(&trainee_id)
            .expect("badges")
            .into_iter()
            .map(|b| b.badge_id)
            .collect();
        assert!(badges.contains(&BadgeId::new("badge-1")));
    }

    #[test]
    fn stale_snapshot_never_lowers_counters_or_reopens_tasks() {
        let stale = seeded().snapshot().expect("snapshot");

        let mut local = seeded();
        complete(&mut local, "trainee-2", "task-4");
        let before = local.require_trainee(&TraineeId::new("trainee-2")).expect("get");

        let mut rewound = stale;
        rewound.task_progress.push(TaskProgress {
            trainee_id: TraineeId::new("trainee-2"),
            task_id: TaskId::new("task-4"),
            status: TaskStatus::NotStarted,
            completed_at: None,
            approved_by: None,
        });
        SnapshotImport::merge(&mut local, rewound, epoch()).expect("merge");

        let after = local.require_trainee(&TraineeId::new("trainee-2")).expect("get");
        assert_eq!(after.overall_xp, before.overall_xp);
        assert_eq!(after.stall_ops_xp, before.stall_ops_xp);
        let progress = local
            .get_task_progress(&TraineeId::new("trainee-2"), &TaskId::new("task-4"))
            .expect("get")
            .expect("progress");
        assert!(progress.is_completed());
    }

    #[test]
    fn copied_mission_progress_is_derived_again() {
        let mut snapshot = seeded().snapshot().expect("snapshot");
        snapshot.mission_progress.push(crate::MissionProgress {
            trainee_id: TraineeId::new("trainee-1"),
            mission_id: MissionId::new("mission-1"),
            status: MissionStatus::Completed,
            completed_tasks: 3,
            total_tasks: 3,
        });

        let mut target = MemoryStore::new();
        let report = SnapshotImport::merge(&mut target, snapshot, epoch()).expect("merge");

        let progress = target
            .get_mission_progress(&TraineeId::new("trainee-1"), &MissionId::new("mission-1"))
            .expect("get")
            .expect("progress");
        assert_eq!(progress.status, MissionStatus::NotStarted);
        assert_eq!(progress.completed_tasks, 0);
        assert_eq!(report.badges_awarded, 0);
        assert!(
            target
                .list_badges_for_trainee(&TraineeId::new("trainee-1"))
                .expect("badges")
                .is_empty()
        );
    }

    #[test]
    fn progress_for_unknown_trainee_is_skipped() {
        let mut snapshot = PortalSnapshot::default();
        snapshot.task_progress.push(TaskProgress {
            trainee_id: TraineeId::new("ghost"),
            task_id: TaskId::new("task-1"),
            status: TaskStatus::Completed,
            completed_at: Some(epoch()),
            approved_by: None,
        });

        let mut store = seeded();
        let report = SnapshotImport::merge(&mut store, snapshot, epoch()).expect("merge");
        assert_eq!(report.progress_skipped, 1);
        assert!(store.get_trainee(&TraineeId::new("ghost")).expect("get").is_none());
    }
}
