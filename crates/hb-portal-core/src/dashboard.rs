//! # Dashboard Views
//!
//! Read-only summaries assembled from a [`PortalStore`]:
//! - [`HomeSummary`]: stage journey, focus suggestions, recent activity,
//!   trainee announcements
//! - [`MissionCard`]: eligible missions with per-task status
//! - [`ProgressReport`]: levels, per-track progress bars, earned badges
//! - [`PortalMetrics`]: roster and queue counts for staff
//!
//! Percentages are integers (0..=100).

use crate::catalog::Catalog;
use crate::announcements::AnnouncementBoard;
use crate::primitives::{ANNOUNCEMENT_FEED_LIMIT, FOCUS_SUGGESTION_LIMIT, RECENT_WINDOW_DAYS};
use crate::progression::{LevelProgress, LevelSnapshot, ProgressionEngine};
use crate::store::PortalStore;
use crate::{
    Announcement, Audience, Badge, Mission, MissionId, MissionStatus, MissionTask, PortalError, Stage, SupportStatus,
    TaskId, TaskStatus, TraineeId, Track,
};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// HOME
// =============================================================================

/// One step of the journey strip on the home view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageStep {
    pub stage: Stage,
    pub name: String,
    pub current: bool,
    /// At or before the trainee's current stage.
    pub reached: bool,
}

/// A task the trainee has not started yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusSuggestion {
    pub mission_id: MissionId,
    pub mission_title: String,
    pub task_id: TaskId,
    pub task_title: String,
    pub track: Track,
    pub xp_reward: u64,
}

/// The trainee home view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeSummary {
    pub trainee_id: TraineeId,
    pub name: String,
    pub current_stage: Stage,
    pub journey: Vec<StageStep>,
    pub focus: Vec<FocusSuggestion>,
    /// Tasks completed within the recent window.
    pub recent_tasks_completed: usize,
    pub missions_completed: usize,
    /// Newest notices for trainees or everyone.
    pub announcements: Vec<Announcement>,
}

// =============================================================================
// MISSIONS
// =============================================================================

/// A task on the mission board with the trainee's status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRow {
    pub task: MissionTask,
    pub status: TaskStatus,
}

/// An eligible mission with the trainee's progress on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionCard {
    pub mission: Mission,
    pub completed_tasks: usize,
    pub total_tasks: usize,
    pub tasks: Vec<TaskRow>,
}

// =============================================================================
// PROGRESS
// =============================================================================

/// Progress bar for one track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackProgress {
    pub track: Track,
    pub label: String,
    pub progress: LevelProgress,
}

/// A badge held by the trainee, with its catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarnedBadge {
    pub badge: Badge,
    pub awarded_at: DateTime<Utc>,
}

/// The trainee progress view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressReport {
    pub trainee_id: TraineeId,
    pub name: String,
    pub total_xp: u64,
    pub levels: LevelSnapshot,
    pub overall: LevelProgress,
    pub tracks: Vec<TrackProgress>,
    pub badges: Vec<EarnedBadge>,
}

// =============================================================================
// METRICS
// =============================================================================

/// Counts across the whole portal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalMetrics {
    pub trainee_count: usize,
    pub mission_count: usize,
    pub task_count: usize,
    pub badge_count: usize,
    pub completed_tasks: usize,
    pub pending_approvals: usize,
    /// Support requests not yet handled.
    pub open_support_requests: usize,
}

// =============================================================================
// DASHBOARD
// =============================================================================

/// Builds the dashboard views.
pub struct Dashboard;

impl Dashboard {
    /// Home view for a trainee as of `now`.
    pub fn home_summary<S: PortalStore + ?Sized>(
        store: &S,
        trainee_id: &TraineeId,
        now: DateTime<Utc>,
    ) -> Result<HomeSummary, PortalError> {
        let trainee = store.require_trainee(trainee_id)?;

        let journey = Stage::ALL
            .into_iter()
            .map(|stage| StageStep {
                stage,
                name: stage.name().to_string(),
                current: stage == trainee.current_stage,
                reached: stage <= trainee.current_stage,
            })
            .collect();

        let progress: BTreeMap<TaskId, TaskStatus> = store
            .list_task_progress_for_trainee(trainee_id)?
            .into_iter()
            .map(|p| (p.task_id.clone(), p.status))
            .collect();

        let mut focus = Vec::new();
        'missions: for mission in Catalog::missions_for_trainee(store, trainee_id)? {
            for task in store.list_tasks_for_mission(&mission.id)? {
                let untouched = progress
                    .get(&task.id)
                    .is_none_or(|status| *status == TaskStatus::NotStarted);
                if !untouched {
                    continue;
                }
                focus.push(FocusSuggestion {
                    mission_id: mission.id.clone(),
                    mission_title: mission.title.clone(),
                    task_id: task.id,
                    task_title: task.title,
                    track: task.track,
                    xp_reward: task.xp_reward,
                });
                if focus.len() >= FOCUS_SUGGESTION_LIMIT {
                    break 'missions;
                }
            }
        }

        let since = now - TimeDelta::days(RECENT_WINDOW_DAYS);
        let recent_tasks_completed = store
            .list_task_progress_for_trainee(trainee_id)?
            .iter()
            .filter(|p| p.is_completed() && p.completed_at.is_some_and(|at| at >= since))
            .count();

        let missions_completed = store
            .list_mission_progress_for_trainee(trainee_id)?
            .iter()
            .filter(|p| p.status == MissionStatus::Completed)
            .count();

        let mut announcements = AnnouncementBoard::list(store, Some(Audience::Trainees))?;
        announcements.truncate(ANNOUNCEMENT_FEED_LIMIT);

        Ok(HomeSummary {
            trainee_id: trainee.id,
            name: trainee.name,
            current_stage: trainee.current_stage,
            journey,
            focus,
            recent_tasks_completed,
            missions_completed,
            announcements,
        })
    }

    /// Missions open to the trainee, each with its tasks and their status.
    pub fn mission_board<S: PortalStore + ?Sized>(
        store: &S,
        trainee_id: &TraineeId,
    ) -> Result<Vec<MissionCard>, PortalError> {
        let progress: BTreeMap<TaskId, TaskStatus> = store
            .list_task_progress_for_trainee(trainee_id)?
            .into_iter()
            .map(|p| (p.task_id.clone(), p.status))
            .collect();

        let mut cards = Vec::new();
        for mission in Catalog::missions_for_trainee(store, trainee_id)? {
            let tasks: Vec<TaskRow> = store
                .list_tasks_for_mission(&mission.id)?
                .into_iter()
                .map(|task| TaskRow {
                    status: progress.get(&task.id).copied().unwrap_or_default(),
                    task,
                })
                .collect();
            let completed_tasks = tasks
                .iter()
                .filter(|row| row.status == TaskStatus::Completed)
                .count();
            cards.push(MissionCard {
                mission,
                completed_tasks,
                total_tasks: tasks.len(),
                tasks,
            });
        }
        Ok(cards)
    }

    /// Progress view for a trainee.
    ///
    /// Awards whose badge is no longer in the catalog are left out.
    pub fn progress_report<S: PortalStore + ?Sized>(
        store: &S,
        trainee_id: &TraineeId,
    ) -> Result<ProgressReport, PortalError> {
        let trainee = store.require_trainee(trainee_id)?;
        let levels = ProgressionEngine::recalculate_levels(&trainee);

        let tracks = Track::KNOWN
            .iter()
            .map(|track| TrackProgress {
                track: track.clone(),
                label: track.label().to_string(),
                progress: ProgressionEngine::level_progress(
                    trainee.track_xp(track).unwrap_or_default(),
                ),
            })
            .collect();

        let mut badges = Vec::new();
        for award in store.list_badges_for_trainee(trainee_id)? {
            if let Some(badge) = store.get_badge(&award.badge_id)? {
                badges.push(EarnedBadge {
                    badge,
                    awarded_at: award.awarded_at,
                });
            }
        }

        Ok(ProgressReport {
            overall: ProgressionEngine::level_progress(trainee.overall_xp),
            total_xp: trainee.overall_xp,
            trainee_id: trainee.id,
            name: trainee.name,
            levels,
            tracks,
            badges,
        })
    }

    /// Counts for the staff overview.
    pub fn portal_metrics<S: PortalStore + ?Sized>(store: &S) -> Result<PortalMetrics, PortalError> {
        let trainees = store.list_trainees()?;

        let mut completed_tasks = 0;
        let mut pending_approvals = 0;
        for trainee in &trainees {
            for progress in store.list_task_progress_for_trainee(&trainee.id)? {
                match progress.status {
                    TaskStatus::Completed => completed_tasks += 1,
                    TaskStatus::PendingApproval => pending_approvals += 1,
                    TaskStatus::NotStarted => {}
                }
            }
        }

        let open_support_requests = store
            .list_support_requests()?
            .iter()
            .filter(|r| r.status != SupportStatus::Handled)
            .count();

        Ok(PortalMetrics {
            trainee_count: trainees.len(),
            mission_count: store.list_missions()?.len(),
            task_count: store.list_tasks()?.len(),
            badge_count: store.list_badges()?.len(),
            completed_tasks,
            pending_approvals,
            open_support_requests,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seed_demo;
    use crate::{MemoryStore, SupportCategory, SupportDesk};

    fn now() -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH + TimeDelta::days(30)
    }

    fn seeded() -> MemoryStore {
        let mut store = MemoryStore::new();
        seed_demo(&mut store, now()).expect("seed");
        store
    }

    #[test]
    fn home_journey_marks_current_stage() {
        let store = seeded();
        let home = Dashboard::home_summary(&store, &TraineeId::new("trainee-1"), now())
            .expect("home");
        assert_eq!(home.journey.len(), 5);
        let current: Vec<_> = home.journey.iter().filter(|s| s.current).collect();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].stage, Stage::SkillsTraining);
        assert_eq!(home.journey.iter().filter(|s| s.reached).count(), 2);
    }

    #[test]
    fn home_lists_trainee_announcements_newest_first() {
        let store = seeded();
        let home = Dashboard::home_summary(&store, &TraineeId::new("trainee-2"), now())
            .expect("home");
        let ids: Vec<_> = home.announcements.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["ann-3", "ann-1"]);
    }

    #[test]
    fn focus_limited_and_skips_touched_tasks() {
        let mut store = seeded();
        let t = TraineeId::new("trainee-1");
        let home = Dashboard::home_summary(&store, &t, now()).expect("home");
        let ids: Vec<_> = home.focus.iter().map(|f| f.task_id.as_str()).collect();
        assert_eq!(ids, vec!["task-1", "task-2", "task-3"]);

        ProgressionEngine::record_task_completion(&mut store, &t, &TaskId::new("task-1"), false, now())
            .expect("complete");
        let home = Dashboard::home_summary(&store, &t, now()).expect("home");
        let ids: Vec<_> = home.focus.iter().map(|f| f.task_id.as_str()).collect();
        assert_eq!(ids, vec!["task-2", "task-3"]);
        assert_eq!(home.recent_tasks_completed, 1);
    }

    #[test]
    fn mission_board_shows_task_status() {
        let mut store = seeded();
        let t = TraineeId::new("trainee-2");
        ProgressionEngine::record_task_completion(&mut store, &t, &TaskId::new("task-5"), true, now())
            .expect("pending");

        let board = Dashboard::mission_board(&store, &t).expect("board");
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].mission.title, "Orientation Day");
        assert_eq!(board[0].total_tasks, 2);
        assert_eq!(board[0].completed_tasks, 0);
        let statuses: Vec<_> = board[0].tasks.iter().map(|r| r.status).collect();
        assert_eq!(statuses, vec![TaskStatus::NotStarted, TaskStatus::PendingApproval]);
    }

    #[test]
    fn old_completions_not_recent() {
        let mut store = seeded();
        let t = TraineeId::new("trainee-2");
        let long_ago = now() - TimeDelta::days(RECENT_WINDOW_DAYS + 1);
        ProgressionEngine::record_task_completion(&mut store, &t, &TaskId::new("task-4"), false, long_ago)
            .expect("complete");

        let home = Dashboard::home_summary(&store, &t, now()).expect("home");
        assert_eq!(home.recent_tasks_completed, 0);
    }

    #[test]
    fn progress_report_lists_tracks_and_badges() {
        let mut store = seeded();
        let t = TraineeId::new("trainee-2");
        ProgressionEngine::record_task_completion(&mut store, &t, &TaskId::new("task-4"), false, now())
            .expect("complete");
        ProgressionEngine::complete_task_with_approval(&mut store, &t, &TaskId::new("task-5"), "admin", now())
            .expect("approve");

        let report = Dashboard::progress_report(&store, &t).expect("report");
        assert_eq!(report.tracks.len(), 3);
        assert_eq!(report.tracks[0].label, "Kitchen Skills");
        assert_eq!(report.total_xp, 160);
        let badge_names: Vec<_> = report.badges.iter().map(|b| b.badge.name.as_str()).collect();
        assert_eq!(badge_names, vec!["First Mission Complete", "Orientation Complete"]);
    }

    #[test]
    fn metrics_count_queues() {
        let mut store = seeded();
        let t = TraineeId::new("trainee-1");
        ProgressionEngine::record_task_completion(&mut store, &t, &TaskId::new("task-2"), true, now())
            .expect("pending");
        SupportDesk::submit(&mut store, &t, "Need a mentor", SupportCategory::Training, now())
            .expect("submit");

        let metrics = Dashboard::portal_metrics(&store).expect("metrics");
        assert_eq!(metrics.trainee_count, 2);
        assert_eq!(metrics.mission_count, 2);
        assert_eq!(metrics.task_count, 5);
        assert_eq!(metrics.badge_count, 3);
        assert_eq!(metrics.pending_approvals, 1);
        assert_eq!(metrics.open_support_requests, 1);
    }
}
