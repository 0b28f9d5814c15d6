//! # Progression Engine
//!
//! XP, levels, task completion, mission status and badge rules.
//!
//! All rules are fixed and applied uniformly to every trainee:
//! - XP counters only grow (saturating addition)
//! - A task is completed at most once per trainee
//! - Mission status is recomputed from task progress on every change
//! - Badges are a set per trainee; re-evaluation never duplicates
//!
//! The engine never reads the clock. Callers pass the timestamp `at`.

use crate::primitives::{
    FIRST_COMPLETION_BADGE, FIVE_COMPLETIONS_BADGE, FIVE_COMPLETIONS_COUNT, ORIENTATION_BADGE,
    RULE_BADGES, XP_THRESHOLDS,
};
use crate::store::PortalStore;
use crate::{
    Badge, BadgeId, MissionId, MissionProgress, MissionStatus, MissionTask, PortalError, Stage, TaskId,
    TaskProgress, TaskStatus, Trainee, TraineeBadge, TraineeId, Track,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// LEVEL TYPES
// =============================================================================

/// Levels for the overall counter and each track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSnapshot {
    pub overall: u32,
    pub kitchen: u32,
    pub stall_ops: u32,
    pub life_mindset: u32,
}

impl LevelSnapshot {
    /// Level of one of the fixed tracks. `None` for unrecognized tracks.
    #[must_use]
    pub fn for_track(&self, track: &Track) -> Option<u32> {
        match track {
            Track::Kitchen => Some(self.kitchen),
            Track::StallOps => Some(self.stall_ops),
            Track::LifeMindset => Some(self.life_mindset),
            Track::Unrecognized(_) => None,
        }
    }
}

/// Position of an XP value on the level ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelProgress {
    pub xp: u64,
    pub level: u32,
    /// First threshold above `xp`, or the top threshold once maxed.
    pub next_threshold: u64,
    /// `min(100, xp * 100 / next_threshold)`.
    pub percent: u64,
    pub max_level: bool,
}

// =============================================================================
// COMPLETION OUTCOME
// =============================================================================

/// What a completion call changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionOutcome {
    /// The task progress record after the call.
    pub progress: TaskProgress,
    /// XP credited by this call (0 for pending or repeated completions).
    pub xp_awarded: u64,
    /// Mission progress of the task's mission after the call.
    pub mission_progress: MissionProgress,
    /// Badges inserted by this call, in rule order.
    pub new_badges: Vec<BadgeId>,
    /// `true` if the task was already completed and nothing changed.
    pub already_completed: bool,
}

// =============================================================================
// PROGRESSION ENGINE
// =============================================================================

/// Applies the progression rules to a [`PortalStore`].
pub struct ProgressionEngine;

impl ProgressionEngine {
    /// Level for an XP amount: the 1-based index of the highest threshold
    /// not exceeding `xp`.
    #[must_use]
    pub fn compute_level(xp: u64) -> u32 {
        let reached = XP_THRESHOLDS
            .iter()
            .take_while(|&&threshold| xp >= threshold)
            .count();
        reached.max(1) as u32
    }

    /// Levels for every counter of a trainee.
    #[must_use]
    pub fn recalculate_levels(trainee: &Trainee) -> LevelSnapshot {
        LevelSnapshot {
            overall: Self::compute_level(trainee.overall_xp),
            kitchen: Self::compute_level(trainee.kitchen_xp),
            stall_ops: Self::compute_level(trainee.stall_ops_xp),
            life_mindset: Self::compute_level(trainee.life_mindset_xp),
        }
    }

    /// Level, next threshold and integer percentage for a progress bar.
    #[must_use]
    pub fn level_progress(xp: u64) -> LevelProgress {
        let top = XP_THRESHOLDS[XP_THRESHOLDS.len() - 1];
        let next = XP_THRESHOLDS.iter().copied().find(|&threshold| threshold > xp);
        let next_threshold = next.unwrap_or(top);
        let percent = xp
            .saturating_mul(100)
            .checked_div(next_threshold)
            .map_or(100, |p| p.min(100));

        LevelProgress {
            xp,
            level: Self::compute_level(xp),
            next_threshold,
            percent,
            max_level: next.is_none(),
        }
    }

    /// Credit a task's XP to a trainee. Returns the XP added.
    ///
    /// Unrecognized tracks only add to the overall counter.
    pub fn award_task_xp(trainee: &mut Trainee, task: &MissionTask) -> u64 {
        trainee.credit(&task.track, task.xp_reward);
        task.xp_reward
    }

    /// Record that a trainee finished a task.
    ///
    /// With `requires_approval` the task goes to `pending_approval` and no XP
    /// is credited. Otherwise it is completed: XP is credited, the mission is
    /// recomputed and badges are evaluated. A task that is already completed
    /// is returned unchanged.
    pub fn record_task_completion<S: PortalStore + ?Sized>(
        store: &mut S,
        trainee_id: &TraineeId,
        task_id: &TaskId,
        requires_approval: bool,
        at: DateTime<Utc>,
    ) -> Result<CompletionOutcome, PortalError> {
        let trainee = store.require_trainee(trainee_id)?;
        let task = store.require_task(task_id)?;

        if let Some(outcome) = Self::already_completed(store, &trainee, &task)? {
            return Ok(outcome);
        }

        if requires_approval {
            let progress = TaskProgress {
                trainee_id: trainee.id.clone(),
                task_id: task.id.clone(),
                status: TaskStatus::PendingApproval,
                completed_at: None,
                approved_by: None,
            };
            store.save_task_progress(progress.clone())?;
            let mission_progress =
                Self::recompute_mission_progress(store, &trainee.id, &task.mission_id)?;
            return Ok(CompletionOutcome {
                progress,
                xp_awarded: 0,
                mission_progress,
                new_badges: Vec::new(),
                already_completed: false,
            });
        }

        Self::complete(store, trainee, &task, None, at)
    }

    /// Complete a task on behalf of an approver.
    ///
    /// Credits XP, recomputes the mission and evaluates badges. An empty
    /// approver is rejected; an already completed task is left unchanged.
    pub fn complete_task_with_approval<S: PortalStore + ?Sized>(
        store: &mut S,
        trainee_id: &TraineeId,
        task_id: &TaskId,
        approver: &str,
        at: DateTime<Utc>,
    ) -> Result<CompletionOutcome, PortalError> {
        let approver = approver.trim();
        if approver.is_empty() {
            return Err(PortalError::InvalidInput(
                "Approver must not be empty".to_string(),
            ));
        }

        let trainee = store.require_trainee(trainee_id)?;
        let task = store.require_task(task_id)?;

        if let Some(outcome) = Self::already_completed(store, &trainee, &task)? {
            return Ok(outcome);
        }

        Self::complete(store, trainee, &task, Some(approver.to_string()), at)
    }

    /// Derive a trainee's progress on a mission from its task progress and
    /// store it.
    ///
    /// Not started with zero completed tasks (including missions without
    /// tasks), completed when every task is completed, in progress otherwise.
    pub fn recompute_mission_progress<S: PortalStore + ?Sized>(
        store: &mut S,
        trainee_id: &TraineeId,
        mission_id: &MissionId,
    ) -> Result<MissionProgress, PortalError> {
        let progress = Self::derive_mission_progress(store, trainee_id, mission_id)?;
        store.save_mission_progress(progress.clone())?;
        Ok(progress)
    }

    /// Add the catalog entry of every rule badge that is not there yet.
    ///
    /// Returns how many entries were added.
    pub fn install_rule_badges<S: PortalStore + ?Sized>(store: &mut S) -> Result<usize, PortalError> {
        let mut added = 0;
        for (id, _, _) in RULE_BADGES {
            if Self::ensure_rule_badge(store, &BadgeId::new(id))? {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Award every rule badge the trainee now qualifies for.
    ///
    /// A rule badge missing from the catalog is installed first. Returns
    /// only the badges inserted by this call.
    pub fn evaluate_badges<S: PortalStore + ?Sized>(
        store: &mut S,
        trainee_id: &TraineeId,
        at: DateTime<Utc>,
    ) -> Result<Vec<BadgeId>, PortalError> {
        store.require_trainee(trainee_id)?;

        let completed: Vec<MissionProgress> = store
            .list_mission_progress_for_trainee(trainee_id)?
            .into_iter()
            .filter(|p| p.status == MissionStatus::Completed)
            .collect();

        let mut orientation_done = false;
        for progress in &completed {
            if let Some(mission) = store.get_mission(&progress.mission_id)?
                && mission.stage == Some(Stage::Orientation)
            {
                orientation_done = true;
                break;
            }
        }

        let rules = [
            (FIRST_COMPLETION_BADGE, !completed.is_empty()),
            (FIVE_COMPLETIONS_BADGE, completed.len() >= FIVE_COMPLETIONS_COUNT),
            (ORIENTATION_BADGE, orientation_done),
        ];

        let mut awarded = Vec::new();
        for (badge, earned) in rules {
            if !earned {
                continue;
            }
            let badge_id = BadgeId::new(badge);
            Self::ensure_rule_badge(store, &badge_id)?;
            let inserted = store.award_badge(TraineeBadge {
                trainee_id: trainee_id.clone(),
                badge_id: badge_id.clone(),
                awarded_at: at,
            })?;
            if inserted {
                awarded.push(badge_id);
            }
        }
        Ok(awarded)
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    /// Add the catalog entry for a rule badge if it is missing.
    fn ensure_rule_badge<S: PortalStore + ?Sized>(
        store: &mut S,
        badge_id: &BadgeId,
    ) -> Result<bool, PortalError> {
        if store.get_badge(badge_id)?.is_some() {
            return Ok(false);
        }
        let Some((_, name, description)) =
            RULE_BADGES.iter().find(|(id, _, _)| *id == badge_id.as_str())
        else {
            return Ok(false);
        };
        store.add_badge(Badge {
            id: badge_id.clone(),
            name: (*name).to_string(),
            description: (*description).to_string(),
            icon: None,
        })?;
        Ok(true)
    }

    /// Mission progress computed from the store without writing it.
    fn derive_mission_progress<S: PortalStore + ?Sized>(
        store: &S,
        trainee_id: &TraineeId,
        mission_id: &MissionId,
    ) -> Result<MissionProgress, PortalError> {
        store.require_mission(mission_id)?;
        let tasks = store.list_tasks_for_mission(mission_id)?;

        let mut completed = 0;
        for task in &tasks {
            if store
                .get_task_progress(trainee_id, &task.id)?
                .is_some_and(|p| p.is_completed())
            {
                completed += 1;
            }
        }

        Ok(MissionProgress::derive(
            trainee_id.clone(),
            mission_id.clone(),
            completed,
            tasks.len(),
        ))
    }

    /// The unchanged outcome for a task that is already completed.
    fn already_completed<S: PortalStore + ?Sized>(
        store: &S,
        trainee: &Trainee,
        task: &MissionTask,
    ) -> Result<Option<CompletionOutcome>, PortalError> {
        let Some(existing) = store.get_task_progress(&trainee.id, &task.id)? else {
            return Ok(None);
        };
        if !existing.is_completed() {
            return Ok(None);
        }

        let mission_progress = match store.get_mission_progress(&trainee.id, &task.mission_id)? {
            Some(progress) => progress,
            None => Self::derive_mission_progress(store, &trainee.id, &task.mission_id)?,
        };
        Ok(Some(CompletionOutcome {
            progress: existing,
            xp_awarded: 0,
            mission_progress,
            new_badges: Vec::new(),
            already_completed: true,
        }))
    }

    fn complete<S: PortalStore + ?Sized>(
        store: &mut S,
        mut trainee: Trainee,
        task: &MissionTask,
        approved_by: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<CompletionOutcome, PortalError> {
        let progress = TaskProgress {
            trainee_id: trainee.id.clone(),
            task_id: task.id.clone(),
            status: TaskStatus::Completed,
            completed_at: Some(at),
            approved_by,
        };
        store.save_task_progress(progress.clone())?;

        let xp_awarded = Self::award_task_xp(&mut trainee, task);
        let trainee_id = trainee.id.clone();
        store.save_trainee(trainee)?;

        let mission_progress =
            Self::recompute_mission_progress(store, &trainee_id, &task.mission_id)?;
        let new_badges = Self::evaluate_badges(store, &trainee_id, at)?;

        Ok(CompletionOutcome {
            progress,
            xp_awarded,
            mission_progress,
            new_badges,
            already_completed: false,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
