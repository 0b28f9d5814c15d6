//! # Catalog Administration
//!
//! Creating missions, tasks and trainees, and the lookups the admin and
//! mission views are built from.
//!
//! Generated identifiers follow the `<kind>-<n>` scheme, where `n` starts at
//! the collection size plus one and skips numbers already in use.

use crate::primitives::{MAX_DESCRIPTION_LENGTH, MAX_TASK_XP, MAX_TITLE_LENGTH, MIN_TASK_XP};
use crate::progression::ProgressionEngine;
use crate::store::PortalStore;
use crate::{
    Mission, MissionId, MissionTask, PortalError, Stage, TaskId, TaskProgress, TaskStatus,
    Trainee, TraineeId, Track,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// INPUT TYPES
// =============================================================================

/// Fields of a mission about to be created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMission {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub stage: Option<Stage>,
    #[serde(default)]
    pub active_from: Option<NaiveDate>,
    #[serde(default)]
    pub active_to: Option<NaiveDate>,
    #[serde(default)]
    pub total_xp_reward: u64,
}

/// Fields of a task about to be added to a mission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub mission_id: MissionId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub track: Track,
    pub xp_reward: u64,
    #[serde(default = "default_auto_complete")]
    pub auto_complete: bool,
}

fn default_auto_complete() -> bool {
    true
}

/// A task waiting for an approver, with its catalog context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingApproval {
    pub progress: TaskProgress,
    pub task: MissionTask,
    pub mission: Option<Mission>,
}

// =============================================================================
// CATALOG
// =============================================================================

/// Catalog and roster administration over a [`PortalStore`].
pub struct Catalog;

impl Catalog {
    /// Register a trainee with all XP counters at zero.
    pub fn register_trainee<S: PortalStore + ?Sized>(
        store: &mut S,
        name: &str,
        cohort: Option<&str>,
        stage: Stage,
        at: DateTime<Utc>,
    ) -> Result<Trainee, PortalError> {
        let name = required_text("name", name, MAX_TITLE_LENGTH)?;
        let cohort = cohort
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(|c| bounded_text("cohort", c, MAX_TITLE_LENGTH))
            .transpose()?;

        let existing = store.list_trainees()?;
        let id = next_id("trainee", existing.len(), |candidate| {
            existing.iter().any(|t| t.id.as_str() == candidate)
        });

        let trainee = Trainee::new(TraineeId::new(id), name, cohort, stage, at);
        store.save_trainee(trainee.clone())?;
        Ok(trainee)
    }

    /// Add a mission to the catalog.
    pub fn create_mission<S: PortalStore + ?Sized>(
        store: &mut S,
        new: NewMission,
    ) -> Result<Mission, PortalError> {
        let title = required_text("title", &new.title, MAX_TITLE_LENGTH)?;
        let description = bounded_text("description", new.description.trim(), MAX_DESCRIPTION_LENGTH)?;
        if let (Some(from), Some(to)) = (new.active_from, new.active_to)
            && from > to
        {
            return Err(PortalError::InvalidInput(format!(
                "active_from {} is after active_to {}",
                from, to
            )));
        }

        let existing = store.list_missions()?;
        let id = next_id("mission", existing.len(), |candidate| {
            existing.iter().any(|m| m.id.as_str() == candidate)
        });

        let mission = Mission {
            id: MissionId::new(id),
            title,
            description,
            stage: new.stage,
            active_from: new.active_from,
            active_to: new.active_to,
            total_xp_reward: new.total_xp_reward,
        };
        store.save_mission(mission.clone())?;
        Ok(mission)
    }

    /// Add a task to an existing mission.
    ///
    /// Stored mission progress is re-derived for every trainee who has
    /// progress on the mission, so a completed mission with a new task goes
    /// back to in-progress.
    pub fn add_task<S: PortalStore + ?Sized>(
        store: &mut S,
        new: NewTask,
    ) -> Result<MissionTask, PortalError> {
        store.require_mission(&new.mission_id)?;
        let title = required_text("title", &new.title, MAX_TITLE_LENGTH)?;
        let description = bounded_text("description", new.description.trim(), MAX_DESCRIPTION_LENGTH)?;
        if !(MIN_TASK_XP..=MAX_TASK_XP).contains(&new.xp_reward) {
            return Err(PortalError::InvalidInput(format!(
                "xp_reward must be between {} and {}, got {}",
                MIN_TASK_XP, MAX_TASK_XP, new.xp_reward
            )));
        }
        if !new.track.is_known() {
            return Err(PortalError::InvalidInput(format!(
                "Unknown track '{}': expected kitchen, stall_ops or life_mindset",
                new.track
            )));
        }

        let existing = store.list_tasks()?;
        let id = next_id("task", existing.len(), |candidate| {
            existing.iter().any(|t| t.id.as_str() == candidate)
        });

        let task = MissionTask {
            id: TaskId::new(id),
            mission_id: new.mission_id,
            title,
            description,
            track: new.track,
            xp_reward: new.xp_reward,
            auto_complete: new.auto_complete,
        };
        store.save_task(task.clone())?;

        for trainee in store.list_trainees()? {
            if store
                .get_mission_progress(&trainee.id, &task.mission_id)?
                .is_some()
            {
                ProgressionEngine::recompute_mission_progress(store, &trainee.id, &task.mission_id)?;
            }
        }

        Ok(task)
    }

    /// Missions a trainee may work on: those without a stage gate and those
    /// gated to the trainee's current stage.
    pub fn missions_for_trainee<S: PortalStore + ?Sized>(
        store: &S,
        trainee_id: &TraineeId,
    ) -> Result<Vec<Mission>, PortalError> {
        let trainee = store.require_trainee(trainee_id)?;
        Ok(store
            .list_missions()?
            .into_iter()
            .filter(|mission| mission.is_open_to(trainee.current_stage))
            .collect())
    }

    /// Tasks of a trainee waiting for approval.
    ///
    /// Progress records whose task has been removed from the catalog are
    /// left out.
    pub fn pending_approvals<S: PortalStore + ?Sized>(
        store: &S,
        trainee_id: &TraineeId,
    ) -> Result<Vec<PendingApproval>, PortalError> {
        store.require_trainee(trainee_id)?;

        let mut pending = Vec::new();
        for progress in store.list_task_progress_for_trainee(trainee_id)? {
            if progress.status != TaskStatus::PendingApproval {
                continue;
            }
            let Some(task) = store.get_task(&progress.task_id)? else {
                continue;
            };
            let mission = store.get_mission(&task.mission_id)?;
            pending.push(PendingApproval {
                progress,
                task,
                mission,
            });
        }
        Ok(pending)
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// First free `<prefix>-<n>` with `n` starting at `count + 1`.
pub(crate) fn next_id(prefix: &str, count: usize, taken: impl Fn(&str) -> bool) -> String {
    let mut n = count.saturating_add(1);
    loop {
        let candidate = format!("{}-{}", prefix, n);
        if !taken(&candidate) {
            return candidate;
        }
        n = n.saturating_add(1);
    }
}

/// Trimmed, non-empty and at most `max` characters.
pub(crate) fn required_text(field: &str, value: &str, max: usize) -> Result<String, PortalError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PortalError::InvalidInput(format!(
            "{} must not be empty",
            field
        )));
    }
    bounded_text(field, trimmed, max)
}

/// At most `max` characters.
pub(crate) fn bounded_text(field: &str, value: &str, max: usize) -> Result<String, PortalError> {
    let len = value.chars().count();
    if len > max {
        return Err(PortalError::InvalidInput(format!(
            "{} too long: {} characters (max {})",
            field, len, max
        )));
    }
    Ok(value.to_string())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryStore, MissionStatus};

    fn epoch() -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH
    }

    fn mission(title: &str, stage: Option<Stage>) -> NewMission {
        NewMission {
            title: title.into(),
            description: String::new(),
            stage,
            active_from: None,
            active_to: None,
            total_xp_reward: 100,
        }
    }

    fn task(mission_id: &MissionId, xp: u64) -> NewTask {
        NewTask {
            mission_id: mission_id.clone(),
            title: "Julienne practice".into(),
            description: String::new(),
            track: Track::Kitchen,
            xp_reward: xp,
            auto_complete: true,
        }
    }

    #[test]
    fn ids_are_sequential() {
        let mut store = MemoryStore::new();
        let a = Catalog::create_mission(&mut store, mission("A", None)).expect("create");
        let b = Catalog::create_mission(&mut store, mission("B", None)).expect("create");
        assert_eq!(a.id.as_str(), "mission-1");
        assert_eq!(b.id.as_str(), "mission-2");

        let t = Catalog::add_task(&mut store, task(&a.id, 40)).expect("add");
        assert_eq!(t.id.as_str(), "task-1");
    }

    #[test]
    fn generated_id_skips_taken() {
        let taken = ["task-2", "task-3"];
        assert_eq!(next_id("task", 1, |c| taken.contains(&c)), "task-4");
    }

    #[test]
    fn blank_title_rejected() {
        let mut store = MemoryStore::new();
        let result = Catalog::create_mission(&mut store, mission("   ", None));
        assert!(matches!(result, Err(PortalError::InvalidInput(_))));
    }

    #[test]
    fn inverted_active_window_rejected() {
        let mut store = MemoryStore::new();
        let mut new = mission("Window", None);
        new.active_from = NaiveDate::from_ymd_opt(2026, 3, 1);
        new.active_to = NaiveDate::from_ymd_opt(2026, 2, 1);
        assert!(Catalog::create_mission(&mut store, new).is_err());
    }

    #[test]
    fn task_xp_bounds() {
        let mut store = MemoryStore::new();
        let m = Catalog::create_mission(&mut store, mission("A", None)).expect("create");
        assert!(Catalog::add_task(&mut store, task(&m.id, 9)).is_err());
        assert!(Catalog::add_task(&mut store, task(&m.id, 301)).is_err());
        assert!(Catalog::add_task(&mut store, task(&m.id, 10)).is_ok());
        assert!(Catalog::add_task(&mut store, task(&m.id, 300)).is_ok());
    }

    #[test]
    fn task_track_must_be_known() {
        let mut store = MemoryStore::new();
        let m = Catalog::create_mission(&mut store, mission("A", None)).expect("create");
        for tag in ["Kitchen", "pastry", ""] {
            let mut new = task(&m.id, 40);
            new.track = Track::from(tag);
            let result = Catalog::add_task(&mut store, new);
            assert!(matches!(result, Err(PortalError::InvalidInput(_))), "{tag}");
        }
        assert!(store.list_tasks().expect("list").is_empty());
    }

    #[test]
    fn task_for_unknown_mission_not_found() {
        let mut store = MemoryStore::new();
        let result = Catalog::add_task(&mut store, task(&MissionId::new("mission-9"), 40));
        assert!(matches!(result, Err(PortalError::MissionNotFound(_))));
    }

    #[test]
    fn new_task_reopens_completed_mission() {
        let mut store = MemoryStore::new();
        let trainee = Catalog::register_trainee(&mut store, "Aisha Tan", None, Stage::Orientation, epoch())
            .expect("register");
        let m = Catalog::create_mission(&mut store, mission("A", None)).expect("create");
        let first = Catalog::add_task(&mut store, task(&m.id, 40)).expect("add");
        let outcome = ProgressionEngine::record_task_completion(
            &mut store,
            &trainee.id,
            &first.id,
            false,
            epoch(),
        )
        .expect("complete");
        assert_eq!(outcome.mission_progress.status, MissionStatus::Completed);

        Catalog::add_task(&mut store, task(&m.id, 40)).expect("add");
        let progress = store
            .get_mission_progress(&trainee.id, &m.id)
            .expect("get")
            .expect("present");
        assert_eq!(progress.status, MissionStatus::InProgress);
        assert_eq!(progress.total_tasks, 2);
    }

    #[test]
    fn stage_gate_filters_missions() {
        let mut store = MemoryStore::new();
        let trainee = Catalog::register_trainee(
            &mut store,
            "Marcus Lim",
            Some("Cohort Orion"),
            Stage::Orientation,
            epoch(),
        )
        .expect("register");
        assert_eq!(trainee.cohort.as_deref(), Some("Cohort Orion"));

        Catalog::create_mission(&mut store, mission("Open", None)).expect("create");
        Catalog::create_mission(&mut store, mission("Intro", Some(Stage::Orientation)))
            .expect("create");
        Catalog::create_mission(&mut store, mission("Knives", Some(Stage::SkillsTraining)))
            .expect("create");

        let titles: Vec<_> = Catalog::missions_for_trainee(&store, &trainee.id)
            .expect("list")
            .into_iter()
            .map(|m| m.title)
            .collect();
        assert_eq!(titles, vec!["Open", "Intro"]);
    }

    #[test]
    fn pending_approvals_joined_with_task() {
        let mut store = MemoryStore::new();
        let trainee = Catalog::register_trainee(&mut store, "Aisha Tan", None, Stage::Orientation, epoch())
            .expect("register");
        let m = Catalog::create_mission(&mut store, mission("A", None)).expect("create");
        let mut new = task(&m.id, 40);
        new.auto_complete = false;
        let t = Catalog::add_task(&mut store, new).expect("add");
        ProgressionEngine::record_task_completion(&mut store, &trainee.id, &t.id, true, epoch())
            .expect("pending");

        let pending = Catalog::pending_approvals(&store, &trainee.id).expect("pending");
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].task.id, t.id);
        assert_eq!(pending[0].mission.as_ref().map(|m| m.id.clone()), Some(m.id));
    }
}
