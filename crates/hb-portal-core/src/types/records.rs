//! Record types held by a [`PortalStore`](crate::store::PortalStore).
//!
//! One struct per entity, named fields only.

use super::{
    AnnouncementId, Audience, BadgeId, MissionId, MissionStatus, Stage, SupportCategory, SupportRequestId, SupportStatus,
    TaskId, TaskStatus, TraineeId, Track,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// TRAINEE
// =============================================================================

/// A trainee and their experience counters.
///
/// Counters only grow: the sole mutation is [`Trainee::credit`], which
/// uses saturating addition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trainee {
    pub id: TraineeId,
    pub name: String,
    pub cohort: Option<String>,
    pub current_stage: Stage,
    pub overall_xp: u64,
    pub kitchen_xp: u64,
    pub stall_ops_xp: u64,
    pub life_mindset_xp: u64,
    pub created_at: DateTime<Utc>,
}

impl Trainee {
    /// Create a trainee with all counters at zero.
    #[must_use]
    pub fn new(
        id: TraineeId,
        name: impl Into<String>,
        cohort: Option<String>,
        current_stage: Stage,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            cohort,
            current_stage,
            overall_xp: 0,
            kitchen_xp: 0,
            stall_ops_xp: 0,
            life_mindset_xp: 0,
            created_at,
        }
    }

    /// XP accrued on a track. `None` for unrecognized tracks.
    #[must_use]
    pub fn track_xp(&self, track: &Track) -> Option<u64> {
        match track {
            Track::Kitchen => Some(self.kitchen_xp),
            Track::StallOps => Some(self.stall_ops_xp),
            Track::LifeMindset => Some(self.life_mindset_xp),
            Track::Unrecognized(_) => None,
        }
    }

    /// Add `xp` to the overall counter and to the counter of `track`.
    pub fn credit(&mut self, track: &Track, xp: u64) {
        self.overall_xp = self.overall_xp.saturating_add(xp);
        let counter = match track {
            Track::Kitchen => &mut self.kitchen_xp,
            Track::StallOps => &mut self.stall_ops_xp,
            Track::LifeMindset => &mut self.life_mindset_xp,
            Track::Unrecognized(_) => return,
        };
        *counter = counter.saturating_add(xp);
    }
}

// =============================================================================
// MISSION CATALOG
// =============================================================================

/// A catalog mission grouping several tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mission {
    pub id: MissionId,
    pub title: String,
    pub description: String,
    /// Only trainees at this stage see the mission. `None` = every stage.
    pub stage: Option<Stage>,
    pub active_from: Option<NaiveDate>,
    pub active_to: Option<NaiveDate>,
    pub total_xp_reward: u64,
}

impl Mission {
    /// Check if a trainee at `stage` may work on this mission.
    #[must_use]
    pub fn is_open_to(&self, stage: Stage) -> bool {
        self.stage.is_none_or(|gate| gate == stage)
    }
}

/// A unit of work inside a mission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionTask {
    pub id: TaskId,
    pub mission_id: MissionId,
    pub title: String,
    pub description: String,
    pub track: Track,
    pub xp_reward: u64,
    /// `true`: the trainee may mark it complete. `false`: a mentor approves.
    pub auto_complete: bool,
}

impl MissionTask {
    /// Check if completing this task needs an approver.
    #[must_use]
    pub fn requires_approval(&self) -> bool {
        !self.auto_complete
    }
}

// =============================================================================
// PROGRESS
// =============================================================================

/// Completion state of one task for one trainee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskProgress {
    pub trainee_id: TraineeId,
    pub task_id: TaskId,
    pub status: TaskStatus,
    pub completed_at: Option<DateTime<Utc>>,
    pub approved_by: Option<String>,
}

impl TaskProgress {
    /// Check if the task is completed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

/// Derived state of one mission for one trainee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionProgress {
    pub trainee_id: TraineeId,
    pub mission_id: MissionId,
    pub status: MissionStatus,
    pub completed_tasks: usize,
    pub total_tasks: usize,
}

impl MissionProgress {
    /// Derive the status from task counts.
    ///
    /// A mission with no tasks is never completed.
    #[must_use]
    pub fn derive(
        trainee_id: TraineeId,
        mission_id: MissionId,
        completed_tasks: usize,
        total_tasks: usize,
    ) -> Self {
        let status = if completed_tasks == 0 {
            MissionStatus::NotStarted
        } else if completed_tasks >= total_tasks {
            MissionStatus::Completed
        } else {
            MissionStatus::InProgress
        };
        Self {
            trainee_id,
            mission_id,
            status,
            completed_tasks,
            total_tasks,
        }
    }
}

// =============================================================================
// BADGES
// =============================================================================

/// A catalog badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub id: BadgeId,
    pub name: String,
    pub description: String,
    pub icon: Option<String>,
}

/// A badge held by a trainee. At most one per (trainee, badge).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraineeBadge {
    pub trainee_id: TraineeId,
    pub badge_id: BadgeId,
    pub awarded_at: DateTime<Utc>,
}

// =============================================================================
// SUPPORT
// =============================================================================

/// A free-text help ticket filed by a trainee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportRequest {
    pub id: SupportRequestId,
    pub trainee_id: TraineeId,
    pub message: String,
    pub category: SupportCategory,
    pub status: SupportStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// ANNOUNCEMENTS
// =============================================================================

/// A notice published by the programme team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: AnnouncementId,
    pub title: String,
    pub body: String,
    pub audience: Audience,
    pub published_at: DateTime<Utc>,
}
