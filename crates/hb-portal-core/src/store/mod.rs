//! # Trainee Repository
//!
//! The `PortalStore` trait and its two back-ends:
//! - [`MemoryStore`]: owned `BTreeMap` collections (fast, volatile unless saved)
//! - [`RedbStore`]: redb embedded database (ACID, persistent)
//!
//! All operations return `Result<T, PortalError>` so the engine treats both
//! back-ends uniformly.

mod memory;
mod redb_store;

pub use memory::MemoryStore;
pub use redb_store::RedbStore;

use crate::{
    Announcement, AnnouncementId, Badge, BadgeId, Mission, MissionId, MissionProgress, MissionTask, PortalError,
    SupportRequest, SupportRequestId, TaskId, TaskProgress, Trainee, TraineeBadge, TraineeId,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// PORTALSTORE TRAIT
// =============================================================================

/// Record storage consumed by the progression engine and the portal.
///
/// `save_*` methods are upserts keyed by the record's identifier (or
/// identifier pair for progress records).
pub trait PortalStore {
    // -- trainees -------------------------------------------------------------

    fn get_trainee(&self, id: &TraineeId) -> Result<Option<Trainee>, PortalError>;
    fn save_trainee(&mut self, trainee: Trainee) -> Result<(), PortalError>;
    fn list_trainees(&self) -> Result<Vec<Trainee>, PortalError>;

    // -- mission catalog ------------------------------------------------------

    fn get_mission(&self, id: &MissionId) -> Result<Option<Mission>, PortalError>;
    fn save_mission(&mut self, mission: Mission) -> Result<(), PortalError>;
    fn list_missions(&self) -> Result<Vec<Mission>, PortalError>;

    fn get_task(&self, id: &TaskId) -> Result<Option<MissionTask>, PortalError>;
    fn save_task(&mut self, task: MissionTask) -> Result<(), PortalError>;
    fn list_tasks(&self) -> Result<Vec<MissionTask>, PortalError>;

    /// Tasks belonging to one mission, in id order.
    fn list_tasks_for_mission(
        &self,
        mission: &MissionId,
    ) -> Result<Vec<MissionTask>, PortalError> {
        Ok(self
            .list_tasks()?
            .into_iter()
            .filter(|task| &task.mission_id == mission)
            .collect())
    }

    // -- progress -------------------------------------------------------------

    fn get_task_progress(
        &self,
        trainee: &TraineeId,
        task: &TaskId,
    ) -> Result<Option<TaskProgress>, PortalError>;
    fn save_task_progress(&mut self, progress: TaskProgress) -> Result<(), PortalError>;
    fn list_task_progress_for_trainee(
        &self,
        trainee: &TraineeId,
    ) -> Result<Vec<TaskProgress>, PortalError>;

    fn get_mission_progress(
        &self,
        trainee: &TraineeId,
        mission: &MissionId,
    ) -> Result<Option<MissionProgress>, PortalError>;
    fn save_mission_progress(&mut self, progress: MissionProgress) -> Result<(), PortalError>;
    fn list_mission_progress_for_trainee(
        &self,
        trainee: &TraineeId,
    ) -> Result<Vec<MissionProgress>, PortalError>;

    // -- badges ---------------------------------------------------------------

    fn add_badge(&mut self, badge: Badge) -> Result<(), PortalError>;
    fn list_badges(&self) -> Result<Vec<Badge>, PortalError>;

    fn get_badge(&self, id: &BadgeId) -> Result<Option<Badge>, PortalError> {
        Ok(self.list_badges()?.into_iter().find(|badge| &badge.id == id))
    }

    /// Insert a (trainee, badge) award.
    ///
    /// Returns `false` without touching the stored award if the pair is
    /// already present.
    fn award_badge(&mut self, award: TraineeBadge) -> Result<bool, PortalError>;
    fn list_badges_for_trainee(
        &self,
        trainee: &TraineeId,
    ) -> Result<Vec<TraineeBadge>, PortalError>;

    // -- support --------------------------------------------------------------

    fn get_support_request(
        &self,
        id: &SupportRequestId,
    ) -> Result<Option<SupportRequest>, PortalError>;
    fn save_support_request(&mut self, request: SupportRequest) -> Result<(), PortalError>;
    fn list_support_requests(&self) -> Result<Vec<SupportRequest>, PortalError>;

    // -- announcements --------------------------------------------------------

    fn get_announcement(&self, id: &AnnouncementId) -> Result<Option<Announcement>, PortalError>;
    fn save_announcement(&mut self, announcement: Announcement) -> Result<(), PortalError>;
    fn list_announcements(&self) -> Result<Vec<Announcement>, PortalError>;

    // -- lookups that must succeed --------------------------------------------

    /// Get a trainee or fail with `TraineeNotFound`.
    fn require_trainee(&self, id: &TraineeId) -> Result<Trainee, PortalError> {
        self.get_trainee(id)?
            .ok_or_else(|| PortalError::TraineeNotFound(id.clone()))
    }

    /// Get a mission or fail with `MissionNotFound`.
    fn require_mission(&self, id: &MissionId) -> Result<Mission, PortalError> {
        self.get_mission(id)?
            .ok_or_else(|| PortalError::MissionNotFound(id.clone()))
    }

    /// Get a task or fail with `TaskNotFound`.
    fn require_task(&self, id: &TaskId) -> Result<MissionTask, PortalError> {
        self.get_task(id)?
            .ok_or_else(|| PortalError::TaskNotFound(id.clone()))
    }

    /// Copy every collection into a [`PortalSnapshot`].
    ///
    /// Progress and badge awards are collected per trainee.
    fn snapshot(&self) -> Result<PortalSnapshot, PortalError> {
        let trainees = self.list_trainees()?;
        let mut task_progress = Vec::new();
        let mut mission_progress = Vec::new();
        let mut trainee_badges = Vec::new();
        for trainee in &trainees {
            task_progress.extend(self.list_task_progress_for_trainee(&trainee.id)?);
            mission_progress.extend(self.list_mission_progress_for_trainee(&trainee.id)?);
            trainee_badges.extend(self.list_badges_for_trainee(&trainee.id)?);
        }
        Ok(PortalSnapshot {
            trainees,
            missions: self.list_missions()?,
            tasks: self.list_tasks()?,
            task_progress,
            mission_progress,
            badges: self.list_badges()?,
            trainee_badges,
            support_requests: self.list_support_requests()?,
            announcements: self.list_announcements()?,
        })
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Serializable copy of every collection in a store.
///
/// Used by the binary snapshot format, JSON export and import
/// (see [`SnapshotImport`](crate::import::SnapshotImport)).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalSnapshot {
    pub trainees: Vec<Trainee>,
    pub missions: Vec<Mission>,
    pub tasks: Vec<MissionTask>,
    pub task_progress: Vec<TaskProgress>,
    pub mission_progress: Vec<MissionProgress>,
    pub badges: Vec<Badge>,
    pub trainee_badges: Vec<TraineeBadge>,
    pub support_requests: Vec<SupportRequest>,
    #[serde(default)]
    pub announcements: Vec<Announcement>,
}
