//! In-memory store.
//!
//! Uses `BTreeMap` exclusively so listings come back in a stable order.

use super::{PortalSnapshot, PortalStore};
use crate::{
    Announcement, AnnouncementId, Badge, BadgeId, Mission, MissionId, MissionProgress, MissionTask, PortalError,
    SupportRequest, SupportRequestId, TaskId, TaskProgress, Trainee, TraineeBadge, TraineeId,
};
use std::collections::BTreeMap;

/// Owned collections for every record type.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    trainees: BTreeMap<TraineeId, Trainee>,
    missions: BTreeMap<MissionId, Mission>,
    tasks: BTreeMap<TaskId, MissionTask>,
    /// (trainee, task) -> progress
    task_progress: BTreeMap<(TraineeId, TaskId), TaskProgress>,
    /// (trainee, mission) -> progress
    mission_progress: BTreeMap<(TraineeId, MissionId), MissionProgress>,
    badges: BTreeMap<BadgeId, Badge>,
    /// (trainee, badge) -> award
    trainee_badges: BTreeMap<(TraineeId, BadgeId), TraineeBadge>,
    support_requests: BTreeMap<SupportRequestId, SupportRequest>,
    announcements: BTreeMap<AnnouncementId, Announcement>,
}

impl MemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of records across all collections.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.trainees.len()
            + self.missions.len()
            + self.tasks.len()
            + self.task_progress.len()
            + self.mission_progress.len()
            + self.badges.len()
            + self.trainee_badges.len()
            + self.support_requests.len()
            + self.announcements.len()
    }
}

impl From<PortalSnapshot> for MemoryStore {
    fn from(snapshot: PortalSnapshot) -> Self {
        Self {
            trainees: snapshot
                .trainees
                .into_iter()
                .map(|t| (t.id.clone(), t))
                .collect(),
            missions: snapshot
                .missions
                .into_iter()
                .map(|m| (m.id.clone(), m))
                .collect(),
            tasks: snapshot
                .tasks
                .into_iter()
                .map(|t| (t.id.clone(), t))
                .collect(),
            task_progress: snapshot
                .task_progress
                .into_iter()
                .map(|p| ((p.trainee_id.clone(), p.task_id.clone()), p))
                .collect(),
            mission_progress: snapshot
                .mission_progress
                .into_iter()
                .map(|p| ((p.trainee_id.clone(), p.mission_id.clone()), p))
                .collect(),
            badges: snapshot
                .badges
                .into_iter()
                .map(|b| (b.id.clone(), b))
                .collect(),
            trainee_badges: snapshot
                .trainee_badges
                .into_iter()
                .map(|a| ((a.trainee_id.clone(), a.badge_id.clone()), a))
                .collect(),
            support_requests: snapshot
                .support_requests
                .into_iter()
                .map(|r| (r.id.clone(), r))
                .collect(),
            announcements: snapshot
                .announcements
                .into_iter()
                .map(|a| (a.id.clone(), a))
                .collect(),
        }
    }
}

impl PortalStore for MemoryStore {
    fn get_trainee(&self, id: &TraineeId) -> Result<Option<Trainee>, PortalError> {
        Ok(self.trainees.get(id).cloned())
    }

    fn save_trainee(&mut self, trainee: Trainee) -> Result<(), PortalError> {
        self.trainees.insert(trainee.id.clone(), trainee);
        Ok(())
    }

    fn list_trainees(&self) -> Result<Vec<Trainee>, PortalError> {
        Ok(self.trainees.values().cloned().collect())
    }

    fn get_mission(&self, id: &MissionId) -> Result<Option<Mission>, PortalError> {
        Ok(self.missions.get(id).cloned())
    }

    fn save_mission(&mut self, mission: Mission) -> Result<(), PortalError> {
        self.missions.insert(mission.id.clone(), mission);
        Ok(())
    }

    fn list_missions(&self) -> Result<Vec<Mission>, PortalError> {
        Ok(self.missions.values().cloned().collect())
    }

    fn get_task(&self, id: &TaskId) -> Result<Option<MissionTask>, PortalError> {
        Ok(self.tasks.get(id).cloned())
    }

    fn save_task(&mut self, task: MissionTask) -> Result<(), PortalError> {
        self.tasks.insert(task.id.clone(), task);
        Ok(())
    }

    fn list_tasks(&self) -> Result<Vec<MissionTask>, PortalError> {
        Ok(self.tasks.values().cloned().collect())
    }

    fn get_task_progress(
        &self,
        trainee: &TraineeId,
        task: &TaskId,
    ) -> Result<Option<TaskProgress>, PortalError> {
        Ok(self
            .task_progress
            .get(&(trainee.clone(), task.clone()))
            .cloned())
    }

    fn save_task_progress(&mut self, progress: TaskProgress) -> Result<(), PortalError> {
        let key = (progress.trainee_id.clone(), progress.task_id.clone());
        self.task_progress.insert(key, progress);
        Ok(())
    }

    fn list_task_progress_for_trainee(
        &self,
        trainee: &TraineeId,
    ) -> Result<Vec<TaskProgress>, PortalError> {
        Ok(self
            .task_progress
            .iter()
            .filter(|((owner, _), _)| owner == trainee)
            .map(|(_, progress)| progress.clone())
            .collect())
    }

    fn get_mission_progress(
        &self,
        trainee: &TraineeId,
        mission: &MissionId,
    ) -> Result<Option<MissionProgress>, PortalError> {
        Ok(self
            .mission_progress
            .get(&(trainee.clone(), mission.clone()))
            .cloned())
    }

    fn save_mission_progress(&mut self, progress: MissionProgress) -> Result<(), PortalError> {
        let key = (progress.trainee_id.clone(), progress.mission_id.clone());
        self.mission_progress.insert(key, progress);
        Ok(())
    }

    fn list_mission_progress_for_trainee(
        &self,
        trainee: &TraineeId,
    ) -> Result<Vec<MissionProgress>, PortalError> {
        Ok(self
            .mission_progress
            .iter()
            .filter(|((owner, _), _)| owner == trainee)
            .map(|(_, progress)| progress.clone())
            .collect())
    }

    fn add_badge(&mut self, badge: Badge) -> Result<(), PortalError> {
        self.badges.insert(badge.id.clone(), badge);
        Ok(())
    }

    fn list_badges(&self) -> Result<Vec<Badge>, PortalError> {
        Ok(self.badges.values().cloned().collect())
    }

    fn get_badge(&self, id: &BadgeId) -> Result<Option<Badge>, PortalError> {
        Ok(self.badges.get(id).cloned())
    }

    fn award_badge(&mut self, award: TraineeBadge) -> Result<bool, PortalError> {
        let key = (award.trainee_id.clone(), award.badge_id.clone());
        if self.trainee_badges.contains_key(&key) {
            return Ok(false);
        }
        self.trainee_badges.insert(key, award);
        Ok(true)
    }

    fn list_badges_for_trainee(
        &self,
        trainee: &TraineeId,
    ) -> Result<Vec<TraineeBadge>, PortalError> {
        Ok(self
            .trainee_badges
            .iter()
            .filter(|((owner, _), _)| owner == trainee)
            .map(|(_, award)| award.clone())
            .collect())
    }

    fn get_support_request(
        &self,
        id: &SupportRequestId,
    ) -> Result<Option<SupportRequest>, PortalError> {
        Ok(self.support_requests.get(id).cloned())
    }

    fn save_support_request(&mut self, request: SupportRequest) -> Result<(), PortalError> {
        self.support_requests.insert(request.id.clone(), request);
        Ok(())
    }

    fn list_support_requests(&self) -> Result<Vec<SupportRequest>, PortalError> {
        Ok(self.support_requests.values().cloned().collect())
    }

    fn get_announcement(&self, id: &AnnouncementId) -> Result<Option<Announcement>, PortalError> {
        Ok(self.announcements.get(id).cloned())
    }

    fn save_announcement(&mut self, announcement: Announcement) -> Result<(), PortalError> {
        self.announcements.insert(announcement.id.clone(), announcement);
        Ok(())
    }

    fn list_announcements(&self) -> Result<Vec<Announcement>, PortalError> {
        Ok(self.announcements.values().cloned().collect())
    }
}
