//! # Portal
//!
//! The high-level entry point used by the CLI and HTTP API.
//!
//! A `Portal` owns one storage back-end:
//! - `InMemory`: a [`MemoryStore`] (fast, volatile unless explicitly saved)
//! - `Persistent`: a [`RedbStore`] (disk-backed, ACID)
//!
//! Methods here supply the current time to the engine; everything below
//! this layer takes time as a parameter.

use crate::announcements::AnnouncementBoard;
use crate::catalog::{Catalog, NewMission, NewTask, PendingApproval};
use crate::dashboard::{Dashboard, HomeSummary, MissionCard, PortalMetrics, ProgressReport};
use crate::import::{ImportReport, SnapshotImport};
use crate::progression::{CompletionOutcome, ProgressionEngine};
use crate::seed::seed_demo;
use crate::store::{MemoryStore, PortalSnapshot, PortalStore, RedbStore};
use crate::support::SupportDesk;
use crate::{
    Announcement, Audience, Badge, Mission, MissionTask, PortalError, Stage, SupportCategory, SupportRequest,
    SupportRequestId, SupportStatus, TaskId, Trainee, TraineeId,
};
use chrono::Utc;
use std::path::Path;

/// Storage back-end of a [`Portal`].
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory collections (fast, volatile).
    InMemory(MemoryStore),
    /// Disk-backed store using redb (ACID, persistent).
    Persistent(RedbStore),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(MemoryStore::new())
    }
}

/// Trainee progression, catalog and support operations over one store.
#[derive(Debug, Default)]
pub struct Portal {
    backend: StorageBackend,
}

impl Portal {
    /// Create an empty in-memory portal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a portal over an existing in-memory store.
    #[must_use]
    pub fn with_store(store: MemoryStore) -> Self {
        Self {
            backend: StorageBackend::InMemory(store),
        }
    }

    /// Open or create a redb database at `path`.
    ///
    /// Every change is written through to disk.
    pub fn with_redb(path: impl AsRef<Path>) -> Result<Self, PortalError> {
        Ok(Self {
            backend: StorageBackend::Persistent(RedbStore::open(path)?),
        })
    }

    /// Check if using persistent storage.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, StorageBackend::Persistent(_))
    }

    /// Get a reference to the storage backend.
    #[must_use]
    pub fn backend(&self) -> &StorageBackend {
        &self.backend
    }

    /// The active store.
    pub fn store(&self) -> &dyn PortalStore {
        match &self.backend {
            StorageBackend::InMemory(store) => store,
            StorageBackend::Persistent(store) => store,
        }
    }

    fn store_mut(&mut self) -> &mut dyn PortalStore {
        match &mut self.backend {
            StorageBackend::InMemory(store) => store,
            StorageBackend::Persistent(store) => store,
        }
    }

    // =========================================================================
    // SNAPSHOTS
    // =========================================================================

    /// Copy of every collection.
    pub fn snapshot(&self) -> Result<PortalSnapshot, PortalError> {
        self.store().snapshot()
    }

    /// Merge `snapshot` into the current store.
    ///
    /// Stored progress is kept and mission progress is derived again; see
    /// [`SnapshotImport::merge`].
    pub fn import_snapshot(&mut self, snapshot: PortalSnapshot) -> Result<ImportReport, PortalError> {
        SnapshotImport::merge(self.store_mut(), snapshot, Utc::now())
    }

    /// Compact the redb database file.
    ///
    /// Returns `true` if space was reclaimed. In-memory portals have nothing
    /// to compact.
    pub fn compact(&mut self) -> Result<bool, PortalError> {
        match &mut self.backend {
            StorageBackend::Persistent(store) => store.compact(),
            StorageBackend::InMemory(_) => Err(PortalError::InvalidInput(
                "Compaction needs the redb backend".to_string(),
            )),
        }
    }

    /// Install the demo roster and catalog.
    pub fn seed_demo(&mut self) -> Result<(), PortalError> {
        seed_demo(self.store_mut(), Utc::now())
    }

    // =========================================================================
    // TRAINEES
    // =========================================================================

    pub fn trainees(&self) -> Result<Vec<Trainee>, PortalError> {
        self.store().list_trainees()
    }

    pub fn trainee(&self, id: &TraineeId) -> Result<Trainee, PortalError> {
        self.store().require_trainee(id)
    }

    pub fn register_trainee(
        &mut self,
        name: &str,
        cohort: Option<&str>,
        stage: Stage,
    ) -> Result<Trainee, PortalError> {
        Catalog::register_trainee(self.store_mut(), name, cohort, stage, Utc::now())
    }

    // =========================================================================
    // CATALOG
    // =========================================================================

    pub fn missions(&self) -> Result<Vec<Mission>, PortalError> {
        self.store().list_missions()
    }

    pub fn missions_for_trainee(&self, trainee: &TraineeId) -> Result<Vec<Mission>, PortalError> {
        Catalog::missions_for_trainee(self.store(), trainee)
    }

    pub fn create_mission(&mut self, new: NewMission) -> Result<Mission, PortalError> {
        Catalog::create_mission(self.store_mut(), new)
    }

    pub fn add_task(&mut self, new: NewTask) -> Result<MissionTask, PortalError> {
        Catalog::add_task(self.store_mut(), new)
    }

    pub fn badges(&self) -> Result<Vec<Badge>, PortalError> {
        self.store().list_badges()
    }

    pub fn pending_approvals(
        &self,
        trainee: &TraineeId,
    ) -> Result<Vec<PendingApproval>, PortalError> {
        Catalog::pending_approvals(self.store(), trainee)
    }

    // =========================================================================
    // PROGRESSION
    // =========================================================================

    /// Trainee-initiated completion.
    ///
    /// Self-complete tasks are completed at once; the rest go to pending
    /// approval.
    pub fn complete_task(
        &mut self,
        trainee: &TraineeId,
        task: &TaskId,
    ) -> Result<CompletionOutcome, PortalError> {
        let requires_approval = self.store().require_task(task)?.requires_approval();
        ProgressionEngine::record_task_completion(
            self.store_mut(),
            trainee,
            task,
            requires_approval,
            Utc::now(),
        )
    }

    pub fn approve_task(
        &mut self,
        trainee: &TraineeId,
        task: &TaskId,
        approver: &str,
    ) -> Result<CompletionOutcome, PortalError> {
        ProgressionEngine::complete_task_with_approval(
            self.store_mut(),
            trainee,
            task,
            approver,
            Utc::now(),
        )
    }

    // =========================================================================
    // DASHBOARD
    // =========================================================================

    pub fn home(&self, trainee: &TraineeId) -> Result<HomeSummary, PortalError> {
        Dashboard::home_summary(self.store(), trainee, Utc::now())
    }

    pub fn mission_board(&self, trainee: &TraineeId) -> Result<Vec<MissionCard>, PortalError> {
        Dashboard::mission_board(self.store(), trainee)
    }

    pub fn progress(&self, trainee: &TraineeId) -> Result<ProgressReport, PortalError> {
        Dashboard::progress_report(self.store(), trainee)
    }

    pub fn metrics(&self) -> Result<PortalMetrics, PortalError> {
        Dashboard::portal_metrics(self.store())
    }

    // =========================================================================
    // SUPPORT
    // =========================================================================

    pub fn submit_support_request(
        &mut self,
        trainee: &TraineeId,
        message: &str,
        category: SupportCategory,
    ) -> Result<SupportRequest, PortalError> {
        SupportDesk::submit(self.store_mut(), trainee, message, category, Utc::now())
    }

    /// All support requests, newest first.
    pub fn support_requests(&self) -> Result<Vec<SupportRequest>, PortalError> {
        SupportDesk::list(self.store())
    }

    pub fn update_support_status(
        &mut self,
        id: &SupportRequestId,
        status: SupportStatus,
    ) -> Result<SupportRequest, PortalError> {
        SupportDesk::update_status(self.store_mut(), id, status, Utc::now())
    }

    // =========================================================================
    // ANNOUNCEMENTS
    // =========================================================================

    pub fn publish_announcement(
        &mut self,
        title: &str,
        body: &str,
        audience: Audience,
    ) -> Result<Announcement, PortalError> {
        AnnouncementBoard::publish(self.store_mut(), title, body, audience, Utc::now())
    }

    /// Announcements visible to `reader` (all of them for `None`), newest
    /// first.
    pub fn announcements(&self, reader: Option<Audience>) -> Result<Vec<Announcement>, PortalError> {
        AnnouncementBoard::list(self.store(), reader)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MissionStatus, TaskStatus};
    use tempfile::tempdir;

    fn seeded() -> Portal {
        let mut portal = Portal::new();
        portal.seed_demo().expect("seed");
        portal
    }

    #[test]
    fn complete_task_respects_approval_flag() {
        let mut portal = seeded();
        let t = TraineeId::new("trainee-2");

        let self_done = portal.complete_task(&t, &TaskId::new("task-4")).expect("complete");
        assert_eq!(self_done.progress.status, TaskStatus::Completed);

        let pending = portal.complete_task(&t, &TaskId::new("task-5")).expect("complete");
        assert_eq!(pending.progress.status, TaskStatus::PendingApproval);
        assert_eq!(portal.pending_approvals(&t).expect("pending").len(), 1);

        let approved = portal
            .approve_task(&t, &TaskId::new("task-5"), "admin")
            .expect("approve");
        assert_eq!(approved.mission_progress.status, MissionStatus::Completed);
        assert!(portal.pending_approvals(&t).expect("pending").is_empty());
    }

    #[test]
    fn persistent_portal_survives_reopen() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("portal.redb");
        {
            let mut portal = Portal::with_redb(&path).expect("open");
            assert!(portal.is_persistent());
            portal.seed_demo().expect("seed");
            portal
                .complete_task(&TraineeId::new("trainee-1"), &TaskId::new("task-1"))
                .expect("complete");
        }

        let portal = Portal::with_redb(&path).expect("reopen");
        let trainee = portal.trainee(&TraineeId::new("trainee-1")).expect("get");
        assert_eq!(trainee.overall_xp, 260);
        assert_eq!(trainee.kitchen_xp, 180);
    }

    #[test]
    fn snapshot_moves_between_backends() {
        let mut memory = seeded();
        memory
            .submit_support_request(
                &TraineeId::new("trainee-1"),
                "Placement paperwork",
                SupportCategory::Placement,
            )
            .expect("submit");
        let snapshot = memory.snapshot().expect("snapshot");

        let temp = tempdir().expect("temp dir");
        let mut disk = Portal::with_redb(temp.path().join("portal.redb")).expect("open");
        disk.import_snapshot(snapshot.clone()).expect("import");
        assert_eq!(disk.snapshot().expect("snapshot"), snapshot);
    }

    #[test]
    fn import_into_redb_keeps_local_completions() {
        let temp = tempdir().expect("temp dir");
        let mut disk = Portal::with_redb(temp.path().join("portal.redb")).expect("open");
        disk.seed_demo().expect("seed");
        let t = TraineeId::new("trainee-1");
        disk.complete_task(&t, &TaskId::new("task-1")).expect("complete");
        disk.complete_task(&t, &TaskId::new("task-3")).expect("complete");

        let mut other = seeded();
        other.complete_task(&t, &TaskId::new("task-2")).expect("pending");
        other.approve_task(&t, &TaskId::new("task-2"), "admin").expect("approve");

        let report = disk.import_snapshot(other.snapshot().expect("snapshot")).expect("import");
        assert_eq!(report.tasks_completed, 1);

        let board = disk.mission_board(&t).expect("board");
        let skills = board
            .iter()
            .find(|card| card.mission.id.as_str() == "mission-1")
            .expect("mission-1");
        assert_eq!(skills.completed_tasks, 3);
        assert_eq!(disk.trainee(&t).expect("get").overall_xp, 340);
    }

    #[test]
    fn compact_needs_redb() {
        let mut memory = Portal::new();
        assert!(matches!(memory.compact(), Err(PortalError::InvalidInput(_))));

        let temp = tempdir().expect("temp dir");
        let mut disk = Portal::with_redb(temp.path().join("portal.redb")).expect("open");
        disk.seed_demo().expect("seed");
        disk.compact().expect("compact");
        assert_eq!(disk.trainees().expect("list").len(), 2);
    }

    #[test]
    fn published_announcement_reaches_its_audience() {
        let mut portal = seeded();
        let ann = portal
            .publish_announcement("Kitchen deep clean", "Saturday 8am.", Audience::Trainees)
            .expect("publish");
        assert_eq!(ann.id.as_str(), "ann-4");

        let mentors = portal.announcements(Some(Audience::Mentors)).expect("list");
        assert!(mentors.iter().all(|a| a.id != ann.id));
        let trainees = portal.announcements(Some(Audience::Trainees)).expect("list");
        assert!(trainees.iter().any(|a| a.id == ann.id));
    }
}
