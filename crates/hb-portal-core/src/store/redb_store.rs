//! # redb-backed Store
//!
//! A disk-backed `PortalStore` using the redb embedded database.
//!
//! Every record is postcard-encoded into a `&[u8]` value:
//! - Catalog and trainee tables are keyed by the record id
//! - Progress and award tables are keyed by `(trainee_id, other_id)`
//!
//! Each mutation runs in its own write transaction, so a change is durable
//! as soon as the call returns.

use super::PortalStore;
use crate::{
    Announcement, AnnouncementId, Badge, BadgeId, Mission, MissionId, MissionProgress, MissionTask, PortalError,
    SupportRequest, SupportRequestId, TaskId, TaskProgress, Trainee, TraineeBadge, TraineeId,
};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Table keyed by a single record id.
type IdTable = TableDefinition<'static, &'static str, &'static [u8]>;

/// Table keyed by `(trainee_id, other_id)`.
type PairTable = TableDefinition<'static, (&'static str, &'static str), &'static [u8]>;

const TRAINEES: IdTable = TableDefinition::new("trainees");
const MISSIONS: IdTable = TableDefinition::new("missions");
const TASKS: IdTable = TableDefinition::new("tasks");
const BADGES: IdTable = TableDefinition::new("badges");
const SUPPORT_REQUESTS: IdTable = TableDefinition::new("support_requests");
const ANNOUNCEMENTS: IdTable = TableDefinition::new("announcements");
const TASK_PROGRESS: PairTable = TableDefinition::new("task_progress");
const MISSION_PROGRESS: PairTable = TableDefinition::new("mission_progress");
const TRAINEE_BADGES: PairTable = TableDefinition::new("trainee_badges");

fn db_err(e: impl std::fmt::Display) -> PortalError {
    PortalError::IoError(e.to_string())
}

fn encode<T: Serialize>(record: &T) -> Result<Vec<u8>, PortalError> {
    postcard::to_allocvec(record).map_err(|e| PortalError::SerializationError(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, PortalError> {
    postcard::from_bytes(bytes).map_err(|e| PortalError::DeserializationError(e.to_string()))
}

/// A disk-backed portal store using redb.
pub struct RedbStore {
    db: Database,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a portal database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PortalError> {
        let db = Database::create(path.as_ref()).map_err(db_err)?;

        // Create all tables up front so readers never hit a missing table.
        let write_txn = db.begin_write().map_err(db_err)?;
        for table in [TRAINEES, MISSIONS, TASKS, BADGES, SUPPORT_REQUESTS, ANNOUNCEMENTS] {
            write_txn.open_table(table).map_err(db_err)?;
        }
        for table in [TASK_PROGRESS, MISSION_PROGRESS, TRAINEE_BADGES] {
            write_txn.open_table(table).map_err(db_err)?;
        }
        write_txn.commit().map_err(db_err)?;

        Ok(Self { db })
    }

    /// Compact the database file.
    ///
    /// Returns `true` if any space was reclaimed.
    pub fn compact(&mut self) -> Result<bool, PortalError> {
        self.db.compact().map_err(db_err)
    }

    // =========================================================================
    // ID-KEYED TABLES
    // =========================================================================

    fn get_by_id<T: DeserializeOwned>(
        &self,
        table: IdTable,
        id: &str,
    ) -> Result<Option<T>, PortalError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let table = read_txn.open_table(table).map_err(db_err)?;
        match table.get(id).map_err(db_err)? {
            Some(data) => Ok(Some(decode(data.value())?)),
            None => Ok(None),
        }
    }

    fn put_by_id<T: Serialize>(
        &self,
        table: IdTable,
        id: &str,
        record: &T,
    ) -> Result<(), PortalError> {
        let bytes = encode(record)?;
        let write_txn = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = write_txn.open_table(table).map_err(db_err)?;
            table.insert(id, bytes.as_slice()).map_err(db_err)?;
        }
        write_txn.commit().map_err(db_err)?;
        Ok(())
    }

    fn list_by_id<T: DeserializeOwned>(&self, table: IdTable) -> Result<Vec<T>, PortalError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let table = read_txn.open_table(table).map_err(db_err)?;

        let mut records = Vec::new();
        for entry in table.iter().map_err(db_err)? {
            let (_, value) = entry.map_err(db_err)?;
            records.push(decode(value.value())?);
        }
        Ok(records)
    }

    // =========================================================================
    // PAIR-KEYED TABLES
    // =========================================================================

    fn get_by_pair<T: DeserializeOwned>(
        &self,
        table: PairTable,
        trainee: &str,
        other: &str,
    ) -> Result<Option<T>, PortalError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let table = read_txn.open_table(table).map_err(db_err)?;
        match table.get((trainee, other)).map_err(db_err)? {
            Some(data) => Ok(Some(decode(data.value())?)),
            None => Ok(None),
        }
    }

    fn put_by_pair<T: Serialize>(
        &self,
        table: PairTable,
        trainee: &str,
        other: &str,
        record: &T,
    ) -> Result<(), PortalError> {
        let bytes = encode(record)?;
        let write_txn = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = write_txn.open_table(table).map_err(db_err)?;
            table
                .insert((trainee, other), bytes.as_slice())
                .map_err(db_err)?;
        }
        write_txn.commit().map_err(db_err)?;
        Ok(())
    }

    fn list_for_trainee<T: DeserializeOwned>(
        &self,
        table: PairTable,
        trainee: &str,
    ) -> Result<Vec<T>, PortalError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let table = read_txn.open_table(table).map_err(db_err)?;

        let mut records = Vec::new();
        for entry in table.iter().map_err(db_err)? {
            let (key, value) = entry.map_err(db_err)?;
            let (owner, _) = key.value();
            if owner == trainee {
                records.push(decode(value.value())?);
            }
        }
        Ok(records)
    }
}

// =============================================================================
// PORTALSTORE TRAIT IMPLEMENTATION
// =============================================================================

impl PortalStore for RedbStore {
    fn get_trainee(&self, id: &TraineeId) -> Result<Option<Trainee>, PortalError> {
        self.get_by_id(TRAINEES, id.as_str())
    }

    fn save_trainee(&mut self, trainee: Trainee) -> Result<(), PortalError> {
        self.put_by_id(TRAINEES, trainee.id.as_str(), &trainee)
    }

    fn list_trainees(&self) -> Result<Vec<Trainee>, PortalError> {
        self.list_by_id(TRAINEES)
    }

    fn get_mission(&self, id: &MissionId) -> Result<Option<Mission>, PortalError> {
        self.get_by_id(MISSIONS, id.as_str())
    }

    fn save_mission(&mut self, mission: Mission) -> Result<(), PortalError> {
        self.put_by_id(MISSIONS, mission.id.as_str(), &mission)
    }

    fn list_missions(&self) -> Result<Vec<Mission>, PortalError> {
        self.list_by_id(MISSIONS)
    }

    fn get_task(&self, id: &TaskId) -> Result<Option<MissionTask>, PortalError> {
        self.get_by_id(TASKS, id.as_str())
    }

    fn save_task(&mut self, task: MissionTask) -> Result<(), PortalError> {
        self.put_by_id(TASKS, task.id.as_str(), &task)
    }

    fn list_tasks(&self) -> Result<Vec<MissionTask>, PortalError> {
        self.list_by_id(TASKS)
    }

    fn get_task_progress(
        &self,
        trainee: &TraineeId,
        task: &TaskId,
    ) -> Result<Option<TaskProgress>, PortalError> {
        self.get_by_pair(TASK_PROGRESS, trainee.as_str(), task.as_str())
    }

    fn save_task_progress(&mut self, progress: TaskProgress) -> Result<(), PortalError> {
        self.put_by_pair(
            TASK_PROGRESS,
            progress.trainee_id.as_str(),
            progress.task_id.as_str(),
            &progress,
        )
    }

    fn list_task_progress_for_trainee(
        &self,
        trainee: &TraineeId,
    ) -> Result<Vec<TaskProgress>, PortalError> {
        self.list_for_trainee(TASK_PROGRESS, trainee.as_str())
    }

    fn get_mission_progress(
        &self,
        trainee: &TraineeId,
        mission: &MissionId,
    ) -> Result<Option<MissionProgress>, PortalError> {
        self.get_by_pair(MISSION_PROGRESS, trainee.as_str(), mission.as_str())
    }

    fn save_mission_progress(&mut self, progress: MissionProgress) -> Result<(), PortalError> {
        self.put_by_pair(
            MISSION_PROGRESS,
            progress.trainee_id.as_str(),
            progress.mission_id.as_str(),
            &progress,
        )
    }

    fn list_mission_progress_for_trainee(
        &self,
        trainee: &TraineeId,
    ) -> Result<Vec<MissionProgress>, PortalError> {
        self.list_for_trainee(MISSION_PROGRESS, trainee.as_str())
    }

    fn add_badge(&mut self, badge: Badge) -> Result<(), PortalError> {
        self.put_by_id(BADGES, badge.id.as_str(), &badge)
    }

    fn list_badges(&self) -> Result<Vec<Badge>, PortalError> {
        self.list_by_id(BADGES)
    }

    fn get_badge(&self, id: &BadgeId) -> Result<Option<Badge>, PortalError> {
        self.get_by_id(BADGES, id.as_str())
    }

    fn award_badge(&mut self, award: TraineeBadge) -> Result<bool, PortalError> {
        let bytes = encode(&award)?;
        let key = (award.trainee_id.as_str(), award.badge_id.as_str());

        // Check and insert inside one transaction.
        let write_txn = self.db.begin_write().map_err(db_err)?;
        let inserted = {
            let mut table = write_txn.open_table(TRAINEE_BADGES).map_err(db_err)?;
            let exists = table.get(key).map_err(db_err)?.is_some();
            if !exists {
                table.insert(key, bytes.as_slice()).map_err(db_err)?;
            }
            !exists
        };
        write_txn.commit().map_err(db_err)?;
        Ok(inserted)
    }

    fn list_badges_for_trainee(
        &self,
        trainee: &TraineeId,
    ) -> Result<Vec<TraineeBadge>, PortalError> {
        self.list_for_trainee(TRAINEE_BADGES, trainee.as_str())
    }

    fn get_support_request(
        &self,
        id: &SupportRequestId,
    ) -> Result<Option<SupportRequest>, PortalError> {
        self.get_by_id(SUPPORT_REQUESTS, id.as_str())
    }

    fn save_support_request(&mut self, request: SupportRequest) -> Result<(), PortalError> {
        self.put_by_id(SUPPORT_REQUESTS, request.id.as_str(), &request)
    }

    fn list_support_requests(&self) -> Result<Vec<SupportRequest>, PortalError> {
        self.list_by_id(SUPPORT_REQUESTS)
    }

    fn get_announcement(&self, id: &AnnouncementId) -> Result<Option<Announcement>, PortalError> {
        self.get_by_id(ANNOUNCEMENTS, id.as_str())
    }

    fn save_announcement(&mut self, announcement: Announcement) -> Result<(), PortalError> {
        self.put_by_id(ANNOUNCEMENTS, announcement.id.as_str(), &announcement)
    }

    fn list_announcements(&self) -> Result<Vec<Announcement>, PortalError> {
        self.list_by_id(ANNOUNCEMENTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Audience, MissionStatus, Stage, TaskStatus};
    use chrono::{DateTime, Utc};
    use tempfile::tempdir;

    fn trainee(id: &str) -> Trainee {
        Trainee::new(
            TraineeId::new(id),
            "Marcus Lim",
            Some("Cohort Orion".into()),
            Stage::Orientation,
            DateTime::<Utc>::UNIX_EPOCH,
        )
    }

    #[test]
    fn records_survive_reopen() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("portal.redb");

        {
            let mut store = RedbStore::open(&db_path).expect("open db");
            store.save_trainee(trainee("trainee-2")).expect("save");
            store
                .save_mission_progress(MissionProgress::derive(
                    TraineeId::new("trainee-2"),
                    MissionId::new("mission-2"),
                    1,
                    2,
                ))
                .expect("save");
        }

        {
            let store = RedbStore::open(&db_path).expect("reopen db");
            let loaded = store
                .get_trainee(&TraineeId::new("trainee-2"))
                .expect("get")
                .expect("present");
            assert_eq!(loaded.name, "Marcus Lim");
            let progress = store
                .get_mission_progress(&TraineeId::new("trainee-2"), &MissionId::new("mission-2"))
                .expect("get")
                .expect("present");
            assert_eq!(progress.status, MissionStatus::InProgress);
        }
    }

    #[test]
    fn progress_listed_per_trainee() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbStore::open(temp.path().join("portal.redb")).expect("open db");

        for (trainee_id, task_id) in [("t1", "task-1"), ("t2", "task-1"), ("t1", "task-2")] {
            store
                .save_task_progress(TaskProgress {
                    trainee_id: TraineeId::new(trainee_id),
                    task_id: TaskId::new(task_id),
                    status: TaskStatus::PendingApproval,
                    completed_at: None,
                    approved_by: None,
                })
                .expect("save");
        }

        let t1 = store
            .list_task_progress_for_trainee(&TraineeId::new("t1"))
            .expect("list");
        assert_eq!(t1.len(), 2);
        assert!(t1.iter().all(|p| p.trainee_id.as_str() == "t1"));
    }

    #[test]
    fn award_badge_not_duplicated() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbStore::open(temp.path().join("portal.redb")).expect("open db");
        let award = TraineeBadge {
            trainee_id: TraineeId::new("t1"),
            badge_id: BadgeId::new("badge-1"),
            awarded_at: DateTime::<Utc>::UNIX_EPOCH,
        };

        assert!(store.award_badge(award.clone()).expect("award"));
        assert!(!store.award_badge(award).expect("award"));
        assert_eq!(
            store
                .list_badges_for_trainee(&TraineeId::new("t1"))
                .expect("list")
                .len(),
            1
        );
    }

    #[test]
    fn missing_records_are_none() {
        let temp = tempdir().expect("temp dir");
        let store = RedbStore::open(temp.path().join("portal.redb")).expect("open db");
        assert!(store.get_task(&TaskId::new("task-404")).expect("get").is_none());
        assert!(matches!(
            store.require_task(&TaskId::new("task-404")),
            Err(PortalError::TaskNotFound(_))
        ));
    }

    #[test]
    fn announcements_survive_compaction() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("portal.redb");
        let mut store = RedbStore::open(&db_path).expect("open db");

        for n in 0..20 {
            store.save_trainee(trainee(&format!("t{n}"))).expect("save");
        }
        store
            .save_announcement(Announcement {
                id: AnnouncementId::new("ann-1"),
                title: "Mentor sync".into(),
                body: "Mentor standup on Friday.".into(),
                audience: Audience::Mentors,
                published_at: DateTime::<Utc>::UNIX_EPOCH,
            })
            .expect("save");

        store.compact().expect("compact");
        drop(store);

        let store = RedbStore::open(&db_path).expect("reopen db");
        assert_eq!(store.list_trainees().expect("list").len(), 20);
        let loaded = store
            .get_announcement(&AnnouncementId::new("ann-1"))
            .expect("get")
            .expect("present");
        assert_eq!(loaded.audience, Audience::Mentors);
    }
}
