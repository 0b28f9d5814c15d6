//! # hb-portal-core
//!
//! The progression engine of the HB training portal - THE LOGIC.
//!
//! This crate holds everything that decides how a trainee moves forward:
//! experience points and levels, mission and task completion, badge rules,
//! support tickets, announcements, and the storage those records live in.
//!
//! ## Architectural Constraints
//!
//! - Pure Rust: NO async, NO network dependencies
//! - Integer arithmetic only; XP counters saturate instead of overflowing
//! - The engine never reads the clock; callers pass timestamps in
//!   (the [`Portal`] facade supplies `Utc::now()`)
//! - Every lookup of an unknown id is an error, never a silent no-op

// =============================================================================
// MODULES
// =============================================================================

pub mod announcements;
pub mod catalog;
pub mod dashboard;
pub mod formats;
pub mod import;
pub mod portal;
pub mod primitives;
pub mod progression;
pub mod seed;
pub mod store;
pub mod support;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Announcement, AnnouncementId, Audience, Badge, BadgeId, Mission, MissionId, MissionProgress, MissionStatus, MissionTask, PortalError,
    Stage, SupportCategory, SupportRequest, SupportRequestId, SupportStatus, TaskId, TaskProgress,
    TaskStatus, Track, Trainee, TraineeBadge, TraineeId,
};

// =============================================================================
// RE-EXPORTS: Engine and Storage
// =============================================================================

pub use announcements::AnnouncementBoard;
pub use catalog::{Catalog, NewMission, NewTask, PendingApproval};
pub use dashboard::{
    Dashboard, EarnedBadge, FocusSuggestion, HomeSummary, MissionCard, PortalMetrics,
    ProgressReport, StageStep, TaskRow, TrackProgress,
};
pub use import::{ImportReport, SnapshotImport};
pub use portal::{Portal, StorageBackend};
pub use progression::{CompletionOutcome, LevelProgress, LevelSnapshot, ProgressionEngine};
pub use seed::seed_demo;
pub use store::{MemoryStore, PortalSnapshot, PortalStore, RedbStore};
pub use support::SupportDesk;

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{MAX_SNAPSHOT_SIZE, SnapshotHeader, snapshot_from_bytes, snapshot_to_bytes};
