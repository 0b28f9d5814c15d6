//! # Core Type Definitions
//!
//! This module contains the vocabulary of the portal:
//! - Record identifiers (`TraineeId`, `MissionId`, `TaskId`, `BadgeId`, `SupportRequestId`,
//!   `AnnouncementId`)
//! - Ordered journey stages and skill tracks (`Stage`, `Track`)
//! - Status enums for tasks, missions and support tickets
//! - Announcement audiences
//! - Error types (`PortalError`)
//!
//! The record structs themselves live in [`records`].
//!
//! ## Determinism Guarantees
//!
//! - Identifiers and enums implement `Ord` so they can key `BTreeMap`/`BTreeSet`
//! - XP counters use saturating arithmetic (see [`records::Trainee`])

mod records;

pub use records::*;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create an identifier from any string-like value.
            #[must_use]
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Get the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(
    /// Identifier of a trainee, e.g. `trainee-1`.
    TraineeId
);
string_id!(
    /// Identifier of a mission in the catalog, e.g. `mission-2`.
    MissionId
);
string_id!(
    /// Identifier of a mission task, e.g. `task-4`.
    TaskId
);
string_id!(
    /// Identifier of a badge in the catalog, e.g. `badge-1`.
    BadgeId
);
string_id!(
    /// Identifier of a support ticket, e.g. `support-1f0c9a2b`.
    SupportRequestId
);
string_id!(
    /// Identifier of an announcement, e.g. `ann-3`.
    AnnouncementId
);

// =============================================================================
// STAGE
// =============================================================================

/// An ordered phase of the trainee journey towards stall ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[serde(alias = "Orientation")]
    Orientation,
    #[serde(alias = "Skills Training")]
    SkillsTraining,
    #[serde(alias = "Stall Practice")]
    StallPractice,
    #[serde(alias = "Placement")]
    Placement,
    #[serde(alias = "Ownership Pathway")]
    OwnershipPathway,
}

impl Stage {
    /// All stages in journey order.
    pub const ALL: [Stage; 5] = [
        Stage::Orientation,
        Stage::SkillsTraining,
        Stage::StallPractice,
        Stage::Placement,
        Stage::OwnershipPathway,
    ];

    /// Human-readable stage name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Orientation => "Orientation",
            Stage::SkillsTraining => "Skills Training",
            Stage::StallPractice => "Stall Practice",
            Stage::Placement => "Placement",
            Stage::OwnershipPathway => "Ownership Pathway",
        }
    }

    /// Zero-based position in the journey.
    #[must_use]
    pub fn position(&self) -> usize {
        match self {
            Stage::Orientation => 0,
            Stage::SkillsTraining => 1,
            Stage::StallPractice => 2,
            Stage::Placement => 3,
            Stage::OwnershipPathway => 4,
        }
    }

    /// Get the next stage, if any.
    #[must_use]
    pub fn next(&self) -> Option<Stage> {
        Self::ALL.get(self.position() + 1).copied()
    }

    /// Get the previous stage, if any.
    #[must_use]
    pub fn previous(&self) -> Option<Stage> {
        self.position()
            .checked_sub(1)
            .and_then(|i| Self::ALL.get(i).copied())
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Stage {
    type Err = PortalError;

    /// Accepts the display name ("Skills Training") or the snake_case
    /// form ("skills_training"), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        Stage::ALL
            .into_iter()
            .find(|stage| stage.name().to_ascii_lowercase().replace(' ', "_") == normalized)
            .ok_or_else(|| PortalError::InvalidInput(format!("Unknown stage: {}", s)))
    }
}

// =============================================================================
// TRACK
// =============================================================================

/// Skill category that experience is accrued against.
///
/// Tags other than the three fixed tracks are kept verbatim in
/// `Unrecognized` so that records read from storage round-trip unchanged.
/// Such tasks still count towards overall XP but feed no track counter.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Track {
    Kitchen,
    StallOps,
    LifeMindset,
    Unrecognized(String),
}

impl Track {
    /// The three tracks that carry their own XP counter.
    pub const KNOWN: [Track; 3] = [Track::Kitchen, Track::StallOps, Track::LifeMindset];

    /// Storage tag of the track.
    #[must_use]
    pub fn tag(&self) -> &str {
        match self {
            Track::Kitchen => "kitchen",
            Track::StallOps => "stall_ops",
            Track::LifeMindset => "life_mindset",
            Track::Unrecognized(tag) => tag,
        }
    }

    /// Label shown on progress views.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Track::Kitchen => "Kitchen Skills",
            Track::StallOps => "Stall Operations",
            Track::LifeMindset => "Life & Mindset",
            Track::Unrecognized(tag) => tag,
        }
    }

    /// Check if the track is one of the fixed three.
    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, Track::Unrecognized(_))
    }
}

impl From<String> for Track {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "kitchen" => Track::Kitchen,
            "stall_ops" => Track::StallOps,
            "life_mindset" => Track::LifeMindset,
            _ => Track::Unrecognized(tag),
        }
    }
}

impl From<&str> for Track {
    fn from(tag: &str) -> Self {
        Track::from(tag.to_string())
    }
}

impl From<Track> for String {
    fn from(track: Track) -> Self {
        match track {
            Track::Unrecognized(tag) => tag,
            known => known.tag().to_string(),
        }
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

// =============================================================================
// STATUS ENUMS
// =============================================================================

/// Per (trainee, task) completion state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    NotStarted,
    PendingApproval,
    Completed,
}

impl TaskStatus {
    /// Label shown to trainees.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "Not started",
            TaskStatus::PendingApproval => "Pending approval",
            TaskStatus::Completed => "Completed",
        }
    }
}

/// Per (trainee, mission) state, derived from task progress.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum MissionStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

impl MissionStatus {
    /// Label shown to trainees.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            MissionStatus::NotStarted => "Not started",
            MissionStatus::InProgress => "In progress",
            MissionStatus::Completed => "Completed",
        }
    }
}

/// Handling state of a support ticket.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum SupportStatus {
    #[default]
    New,
    InProgress,
    Handled,
}

impl FromStr for SupportStatus {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "new" => Ok(SupportStatus::New),
            "in_progress" => Ok(SupportStatus::InProgress),
            "handled" => Ok(SupportStatus::Handled),
            _ => Err(PortalError::InvalidInput(format!(
                "Unknown support status: {}",
                s
            ))),
        }
    }
}

/// Topic a support ticket is filed under.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum SupportCategory {
    Training,
    Placement,
    PersonalSupport,
    #[default]
    Other,
}

impl FromStr for SupportCategory {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "training" => Ok(SupportCategory::Training),
            "placement" => Ok(SupportCategory::Placement),
            "personal_support" => Ok(SupportCategory::PersonalSupport),
            "other" => Ok(SupportCategory::Other),
            _ => Err(PortalError::InvalidInput(format!(
                "Unknown support category: {}",
                s
            ))),
        }
    }
}

// =============================================================================
// AUDIENCE
// =============================================================================

/// Who an announcement is addressed to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    #[default]
    #[serde(alias = "ALL")]
    All,
    #[serde(alias = "TRAINEES")]
    Trainees,
    #[serde(alias = "MENTORS")]
    Mentors,
    #[serde(alias = "EMPLOYERS")]
    Employers,
}

impl Audience {
    /// Whether a reader in `self` sees an announcement addressed to `target`.
    ///
    /// Everyone sees announcements for [`Audience::All`].
    #[must_use]
    pub fn sees(self, target: Audience) -> bool {
        target == Audience::All || target == self
    }

    /// Lowercase tag used on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Audience::All => "all",
            Audience::Trainees => "trainees",
            Audience::Mentors => "mentors",
            Audience::Employers => "employers",
        }
    }
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Audience {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Audience::All),
            "trainees" | "trainee" => Ok(Audience::Trainees),
            "mentors" | "mentor" => Ok(Audience::Mentors),
            "employers" | "employer" => Ok(Audience::Employers),
            _ => Err(PortalError::InvalidInput(format!("Unknown audience: {}", s))),
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the portal core.
///
/// - No silent failures
/// - Unknown references are reported, never ignored
/// - The core should never panic; all errors must be recoverable
#[derive(Debug, Error)]
pub enum PortalError {
    /// No trainee with this id.
    #[error("Trainee not found: {0}")]
    TraineeNotFound(TraineeId),

    /// No mission with this id.
    #[error("Mission not found: {0}")]
    MissionNotFound(MissionId),

    /// No task with this id.
    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    /// No support request with this id.
    #[error("Support request not found: {0}")]
    SupportRequestNotFound(SupportRequestId),

    /// Caller-supplied input failed validation.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O or database error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl PortalError {
    /// Check if this error reports an unknown reference.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            PortalError::TraineeNotFound(_)
                | PortalError::MissionNotFound(_)
                | PortalError::TaskNotFound(_)
                | PortalError::SupportRequestNotFound(_)
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================
