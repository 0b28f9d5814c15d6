//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.
//!
//! Catalog bodies (`NewMission`, `NewTask`) are taken straight from the
//! core; everything else is defined here.

use hb_portal_core::{
    Audience, PortalError, PortalMetrics, Stage, SupportCategory, SupportStatus, TaskId, TraineeId,
    primitives::MAX_MESSAGE_LENGTH,
};
use serde::{Deserialize, Serialize};

/// Approver recorded when an approval request names none.
pub const DEFAULT_APPROVER: &str = "admin";

// =============================================================================
// ENVELOPE
// =============================================================================

/// Standard response envelope.
///
/// Every JSON endpoint except `/health` answers with this shape; failures
/// carry `success: false` and a message in `error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Portal status: storage kind plus record counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub persistent: bool,
    #[serde(flatten)]
    pub metrics: PortalMetrics,
}

// =============================================================================
// TRAINEE REQUESTS
// =============================================================================

/// Body of `POST /admin/trainees`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterTraineeRequest {
    pub name: String,
    #[serde(default)]
    pub cohort: Option<String>,
    /// Display name or snake_case form; defaults to Orientation.
    #[serde(default)]
    pub stage: Option<String>,
}

impl RegisterTraineeRequest {
    /// Parse the optional stage.
    pub fn stage(&self) -> Result<Stage, PortalError> {
        match self.stage.as_deref() {
            Some(raw) => raw.parse(),
            None => Ok(Stage::Orientation),
        }
    }
}

// =============================================================================
// APPROVAL REQUEST
// =============================================================================

/// Body of `POST /admin/approvals`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub trainee_id: String,
    pub task_id: String,
    #[serde(default)]
    pub approver: Option<String>,
}

impl ApprovalRequest {
    /// Resolve ids and the approver name.
    pub fn parts(&self) -> (TraineeId, TaskId, String) {
        let approver = self
            .approver
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(DEFAULT_APPROVER)
            .to_string();
        (
            TraineeId::new(self.trainee_id.trim()),
            TaskId::new(self.task_id.trim()),
            approver,
        )
    }
}

// =============================================================================
// SUPPORT REQUESTS
// =============================================================================

/// Body of `POST /support`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportSubmission {
    pub trainee_id: String,
    pub message: String,
    #[serde(default)]
    pub category: Option<String>,
}

impl SupportSubmission {
    /// Validate the message size and parse the category.
    ///
    /// Oversized messages are rejected here so they never reach the core.
    pub fn category(&self) -> Result<SupportCategory, PortalError> {
        if self.message.len() > MAX_MESSAGE_LENGTH {
            return Err(PortalError::InvalidInput(format!(
                "Message length {} exceeds maximum {} bytes",
                self.message.len(),
                MAX_MESSAGE_LENGTH
            )));
        }
        match self.category.as_deref() {
            Some(raw) => raw.parse(),
            None => Ok(SupportCategory::default()),
        }
    }
}

/// Body of `POST /admin/support/{id}/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportStatusUpdate {
    pub status: String,
}

impl SupportStatusUpdate {
    pub fn status(&self) -> Result<SupportStatus, PortalError> {
        self.status.parse()
    }
}

// =============================================================================
// ANNOUNCEMENTS
// =============================================================================

/// Body of `POST /admin/announcements`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnouncementRequest {
    pub title: String,
    pub body: String,
    /// Defaults to everyone.
    #[serde(default)]
    pub audience: Option<String>,
}

impl AnnouncementRequest {
    pub fn audience(&self) -> Result<Audience, PortalError> {
        match self.audience.as_deref() {
            Some(raw) => raw.parse(),
            None => Ok(Audience::All),
        }
    }
}

/// Query string of `GET /announcements`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnouncementQuery {
    #[serde(default)]
    pub audience: Option<String>,
}

impl AnnouncementQuery {
    /// The reading audience; anonymous readers see only notices for everyone.
    pub fn reader(&self) -> Result<Audience, PortalError> {
        match self.audience.as_deref() {
            Some(raw) => raw.parse(),
            None => Ok(Audience::All),
        }
    }
}

// =============================================================================
// EXPORT RESPONSE
// =============================================================================

/// Export response carrying a base64 snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResponse {
    pub success: bool,
    pub data: Option<String>, // Base64 encoded
    pub size_bytes: Option<usize>,
    pub error: Option<String>,
}

impl ExportResponse {
    pub fn success(data: Vec<u8>) -> Self {
        Self {
            success: true,
            size_bytes: Some(data.len()),
            data: Some(base64::Engine::encode(
                &base64::engine::general_purpose::STANDARD,
                &data,
            )),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            size_bytes: None,
            error: Some(msg.into()),
        }
    }
}
