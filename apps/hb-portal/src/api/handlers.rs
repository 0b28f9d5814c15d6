//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.
//!
//! Reads take the portal's read lock; every mutation holds the write lock
//! for its whole read-modify-write pass.

use super::{
    AppState,
    types::{
        AnnouncementQuery, AnnouncementRequest, ApiResponse, ApprovalRequest, ExportResponse, HealthResponse, RegisterTraineeRequest,
        StatusResponse, SupportStatusUpdate, SupportSubmission,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use hb_portal_core::{
    Announcement, NewMission, NewTask, PortalError, SupportRequest, SupportRequestId, TaskId, Trainee,
    TraineeId, snapshot_to_bytes,
};
use serde::Serialize;

// =============================================================================
// RESPONSE HELPERS
// =============================================================================

/// HTTP status for a core error.
///
/// Unknown ids are 404, rejected input is 400, storage trouble is 500.
pub fn error_status(err: &PortalError) -> StatusCode {
    if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else if matches!(err, PortalError::InvalidInput(_)) {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

fn respond<T: Serialize>(result: Result<T, PortalError>) -> (StatusCode, Json<ApiResponse<T>>) {
    match result {
        Ok(data) => (StatusCode::OK, Json(ApiResponse::success(data))),
        Err(e) => {
            let status = error_status(&e);
            if status.is_server_error() {
                tracing::error!("Request failed: {}", e);
            }
            (status, Json(ApiResponse::error(e.to_string())))
        }
    }
}

// =============================================================================
// HEALTH AND STATUS
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// Record counts and storage kind.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let portal = state.portal.read().await;
    respond(portal.metrics().map(|metrics| StatusResponse {
        persistent: portal.is_persistent(),
        metrics,
    }))
}

// =============================================================================
// TRAINEE VIEWS
// =============================================================================

pub async fn trainees_handler(State(state): State<AppState>) -> impl IntoResponse {
    let portal = state.portal.read().await;
    respond(portal.trainees())
}

pub async fn badges_handler(State(state): State<AppState>) -> impl IntoResponse {
    let portal = state.portal.read().await;
    respond(portal.badges())
}

/// Mission board: eligible missions with per-task status.
pub async fn missions_handler(
    State(state): State<AppState>,
    Path(trainee_id): Path<String>,
) -> impl IntoResponse {
    let portal = state.portal.read().await;
    respond(portal.mission_board(&TraineeId::new(trainee_id)))
}

pub async fn progress_handler(
    State(state): State<AppState>,
    Path(trainee_id): Path<String>,
) -> impl IntoResponse {
    let portal = state.portal.read().await;
    respond(portal.progress(&TraineeId::new(trainee_id)))
}

pub async fn home_handler(
    State(state): State<AppState>,
    Path(trainee_id): Path<String>,
) -> impl IntoResponse {
    let portal = state.portal.read().await;
    respond(portal.home(&TraineeId::new(trainee_id)))
}

// =============================================================================
// TASK COMPLETION
// =============================================================================

/// Trainee marks a task done.
///
/// Self-complete tasks are credited at once; the rest wait for approval.
pub async fn complete_task_handler(
    State(state): State<AppState>,
    Path((trainee_id, task_id)): Path<(String, String)>,
) -> impl IntoResponse {
    let trainee = TraineeId::new(trainee_id);
    let task = TaskId::new(task_id);

    let mut portal = state.portal.write().await;
    let result = portal.complete_task(&trainee, &task);
    if let Ok(outcome) = &result {
        tracing::info!(
            trainee = %trainee,
            task = %task,
            status = outcome.progress.status.label(),
            xp_awarded = outcome.xp_awarded,
            "Task submitted"
        );
    }
    respond(result)
}

// =============================================================================
// SUPPORT
// =============================================================================

pub async fn submit_support_handler(
    State(state): State<AppState>,
    Json(request): Json<SupportSubmission>,
) -> impl IntoResponse {
    let category = match request.category() {
        Ok(c) => c,
        Err(e) => return respond::<SupportRequest>(Err(e)),
    };

    let mut portal = state.portal.write().await;
    let result = portal.submit_support_request(
        &TraineeId::new(request.trainee_id.trim()),
        &request.message,
        category,
    );
    if let Ok(ticket) = &result {
        tracing::info!(id = %ticket.id, trainee = %ticket.trainee_id, "Support request submitted");
    }
    respond(result)
}

/// Announcements visible to `?audience=` (notices for everyone when absent),
/// newest first.
pub async fn announcements_handler(
    State(state): State<AppState>,
    Query(query): Query<AnnouncementQuery>,
) -> impl IntoResponse {
    let reader = match query.reader() {
        Ok(r) => r,
        Err(e) => return respond::<Vec<Announcement>>(Err(e)),
    };

    let portal = state.portal.read().await;
    respond(portal.announcements(Some(reader)))
}

// =============================================================================
// ADMIN: ROSTER AND CATALOG
// =============================================================================

pub async fn register_trainee_handler(
    State(state): State<AppState>,
    Json(request): Json<RegisterTraineeRequest>,
) -> impl IntoResponse {
    let stage = match request.stage() {
        Ok(s) => s,
        Err(e) => return respond::<Trainee>(Err(e)),
    };

    let mut portal = state.portal.write().await;
    let result = portal.register_trainee(&request.name, request.cohort.as_deref(), stage);
    if let Ok(trainee) = &result {
        tracing::info!(id = %trainee.id, "Trainee registered");
    }
    respond(result)
}

pub async fn create_mission_handler(
    State(state): State<AppState>,
    Json(request): Json<NewMission>,
) -> impl IntoResponse {
    let mut portal = state.portal.write().await;
    let result = portal.create_mission(request);
    if let Ok(mission) = &result {
        tracing::info!(id = %mission.id, "Mission created");
    }
    respond(result)
}

pub async fn add_task_handler(
    State(state): State<AppState>,
    Json(request): Json<NewTask>,
) -> impl IntoResponse {
    let mut portal = state.portal.write().await;
    let result = portal.add_task(request);
    if let Ok(task) = &result {
        tracing::info!(id = %task.id, mission = %task.mission_id, "Task added");
    }
    respond(result)
}

// =============================================================================
// ADMIN: APPROVALS
// =============================================================================

pub async fn pending_handler(
    State(state): State<AppState>,
    Path(trainee_id): Path<String>,
) -> impl IntoResponse {
    let portal = state.portal.read().await;
    respond(portal.pending_approvals(&TraineeId::new(trainee_id)))
}

pub async fn approve_handler(
    State(state): State<AppState>,
    Json(request): Json<ApprovalRequest>,
) -> impl IntoResponse {
    let (trainee, task, approver) = request.parts();

    let mut portal = state.portal.write().await;
    let result = portal.approve_task(&trainee, &task, &approver);
    if let Ok(outcome) = &result {
        tracing::info!(
            trainee = %trainee,
            task = %task,
            approver = %approver,
            already_completed = outcome.already_completed,
            "Task approved"
        );
    }
    respond(result)
}

// =============================================================================
// ADMIN: SUPPORT QUEUE
// =============================================================================

/// All support requests, newest first.
pub async fn support_list_handler(State(state): State<AppState>) -> impl IntoResponse {
    let portal = state.portal.read().await;
    respond(portal.support_requests())
}

pub async fn support_status_handler(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
    Json(update): Json<SupportStatusUpdate>,
) -> impl IntoResponse {
    let status = match update.status() {
        Ok(s) => s,
        Err(e) => return respond::<SupportRequest>(Err(e)),
    };

    let mut portal = state.portal.write().await;
    respond(portal.update_support_status(&SupportRequestId::new(request_id), status))
}

// =============================================================================
// ADMIN: ANNOUNCEMENTS
// =============================================================================

/// Every announcement regardless of audience, newest first.
pub async fn all_announcements_handler(State(state): State<AppState>) -> impl IntoResponse {
    let portal = state.portal.read().await;
    respond(portal.announcements(None))
}

pub async fn publish_announcement_handler(
    State(state): State<AppState>,
    Json(request): Json<AnnouncementRequest>,
) -> impl IntoResponse {
    let audience = match request.audience() {
        Ok(a) => a,
        Err(e) => return respond::<Announcement>(Err(e)),
    };

    let mut portal = state.portal.write().await;
    let result = portal.publish_announcement(&request.title, &request.body, audience);
    if let Ok(announcement) = &result {
        tracing::info!(id = %announcement.id, audience = %announcement.audience, "Announcement published");
    }
    respond(result)
}

// =============================================================================
// ADMIN: EXPORT
// =============================================================================

/// Export every collection as a base64 snapshot.
pub async fn export_handler(State(state): State<AppState>) -> impl IntoResponse {
    let portal = state.portal.read().await;

    let bytes = portal
        .snapshot()
        .and_then(|snapshot| snapshot_to_bytes(&snapshot));

    match bytes {
        Ok(data) => (StatusCode::OK, Json(ExportResponse::success(data))),
        Err(e) => (
            error_status(&e),
            Json(ExportResponse::error(format!("Export failed: {}", e))),
        ),
    }
}
