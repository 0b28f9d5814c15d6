//! # HB Portal HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Public Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /status` - Storage kind and record counts
//! - `GET /trainees` - Roster
//! - `GET /badges` - Badge catalog
//! - `GET /trainees/{id}/missions` - Mission board for a trainee
//! - `GET /trainees/{id}/progress` - Levels, tracks and earned badges
//! - `GET /trainees/{id}/home` - Journey, focus tasks and recent activity
//! - `POST /trainees/{id}/tasks/{task_id}/complete` - Mark a task done
//! - `POST /support` - File a support request
//! - `GET /announcements?audience=` - Notices for one audience and everyone
//!
//! ## Admin Endpoints (admin key required)
//!
//! - `POST /admin/trainees` - Register a trainee
//! - `GET /admin/trainees/{id}/pending` - Tasks awaiting approval
//! - `POST /admin/approvals` - Approve a task
//! - `POST /admin/missions` - Create a mission
//! - `POST /admin/tasks` - Add a task to a mission
//! - `GET /admin/support` - Support queue, newest first
//! - `POST /admin/support/{id}/status` - Move a support request along
//! - `GET /admin/announcements` - Every notice, newest first
//! - `POST /admin/announcements` - Publish a notice
//! - `POST /admin/export` - Base64 snapshot of every collection
//!
//! ## Security Configuration
//!
//! See [`crate::config`]: `admin_key`, `rate_limit` and `cors_origins`,
//! each overridable through its `HB_PORTAL_*` environment variable.

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::{admin_auth_middleware, keys_match};
pub use handlers::error_status;
pub use middleware::{GlobalRateLimiter, create_rate_limiter};
pub use types::{
    AnnouncementQuery, AnnouncementRequest, ApiResponse, ApprovalRequest, DEFAULT_APPROVER, ExportResponse, HealthResponse,
    RegisterTraineeRequest, StatusResponse, SupportStatusUpdate, SupportSubmission,
};

use crate::config::PortalConfig;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use hb_portal_core::{Portal, PortalError};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Request body limit (2 MB).
const MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    /// The portal and its store.
    pub portal: Arc<RwLock<Portal>>,
    /// Shared secret for admin routes; `None` refuses them all.
    pub admin_key: Option<Arc<str>>,
}

impl AppState {
    /// Create new app state around a portal.
    #[must_use]
    pub fn new(portal: Portal, admin_key: Option<&str>) -> Self {
        Self {
            portal: Arc::new(RwLock::new(portal)),
            admin_key: admin_key.filter(|k| !k.is_empty()).map(Arc::from),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build the CORS layer.
///
/// - `Some("*")`: allows all origins
/// - `None`: localhost only
/// - Otherwise: the comma-separated list; invalid entries are skipped
fn build_cors_layer(origins: Option<&str>) -> CorsLayer {
    match origins.map(str::trim) {
        Some("*") => {
            tracing::warn!(
                "CORS: Allowing ALL origins (cors_origins = \"*\"). Do not use this in production!"
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .filter_map(|s| match s.parse::<HeaderValue>() {
                    Ok(hv) => {
                        tracing::info!("CORS: Allowing origin: {}", s);
                        Some(hv)
                    }
                    Err(e) => {
                        tracing::warn!("CORS: Invalid origin '{}': {}", s, e);
                        None
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!("CORS: No valid origins configured, defaulting to localhost only");
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            }
        }
        None => {
            tracing::info!("CORS: No origins configured, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit
/// 4. Rate Limiting - global quota (if enabled)
/// 5. Admin key check - admin routes only
pub fn create_router(state: AppState, config: &PortalConfig) -> Router {
    let rate_limiter = if config.rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", config.rate_limit);
        Some(create_rate_limiter(config.rate_limit))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    if state.admin_key.is_some() {
        tracing::info!("Admin key configured; /admin routes enabled");
    } else {
        tracing::warn!(
            "No admin key configured - /admin routes will answer 403. \
             Set admin_key in the config file or HB_PORTAL_ADMIN_KEY."
        );
    }

    let public = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route("/trainees", get(handlers::trainees_handler))
        .route("/badges", get(handlers::badges_handler))
        .route("/trainees/{id}/missions", get(handlers::missions_handler))
        .route("/trainees/{id}/progress", get(handlers::progress_handler))
        .route("/trainees/{id}/home", get(handlers::home_handler))
        .route(
            "/trainees/{id}/tasks/{task_id}/complete",
            post(handlers::complete_task_handler),
        )
        .route("/support", post(handlers::submit_support_handler))
        .route("/announcements", get(handlers::announcements_handler));

    let admin = Router::new()
        .route("/admin/trainees", post(handlers::register_trainee_handler))
        .route("/admin/trainees/{id}/pending", get(handlers::pending_handler))
        .route("/admin/approvals", post(handlers::approve_handler))
        .route("/admin/missions", post(handlers::create_mission_handler))
        .route("/admin/tasks", post(handlers::add_task_handler))
        .route("/admin/support", get(handlers::support_list_handler))
        .route(
            "/admin/support/{id}/status",
            post(handlers::support_status_handler),
        )
        .route(
            "/admin/announcements",
            get(handlers::all_announcements_handler).post(handlers::publish_announcement_handler),
        )
        .route("/admin/export", post(handlers::export_handler))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth::admin_auth_middleware,
        ));

    let mut router = public.merge(admin);

    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors_layer(config.cors_origins.as_deref()))
                .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_SIZE)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server.
pub async fn run_server(
    addr: &str,
    portal: Portal,
    config: &PortalConfig,
) -> Result<(), PortalError> {
    if config.is_production() && config.cors_origins.as_deref().map(str::trim) == Some("*") {
        tracing::warn!("Wildcard CORS is enabled in a production environment");
    }

    let state = AppState::new(portal, config.admin_key());
    let router = create_router(state, config);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| PortalError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!(
        environment = %config.environment,
        "HB Portal HTTP server listening on {}",
        addr
    );

    axum::serve(listener, router)
        .await
        .map_err(|e| PortalError::IoError(format!("Server error: {}", e)))
}
