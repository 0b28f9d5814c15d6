//! # Authentication Module
//!
//! Shared-key gate for the `/admin/*` routes.
//!
//! ## Configuration
//!
//! The key comes from `admin_key` in the config file or
//! `HB_PORTAL_ADMIN_KEY`. Public routes never check it. Admin routes are
//! refused with 403 while no key is configured.
//!
//! ## Usage
//!
//! ```text
//! Authorization: Bearer <admin-key>
//! ```

use super::AppState;
use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

// =============================================================================
// KEY COMPARISON
// =============================================================================

/// Compare a presented key with the expected one in constant time.
///
/// Both keys are padded to the same length so `ct_eq` always runs over
/// the same number of bytes.
pub fn keys_match(provided: &str, expected: &str) -> bool {
    let provided_bytes = provided.as_bytes();
    let expected_bytes = expected.as_bytes();

    let max_len = provided_bytes.len().max(expected_bytes.len());
    let mut padded_provided = vec![0u8; max_len];
    let mut padded_expected = vec![0u8; max_len];
    padded_provided[..provided_bytes.len()].copy_from_slice(provided_bytes);
    padded_expected[..expected_bytes.len()].copy_from_slice(expected_bytes);

    let bytes_match: bool = padded_provided.ct_eq(&padded_expected).into();
    bytes_match && provided_bytes.len() == expected_bytes.len()
}

// =============================================================================
// ADMIN MIDDLEWARE
// =============================================================================

/// Admin key middleware, applied as a `route_layer` on the admin router.
///
/// Accepts both `Bearer <key>` and the raw key in `Authorization`.
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    let Some(expected) = state.admin_key.as_deref() else {
        tracing::warn!(
            event = "auth_failure",
            reason = "admin_key_not_configured",
            path = %request.uri().path(),
            "Admin route refused: no admin key configured"
        );
        return Err((StatusCode::FORBIDDEN, "Admin access is not configured"));
    };

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match auth_header {
        Some(header_value) => {
            let provided_key = header_value.strip_prefix("Bearer ").unwrap_or(header_value);
            if keys_match(provided_key, expected) {
                Ok(next.run(request).await)
            } else {
                tracing::warn!(
                    event = "auth_failure",
                    reason = "invalid_admin_key",
                    "Authentication failed: invalid admin key"
                );
                Err((StatusCode::UNAUTHORIZED, "Unauthorized"))
            }
        }
        None => {
            tracing::warn!(
                event = "auth_failure",
                reason = "missing_authorization_header",
                "Missing Authorization header"
            );
            Err((StatusCode::UNAUTHORIZED, "Unauthorized"))
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_keys_match() {
        assert!(keys_match("hb-secret", "hb-secret"));
    }

    #[test]
    fn prefix_does_not_match() {
        assert!(!keys_match("hb-sec", "hb-secret"));
        assert!(!keys_match("hb-secret-and-more", "hb-secret"));
    }

    #[test]
    fn empty_never_matches_non_empty() {
        assert!(!keys_match("", "hb-secret"));
    }
}
