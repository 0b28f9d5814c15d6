//! # Support Requests
//!
//! Free-text help tickets filed by trainees and triaged by staff.

use crate::catalog::required_text;
use crate::primitives::MAX_MESSAGE_LENGTH;
use crate::store::PortalStore;
use crate::{
    PortalError, SupportCategory, SupportRequest, SupportRequestId, SupportStatus, TraineeId,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Fresh ids drawn before giving up on finding an unused one.
const MAX_ID_ATTEMPTS: usize = 16;

/// Ticket operations over a [`PortalStore`].
pub struct SupportDesk;

impl SupportDesk {
    /// File a new ticket with status `new`.
    ///
    /// The message is trimmed; an empty message is rejected.
    pub fn submit<S: PortalStore + ?Sized>(
        store: &mut S,
        trainee_id: &TraineeId,
        message: &str,
        category: SupportCategory,
        at: DateTime<Utc>,
    ) -> Result<SupportRequest, PortalError> {
        store.require_trainee(trainee_id)?;
        let message = required_text("message", message, MAX_MESSAGE_LENGTH)?;

        let request = SupportRequest {
            id: unused_request_id(store, new_request_id)?,
            trainee_id: trainee_id.clone(),
            message,
            category,
            status: SupportStatus::New,
            created_at: at,
            updated_at: at,
        };
        store.save_support_request(request.clone())?;
        Ok(request)
    }

    /// All tickets, newest first.
    pub fn list<S: PortalStore + ?Sized>(store: &S) -> Result<Vec<SupportRequest>, PortalError> {
        let mut requests = store.list_support_requests()?;
        requests.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(requests)
    }

    /// Move a ticket to `status`. Setting the current status changes nothing.
    pub fn update_status<S: PortalStore + ?Sized>(
        store: &mut S,
        id: &SupportRequestId,
        status: SupportStatus,
        at: DateTime<Utc>,
    ) -> Result<SupportRequest, PortalError> {
        let mut request = store
            .get_support_request(id)?
            .ok_or_else(|| PortalError::SupportRequestNotFound(id.clone()))?;
        if request.status == status {
            return Ok(request);
        }

        request.status = status;
        request.updated_at = at;
        store.save_support_request(request.clone())?;
        Ok(request)
    }
}

/// `support-` followed by the first 8 hex digits of a random UUID.
fn new_request_id() -> SupportRequestId {
    let short: String = Uuid::new_v4().simple().to_string().chars().take(8).collect();
    SupportRequestId::new(format!("support-{}", short))
}

/// Draw ids from `generate` until one is not already stored.
///
/// Saving is an upsert, so a reused id would overwrite an existing ticket.
fn unused_request_id<S: PortalStore + ?Sized>(
    store: &S,
    mut generate: impl FnMut() -> SupportRequestId,
) -> Result<SupportRequestId, PortalError> {
    for _ in 0..MAX_ID_ATTEMPTS {
        let id = generate();
        if store.get_support_request(&id)?.is_none() {
            return Ok(id);
        }
    }
    Err(PortalError::IoError(format!(
        "No unused support request id after {} attempts",
        MAX_ID_ATTEMPTS
    )))
}
