//! Request-scoped visibility rules.
//!
//! A maintenance request and everything hanging off it (messages, feedback)
//! is visible to admins, to the client who filed it, and to the technician
//! assigned to it. Decisions are recomputed on every call.

use crate::error::AppError;
use crate::models::{MaintenanceRequest, Message, User};

pub fn can_access_request(user: &User, request: &MaintenanceRequest) -> bool {
    user.is_admin() || request.is_owned_by(user.id) || request.is_assigned_to(user.id)
}

/// Technicians may look at open requests in their trade before taking them.
pub fn can_view_request(user: &User, request: &MaintenanceRequest) -> bool {
    can_access_request(user, request)
        || (user.is_technician()
            && request.is_open()
            && user.service_categories.contains(&request.category))
}

pub fn can_delete_message(user: &User, request: &MaintenanceRequest, message: &Message) -> bool {
    can_access_request(user, request) && (user.is_admin() || message.sender_id == user.id)
}

pub fn require_request_access(user: &User, request: &MaintenanceRequest) -> Result<(), AppError> {
    if can_access_request(user, request) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You do not have access to this request".to_string(),
        ))
    }
}
