pub mod admin;
pub mod auth;
pub mod feedback;
pub mod messages;
pub mod profile;
pub mod public;
pub mod requests;
pub mod upload;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, patch, post};
use axum::Router;

use crate::state::SharedState;

/// Multipart framing allowance on top of the configured file size.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/forgot-password", post(auth::forgot_password))
        .route("/api/v1/auth/reset-password", post(auth::reset_password))
        // Profile
        .route(
            "/api/v1/profile",
            get(profile::get)
                .patch(profile::update)
                .delete(profile::delete),
        )
        // Requests
        .route("/api/v1/requests", get(requests::list).post(requests::create))
        .route("/api/v1/requests/mine", get(requests::mine))
        .route(
            "/api/v1/requests/{id}",
            get(requests::get)
                .patch(requests::update)
                .delete(requests::delete),
        )
        .route("/api/v1/requests/{id}/accept", post(requests::accept))
        .route(
            "/api/v1/requests/{id}/messages",
            get(messages::list_for_request).post(messages::create_for_request),
        )
        .route(
            "/api/v1/requests/{id}/messages/{message_id}",
            delete(messages::delete_for_request),
        )
        .route(
            "/api/v1/requests/{id}/feedback",
            get(feedback::get).post(feedback::create),
        )
        // Messages
        .route("/api/v1/messages", get(messages::list).post(messages::create))
        .route("/api/v1/messages/{id}", delete(messages::delete))
        // Admin
        .route("/api/v1/admin/users", get(admin::list_users))
        .route("/api/v1/admin/users/{id}", patch(admin::update_user))
        .route("/api/v1/admin/requests", get(admin::list_requests))
        .route("/api/v1/admin/requests/{id}", delete(admin::delete_request))
        .route("/api/v1/admin/feedback", get(admin::list_feedback))
        .route("/api/v1/admin/feedback/{id}", delete(admin::delete_feedback))
        // Public
        .route(
            "/api/v1/public/completed-requests",
            get(public::completed_requests),
        )
}

pub fn upload_routes(max_bytes: usize) -> Router<SharedState> {
    Router::new()
        .route("/api/v1/upload", post(upload::upload))
        .layer(DefaultBodyLimit::max(max_bytes + MULTIPART_OVERHEAD))
}
