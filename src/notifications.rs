//! Scheduled emails raised by request lifecycle events.
//!
//! Each trigger inserts `scheduled_emails` rows for the dispatcher to pick up.
//! A failed insert is logged and never fails the request that raised it.

use chrono::{DateTime, Duration, Utc};

use crate::db;
use crate::email::templates;
use crate::models::{MaintenanceRequest, User};
use crate::state::SharedState;

/// Delay before the client is asked to review a completed job.
pub const REVIEW_REMINDER_DELAY_HOURS: i64 = 24;

fn request_url(state: &SharedState, request: &MaintenanceRequest) -> String {
    format!("{}/requests/{}", state.config.base_url, request.id)
}

async fn schedule(state: &SharedState, to: &str, subject: &str, body: &str, send_at: DateTime<Utc>) {
    if let Err(e) = db::scheduled_emails::schedule(&state.pool, to, subject, body, send_at).await {
        tracing::error!(%to, %subject, "Failed to schedule email: {e}");
    }
}

pub async fn request_created(state: &SharedState, client: &User, request: &MaintenanceRequest) {
    let body = templates::render_request_received(
        &client.name,
        &request.title,
        &request_url(state, request),
    );
    schedule(
        state,
        &client.email,
        &format!("Request received: {}", request.title),
        &body,
        Utc::now(),
    )
    .await;
}

pub async fn technician_assigned(state: &SharedState, request: &MaintenanceRequest) {
    let Some(technician_id) = request.technician_id else {
        return;
    };

    let (client, technician) = match (
        db::users::find_by_id(&state.pool, request.client_id).await,
        db::users::find_by_id(&state.pool, technician_id).await,
    ) {
        (Ok(Some(c)), Ok(Some(t))) => (c, t),
        _ => {
            tracing::warn!(request_id = %request.id, "Skipping assignment emails, participants not found");
            return;
        }
    };

    let url = request_url(state, request);
    let now = Utc::now();

    schedule(
        state,
        &client.email,
        &format!("Technician assigned: {}", request.title),
        &templates::render_technician_assigned(&client.name, &technician.name, &request.title, &url),
        now,
    )
    .await;

    schedule(
        state,
        &technician.email,
        &format!("New job: {}", request.title),
        &templates::render_new_assignment(&technician.name, &request.title, &url),
        now,
    )
    .await;
}

pub async fn request_completed(state: &SharedState, request: &MaintenanceRequest) {
    let client = match db::users::find_by_id(&state.pool, request.client_id).await {
        Ok(Some(c)) => c,
        _ => {
            tracing::warn!(request_id = %request.id, "Skipping review reminder, client not found");
            return;
        }
    };

    schedule(
        state,
        &client.email,
        &format!("How was \"{}\"?", request.title),
        &templates::render_rate_service(&client.name, &request.title, &request_url(state, request)),
        Utc::now() + Duration::hours(REVIEW_REMINDER_DELAY_HOURS),
    )
    .await;
}
