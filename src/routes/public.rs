use axum::extract::State;
use axum::Json;

use crate::db;
use crate::error::AppError;
use crate::models::CompletedRequestSummary;
use crate::state::SharedState;

/// Number of entries on the public showcase of finished jobs.
pub const FEED_SIZE: i64 = 12;

pub async fn completed_requests(
    State(state): State<SharedState>,
) -> Result<Json<Vec<CompletedRequestSummary>>, AppError> {
    let requests = db::requests::list_completed_with_feedback(&state.pool, FEED_SIZE).await?;
    Ok(Json(requests))
}
