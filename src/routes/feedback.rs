use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::access;
use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::extract::{AppJson, AppPath};
use crate::models::{Feedback, RequestStatus};
use crate::routes::requests;
use crate::state::SharedState;
use crate::validation::Validator;

#[derive(Deserialize)]
pub struct CreateFeedback {
    pub rating: i16,
    #[serde(default)]
    pub comment: String,
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    AppPath(request_id): AppPath<Uuid>,
    AppJson(req): AppJson<CreateFeedback>,
) -> Result<(StatusCode, Json<Feedback>), AppError> {
    let request = requests::load(&state, request_id).await?;
    if !request.is_owned_by(auth.id()) {
        return Err(AppError::Forbidden(
            "Only the client who filed the request can review it".to_string(),
        ));
    }
    if request.status != RequestStatus::Completed {
        return Err(AppError::BadRequest(
            "Only completed requests can be reviewed".to_string(),
        ));
    }

    Validator::new()
        .check((1..=5).contains(&req.rating), "rating", "Must be between 1 and 5")
        .length("comment", &req.comment, 0, 1000)
        .finish()?;

    let feedback = db::feedback::create(
        &state.pool,
        request_id,
        auth.id(),
        req.rating,
        req.comment.trim(),
    )
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::field("request_id", "Feedback was already submitted for this request")
        }
        _ => AppError::Database(e),
    })?;

    tracing::info!(request_id = %request_id, rating = feedback.rating, "Feedback submitted");
    Ok((StatusCode::CREATED, Json(feedback)))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    AppPath(request_id): AppPath<Uuid>,
) -> Result<Json<Feedback>, AppError> {
    let request = requests::load(&state, request_id).await?;
    access::require_request_access(&auth.user, &request)?;

    let feedback = db::feedback::find_by_request(&state.pool, request_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No feedback for this request".to_string()))?;
    Ok(Json(feedback))
}
