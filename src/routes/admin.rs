use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::db::requests::ListFilter;
use crate::error::AppError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::models::{Feedback, MaintenanceRequest, RequestStatus, Role, User};
use crate::state::SharedState;
use crate::validation::Validator;

#[derive(Deserialize)]
pub struct PatchUser {
    pub role: Option<Role>,
    pub service_categories: Option<Vec<String>>,
}

#[derive(Deserialize)]
pub struct RequestParams {
    pub category: Option<String>,
    pub status: Option<RequestStatus>,
}

pub async fn list_users(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<User>>, AppError> {
    auth.require_admin()?;
    let users = db::users::list_all(&state.pool).await?;
    Ok(Json(users))
}

pub async fn update_user(
    auth: AuthUser,
    State(state): State<SharedState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<PatchUser>,
) -> Result<Json<User>, AppError> {
    auth.require_admin()?;

    let mut v = Validator::new();
    v.check(
        id != auth.id() || req.role.is_none_or(|role| role == Role::Admin),
        "role",
        "You cannot change your own role",
    );
    if let Some(ref categories) = req.service_categories {
        v.categories("service_categories", categories);
    }
    v.finish()?;

    let user = db::users::update_role(
        &state.pool,
        id,
        req.role,
        req.service_categories.as_deref(),
    )
    .await
    .map_err(|e| match e {
        sqlx::Error::RowNotFound => AppError::NotFound("User not found".to_string()),
        _ => AppError::Database(e),
    })?;

    tracing::info!(
        user_id = %user.id,
        role = user.role.as_str(),
        admin_id = %auth.id(),
        "User updated by admin"
    );

    Ok(Json(user))
}

pub async fn list_requests(
    auth: AuthUser,
    State(state): State<SharedState>,
    AppQuery(params): AppQuery<RequestParams>,
) -> Result<Json<Vec<MaintenanceRequest>>, AppError> {
    auth.require_admin()?;
    let filter = ListFilter {
        category: params.category.as_deref(),
        status: params.status,
    };
    let requests = db::requests::list_all(&state.pool, &filter).await?;
    Ok(Json(requests))
}

pub async fn delete_request(
    auth: AuthUser,
    State(state): State<SharedState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_admin()?;

    if !db::requests::delete_cascade(&state.pool, id).await? {
        return Err(AppError::NotFound("Request not found".to_string()));
    }

    tracing::info!(request_id = %id, admin_id = %auth.id(), "Request deleted by admin");
    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}

pub async fn list_feedback(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<Feedback>>, AppError> {
    auth.require_admin()?;
    let feedback = db::feedback::list_all(&state.pool).await?;
    Ok(Json(feedback))
}

pub async fn delete_feedback(
    auth: AuthUser,
    State(state): State<SharedState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_admin()?;

    if !db::feedback::delete(&state.pool, id).await? {
        return Err(AppError::NotFound("Feedback not found".to_string()));
    }

    tracing::info!(feedback_id = %id, admin_id = %auth.id(), "Feedback deleted by admin");
    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}
