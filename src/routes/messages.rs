use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::access;
use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::models::Message;
use crate::routes::requests;
use crate::state::SharedState;
use crate::validation::{Validator, MAX_ATTACHMENTS};

#[derive(Deserialize)]
pub struct ListParams {
    pub request_id: Uuid,
}

#[derive(Deserialize)]
pub struct NewMessage {
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<String>,
}

#[derive(Deserialize)]
pub struct CreateMessage {
    pub request_id: Uuid,
    #[serde(flatten)]
    pub message: NewMessage,
}

async fn list_thread(
    state: &SharedState,
    auth: &AuthUser,
    request_id: Uuid,
) -> Result<Vec<Message>, AppError> {
    let request = requests::load(state, request_id).await?;
    access::require_request_access(&auth.user, &request)?;
    Ok(db::messages::list_by_request(&state.pool, request_id).await?)
}

async fn post_to_thread(
    state: &SharedState,
    auth: &AuthUser,
    request_id: Uuid,
    new: &NewMessage,
) -> Result<Message, AppError> {
    let mut v = Validator::new();
    v.length("content", &new.content, 1, 2000).check(
        new.attachments.len() <= MAX_ATTACHMENTS,
        "attachments",
        &format!("At most {MAX_ATTACHMENTS} attachments"),
    );
    for url in &new.attachments {
        v.url("attachments", url);
    }
    v.finish()?;

    let request = requests::load(state, request_id).await?;
    access::require_request_access(&auth.user, &request)?;

    let message = db::messages::create(
        &state.pool,
        request_id,
        auth.id(),
        new.content.trim(),
        &new.attachments,
    )
    .await?;

    tracing::debug!(message_id = %message.id, request_id = %request_id, "Message posted");
    Ok(message)
}

/// `thread` pins the message to a request when the route is nested.
async fn delete_from_thread(
    state: &SharedState,
    auth: &AuthUser,
    message_id: Uuid,
    thread: Option<Uuid>,
) -> Result<(), AppError> {
    let message = db::messages::find_by_id(&state.pool, message_id)
        .await?
        .filter(|m| thread.is_none_or(|request_id| m.request_id == request_id))
        .ok_or_else(|| AppError::NotFound("Message not found".to_string()))?;

    let request = requests::load(state, message.request_id).await?;
    if !access::can_delete_message(&auth.user, &request, &message) {
        return Err(AppError::Forbidden(
            "Only the author or an admin can delete this message".to_string(),
        ));
    }

    db::messages::delete(&state.pool, message_id).await?;
    Ok(())
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    AppQuery(params): AppQuery<ListParams>,
) -> Result<Json<Vec<Message>>, AppError> {
    Ok(Json(list_thread(&state, &auth, params.request_id).await?))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    AppJson(req): AppJson<CreateMessage>,
) -> Result<(StatusCode, Json<Message>), AppError> {
    let message = post_to_thread(&state, &auth, req.request_id, &req.message).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    delete_from_thread(&state, &auth, id, None).await?;
    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}

pub async fn list_for_request(
    auth: AuthUser,
    State(state): State<SharedState>,
    AppPath(request_id): AppPath<Uuid>,
) -> Result<Json<Vec<Message>>, AppError> {
    Ok(Json(list_thread(&state, &auth, request_id).await?))
}

pub async fn create_for_request(
    auth: AuthUser,
    State(state): State<SharedState>,
    AppPath(request_id): AppPath<Uuid>,
    AppJson(req): AppJson<NewMessage>,
) -> Result<(StatusCode, Json<Message>), AppError> {
    let message = post_to_thread(&state, &auth, request_id, &req).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn delete_for_request(
    auth: AuthUser,
    State(state): State<SharedState>,
    AppPath((request_id, message_id)): AppPath<(Uuid, Uuid)>,
) -> Result<Json<serde_json::Value>, AppError> {
    delete_from_thread(&state, &auth, message_id, Some(request_id)).await?;
    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}
