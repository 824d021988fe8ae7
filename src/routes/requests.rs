use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::access;
use crate::auth::extractor::AuthUser;
use crate::db;
use crate::db::requests::{ListFilter, NewRequest};
use crate::error::AppError;
use crate::extract::{double_option, AppJson, AppPath, AppQuery};
use crate::models::{MaintenanceRequest, RequestStatus, Role};
use crate::notifications;
use crate::state::SharedState;
use crate::validation::Validator;

#[derive(Deserialize)]
pub struct CreateRequest {
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: f64,
}

#[derive(Deserialize)]
pub struct UpdateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub status: Option<RequestStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub technician_id: Option<Option<Uuid>>,
}

#[derive(Deserialize)]
pub struct ListParams {
    pub category: Option<String>,
    pub status: Option<RequestStatus>,
}

impl ListParams {
    fn filter(&self) -> ListFilter<'_> {
        ListFilter {
            category: self.category.as_deref(),
            status: self.status,
        }
    }
}

fn validate_content(
    v: &mut Validator,
    title: &str,
    description: &str,
    category: &str,
    price: f64,
) {
    v.length("title", title, 3, 120)
        .length("description", description, 10, 5000)
        .category("category", category)
        .price("price", price);
}

pub(crate) async fn load(state: &SharedState, id: Uuid) -> Result<MaintenanceRequest, AppError> {
    db::requests::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Request not found".to_string()))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    AppJson(req): AppJson<CreateRequest>,
) -> Result<(StatusCode, Json<MaintenanceRequest>), AppError> {
    if auth.user.role == Role::Technician {
        return Err(AppError::Forbidden(
            "Technicians cannot open requests".to_string(),
        ));
    }

    let mut v = Validator::new();
    validate_content(&mut v, &req.title, &req.description, &req.category, req.price);
    v.finish()?;

    let request = db::requests::create(
        &state.pool,
        &NewRequest {
            title: req.title.trim(),
            description: req.description.trim(),
            category: &req.category,
            price: req.price,
            client_id: auth.id(),
        },
    )
    .await?;

    tracing::info!(request_id = %request.id, client_id = %auth.id(), "Request created");
    notifications::request_created(&state, &auth.user, &request).await;

    Ok((StatusCode::CREATED, Json(request)))
}

/// Admins see everything, technicians see open work in their trade plus
/// their own jobs, clients see what they filed.
pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    AppQuery(params): AppQuery<ListParams>,
) -> Result<Json<Vec<MaintenanceRequest>>, AppError> {
    let filter = params.filter();
    let requests = match auth.user.role {
        Role::Admin => db::requests::list_all(&state.pool, &filter).await?,
        Role::Technician => {
            db::requests::list_for_technician(
                &state.pool,
                auth.id(),
                &auth.user.service_categories,
                &filter,
            )
            .await?
        }
        Role::Client => db::requests::list_for_participant(&state.pool, auth.id(), &filter).await?,
    };
    Ok(Json(requests))
}

pub async fn mine(
    auth: AuthUser,
    State(state): State<SharedState>,
    AppQuery(params): AppQuery<ListParams>,
) -> Result<Json<Vec<MaintenanceRequest>>, AppError> {
    let requests =
        db::requests::list_for_participant(&state.pool, auth.id(), &params.filter()).await?;
    Ok(Json(requests))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<MaintenanceRequest>, AppError> {
    let request = load(&state, id).await?;
    if !access::can_view_request(&auth.user, &request) {
        return Err(AppError::Forbidden(
            "You do not have access to this request".to_string(),
        ));
    }
    Ok(Json(request))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateRequest>,
) -> Result<Json<MaintenanceRequest>, AppError> {
    let mut request = load(&state, id).await?;
    access::require_request_access(&auth.user, &request)?;

    let user = &auth.user;
    let is_admin = user.is_admin();
    let is_owner = request.is_owned_by(user.id);
    let is_assigned = request.is_assigned_to(user.id);

    let edits_content = req.title.is_some()
        || req.description.is_some()
        || req.category.is_some()
        || req.price.is_some();

    if edits_content {
        if !(is_admin || is_owner) {
            return Err(AppError::Forbidden(
                "Only the owner can edit this request".to_string(),
            ));
        }
        if !is_admin && request.status != RequestStatus::Pending {
            return Err(AppError::BadRequest(
                "Only pending requests can be edited".to_string(),
            ));
        }
    }

    if req.technician_id.is_some() && !is_admin {
        return Err(AppError::Forbidden(
            "Only admins can assign technicians".to_string(),
        ));
    }

    let title = req.title.as_deref().map(str::trim).unwrap_or(&request.title);
    let description = req
        .description
        .as_deref()
        .map(str::trim)
        .unwrap_or(&request.description);
    let category = req.category.as_deref().unwrap_or(&request.category);
    let price = req.price.unwrap_or(request.price);

    if edits_content {
        let mut v = Validator::new();
        validate_content(&mut v, title, description, category, price);
        v.finish()?;
    }

    let mut status = request.status;
    let mut technician_id = request.technician_id;

    if let Some(assignment) = req.technician_id {
        if status.is_terminal() && assignment != technician_id {
            return Err(AppError::BadRequest(format!(
                "Cannot change the technician of a {} request",
                status.as_str()
            )));
        }
        match assignment {
            Some(tech_id) => {
                let technician = db::users::find_by_id(&state.pool, tech_id)
                    .await?
                    .ok_or_else(|| AppError::field("technician_id", "Unknown user"))?;
                if !technician.is_technician() {
                    return Err(AppError::field("technician_id", "User is not a technician"));
                }
                technician_id = Some(tech_id);
                if status == RequestStatus::Pending {
                    status = RequestStatus::InProgress;
                }
            }
            None => {
                technician_id = None;
                if status == RequestStatus::InProgress {
                    status = RequestStatus::Pending;
                }
            }
        }
    }

    if let Some(next) = req.status.filter(|next| *next != status) {
        let allowed = is_admin
            || (is_owner && next == RequestStatus::Cancelled && status == RequestStatus::Pending)
            || (is_assigned
                && status == RequestStatus::InProgress
                && next == RequestStatus::Completed);
        if !allowed {
            return Err(AppError::Forbidden(format!(
                "You cannot move this request to {}",
                next.as_str()
            )));
        }
        if !status.can_transition_to(next) {
            return Err(AppError::BadRequest(format!(
                "Cannot change status from {} to {}",
                status.as_str(),
                next.as_str()
            )));
        }
        if next == RequestStatus::InProgress && technician_id.is_none() {
            return Err(AppError::BadRequest(
                "Assign a technician before starting work".to_string(),
            ));
        }
        status = next;
    }

    let newly_assigned = technician_id.is_some() && technician_id != request.technician_id;
    let newly_completed =
        status == RequestStatus::Completed && request.status != RequestStatus::Completed;
    let assignment_changed = status != request.status || technician_id != request.technician_id;

    if edits_content {
        let (title, description, category) =
            (title.to_string(), description.to_string(), category.to_string());
        request = db::requests::update_content(
            &state.pool,
            id,
            &title,
            &description,
            &category,
            price,
        )
        .await?;
    }

    if assignment_changed {
        request = db::requests::update_assignment(&state.pool, id, status, technician_id).await?;
        tracing::info!(
            request_id = %id,
            status = status.as_str(),
            technician_id = ?technician_id,
            "Request updated"
        );
    }

    if newly_assigned {
        notifications::technician_assigned(&state, &request).await;
    }
    if newly_completed {
        notifications::request_completed(&state, &request).await;
    }

    Ok(Json(request))
}

/// A technician takes an open request in one of their categories.
pub async fn accept(
    auth: AuthUser,
    State(state): State<SharedState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<MaintenanceRequest>, AppError> {
    auth.require_technician()?;

    let request = load(&state, id).await?;
    if !auth.user.service_categories.contains(&request.category) {
        return Err(AppError::Forbidden(
            "This request is outside your service categories".to_string(),
        ));
    }

    let request = db::requests::claim(&state.pool, id, auth.id())
        .await?
        .ok_or_else(|| AppError::BadRequest("Request is no longer open".to_string()))?;

    tracing::info!(request_id = %id, technician_id = %auth.id(), "Request accepted");
    notifications::technician_assigned(&state, &request).await;

    Ok(Json(request))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let request = load(&state, id).await?;
    if !(auth.user.is_admin() || request.is_owned_by(auth.id())) {
        return Err(AppError::Forbidden(
            "Only the owner can delete this request".to_string(),
        ));
    }

    db::requests::delete_cascade(&state.pool, id).await?;
    tracing::info!(request_id = %id, "Request deleted");

    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}
