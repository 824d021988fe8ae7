use axum::extract::State;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::auth::extractor::AuthUser;
use crate::auth::password;
use crate::db;
use crate::db::users::ProfileChanges;
use crate::email::{self, templates};
use crate::error::AppError;
use crate::extract::AppJson;
use crate::models::User;
use crate::state::SharedState;
use crate::validation::Validator;

#[derive(Deserialize)]
pub struct UpdateProfile {
    pub name: Option<String>,
    pub nif: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub avatar_url: Option<String>,
    pub service_categories: Option<Vec<String>>,
    pub password: Option<String>,
    pub current_password: Option<String>,
}

pub async fn get(auth: AuthUser) -> Json<User> {
    Json(auth.user)
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    AppJson(req): AppJson<UpdateProfile>,
) -> Result<Json<User>, AppError> {
    let mut v = Validator::new();
    if let Some(ref name) = req.name {
        v.length("name", name, 2, 100);
    }
    if let Some(ref nif) = req.nif {
        v.nif("nif", nif.trim());
    }
    if let Some(birth_date) = req.birth_date {
        v.birth_date("birth_date", birth_date);
    }
    if let Some(ref avatar_url) = req.avatar_url {
        v.url("avatar_url", avatar_url);
    }
    if let Some(ref categories) = req.service_categories {
        v.check(
            auth.user.is_technician(),
            "service_categories",
            "Only technicians offer service categories",
        )
        .check(
            !categories.is_empty(),
            "service_categories",
            "Technicians must offer at least one category",
        )
        .categories("service_categories", categories);
    }
    if let Some(ref new_password) = req.password {
        v.password("password", new_password).check(
            req.current_password.is_some(),
            "current_password",
            "Required to change the password",
        );
    }
    v.finish()?;

    let password_hash = match (&req.password, &req.current_password) {
        (Some(new_password), Some(current)) => {
            let valid = password::verify(current, &auth.user.password_hash)
                .await
                .map_err(AppError::Internal)?;
            if !valid {
                return Err(AppError::Unauthorized(
                    "Current password is incorrect".to_string(),
                ));
            }
            Some(
                password::hash(new_password)
                    .await
                    .map_err(AppError::Internal)?,
            )
        }
        _ => None,
    };

    let changes = ProfileChanges {
        name: req.name.as_deref().map(str::trim),
        nif: req.nif.as_deref().map(str::trim),
        birth_date: req.birth_date,
        avatar_url: req.avatar_url.as_deref(),
        service_categories: req.service_categories.as_deref(),
        password_hash: password_hash.as_deref(),
    };

    let user = db::users::update_profile(&state.pool, auth.id(), &changes).await?;

    email::send_in_background(
        &state.mailer,
        user.email.clone(),
        "Your HomeFix profile was updated".to_string(),
        templates::render_profile_updated(&user.name),
    );

    Ok(Json(user))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = auth.user;

    db::users::delete_cascade(&state.pool, user.id).await?;

    tracing::info!(user_id = %user.id, "Account deleted");

    email::send_in_background(
        &state.mailer,
        user.email.clone(),
        "Your HomeFix account was deleted".to_string(),
        templates::render_account_deleted(&user.name),
    );

    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}
