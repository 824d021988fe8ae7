use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::auth::{jwt, password};
use crate::db;
use crate::db::users::NewUser;
use crate::email::{self, templates};
use crate::error::AppError;
use crate::extract::AppJson;
use crate::models::{Role, User};
use crate::state::SharedState;
use crate::validation::{normalize_email, Validator};

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub nif: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub role: Option<Role>,
    #[serde(default)]
    pub service_categories: Vec<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn generate_reset_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn issue_token(state: &SharedState, user: &User) -> Result<String, AppError> {
    jwt::issue(user.id, &state.config.jwt_secret, state.config.token_ttl_hours)
        .map_err(AppError::Internal)
}

pub async fn register(
    State(state): State<SharedState>,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let email = normalize_email(&req.email);
    let role = req.role.unwrap_or(Role::Client);
    let nif = req.nif.as_deref().map(str::trim).filter(|s| !s.is_empty());

    let mut v = Validator::new();
    v.email("email", &email)
        .password("password", &req.password)
        .length("name", &req.name, 2, 100)
        .check(role != Role::Admin, "role", "Must be client or technician");
    if let Some(nif) = nif {
        v.nif("nif", nif);
    }
    if let Some(birth_date) = req.birth_date {
        v.birth_date("birth_date", birth_date);
    }
    if role == Role::Technician {
        v.check(
            !req.service_categories.is_empty(),
            "service_categories",
            "Technicians must offer at least one category",
        )
        .categories("service_categories", &req.service_categories);
    }
    v.finish()?;

    if db::users::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::field("email", "Email is already registered"));
    }

    let pw_hash = password::hash(&req.password)
        .await
        .map_err(AppError::Internal)?;

    let categories = if role == Role::Technician {
        req.service_categories.clone()
    } else {
        Vec::new()
    };

    let user = db::users::create(
        &state.pool,
        &NewUser {
            email: &email,
            password_hash: &pw_hash,
            name: req.name.trim(),
            nif,
            birth_date: req.birth_date,
            role,
            service_categories: &categories,
        },
    )
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::field("email", "Email is already registered")
        }
        _ => AppError::Database(e),
    })?;

    tracing::info!(user_id = %user.id, role = role.as_str(), "User registered");

    email::send_in_background(
        &state.mailer,
        user.email.clone(),
        "Welcome to HomeFix".to_string(),
        templates::render_welcome(&user.name, &state.config.base_url),
    );

    let token = issue_token(&state, &user)?;
    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

pub async fn login(
    State(state): State<SharedState>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = normalize_email(&req.email);

    if state.login_limiter.check(&email).is_err() {
        return Err(AppError::RateLimited(
            "Too many login attempts. Please try again later.".to_string(),
        ));
    }

    let Some(user) = db::users::find_by_email(&state.pool, &email).await? else {
        state.login_limiter.record_failure(&email);
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    };

    let valid = password::verify(&req.password, &user.password_hash)
        .await
        .map_err(AppError::Internal)?;

    if !valid {
        state.login_limiter.record_failure(&email);
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    state.login_limiter.reset(&email);

    let token = issue_token(&state, &user)?;
    Ok(Json(AuthResponse { token, user }))
}

pub async fn forgot_password(
    State(state): State<SharedState>,
    AppJson(req): AppJson<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    // Always 200 so the response does not reveal whether the email exists
    let response = Json(MessageResponse {
        message: "If that email is registered, a reset link has been sent.".to_string(),
    });

    let email = normalize_email(&req.email);

    tokio::spawn(async move {
        let user = match db::users::find_by_email(&state.pool, &email).await {
            Ok(Some(user)) => user,
            Ok(None) => return,
            Err(e) => {
                tracing::error!("Password reset lookup failed: {e}");
                return;
            }
        };

        let token = generate_reset_token();
        if let Err(e) = db::password_reset_tokens::create(
            &state.pool,
            user.id,
            &hash_token(&token),
            Utc::now() + Duration::hours(1),
        )
        .await
        {
            tracing::error!("Failed to store password reset token: {e}");
            return;
        }

        let reset_url = format!("{}/reset-password?token={token}", state.config.base_url);
        if let Err(e) = state
            .mailer
            .send(
                &user.email,
                "Password Reset - HomeFix",
                &templates::render_password_reset(&reset_url),
            )
            .await
        {
            tracing::error!("Failed to send password reset email: {e}");
        }
    });

    Ok(response)
}

pub async fn reset_password(
    State(state): State<SharedState>,
    AppJson(req): AppJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    Validator::new().password("password", &req.password).finish()?;

    let reset_token = db::password_reset_tokens::consume(&state.pool, &hash_token(&req.token))
        .await?
        .ok_or_else(|| AppError::BadRequest("Invalid or expired reset token".to_string()))?;

    let pw_hash = password::hash(&req.password)
        .await
        .map_err(AppError::Internal)?;
    db::users::update_password(&state.pool, reset_token.user_id, &pw_hash).await?;

    tracing::info!(user_id = %reset_token.user_id, "Password reset");

    Ok(Json(MessageResponse {
        message: "Password reset successfully".to_string(),
    }))
}
