pub mod auth;
pub mod config;
pub mod db;
pub mod dispatcher;
pub mod email;
pub mod error;
pub mod extract;
pub mod models;
pub mod notifications;
pub mod rate_limit;
pub mod routes;
pub mod state;
pub mod storage;
pub mod validation;

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::Router;
use sqlx::PgPool;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::{BootstrapAdmin, Config};
use crate::db::users::NewUser;
use crate::models::Role;
use crate::state::SharedState;

pub fn build_app(state: SharedState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .merge(routes::api_routes())
        .merge(routes::upload_routes(state.config.upload_max_bytes))
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
        .route("/health", axum::routing::get(health))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if config.allowed_origins.is_empty() {
        return layer.allow_origin(AllowOrigin::any());
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring invalid allowed origin '{origin}': {e}");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}

/// Make sure the configured bootstrap account exists and is an admin.
pub async fn ensure_bootstrap_admin(
    pool: &PgPool,
    admin: &BootstrapAdmin,
) -> Result<(), String> {
    let email = validation::normalize_email(&admin.email);

    let existing = db::users::find_by_email(pool, &email)
        .await
        .map_err(|e| format!("Failed to look up bootstrap admin: {e}"))?;

    match existing {
        Some(user) if user.is_admin() => Ok(()),
        Some(user) => {
            db::users::update_role(pool, user.id, Some(Role::Admin), None)
                .await
                .map_err(|e| format!("Failed to promote bootstrap admin: {e}"))?;
            tracing::info!(user_id = %user.id, "Promoted bootstrap admin");
            Ok(())
        }
        None => {
            let pw_hash = auth::password::hash(&admin.password).await?;
            let user = db::users::create(
                pool,
                &NewUser {
                    email: &email,
                    password_hash: &pw_hash,
                    name: "Administrator",
                    nif: None,
                    birth_date: None,
                    role: Role::Admin,
                    service_categories: &[],
                },
            )
            .await
            .map_err(|e| format!("Failed to create bootstrap admin: {e}"))?;
            tracing::info!(user_id = %user.id, "Created bootstrap admin");
            Ok(())
        }
    }
}

async fn health() -> &'static str {
    "ok"
}
