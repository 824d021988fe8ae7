use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::email::{self, SharedMailer};
use crate::rate_limit::LoginRateLimiter;
use crate::storage::{LocalStorage, Storage};

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub mailer: SharedMailer,
    pub storage: Arc<dyn Storage>,
    pub login_limiter: LoginRateLimiter,
}

impl AppState {
    /// Wire the mailer and storage described by `config`.
    pub fn new(pool: PgPool, config: Config) -> SharedState {
        let mailer = email::from_config(config.smtp.as_ref());
        Self::with_mailer(pool, config, mailer)
    }

    pub fn with_mailer(pool: PgPool, config: Config, mailer: SharedMailer) -> SharedState {
        let storage = Arc::new(LocalStorage::new(config.upload_dir.clone()));
        Arc::new(AppState {
            pool,
            config,
            mailer,
            storage,
            login_limiter: LoginRateLimiter::new(),
        })
    }
}
