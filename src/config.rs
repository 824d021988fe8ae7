use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub base_url: String,
    pub allowed_origins: Vec<String>,
    pub token_ttl_hours: i64,
    pub log_level: String,
    pub upload_dir: PathBuf,
    pub upload_max_bytes: usize,
    pub dispatch_interval: Duration,
    pub dispatch_max_attempts: i32,
    pub smtp: Option<SmtpConfig>,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

/// Admin account created at startup when no user with this email exists.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;

        let host: IpAddr = env_or("HOMEFIX_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid HOMEFIX_HOST: {e}"))?;

        let port: u16 = env_or("HOMEFIX_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid HOMEFIX_PORT: {e}"))?;

        let base_url = env_or("HOMEFIX_BASE_URL", &format!("http://{host}:{port}"));

        let allowed_origins: Vec<String> = env_or("HOMEFIX_ALLOWED_ORIGINS", "")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let token_ttl_hours: i64 = env_or("HOMEFIX_TOKEN_TTL_HOURS", "24")
            .parse()
            .map_err(|e| format!("Invalid HOMEFIX_TOKEN_TTL_HOURS: {e}"))?;

        let log_level = env_or("HOMEFIX_LOG_LEVEL", "info");

        let upload_dir = PathBuf::from(env_or("HOMEFIX_UPLOAD_DIR", "uploads"));

        let upload_max_bytes: usize = env_or("HOMEFIX_UPLOAD_MAX_BYTES", "5242880")
            .parse()
            .map_err(|e| format!("Invalid HOMEFIX_UPLOAD_MAX_BYTES: {e}"))?;

        let dispatch_interval_secs: u64 = env_or("HOMEFIX_DISPATCH_INTERVAL_SECS", "30")
            .parse()
            .map_err(|e| format!("Invalid HOMEFIX_DISPATCH_INTERVAL_SECS: {e}"))?;
        if dispatch_interval_secs == 0 {
            return Err("HOMEFIX_DISPATCH_INTERVAL_SECS must be greater than zero".to_string());
        }

        let dispatch_max_attempts: i32 = env_or("HOMEFIX_DISPATCH_MAX_ATTEMPTS", "10")
            .parse()
            .map_err(|e| format!("Invalid HOMEFIX_DISPATCH_MAX_ATTEMPTS: {e}"))?;

        let smtp = match (
            std::env::var("HOMEFIX_SMTP_HOST").ok(),
            std::env::var("HOMEFIX_SMTP_PORT").ok(),
            std::env::var("HOMEFIX_SMTP_USER").ok(),
            std::env::var("HOMEFIX_SMTP_PASS").ok(),
            std::env::var("HOMEFIX_SMTP_FROM").ok(),
        ) {
            (Some(host), Some(port), Some(user), Some(pass), Some(from)) => Some(SmtpConfig {
                host,
                port: port
                    .parse()
                    .map_err(|e| format!("Invalid HOMEFIX_SMTP_PORT: {e}"))?,
                user,
                pass,
                from,
            }),
            _ => None,
        };

        let bootstrap_admin = match (
            std::env::var("HOMEFIX_ADMIN_EMAIL").ok(),
            std::env::var("HOMEFIX_ADMIN_PASSWORD").ok(),
        ) {
            (Some(email), Some(password)) => Some(BootstrapAdmin { email, password }),
            _ => None,
        };

        Ok(Config {
            database_url,
            jwt_secret,
            host,
            port,
            base_url,
            allowed_origins,
            token_ttl_hours,
            log_level,
            upload_dir,
            upload_max_bytes,
            dispatch_interval: Duration::from_secs(dispatch_interval_secs),
            dispatch_max_attempts,
            smtp,
            bootstrap_admin,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
