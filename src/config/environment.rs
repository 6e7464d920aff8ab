use std::env;
use std::str::FromStr;

/// Environment configuration
/// Loaded and validated once at startup; the resulting value is carried
/// inside application state so tests can construct their own instead of
/// reading the process environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub access_token_expire_minutes: i64,
    pub email_token_expire_minutes: i64,
    pub sessions_enabled: bool,
    pub public_base_url: String,
    pub bind_addr: String,
    pub rate_limit: RateLimitConfig,
}

/// Window/threshold pairs for the two rate-limit classes: public
/// endpoints are keyed by client IP, authenticated ones by the token
/// subject.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub public_window_secs: u64,
    pub public_max_requests: u32,
    pub user_window_secs: u64,
    pub user_max_requests: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL must be set".to_string())?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| "JWT_SECRET must be set".to_string())?;

        let access_token_expire_minutes = parse_var("ACCESS_TOKEN_EXPIRE_MINUTES", 60)?;
        let email_token_expire_minutes = parse_var("EMAIL_TOKEN_EXPIRE_MINUTES", 24 * 60)?;
        let sessions_enabled = parse_var("SESSIONS_ENABLED", false)?;

        let public_base_url =
            env::var("PUBLIC_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let rate_limit = RateLimitConfig {
            public_window_secs: parse_var("RATE_LIMIT_PUBLIC_WINDOW_SECS", 60)?,
            public_max_requests: parse_var("RATE_LIMIT_PUBLIC_MAX_REQUESTS", 30)?,
            user_window_secs: parse_var("RATE_LIMIT_USER_WINDOW_SECS", 60)?,
            user_max_requests: parse_var("RATE_LIMIT_USER_MAX_REQUESTS", 120)?,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            access_token_expire_minutes,
            email_token_expire_minutes,
            sessions_enabled,
            public_base_url,
            bind_addr,
            rate_limit,
        })
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, String> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| format!("{} has an invalid value: {}", name, raw)),
        Err(_) => Ok(default),
    }
}
