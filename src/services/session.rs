use axum::http::{header, HeaderMap};
use chrono::{Duration, Utc};

use crate::config::DbPool;
use crate::error::ApiError;
use crate::modules::auth::model::Session;
use crate::services::secrets;

pub const SESSION_COOKIE: &str = "todo_session";

/// Optional server-side session store. When disabled, `enabled()` is
/// false and login/logout skip it entirely; authentication then relies
/// on bearer tokens alone.
#[derive(Clone)]
pub struct SessionService {
    enabled: bool,
    lifetime: Duration,
}

impl SessionService {
    pub fn new(enabled: bool, lifetime_minutes: i64) -> Self {
        Self {
            enabled,
            lifetime: Duration::minutes(lifetime_minutes),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Create a session row and return the raw session id. Only the
    /// SHA-256 of the id is persisted.
    pub async fn create(&self, pool: &DbPool, user_id: &str) -> Result<String, ApiError> {
        let session_id = secrets::generate_token();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO sessions (token_hash, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(secrets::sha256_hex(&session_id))
        .bind(user_id)
        .bind(now)
        .bind(now + self.lifetime)
        .execute(pool)
        .await?;

        Ok(session_id)
    }

    /// Resolve a raw session id to its owning user id. Expired rows are
    /// deleted on sight and treated as absent.
    pub async fn resolve(&self, pool: &DbPool, session_id: &str) -> Result<Option<String>, ApiError> {
        let token_hash = secrets::sha256_hex(session_id);

        let session = sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE token_hash = ?")
            .bind(&token_hash)
            .fetch_optional(pool)
            .await?;

        let session = match session {
            Some(session) => session,
            None => return Ok(None),
        };

        if session.expires_at <= Utc::now() {
            sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
                .bind(&token_hash)
                .execute(pool)
                .await?;
            return Ok(None);
        }

        Ok(Some(session.user_id))
    }

    pub async fn destroy(&self, pool: &DbPool, session_id: &str) -> Result<(), ApiError> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(secrets::sha256_hex(session_id))
            .execute(pool)
            .await?;

        Ok(())
    }

    pub fn cookie_for(&self, session_id: &str) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            SESSION_COOKIE,
            session_id,
            self.lifetime.num_seconds()
        )
    }

    pub fn clear_cookie(&self) -> String {
        format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
    }
}

/// Pull the session id out of the Cookie header, if present.
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;

    raw.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_string())
    })
}
