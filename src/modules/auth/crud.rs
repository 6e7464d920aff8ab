use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::config::DbPool;
use crate::error::ApiError;
use crate::modules::auth::model::{EmailVerificationToken, User};
use crate::services::{hashing, jwt::JwtService, secrets};

/// Email identity is case-insensitive: normalized once here, stored and
/// compared lowercase everywhere.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub struct UserCrud<'a> {
    pool: DbPool,
    jwt_service: &'a JwtService,
}

pub struct LoginResult {
    pub user: User,
    pub access_token: String,
    pub expires_in: i64,
}

impl<'a> UserCrud<'a> {
    pub fn new(pool: DbPool, jwt_service: &'a JwtService) -> Self {
        Self { pool, jwt_service }
    }

    pub async fn create(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let email = normalize_email(email);

        if self.email_exists(&email).await? {
            return Err(ApiError::EmailTaken);
        }

        let password_hash = hashing::hash_password(password)
            .map_err(|e| ApiError::Internal(format!("password hashing failed: {}", e)))?;

        let user = User {
            id: Uuid::new_v4().to_string(),
            email,
            password_hash,
            is_admin: false,
            email_verified: false,
            is_active: true,
            created_at: Utc::now(),
        };

        let inserted = sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, is_admin, email_verified, is_active, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_admin)
        .bind(user.email_verified)
        .bind(user.is_active)
        .bind(user.created_at)
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => Ok(user),
            // Two registrations can pass the pre-check concurrently;
            // the unique index on email is the authority.
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(ApiError::EmailTaken),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool, ApiError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind(normalize_email(email))
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0 > 0)
    }

    /// Check credentials and mint an access token. Unknown email and
    /// wrong password are indistinguishable to the caller; unverified
    /// and deactivated accounts are the only distinct signals.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResult, ApiError> {
        let user = match self.find_by_email(email).await? {
            Some(user) => user,
            None => {
                // Burn the same hashing work as a real verify so a
                // missing account is not observable through timing.
                let _ = hashing::hash_password(password);
                return Err(ApiError::BadCredentials);
            }
        };

        let is_valid = hashing::verify_password(password, &user.password_hash)
            .map_err(|e| ApiError::Internal(format!("password verify failed: {}", e)))?;

        if !is_valid {
            return Err(ApiError::BadCredentials);
        }

        if !user.email_verified {
            return Err(ApiError::Unverified);
        }

        if !user.is_active {
            return Err(ApiError::Forbidden("Account is deactivated"));
        }

        let access_token = self
            .jwt_service
            .create_access_token(&user.email, user.is_admin)
            .map_err(|e| ApiError::Internal(format!("token signing failed: {}", e)))?;

        Ok(LoginResult {
            user,
            access_token,
            expires_in: self.jwt_service.get_access_token_duration_secs(),
        })
    }
}

pub struct VerificationCrud {
    pool: DbPool,
}

impl VerificationCrud {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Issue a fresh verification token for the user.
    pub async fn issue(
        &self,
        user_id: &str,
        ttl_minutes: i64,
    ) -> Result<EmailVerificationToken, ApiError> {
        let now = Utc::now();
        let record = EmailVerificationToken {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            token: secrets::generate_token(),
            expires_at: now + Duration::minutes(ttl_minutes),
            used: false,
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO email_verification_tokens (id, user_id, token, expires_at, used, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.user_id)
        .bind(&record.token)
        .bind(record.expires_at)
        .bind(record.used)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    /// Consume a token and mark its owner verified. Exactly one of any
    /// number of concurrent callers wins: the conditional update on
    /// `used` is the authoritative gate, the pre-read only classifies
    /// the failure.
    pub async fn consume(&self, token: &str) -> Result<String, ApiError> {
        let record = sqlx::query_as::<_, EmailVerificationToken>(
            "SELECT * FROM email_verification_tokens WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::NotFound("Verification token"))?;

        if record.used {
            return Err(ApiError::NotFound("Verification token"));
        }

        if record.expires_at <= Utc::now() {
            return Err(ApiError::TokenExpired);
        }

        let claimed = sqlx::query(
            "UPDATE email_verification_tokens SET used = TRUE WHERE id = ? AND used = FALSE",
        )
        .bind(&record.id)
        .execute(&self.pool)
        .await?;

        if claimed.rows_affected() == 0 {
            // Lost the race to a concurrent consumer.
            return Err(ApiError::NotFound("Verification token"));
        }

        sqlx::query("UPDATE users SET email_verified = TRUE WHERE id = ?")
            .bind(&record.user_id)
            .execute(&self.pool)
            .await?;

        Ok(record.user_id)
    }
}
