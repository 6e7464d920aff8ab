use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Crate-wide error taxonomy. Every variant carries a stable machine
/// kind (`kind()`) and maps to exactly one HTTP status; handlers and
/// extractors bubble these with `?` and the `IntoResponse` impl turns
/// them into the wire shape `{"error": kind, "message": text}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Incorrect email or password")]
    BadCredentials,

    #[error("Email already registered")]
    EmailTaken,

    #[error("{0}")]
    Unauthenticated(&'static str),

    #[error("Email not verified")]
    Unverified,

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Verification token expired")]
    TokenExpired,

    #[error("Rate limit exceeded, try again later")]
    RateLimited,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::BadCredentials => StatusCode::BAD_REQUEST,
            Self::EmailTaken => StatusCode::CONFLICT,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Unverified => StatusCode::FORBIDDEN,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::TokenExpired => StatusCode::NOT_FOUND,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::BadCredentials => "bad_credentials",
            Self::EmailTaken => "conflict",
            Self::Unauthenticated(_) => "unauthenticated",
            Self::Unverified => "unverified",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::TokenExpired => "expired",
            Self::RateLimited => "rate_limited",
            Self::Database(_) | Self::Internal(_) => "internal",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Internal detail stays in the log; the client only ever sees a
        // generic message for 500s.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "internal error");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            error: self.kind(),
            message,
        };

        (status, Json(body)).into_response()
    }
}
