use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::error::ApiError;
use crate::modules::auth::{
    crud::{UserCrud, VerificationCrud},
    extractor::CurrentUser,
    schema::{LoginRequest, MessageResponse, RegisterRequest, TokenResponse, UserResponse, VerifyEmailQuery},
};
use crate::services::session;
use crate::AppState;

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    req.validate()
        .map_err(|e| ApiError::InvalidInput(e.to_string()))?;

    let crud = UserCrud::new(state.db.clone(), &state.jwt);
    let user = crud.create(&req.email, &req.password).await?;

    let verification = VerificationCrud::new(state.db.clone())
        .issue(&user.id, state.config.email_token_expire_minutes)
        .await?;

    // Mock delivery: the verification link goes to the log instead of
    // an email provider.
    tracing::info!(
        "[MOCK EMAIL] Verify your email: {}/auth/verify-email?token={}",
        state.config.public_base_url,
        verification.token
    );

    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn verify_email(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VerifyEmailQuery>,
) -> Result<Json<MessageResponse>, ApiError> {
    let token = query.token.trim();

    if token.is_empty() {
        return Err(ApiError::InvalidInput(
            "token query parameter is required".to_string(),
        ));
    }

    VerificationCrud::new(state.db.clone()).consume(token).await?;

    Ok(Json(MessageResponse {
        message: "Email verified",
    }))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Form(req): Form<LoginRequest>,
) -> Result<Response, ApiError> {
    let crud = UserCrud::new(state.db.clone(), &state.jwt);
    let result = crud.login(&req.username, &req.password).await?;

    let body = TokenResponse {
        access_token: result.access_token,
        token_type: "bearer",
        expires_in: result.expires_in,
    };

    let mut response = Json(body).into_response();

    if state.sessions.enabled() {
        let session_id = state.sessions.create(&state.db, &result.user.id).await?;
        set_cookie(&mut response, state.sessions.cookie_for(&session_id))?;
    }

    Ok(response)
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    CurrentUser(_user): CurrentUser,
) -> Result<Response, ApiError> {
    let mut response = Json(MessageResponse {
        message: "Logged out",
    })
    .into_response();

    if state.sessions.enabled() {
        if let Some(session_id) = session::session_cookie(&headers) {
            state.sessions.destroy(&state.db, &session_id).await?;
        }

        set_cookie(&mut response, state.sessions.clear_cookie())?;
    }

    Ok(response)
}

pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(user.into())
}

fn set_cookie(response: &mut Response, cookie: String) -> Result<(), ApiError> {
    let value = HeaderValue::from_str(&cookie)
        .map_err(|_| ApiError::Internal("session cookie is not a valid header value".to_string()))?;

    response.headers_mut().insert(header::SET_COOKIE, value);
    Ok(())
}
