use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use std::sync::Arc;

use crate::error::ApiError;
use crate::modules::auth::{crud::UserCrud, model::User};
use crate::services::session;
use crate::AppState;

/// Caller resolved to a live user row. Credentials are consulted in
/// order: session cookie first (when sessions are enabled), bearer
/// token second. The row lookup happens on every request, so
/// deactivating an account revokes already-issued credentials
/// immediately.
pub struct CurrentUser(pub User);

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user = resolve_user(parts, state).await?;
        Ok(Self(user))
    }
}

/// `CurrentUser` with a verified email address.
pub struct VerifiedUser(pub User);

impl FromRequestParts<Arc<AppState>> for VerifiedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if !user.email_verified {
            return Err(ApiError::Unverified);
        }

        Ok(Self(user))
    }
}

/// `VerifiedUser` with the admin flag set.
pub struct AdminUser(pub User);

impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let VerifiedUser(user) = VerifiedUser::from_request_parts(parts, state).await?;

        if !user.is_admin {
            return Err(ApiError::Forbidden("Admin privileges required"));
        }

        Ok(Self(user))
    }
}

async fn resolve_user(parts: &Parts, state: &Arc<AppState>) -> Result<User, ApiError> {
    let crud = UserCrud::new(state.db.clone(), &state.jwt);

    // A resolvable session decides the identity outright; the bearer
    // token is only consulted when no session matches.
    if state.sessions.enabled() {
        if let Some(session_id) = session::session_cookie(&parts.headers) {
            if let Some(user_id) = state.sessions.resolve(&state.db, &session_id).await? {
                let user = crud
                    .find_by_id(&user_id)
                    .await?
                    .ok_or(ApiError::Unauthenticated("User inactive or not found"))?;
                return ensure_active(user);
            }
        }
    }

    let token =
        bearer_token(&parts.headers).ok_or(ApiError::Unauthenticated("Missing credentials"))?;

    let claims = state
        .jwt
        .verify_access_token(&token)
        .map_err(|_| ApiError::Unauthenticated("Invalid or expired token"))?;

    let user = crud
        .find_by_email(&claims.sub)
        .await?
        .ok_or(ApiError::Unauthenticated("User inactive or not found"))?;

    ensure_active(user)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|token| token.to_string())
}

fn ensure_active(user: User) -> Result<User, ApiError> {
    if !user.is_active {
        return Err(ApiError::Unauthenticated("User inactive or not found"));
    }

    Ok(user)
}
