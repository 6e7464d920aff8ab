pub mod config;
pub mod error;
pub mod modules;
pub mod services;

use axum::{middleware, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use config::environment::Config;
use config::DbPool;
use modules::admin::admin_routes;
use modules::auth::auth_routes;
use modules::todo::todo_routes;
use services::jwt::JwtService;
use services::rate_limit::{ApiRateLimiter, RateLimitLayer};
use services::security::security_headers;
use services::session::SessionService;

pub struct AppState {
    pub db: DbPool,
    pub jwt: JwtService,
    pub sessions: SessionService,
    pub config: Config,
}

pub async fn create_app(db: DbPool, config: Config) -> Router {
    let jwt = JwtService::new(config.jwt_secret.clone(), config.access_token_expire_minutes);
    let sessions = SessionService::new(config.sessions_enabled, config.access_token_expire_minutes);
    let limiter = Arc::new(ApiRateLimiter::new(config.rate_limit));

    // The layer keeps its own jwt handle: it decodes bearer tokens
    // before routing to pick the rate-limit key.
    let rate_limit_layer = RateLimitLayer::new(limiter, jwt.clone());

    let state = Arc::new(AppState {
        db,
        jwt,
        sessions,
        config,
    });

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/users/me", get(modules::auth::controller::me))
        .nest("/auth", auth_routes())
        .nest("/todos", todo_routes())
        .nest("/admin", admin_routes())
        .layer(middleware::from_fn(security_headers))
        .layer(RequestBodyLimitLayer::new(1024 * 100)) // 100KB max body
        .layer(rate_limit_layer)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> &'static str {
    "Todo API (Multi-User)"
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    time: DateTime<Utc>,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        time: Utc::now(),
    })
}
