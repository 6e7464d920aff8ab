use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Request},
    response::{IntoResponse, Response},
};
use governor::{
    clock::DefaultClock,
    state::keyed::DefaultKeyedStateStore,
    Quota, RateLimiter,
};
use std::{
    future::Future,
    net::SocketAddr,
    num::NonZeroU32,
    pin::Pin,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};
use tower::{Layer, Service};

use crate::config::environment::RateLimitConfig;
use crate::error::ApiError;
use crate::services::jwt::JwtService;

type KeyedLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

// Evict stale per-key state every this many checks so the key maps
// cannot grow without bound.
const SWEEP_EVERY: u64 = 1024;

/// Two keyed limiters: public endpoints are charged per client IP,
/// authenticated requests per token subject. Exhausting one key never
/// affects another, and the two classes have independent budgets.
pub struct ApiRateLimiter {
    public: KeyedLimiter,
    authed: KeyedLimiter,
    checks: AtomicU64,
}

impl ApiRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            public: RateLimiter::keyed(window_quota(
                config.public_window_secs,
                config.public_max_requests,
            )),
            authed: RateLimiter::keyed(window_quota(
                config.user_window_secs,
                config.user_max_requests,
            )),
            checks: AtomicU64::new(0),
        }
    }

    pub fn check_public(&self, ip: &str) -> Result<(), ApiError> {
        self.charge_public(format!("ip:{}", ip))
    }

    pub fn check_authed(&self, email: &str) -> Result<(), ApiError> {
        self.charge_authed(format!("user:{}", email))
    }

    fn charge_public(&self, key: String) -> Result<(), ApiError> {
        self.maybe_sweep();
        self.public.check_key(&key).map_err(|_| ApiError::RateLimited)
    }

    fn charge_authed(&self, key: String) -> Result<(), ApiError> {
        self.maybe_sweep();
        self.authed.check_key(&key).map_err(|_| ApiError::RateLimited)
    }

    fn maybe_sweep(&self) {
        if self.checks.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == SWEEP_EVERY - 1 {
            self.public.retain_recent();
            self.authed.retain_recent();
        }
    }
}

// Burst capacity of `max_requests`, refilled at one permit per
// window/max. Approximates "at most max per window" per key.
fn window_quota(window_secs: u64, max_requests: u32) -> Quota {
    let max = NonZeroU32::new(max_requests.max(1)).unwrap();
    let period =
        (Duration::from_secs(window_secs.max(1)) / max.get()).max(Duration::from_nanos(1));
    Quota::with_period(period).unwrap().allow_burst(max)
}

#[derive(Clone)]
pub struct RateLimitLayer {
    limiter: Arc<ApiRateLimiter>,
    jwt: JwtService,
}

impl RateLimitLayer {
    pub fn new(limiter: Arc<ApiRateLimiter>, jwt: JwtService) -> Self {
        Self { limiter, jwt }
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitService {
            inner,
            limiter: self.limiter.clone(),
            jwt: self.jwt.clone(),
        }
    }
}

#[derive(Clone)]
pub struct RateLimitService<S> {
    inner: S,
    limiter: Arc<ApiRateLimiter>,
    jwt: JwtService,
}

impl<S> Service<Request<Body>> for RateLimitService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut std::task::Context<'_>) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let limiter = self.limiter.clone();
        let jwt = self.jwt.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            // Requests with a valid bearer token are charged to the
            // token subject; everything else to the client IP. A bad
            // token is not rejected here, it just lands in the IP
            // class and fails in the auth extractor instead.
            let outcome = match bearer_subject(&request, &jwt) {
                Some(email) => limiter.check_authed(&email),
                None => limiter.check_public(&client_ip(&request)),
            };

            if let Err(err) = outcome {
                return Ok(err.into_response());
            }

            inner.call(request).await
        })
    }
}

fn bearer_subject(request: &Request<Body>, jwt: &JwtService) -> Option<String> {
    let header = request.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?;

    jwt.verify_access_token(token).ok().map(|claims| claims.sub)
}

/// Best-effort client address: X-Forwarded-For (first hop), then
/// X-Real-IP, then the socket peer when the server exposes it.
fn client_ip(request: &Request<Body>) -> String {
    if let Some(forwarded) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    if let Some(real_ip) = request
        .headers()
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
    {
        let real_ip = real_ip.trim();
        if !real_ip.is_empty() {
            return real_ip.to_string();
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
