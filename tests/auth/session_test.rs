use axum::http::{header, HeaderValue, StatusCode};
use axum_test::TestResponse;

use crate::common::{sessions_config, test_password, TestContext};

/// Register + verify without logging in, so each test controls exactly
/// how many sessions exist.
async fn verified_email(ctx: &TestContext) -> String {
    let (email, token) = ctx.register().await;

    ctx.server
        .get("/auth/verify-email")
        .add_query_param("token", &token)
        .await
        .assert_status_ok();

    email
}

async fn login_response(ctx: &TestContext, email: &str) -> TestResponse {
    ctx.server
        .post("/auth/login")
        .form(&[("username", email), ("password", test_password())])
        .await
}

fn session_cookie(response: &TestResponse) -> String {
    let raw = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("login should set a session cookie")
        .to_str()
        .unwrap()
        .to_string();

    raw.split(';')
        .next()
        .unwrap()
        .strip_prefix("todo_session=")
        .expect("cookie name should be todo_session")
        .to_string()
}

fn cookie_header(session_id: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("todo_session={}", session_id)).unwrap()
}

async fn session_count(ctx: &TestContext) -> i64 {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions")
        .fetch_one(&ctx.db)
        .await
        .unwrap();
    count.0
}

#[tokio::test]
async fn login_sets_http_only_session_cookie() {
    let ctx = TestContext::with_config(sessions_config()).await;
    let email = verified_email(&ctx).await;

    let response = login_response(&ctx, &email).await;
    response.assert_status(StatusCode::OK);

    let raw = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();

    assert!(raw.starts_with("todo_session="));
    assert!(raw.contains("HttpOnly"));
    assert!(raw.contains("SameSite=Lax"));
    assert!(raw.contains("Path=/"));
    assert!(raw.contains("Max-Age=3600"));

    // The raw id is never stored; only its digest is
    let session_id = session_cookie(&response);
    let stored: Option<String> =
        sqlx::query_scalar("SELECT token_hash FROM sessions WHERE token_hash = ?")
            .bind(&session_id)
            .fetch_optional(&ctx.db)
            .await
            .unwrap();
    assert!(stored.is_none());

    assert_eq!(session_count(&ctx).await, 1);
}

#[tokio::test]
async fn session_cookie_authenticates_without_bearer() {
    let ctx = TestContext::with_config(sessions_config()).await;
    let email = verified_email(&ctx).await;

    let session_id = session_cookie(&login_response(&ctx, &email).await);

    let response = ctx
        .server
        .get("/users/me")
        .add_header(header::COOKIE, cookie_header(&session_id))
        .await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert_eq!(body["email"], email.as_str());
}

#[tokio::test]
async fn session_cookie_takes_precedence_over_bearer() {
    let ctx = TestContext::with_config(sessions_config()).await;
    let email_a = verified_email(&ctx).await;
    let email_b = verified_email(&ctx).await;

    let session_a = session_cookie(&login_response(&ctx, &email_a).await);
    let token_b = ctx.login(&email_b).await;

    // Cookie for A and bearer for B on the same request
    let response = ctx
        .server
        .get("/users/me")
        .add_header(header::COOKIE, cookie_header(&session_a))
        .authorization_bearer(&token_b)
        .await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert_eq!(body["email"], email_a.as_str());
}

#[tokio::test]
async fn logout_destroys_session() {
    let ctx = TestContext::with_config(sessions_config()).await;
    let email = verified_email(&ctx).await;

    let session_id = session_cookie(&login_response(&ctx, &email).await);
    assert_eq!(session_count(&ctx).await, 1);

    let response = ctx
        .server
        .post("/auth/logout")
        .add_header(header::COOKIE, cookie_header(&session_id))
        .await;

    response.assert_status(StatusCode::OK);

    // Logout answers with an expired cookie
    let cleared = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(cleared.starts_with("todo_session="));
    assert!(cleared.contains("Max-Age=0"));

    assert_eq!(session_count(&ctx).await, 0);

    // The old cookie no longer resolves
    let me = ctx
        .server
        .get("/users/me")
        .add_header(header::COOKIE, cookie_header(&session_id))
        .await;
    me.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_session_is_rejected_and_reaped() {
    let ctx = TestContext::with_config(sessions_config()).await;
    let email = verified_email(&ctx).await;

    let session_id = session_cookie(&login_response(&ctx, &email).await);

    sqlx::query("UPDATE sessions SET expires_at = ?")
        .bind(chrono::Utc::now() - chrono::Duration::minutes(1))
        .execute(&ctx.db)
        .await
        .unwrap();

    let response = ctx
        .server
        .get("/users/me")
        .add_header(header::COOKIE, cookie_header(&session_id))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);

    // Resolving an expired session deletes the row
    assert_eq!(session_count(&ctx).await, 0);
}

#[tokio::test]
async fn session_of_deactivated_user_is_rejected() {
    let ctx = TestContext::with_config(sessions_config()).await;
    let email = verified_email(&ctx).await;

    let session_id = session_cookie(&login_response(&ctx, &email).await);

    sqlx::query("UPDATE users SET is_active = FALSE WHERE email = ?")
        .bind(&email)
        .execute(&ctx.db)
        .await
        .unwrap();

    let response = ctx
        .server
        .get("/users/me")
        .add_header(header::COOKIE, cookie_header(&session_id))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn sessions_disabled_ignores_cookies() {
    let ctx = TestContext::new().await;
    let email = verified_email(&ctx).await;

    // No cookie is issued when sessions are off
    let login = login_response(&ctx, &email).await;
    login.assert_status(StatusCode::OK);
    assert!(login.headers().get(header::SET_COOKIE).is_none());

    // A stray cookie carries no weight either
    let fake_id = "ab".repeat(32);
    let response = ctx
        .server
        .get("/users/me")
        .add_header(header::COOKIE, cookie_header(&fake_id))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);

    assert_eq!(session_count(&ctx).await, 0);
}
