use axum::http::StatusCode;

use todohub::services::jwt::JwtService;

use crate::common::TestContext;

fn test_jwt() -> JwtService {
    JwtService::new("test-secret-key-for-testing-only".to_string(), 60)
}

#[tokio::test]
async fn me_with_valid_token_returns_user_data() {
    let ctx = TestContext::new().await;
    let (email, access_token) = ctx.create_verified_user().await;

    let response = ctx
        .server
        .get("/users/me")
        .authorization_bearer(&access_token)
        .await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert_eq!(body["email"], email);
    assert!(body.get("id").is_some());
    assert!(body.get("created_at").is_some());
    assert_eq!(body["email_verified"], true);
    assert_eq!(body["is_active"], true);
    assert!(body.get("password").is_none()); // Password should never be returned
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn me_without_auth_header_returns_unauthorized() {
    let ctx = TestContext::new().await;

    let response = ctx.server.get("/users/me").await;

    response.assert_status(StatusCode::UNAUTHORIZED);

    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "unauthenticated");
    assert_eq!(body["message"], "Missing credentials");
}

#[tokio::test]
async fn me_with_invalid_token_returns_unauthorized() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .get("/users/me")
        .authorization_bearer("invalid-token")
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_with_malformed_auth_header_returns_unauthorized() {
    let ctx = TestContext::new().await;

    // Empty token
    let response = ctx.server.get("/users/me").authorization_bearer("").await;

    response.assert_status(StatusCode::UNAUTHORIZED);

    // Wrong scheme
    let response = ctx
        .server
        .get("/users/me")
        .add_header(
            axum::http::header::AUTHORIZATION,
            axum::http::HeaderValue::from_static("Basic dXNlcjpwYXNz"),
        )
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_with_foreign_signature_returns_unauthorized() {
    let ctx = TestContext::new().await;
    let (email, _access_token) = ctx.create_verified_user().await;

    // Valid claims signed with the wrong key
    let forged = JwtService::new("some-other-secret".to_string(), 60)
        .create_access_token(&email, false)
        .unwrap();

    let response = ctx
        .server
        .get("/users/me")
        .authorization_bearer(&forged)
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);

    let body: serde_json::Value = response.json();
    assert_eq!(body["message"], "Invalid or expired token");
}

#[tokio::test]
async fn me_after_deactivation_returns_unauthorized() {
    let ctx = TestContext::new().await;
    let (email, access_token) = ctx.create_verified_user().await;

    // Token works before the flag flips
    ctx.server
        .get("/users/me")
        .authorization_bearer(&access_token)
        .await
        .assert_status_ok();

    sqlx::query("UPDATE users SET is_active = FALSE WHERE email = ?")
        .bind(&email)
        .execute(&ctx.db)
        .await
        .unwrap();

    // Deactivation takes effect immediately, not at token expiry
    let response = ctx
        .server
        .get("/users/me")
        .authorization_bearer(&access_token)
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_does_not_require_verification() {
    let ctx = TestContext::new().await;
    let (email, _token) = ctx.register().await;

    // Unverified accounts cannot log in, but a token minted out of band
    // still identifies them
    let access_token = test_jwt().create_access_token(&email, false).unwrap();

    let response = ctx
        .server
        .get("/users/me")
        .authorization_bearer(&access_token)
        .await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert_eq!(body["email_verified"], false);
}

#[tokio::test]
async fn me_with_token_for_unknown_user_returns_unauthorized() {
    let ctx = TestContext::new().await;

    let access_token = test_jwt()
        .create_access_token("ghost@example.com", false)
        .unwrap();

    let response = ctx
        .server
        .get("/users/me")
        .authorization_bearer(&access_token)
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);

    let body: serde_json::Value = response.json();
    assert_eq!(body["message"], "User inactive or not found");
}
