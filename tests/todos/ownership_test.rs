use axum::http::StatusCode;
use serde_json::json;

use crate::common::TestContext;

async fn create_todo_id(ctx: &TestContext, token: &str, title: &str) -> String {
    let response = ctx
        .server
        .post("/todos")
        .authorization_bearer(token)
        .json(&json!({ "title": title }))
        .await;

    response.assert_status(StatusCode::CREATED);

    let body: serde_json::Value = response.json();
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn todos_are_scoped_to_their_owner() {
    let ctx = TestContext::new().await;
    let (_email_a, token_a) = ctx.create_verified_user().await;
    let (_email_b, token_b) = ctx.create_verified_user().await;

    create_todo_id(&ctx, &token_a, "A one").await;
    create_todo_id(&ctx, &token_a, "A two").await;
    create_todo_id(&ctx, &token_b, "B one").await;

    let list_a = ctx.server.get("/todos").authorization_bearer(&token_a).await;
    let body_a: serde_json::Value = list_a.json();
    assert_eq!(body_a.as_array().unwrap().len(), 2);

    let list_b = ctx.server.get("/todos").authorization_bearer(&token_b).await;
    let body_b: serde_json::Value = list_b.json();
    assert_eq!(body_b.as_array().unwrap().len(), 1);
    assert_eq!(body_b[0]["title"], "B one");
}

#[tokio::test]
async fn foreign_todo_reads_as_missing() {
    let ctx = TestContext::new().await;
    let (_email_a, token_a) = ctx.create_verified_user().await;
    let (_email_b, token_b) = ctx.create_verified_user().await;

    let id = create_todo_id(&ctx, &token_a, "A's secret").await;

    // Existence must not leak: not 403, but the same 404 an absent id gets
    let get = ctx
        .server
        .get(&format!("/todos/{}", id))
        .authorization_bearer(&token_b)
        .await;
    get.assert_status(StatusCode::NOT_FOUND);

    let patch = ctx
        .server
        .patch(&format!("/todos/{}", id))
        .authorization_bearer(&token_b)
        .json(&json!({ "done": true }))
        .await;
    patch.assert_status(StatusCode::NOT_FOUND);

    let delete = ctx
        .server
        .delete(&format!("/todos/{}", id))
        .authorization_bearer(&token_b)
        .await;
    delete.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn failed_foreign_delete_leaves_todo_intact() {
    let ctx = TestContext::new().await;
    let (_email_a, token_a) = ctx.create_verified_user().await;
    let (_email_b, token_b) = ctx.create_verified_user().await;

    let id = create_todo_id(&ctx, &token_a, "Keep me").await;

    ctx.server
        .delete(&format!("/todos/{}", id))
        .authorization_bearer(&token_b)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    ctx.server
        .get(&format!("/todos/{}", id))
        .authorization_bearer(&token_a)
        .await
        .assert_status(StatusCode::OK);
}

#[tokio::test]
async fn failed_foreign_patch_changes_nothing() {
    let ctx = TestContext::new().await;
    let (_email_a, token_a) = ctx.create_verified_user().await;
    let (_email_b, token_b) = ctx.create_verified_user().await;

    let id = create_todo_id(&ctx, &token_a, "Original title").await;

    ctx.server
        .patch(&format!("/todos/{}", id))
        .authorization_bearer(&token_b)
        .json(&json!({ "title": "Hijacked" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let response = ctx
        .server
        .get(&format!("/todos/{}", id))
        .authorization_bearer(&token_a)
        .await;

    let body: serde_json::Value = response.json();
    assert_eq!(body["title"], "Original title");
    assert_eq!(body["done"], false);
}

#[tokio::test]
async fn admins_get_no_special_access_on_the_personal_surface() {
    let ctx = TestContext::new().await;
    let (_email_a, token_a) = ctx.create_verified_user().await;
    let (_admin_email, admin_token) = ctx.create_admin_user().await;

    let id = create_todo_id(&ctx, &token_a, "A's todo").await;

    // /todos is owner-scoped even for admins; /admin/todos is the
    // cross-tenant surface
    ctx.server
        .get(&format!("/todos/{}", id))
        .authorization_bearer(&admin_token)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let list = ctx
        .server
        .get("/todos")
        .authorization_bearer(&admin_token)
        .await;
    let body: serde_json::Value = list.json();
    assert_eq!(body.as_array().unwrap().len(), 0);
}
