use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::error::ApiError;
use crate::modules::admin::{
    crud::AdminCrud,
    schema::{AdminTodoResponse, UserFlagsQuery},
};
use crate::modules::auth::{extractor::AdminUser, schema::UserResponse};
use crate::modules::todo::schema::TodoResponse;
use crate::AppState;

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = AdminCrud::new(state.db.clone()).list_users().await?;

    Ok(Json(users.into_iter().map(Into::into).collect()))
}

pub async fn update_user_flags(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    Query(flags): Query<UserFlagsQuery>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = AdminCrud::new(state.db.clone())
        .update_user_flags(&id, &flags)
        .await?;

    Ok(Json(user.into()))
}

pub async fn list_user_todos(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<TodoResponse>>, ApiError> {
    let todos = AdminCrud::new(state.db.clone())
        .list_todos_for_user(&id)
        .await?;

    Ok(Json(todos.into_iter().map(Into::into).collect()))
}

pub async fn list_all_todos(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<AdminTodoResponse>>, ApiError> {
    let rows = AdminCrud::new(state.db.clone()).list_all_todos().await?;

    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

pub async fn delete_any_todo(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    AdminCrud::new(state.db.clone()).delete_todo(&id).await?;

    Ok(StatusCode::NO_CONTENT)
}
