use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::error::ApiError;
use crate::modules::auth::extractor::VerifiedUser;
use crate::modules::todo::{
    crud::TodoCrud,
    schema::{CreateTodoRequest, TodoResponse, UpdateTodoRequest},
};
use crate::AppState;

pub async fn list_todos(
    State(state): State<Arc<AppState>>,
    VerifiedUser(user): VerifiedUser,
) -> Result<Json<Vec<TodoResponse>>, ApiError> {
    let todos = TodoCrud::new(state.db.clone())
        .list_for_owner(&user.id)
        .await?;

    Ok(Json(todos.into_iter().map(Into::into).collect()))
}

pub async fn create_todo(
    State(state): State<Arc<AppState>>,
    VerifiedUser(user): VerifiedUser,
    Json(req): Json<CreateTodoRequest>,
) -> Result<(StatusCode, Json<TodoResponse>), ApiError> {
    req.validate()
        .map_err(|e| ApiError::InvalidInput(e.to_string()))?;

    let todo = TodoCrud::new(state.db.clone()).create(&user.id, &req).await?;

    Ok((StatusCode::CREATED, Json(todo.into())))
}

pub async fn get_todo(
    State(state): State<Arc<AppState>>,
    VerifiedUser(user): VerifiedUser,
    Path(id): Path<String>,
) -> Result<Json<TodoResponse>, ApiError> {
    let todo = TodoCrud::new(state.db.clone())
        .find_owned(&id, &user.id)
        .await?;

    Ok(Json(todo.into()))
}

pub async fn update_todo(
    State(state): State<Arc<AppState>>,
    VerifiedUser(user): VerifiedUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateTodoRequest>,
) -> Result<Json<TodoResponse>, ApiError> {
    req.validate()
        .map_err(|e| ApiError::InvalidInput(e.to_string()))?;

    let todo = TodoCrud::new(state.db.clone())
        .update_owned(&id, &user.id, &req)
        .await?;

    Ok(Json(todo.into()))
}

pub async fn delete_todo(
    State(state): State<Arc<AppState>>,
    VerifiedUser(user): VerifiedUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    TodoCrud::new(state.db.clone())
        .delete_owned(&id, &user.id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
