use axum::{
    routing::{delete, get, patch},
    Router,
};
use std::sync::Arc;

use super::controller;
use crate::AppState;

pub fn admin_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(controller::list_users))
        .route("/users/{id}", patch(controller::update_user_flags))
        .route("/users/{id}/todos", get(controller::list_user_todos))
        .route("/todos", get(controller::list_all_todos))
        .route("/todos/{id}", delete(controller::delete_any_todo))
}
