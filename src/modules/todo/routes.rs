use axum::{routing::get, Router};
use std::sync::Arc;

use super::controller;
use crate::AppState;

pub fn todo_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(controller::list_todos).post(controller::create_todo))
        .route(
            "/{id}",
            get(controller::get_todo)
                .patch(controller::update_todo)
                .delete(controller::delete_todo),
        )
}
