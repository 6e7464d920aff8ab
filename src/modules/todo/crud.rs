use chrono::Utc;
use uuid::Uuid;

use super::model::Todo;
use super::schema::{CreateTodoRequest, UpdateTodoRequest};
use crate::config::DbPool;
use crate::error::ApiError;

pub struct TodoCrud {
    pool: DbPool,
}

impl TodoCrud {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<Todo>, ApiError> {
        let todos = sqlx::query_as::<_, Todo>(
            "SELECT * FROM todos WHERE owner_id = ? ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(todos)
    }

    pub async fn create(&self, owner_id: &str, req: &CreateTodoRequest) -> Result<Todo, ApiError> {
        let now = Utc::now();
        let todo = Todo {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            title: req.title.clone(),
            description: req.description.clone().unwrap_or_default(),
            done: false,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO todos (id, owner_id, title, description, done, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&todo.id)
        .bind(&todo.owner_id)
        .bind(&todo.title)
        .bind(&todo.description)
        .bind(todo.done)
        .bind(todo.created_at)
        .bind(todo.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(todo)
    }

    /// Owner-scoped fetch: a todo belonging to someone else is
    /// indistinguishable from a missing one.
    pub async fn find_owned(&self, id: &str, owner_id: &str) -> Result<Todo, ApiError> {
        sqlx::query_as::<_, Todo>("SELECT * FROM todos WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ApiError::NotFound("Todo"))
    }

    /// Writes only the supplied fields, so two concurrent patches of
    /// different fields both land.
    pub async fn update_owned(
        &self,
        id: &str,
        owner_id: &str,
        req: &UpdateTodoRequest,
    ) -> Result<Todo, ApiError> {
        let result = sqlx::query(
            r#"
            UPDATE todos
            SET title = COALESCE(?, title),
                description = COALESCE(?, description),
                done = COALESCE(?, done),
                updated_at = ?
            WHERE id = ? AND owner_id = ?
            "#,
        )
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.done)
        .bind(Utc::now())
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Todo"));
        }

        self.find_owned(id, owner_id).await
    }

    pub async fn delete_owned(&self, id: &str, owner_id: &str) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM todos WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Todo"));
        }

        Ok(())
    }
}
