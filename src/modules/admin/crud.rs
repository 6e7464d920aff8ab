use super::model::AdminTodoRow;
use super::schema::UserFlagsQuery;
use crate::config::DbPool;
use crate::error::ApiError;
use crate::modules::auth::model::User;
use crate::modules::todo::model::Todo;

pub struct AdminCrud {
    pool: DbPool,
}

impl AdminCrud {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    /// Write only the supplied flags; COALESCE leaves the rest alone so
    /// two admins patching different flags do not clobber each other.
    pub async fn update_user_flags(
        &self,
        user_id: &str,
        flags: &UserFlagsQuery,
    ) -> Result<User, ApiError> {
        let is_active = flags.deactivate.map(|deactivate| !deactivate);

        let result = sqlx::query(
            r#"
            UPDATE users
            SET is_admin = COALESCE(?, is_admin),
                email_verified = COALESCE(?, email_verified),
                is_active = COALESCE(?, is_active)
            WHERE id = ?
            "#,
        )
        .bind(flags.make_admin)
        .bind(flags.verify_email)
        .bind(is_active)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("User"));
        }

        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ApiError::NotFound("User"))
    }

    pub async fn list_all_todos(&self) -> Result<Vec<AdminTodoRow>, ApiError> {
        let rows = sqlx::query_as::<_, AdminTodoRow>(
            r#"
            SELECT t.id, t.title, t.description, t.done, t.created_at, t.updated_at,
                   u.id AS owner_id, u.email AS owner_email
            FROM todos t
            JOIN users u ON u.id = t.owner_id
            ORDER BY t.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn delete_todo(&self, id: &str) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM todos WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Todo"));
        }

        Ok(())
    }

    pub async fn list_todos_for_user(&self, user_id: &str) -> Result<Vec<Todo>, ApiError> {
        let exists: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        if exists.0 == 0 {
            return Err(ApiError::NotFound("User"));
        }

        let todos = sqlx::query_as::<_, Todo>(
            "SELECT * FROM todos WHERE owner_id = ? ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(todos)
    }
}
