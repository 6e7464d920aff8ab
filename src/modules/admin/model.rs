use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Todo row joined with its owner, for the admin overview.
#[derive(Debug, FromRow)]
pub struct AdminTodoRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub done: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner_id: String,
    pub owner_email: String,
}
