use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::model::AdminTodoRow;

// =============================================================================
// USER FLAGS
// =============================================================================

// Query-parameter patch; absent flags are left untouched.
// `deactivate=true` maps to is_active = false.
#[derive(Debug, Deserialize)]
pub struct UserFlagsQuery {
    pub make_admin: Option<bool>,
    pub verify_email: Option<bool>,
    pub deactivate: Option<bool>,
}

// =============================================================================
// TODOS WITH OWNER
// =============================================================================

#[derive(Debug, Serialize)]
pub struct OwnerSummary {
    pub id: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct AdminTodoResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub done: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner: OwnerSummary,
}

impl From<AdminTodoRow> for AdminTodoResponse {
    fn from(row: AdminTodoRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            done: row.done,
            created_at: row.created_at,
            updated_at: row.updated_at,
            owner: OwnerSummary {
                id: row.owner_id,
                email: row.owner_email,
            },
        }
    }
}
