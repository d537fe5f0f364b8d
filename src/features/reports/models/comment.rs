use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub report_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

pub const COMMENT_SELECT: &str = "SELECT c.id, c.report_id, c.user_id, u.username, c.body, c.created_at \
     FROM comments c JOIN users u ON u.id = c.user_id";
