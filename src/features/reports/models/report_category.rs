use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// A category link on a report, with the category name resolved
#[derive(Debug, Clone, FromRow)]
pub struct ReportCategory {
    pub id: Uuid,
    pub report_id: Uuid,
    pub category_id: Uuid,
    pub category_name: String,
    pub created_at: DateTime<Utc>,
}

pub const REPORT_CATEGORY_SELECT: &str = "SELECT rc.id, rc.report_id, rc.category_id, \
     c.name AS category_name, rc.created_at \
     FROM report_categories rc JOIN categories c ON c.id = rc.category_id";
