use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct ReportImage {
    pub id: Uuid,
    pub report_id: Uuid,
    pub file_name: String,
    pub created_at: DateTime<Utc>,
}

pub const REPORT_IMAGE_COLUMNS: &str = "id, report_id, file_name, created_at";
