use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::report::Severity;

/// Handler write-up closing out a report
#[derive(Debug, Clone, FromRow)]
pub struct ReportResolution {
    pub id: Uuid,
    pub handler_id: Uuid,
    pub severity_level: Severity,
    pub initial_situation_description: String,
    pub steps_taken: String,
    pub recommendations: Option<String>,
    pub potential_causes: Option<String>,
    pub man_power_details: Option<String>,
    pub financial_costs: Option<String>,
    pub date_completed: NaiveDate,
    pub created_at: DateTime<Utc>,
}

pub const RESOLUTION_COLUMNS: &str = "id, handler_id, severity_level, initial_situation_description, \
     steps_taken, recommendations, potential_causes, man_power_details, financial_costs, \
     date_completed, created_at";
