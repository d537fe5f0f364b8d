use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

use super::report::{ReportStatus, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "assignment_status", rename_all = "snake_case")]
pub enum AssignmentStatus {
    Assigned,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}

/// One entry of a report's handling history. The newest row is the current one.
#[derive(Debug, Clone, FromRow)]
pub struct ReportAssignment {
    pub id: Uuid,
    pub report_id: Uuid,
    pub handler_id: Uuid,
    pub report_resolution_id: Option<Uuid>,
    pub status: AssignmentStatus,
    pub estimated_completion_date: Option<NaiveDate>,
    pub date_completed: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const ASSIGNMENT_COLUMNS: &str = "id, report_id, handler_id, report_resolution_id, status, \
     estimated_completion_date, date_completed, created_at, updated_at";

/// Assignment joined with a summary of its report, for a handler's work list
#[derive(Debug, Clone, FromRow)]
pub struct HandlerAssignment {
    pub id: Uuid,
    pub report_id: Uuid,
    pub report_resolution_id: Option<Uuid>,
    pub status: AssignmentStatus,
    pub estimated_completion_date: Option<NaiveDate>,
    pub date_completed: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub location: String,
    pub severity: Severity,
    pub report_status: ReportStatus,
}

pub const HANDLER_ASSIGNMENT_SELECT: &str = "SELECT a.id, a.report_id, a.report_resolution_id, a.status, \
     a.estimated_completion_date, a.date_completed, a.created_at, \
     r.location, r.severity, r.status AS report_status \
     FROM report_assignments a JOIN reports r ON r.id = a.report_id";
