use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::reports::dtos::ReportResponseDto;
use crate::features::reports::models::{
    AssignmentStatus, HandlerAssignment, ReportAssignment, ReportResolution, ReportStatus,
    Severity,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssignmentResponseDto {
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

impl From<ReportAssignment> for AssignmentResponseDto {
    fn from(a: ReportAssignment) -> Self {
        Self {
            id: a.id,
            report_id: a.report_id,
            handler_id: a.handler_id,
            report_resolution_id: a.report_resolution_id,
            status: a.status,
            estimated_completion_date: a.estimated_completion_date,
            date_completed: a.date_completed,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

/// Entry of a handler's work list
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HandlerAssignmentDto {
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

impl From<HandlerAssignment> for HandlerAssignmentDto {
    fn from(a: HandlerAssignment) -> Self {
        Self {
            id: a.id,
            report_id: a.report_id,
            report_resolution_id: a.report_resolution_id,
            status: a.status,
            estimated_completion_date: a.estimated_completion_date,
            date_completed: a.date_completed,
            created_at: a.created_at,
            location: a.location,
            severity: a.severity,
            report_status: a.report_status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResolutionResponseDto {
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

impl From<ReportResolution> for ResolutionResponseDto {
    fn from(r: ReportResolution) -> Self {
        Self {
            id: r.id,
            handler_id: r.handler_id,
            severity_level: r.severity_level,
            initial_situation_description: r.initial_situation_description,
            steps_taken: r.steps_taken,
            recommendations: r.recommendations,
            potential_causes: r.potential_causes,
            man_power_details: r.man_power_details,
            financial_costs: r.financial_costs,
            date_completed: r.date_completed,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateResolutionDto {
    pub severity_level: Severity,

    #[validate(custom(function = "crate::shared::validation::not_blank"))]
    pub initial_situation_description: String,

    #[validate(custom(function = "crate::shared::validation::not_blank"))]
    pub steps_taken: String,

    pub recommendations: Option<String>,
    pub potential_causes: Option<String>,
    pub man_power_details: Option<String>,
    pub financial_costs: Option<String>,

    pub date_completed: NaiveDate,
}

/// Resolve with an existing resolution record or write one inline
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct ResolveReportDto {
    pub resolution_id: Option<Uuid>,

    #[validate(nested)]
    pub resolution: Option<CreateResolutionDto>,
}

/// Where the resolution attached to a report comes from
#[derive(Debug)]
pub enum ResolutionSource {
    Existing(Uuid),
    New(CreateResolutionDto),
}

impl ResolveReportDto {
    pub fn into_source(self) -> Result<ResolutionSource> {
        match (self.resolution_id, self.resolution) {
            (Some(id), None) => Ok(ResolutionSource::Existing(id)),
            (None, Some(details)) => Ok(ResolutionSource::New(details)),
            _ => Err(AppError::field(
                "resolution",
                "Provide either an existing resolution_id or resolution details.",
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResolvedReportDto {
    pub report: ReportResponseDto,
    pub assignment: AssignmentResponseDto,
    pub resolution: ResolutionResponseDto,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AcceptedReportDto {
    pub report: ReportResponseDto,
    pub assignment: AssignmentResponseDto,
}

/// Handler progress update on their current assignment
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateAssignmentProgressDto {
    /// `Assigned` or `In Progress`; completion happens through resolve
    pub status: Option<AssignmentStatus>,
    pub estimated_completion_date: Option<NaiveDate>,
}

impl UpdateAssignmentProgressDto {
    pub fn check(&self) -> Result<()> {
        if self.status.is_none() && self.estimated_completion_date.is_none() {
            return Err(AppError::BadRequest("Nothing to update".to_string()));
        }
        if self.status == Some(AssignmentStatus::Completed) {
            return Err(AppError::field(
                "status",
                "Assignments are completed by resolving the report.",
            ));
        }
        Ok(())
    }
}
