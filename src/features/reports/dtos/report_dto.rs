use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::reports::dtos::AssignmentResponseDto;
use crate::features::reports::models::{
    OccurrencePeriod, Report, ReportCategory, ReportImage, ReportStatus, Severity, WasteType,
};
use crate::features::rewards::dtos::RewardResponseDto;

/// Response DTO for report
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportResponseDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub waste_type: WasteType,
    pub description: String,
    pub severity: Severity,
    pub period_of_occurrence: OccurrencePeriod,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Report> for ReportResponseDto {
    fn from(r: Report) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            location: r.location,
            latitude: r.latitude,
            longitude: r.longitude,
            waste_type: r.waste_type,
            description: r.description,
            severity: r.severity,
            period_of_occurrence: r.period_of_occurrence,
            status: r.status,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportCategoryDto {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<ReportCategory> for ReportCategoryDto {
    fn from(rc: ReportCategory) -> Self {
        Self {
            id: rc.id,
            category_id: rc.category_id,
            name: rc.category_name,
            created_at: rc.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportImageDto {
    pub id: Uuid,
    pub file_name: String,
    /// Location relative to the report image root (`{report_id}/{file_name}`)
    pub path: String,
    pub created_at: DateTime<Utc>,
}

impl From<ReportImage> for ReportImageDto {
    fn from(i: ReportImage) -> Self {
        Self {
            id: i.id,
            path: format!("{}/{}", i.report_id, i.file_name),
            file_name: i.file_name,
            created_at: i.created_at,
        }
    }
}

/// A report with everything attached to it
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportDetailDto {
    #[serde(flatten)]
    pub report: ReportResponseDto,
    pub categories: Vec<ReportCategoryDto>,
    pub images: Vec<ReportImageDto>,
    /// Most recent assignment, if the report was ever accepted
    pub current_assignment: Option<AssignmentResponseDto>,
    pub comment_count: i64,
}

/// Result of submitting a report
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatedReportDto {
    pub report: ReportDetailDto,
    pub points_awarded: i32,
    /// Reward tiers reached with this submission
    pub rewards_granted: Vec<RewardResponseDto>,
    /// Non-fatal problems, such as a location that could not be geocoded
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateReportDto {
    #[validate(
        length(min = 1, max = 255, message = "Location must be between 1 and 255 characters."),
        custom(function = "crate::shared::validation::not_blank")
    )]
    pub location: String,

    /// Looked up from `location` when both coordinates are omitted
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90."))]
    pub latitude: Option<f64>,

    #[validate(range(
        min = -180.0,
        max = 180.0,
        message = "Longitude must be between -180 and 180."
    ))]
    pub longitude: Option<f64>,

    pub waste_type: WasteType,

    #[validate(custom(function = "crate::shared::validation::not_blank"))]
    pub description: String,

    pub severity: Severity,

    pub period_of_occurrence: OccurrencePeriod,

    /// Category IDs to link; duplicates produce duplicate links
    #[serde(default)]
    pub categories: Vec<Uuid>,
}

/// Owner edit of a pending report; omitted fields stay unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateReportDto {
    #[validate(
        length(min = 1, max = 255, message = "Location must be between 1 and 255 characters."),
        custom(function = "crate::shared::validation::not_blank")
    )]
    pub location: Option<String>,

    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90."))]
    pub latitude: Option<f64>,

    #[validate(range(
        min = -180.0,
        max = 180.0,
        message = "Longitude must be between -180 and 180."
    ))]
    pub longitude: Option<f64>,

    pub waste_type: Option<WasteType>,

    #[validate(custom(function = "crate::shared::validation::not_blank"))]
    pub description: Option<String>,

    pub severity: Option<Severity>,

    pub period_of_occurrence: Option<OccurrencePeriod>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssignCategoryDto {
    pub category_id: Uuid,
}

/// Both coordinates or neither
pub fn paired_coordinates(latitude: Option<f64>, longitude: Option<f64>) -> Result<Option<(f64, f64)>> {
    match (latitude, longitude) {
        (Some(lat), Some(lon)) => Ok(Some((lat, lon))),
        (None, None) => Ok(None),
        (None, Some(_)) => Err(AppError::field(
            "latitude",
            "Latitude and longitude must be provided together.",
        )),
        (Some(_), None) => Err(AppError::field(
            "longitude",
            "Latitude and longitude must be provided together.",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> serde_json::Value {
        json!({
            "location": "Gikomba Market, Nairobi",
            "waste_type": "Plastic",
            "description": "Heap of plastic bags blocking the drainage",
            "severity": "high",
            "period_of_occurrence": "Last 1 week"
        })
    }

    #[test]
    fn test_create_report_parses_form_labels() {
        let dto: CreateReportDto = serde_json::from_value(payload()).unwrap();
        assert_eq!(dto.severity, Severity::High);
        assert_eq!(dto.period_of_occurrence, OccurrencePeriod::LastWeek);
        assert!(dto.categories.is_empty());
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_create_report_rejects_unknown_waste_type() {
        let mut body = payload();
        body["waste_type"] = json!("Nuclear");
        assert!(serde_json::from_value::<CreateReportDto>(body).is_err());
    }

    #[test]
    fn test_coordinate_ranges() {
        let mut body = payload();
        body["latitude"] = json!(91.0);
        body["longitude"] = json!(36.8);
        let dto: CreateReportDto = serde_json::from_value(body).unwrap();
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_paired_coordinates() {
        assert_eq!(paired_coordinates(None, None).unwrap(), None);
        assert_eq!(
            paired_coordinates(Some(-1.2), Some(36.8)).unwrap(),
            Some((-1.2, 36.8))
        );
        assert!(paired_coordinates(Some(-1.2), None).is_err());
        assert!(paired_coordinates(None, Some(36.8)).is_err());
    }

    #[test]
    fn test_blank_description_rejected() {
        let mut body = payload();
        body["description"] = json!("   ");
        let dto: CreateReportDto = serde_json::from_value(body).unwrap();
        assert!(dto.validate().is_err());
    }
}
