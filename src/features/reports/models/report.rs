use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// Report status enum matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "report_status", rename_all = "snake_case")]
pub enum ReportStatus {
    Pending,
    Verified,
    Assigned,
    Resolved,
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportStatus::Pending => write!(f, "Pending"),
            ReportStatus::Verified => write!(f, "Verified"),
            ReportStatus::Assigned => write!(f, "Assigned"),
            ReportStatus::Resolved => write!(f, "Resolved"),
        }
    }
}

/// Severity of the reported incident, also used when a handler re-assesses it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "report_severity", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Moderate,
    High,
}

/// How long ago the dumping started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "occurrence_period")]
pub enum OccurrencePeriod {
    #[serde(rename = "Last 1 day")]
    #[sqlx(rename = "last_1_day")]
    LastDay,
    #[serde(rename = "Last 3 days")]
    #[sqlx(rename = "last_3_days")]
    LastThreeDays,
    #[serde(rename = "Last 1 week")]
    #[sqlx(rename = "last_1_week")]
    LastWeek,
    #[serde(rename = "Last 2 weeks")]
    #[sqlx(rename = "last_2_weeks")]
    LastTwoWeeks,
    #[serde(rename = "Last 1 month")]
    #[sqlx(rename = "last_1_month")]
    LastMonth,
    #[serde(rename = "Last 3 months")]
    #[sqlx(rename = "last_3_months")]
    LastThreeMonths,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "waste_type", rename_all = "snake_case")]
pub enum WasteType {
    Plastic,
    Glass,
    Metal,
    Paper,
    Organic,
    #[serde(rename = "Electronic Waste")]
    ElectronicWaste,
    #[serde(rename = "Construction Waste")]
    ConstructionWaste,
    Textile,
    Hazardous,
    #[serde(rename = "Medical Waste")]
    MedicalWaste,
}

/// Database model for report
#[derive(Debug, Clone, FromRow)]
pub struct Report {
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

pub const REPORT_COLUMNS: &str = "id, user_id, location, latitude, longitude, waste_type, description, \
     severity, period_of_occurrence, status, created_at, updated_at";

/// Data for creating a new report
#[derive(Debug)]
pub struct NewReport {
    pub user_id: Uuid,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub waste_type: WasteType,
    pub description: String,
    pub severity: Severity,
    pub period_of_occurrence: OccurrencePeriod,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_match_form_choices() {
        assert_eq!(
            serde_json::to_string(&OccurrencePeriod::LastTwoWeeks).unwrap(),
            "\"Last 2 weeks\""
        );
        assert_eq!(
            serde_json::to_string(&WasteType::ElectronicWaste).unwrap(),
            "\"Electronic Waste\""
        );
        assert_eq!(serde_json::to_string(&Severity::Moderate).unwrap(), "\"moderate\"");
        assert_eq!(serde_json::to_string(&ReportStatus::Pending).unwrap(), "\"Pending\"");

        let period: OccurrencePeriod = serde_json::from_str("\"Last 1 day\"").unwrap();
        assert_eq!(period, OccurrencePeriod::LastDay);
        assert!(serde_json::from_str::<Severity>("\"critical\"").is_err());
    }
}
