use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::auth::{RequireAuthenticated, RequireMember, RequireModerator, RequireUser};
use crate::features::reports::dtos::{
    AssignCategoryDto, CreateReportDto, CreatedReportDto, ReportCategoryDto, ReportDetailDto,
    ReportResponseDto, UpdateReportDto,
};
use crate::features::reports::models::Report;
use crate::features::reports::services::ReportService;
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};

fn page(reports: Vec<Report>, total: i64) -> Json<ApiResponse<Vec<ReportResponseDto>>> {
    let reports = reports.into_iter().map(Into::into).collect();
    Json(ApiResponse::success(
        Some(reports),
        None,
        Some(Meta { total }),
    ))
}

/// Submit a new waste report
#[utoipa::path(
    post,
    path = "/api/reports",
    request_body = CreateReportDto,
    responses(
        (status = 201, description = "Report submitted", body = ApiResponse<CreatedReportDto>),
        (status = 400, description = "Validation error or unknown category"),
        (status = 403, description = "Account not confirmed")
    ),
    tag = "reports",
    security(("session_cookie" = []))
)]
pub async fn create_report(
    RequireMember(user): RequireMember,
    State(service): State<Arc<ReportService>>,
    AppJson(dto): AppJson<CreateReportDto>,
) -> Result<(StatusCode, Json<ApiResponse<CreatedReportDto>>)> {
    dto.validate()?;

    let created = service.create(user.id, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(created),
            Some("Your report has been submitted.".to_string()),
            None,
        )),
    ))
}

/// Most recent reports from all citizens
#[utoipa::path(
    get,
    path = "/api/reports/latest",
    responses(
        (status = 200, description = "Up to 50 reports, newest first", body = ApiResponse<Vec<ReportResponseDto>>)
    ),
    tag = "reports",
    security(("session_cookie" = []))
)]
pub async fn latest_reports(
    RequireAuthenticated(_principal): RequireAuthenticated,
    State(service): State<Arc<ReportService>>,
) -> Result<Json<ApiResponse<Vec<ReportResponseDto>>>> {
    let reports = service.list_latest().await?;
    let total = reports.len() as i64;
    Ok(page(reports, total))
}

/// Reports submitted by the logged-in citizen
#[utoipa::path(
    get,
    path = "/api/reports/mine",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Caller's reports, newest first", body = ApiResponse<Vec<ReportResponseDto>>),
        (status = 303, description = "Login required")
    ),
    tag = "reports",
    security(("session_cookie" = []))
)]
pub async fn my_reports(
    RequireUser(user): RequireUser,
    State(service): State<Arc<ReportService>>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<ReportResponseDto>>>> {
    let (reports, total) = service.list_by_user(user.id, &pagination).await?;
    Ok(page(reports, total))
}

#[utoipa::path(
    get,
    path = "/api/reports/user/{id}",
    params(("id" = Uuid, Path, description = "User ID"), PaginationQuery),
    responses(
        (status = 200, description = "Reports submitted by the user", body = ApiResponse<Vec<ReportResponseDto>>),
        (status = 403, description = "Moderator access required")
    ),
    tag = "reports",
    security(("session_cookie" = []))
)]
pub async fn user_reports(
    RequireModerator(_principal): RequireModerator,
    State(service): State<Arc<ReportService>>,
    Path(id): Path<Uuid>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<ReportResponseDto>>>> {
    let (reports, total) = service.list_by_user(id, &pagination).await?;
    Ok(page(reports, total))
}

#[utoipa::path(
    get,
    path = "/api/reports/handler/{id}",
    params(("id" = Uuid, Path, description = "Handler ID"), PaginationQuery),
    responses(
        (status = 200, description = "Reports the handler was ever assigned to", body = ApiResponse<Vec<ReportResponseDto>>),
        (status = 403, description = "Moderator access required")
    ),
    tag = "reports",
    security(("session_cookie" = []))
)]
pub async fn handler_reports(
    RequireModerator(_principal): RequireModerator,
    State(service): State<Arc<ReportService>>,
    Path(id): Path<Uuid>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<ReportResponseDto>>>> {
    let (reports, total) = service.list_by_handler(id, &pagination).await?;
    Ok(page(reports, total))
}

/// Report with categories, images and current assignment
#[utoipa::path(
    get,
    path = "/api/reports/{id}",
    params(("id" = Uuid, Path, description = "Report ID")),
    responses(
        (status = 200, description = "Report detail", body = ApiResponse<ReportDetailDto>),
        (status = 404, description = "Report not found")
    ),
    tag = "reports",
    security(("session_cookie" = []))
)]
pub async fn get_report(
    RequireAuthenticated(_principal): RequireAuthenticated,
    State(service): State<Arc<ReportService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ReportDetailDto>>> {
    let report = service.get_detail(id).await?;
    Ok(Json(ApiResponse::success(Some(report), None, None)))
}

/// Edit a pending report (author only)
#[utoipa::path(
    put,
    path = "/api/reports/{id}",
    params(("id" = Uuid, Path, description = "Report ID")),
    request_body = UpdateReportDto,
    responses(
        (status = 200, description = "Report updated; message carries any geocoding warning", body = ApiResponse<ReportDetailDto>),
        (status = 403, description = "Not the author"),
        (status = 409, description = "Report is no longer pending")
    ),
    tag = "reports",
    security(("session_cookie" = []))
)]
pub async fn update_report(
    RequireMember(user): RequireMember,
    State(service): State<Arc<ReportService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateReportDto>,
) -> Result<Json<ApiResponse<ReportDetailDto>>> {
    dto.validate()?;

    let (report, warnings) = service.update(user.id, id, dto).await?;
    let message = if warnings.is_empty() {
        "Your report has been updated.".to_string()
    } else {
        warnings.join(" ")
    };
    Ok(Json(ApiResponse::success(Some(report), Some(message), None)))
}

#[utoipa::path(
    get,
    path = "/api/reports/{id}/categories",
    params(("id" = Uuid, Path, description = "Report ID")),
    responses(
        (status = 200, description = "Category links of the report", body = ApiResponse<Vec<ReportCategoryDto>>),
        (status = 404, description = "Report not found")
    ),
    tag = "reports",
    security(("session_cookie" = []))
)]
pub async fn list_categories(
    RequireAuthenticated(_principal): RequireAuthenticated,
    State(service): State<Arc<ReportService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<ReportCategoryDto>>>> {
    service.get_by_id(id).await?;
    let categories = service
        .list_categories(id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(ApiResponse::success(Some(categories), None, None)))
}

/// Link a category to a report (author or moderator)
#[utoipa::path(
    post,
    path = "/api/reports/{id}/categories",
    params(("id" = Uuid, Path, description = "Report ID")),
    request_body = AssignCategoryDto,
    responses(
        (status = 201, description = "Category linked", body = ApiResponse<ReportCategoryDto>),
        (status = 400, description = "Unknown category"),
        (status = 403, description = "Neither author nor moderator")
    ),
    tag = "reports",
    security(("session_cookie" = []))
)]
pub async fn assign_category(
    RequireAuthenticated(principal): RequireAuthenticated,
    State(service): State<Arc<ReportService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<AssignCategoryDto>,
) -> Result<(StatusCode, Json<ApiResponse<ReportCategoryDto>>)> {
    let link = service
        .assign_category(&principal, id, dto.category_id)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(link.into()), None, None)),
    ))
}
