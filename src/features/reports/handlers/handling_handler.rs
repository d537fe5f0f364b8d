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
use crate::features::auth::{RequireAuthenticated, RequireHandler, RequireModerator};
use crate::features::reports::dtos::{
    AcceptedReportDto, AssignmentResponseDto, CreateResolutionDto, HandlerAssignmentDto,
    ReportResponseDto, ResolutionResponseDto, ResolveReportDto, ResolvedReportDto,
    UpdateAssignmentProgressDto,
};
use crate::features::reports::services::HandlingService;
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};

#[utoipa::path(
    post,
    path = "/api/reports/{id}/verify",
    params(("id" = Uuid, Path, description = "Report ID")),
    responses(
        (status = 200, description = "Report verified", body = ApiResponse<ReportResponseDto>),
        (status = 403, description = "Moderator access required"),
        (status = 404, description = "Report not found"),
        (status = 409, description = "Report is not pending")
    ),
    tag = "handling",
    security(("session_cookie" = []))
)]
pub async fn verify_report(
    RequireModerator(_principal): RequireModerator,
    State(service): State<Arc<HandlingService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ReportResponseDto>>> {
    let report = service.verify(id).await?;
    Ok(Json(ApiResponse::success(
        Some(report.into()),
        Some("Report verified.".to_string()),
        None,
    )))
}

/// Take on a report; reassigns when it is already assigned
#[utoipa::path(
    post,
    path = "/api/reports/{id}/accept",
    params(("id" = Uuid, Path, description = "Report ID")),
    responses(
        (status = 200, description = "Report assigned to the caller", body = ApiResponse<AcceptedReportDto>),
        (status = 403, description = "Handler not approved"),
        (status = 404, description = "Report not found"),
        (status = 409, description = "Report already resolved")
    ),
    tag = "handling",
    security(("session_cookie" = []))
)]
pub async fn accept_report(
    RequireHandler(handler): RequireHandler,
    State(service): State<Arc<HandlingService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<AcceptedReportDto>>> {
    let accepted = service.accept(id, &handler).await?;
    Ok(Json(ApiResponse::success(
        Some(accepted),
        Some("You are now handling this report.".to_string()),
        None,
    )))
}

#[utoipa::path(
    post,
    path = "/api/reports/{id}/resolve",
    params(("id" = Uuid, Path, description = "Report ID")),
    request_body = ResolveReportDto,
    responses(
        (status = 200, description = "Report resolved", body = ApiResponse<ResolvedReportDto>),
        (status = 400, description = "Missing or ambiguous resolution"),
        (status = 403, description = "Caller does not hold the current assignment"),
        (status = 409, description = "Report is not assigned")
    ),
    tag = "handling",
    security(("session_cookie" = []))
)]
pub async fn resolve_report(
    RequireHandler(handler): RequireHandler,
    State(service): State<Arc<HandlingService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<ResolveReportDto>,
) -> Result<Json<ApiResponse<ResolvedReportDto>>> {
    dto.validate()?;

    let resolved = service.resolve(id, &handler, dto.into_source()?).await?;
    Ok(Json(ApiResponse::success(
        Some(resolved),
        Some("Report resolved.".to_string()),
        None,
    )))
}

/// Assignment history of a report, newest first
#[utoipa::path(
    get,
    path = "/api/reports/{id}/assignments",
    params(("id" = Uuid, Path, description = "Report ID")),
    responses(
        (status = 200, description = "Assignments", body = ApiResponse<Vec<AssignmentResponseDto>>),
        (status = 404, description = "Report not found")
    ),
    tag = "handling",
    security(("session_cookie" = []))
)]
pub async fn list_assignments(
    RequireAuthenticated(_principal): RequireAuthenticated,
    State(service): State<Arc<HandlingService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<AssignmentResponseDto>>>> {
    let assignments = service
        .list_assignments(id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(ApiResponse::success(Some(assignments), None, None)))
}

/// Handler dashboard: the caller's assignments
#[utoipa::path(
    get,
    path = "/api/staff/assignments",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Caller's assignments, newest first", body = ApiResponse<Vec<HandlerAssignmentDto>>),
        (status = 303, description = "Login required")
    ),
    tag = "handling",
    security(("session_cookie" = []))
)]
pub async fn my_assignments(
    RequireHandler(handler): RequireHandler,
    State(service): State<Arc<HandlingService>>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<HandlerAssignmentDto>>>> {
    let (assignments, total) = service.list_for_handler(handler.id, &pagination).await?;
    let assignments = assignments.into_iter().map(Into::into).collect();
    Ok(Json(ApiResponse::success(
        Some(assignments),
        None,
        Some(Meta { total }),
    )))
}

#[utoipa::path(
    patch,
    path = "/api/staff/assignments/{id}",
    params(("id" = Uuid, Path, description = "Assignment ID")),
    request_body = UpdateAssignmentProgressDto,
    responses(
        (status = 200, description = "Progress updated", body = ApiResponse<AssignmentResponseDto>),
        (status = 400, description = "Empty update or completion attempt"),
        (status = 403, description = "Assignment belongs to another handler"),
        (status = 409, description = "Assignment completed or superseded")
    ),
    tag = "handling",
    security(("session_cookie" = []))
)]
pub async fn update_progress(
    RequireHandler(handler): RequireHandler,
    State(service): State<Arc<HandlingService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateAssignmentProgressDto>,
) -> Result<Json<ApiResponse<AssignmentResponseDto>>> {
    let assignment = service.update_progress(handler.id, id, dto).await?;
    Ok(Json(ApiResponse::success(
        Some(assignment.into()),
        None,
        None,
    )))
}

#[utoipa::path(
    get,
    path = "/api/staff/resolutions",
    responses(
        (status = 200, description = "Resolutions written by the caller", body = ApiResponse<Vec<ResolutionResponseDto>>)
    ),
    tag = "handling",
    security(("session_cookie" = []))
)]
pub async fn my_resolutions(
    RequireHandler(handler): RequireHandler,
    State(service): State<Arc<HandlingService>>,
) -> Result<Json<ApiResponse<Vec<ResolutionResponseDto>>>> {
    let resolutions = service
        .list_resolutions(handler.id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(ApiResponse::success(Some(resolutions), None, None)))
}

/// Write a resolution to attach later through resolve
#[utoipa::path(
    post,
    path = "/api/staff/resolutions",
    request_body = CreateResolutionDto,
    responses(
        (status = 201, description = "Resolution recorded", body = ApiResponse<ResolutionResponseDto>),
        (status = 400, description = "Validation error")
    ),
    tag = "handling",
    security(("session_cookie" = []))
)]
pub async fn create_resolution(
    RequireHandler(handler): RequireHandler,
    State(service): State<Arc<HandlingService>>,
    AppJson(dto): AppJson<CreateResolutionDto>,
) -> Result<(StatusCode, Json<ApiResponse<ResolutionResponseDto>>)> {
    dto.validate()?;

    let resolution = service.create_resolution(handler.id, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(resolution.into()), None, None)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/staff/resolutions/{id}",
    params(("id" = Uuid, Path, description = "Resolution ID")),
    responses(
        (status = 200, description = "Resolution", body = ApiResponse<ResolutionResponseDto>),
        (status = 404, description = "Resolution not found")
    ),
    tag = "handling",
    security(("session_cookie" = []))
)]
pub async fn get_resolution(
    RequireHandler(_principal): RequireHandler,
    State(service): State<Arc<HandlingService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ResolutionResponseDto>>> {
    let resolution = service.get_resolution(id).await?;
    Ok(Json(ApiResponse::success(Some(resolution.into()), None, None)))
}
