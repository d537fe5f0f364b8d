use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::auth::{RequireAuthenticated, RequireMember};
use crate::features::reports::dtos::ReportImageDto;
use crate::features::reports::services::ReportImageService;
use crate::modules::storage::read_images;
use crate::shared::types::ApiResponse;

#[utoipa::path(
    get,
    path = "/api/reports/{id}/images",
    params(("id" = Uuid, Path, description = "Report ID")),
    responses(
        (status = 200, description = "Images of the report", body = ApiResponse<Vec<ReportImageDto>>),
        (status = 404, description = "Report not found")
    ),
    tag = "reports",
    security(("session_cookie" = []))
)]
pub async fn list_images(
    RequireAuthenticated(_principal): RequireAuthenticated,
    State(service): State<Arc<ReportImageService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<ReportImageDto>>>> {
    let images = service.list(id).await?.into_iter().map(Into::into).collect();
    Ok(Json(ApiResponse::success(Some(images), None, None)))
}

/// Attach photos to one's own report
#[utoipa::path(
    post,
    path = "/api/reports/{id}/images",
    params(("id" = Uuid, Path, description = "Report ID")),
    request_body(content_type = "multipart/form-data", description = "One or more image files"),
    responses(
        (status = 201, description = "All images of the report after the upload", body = ApiResponse<Vec<ReportImageDto>>),
        (status = 400, description = "Missing, empty, oversized or disallowed file"),
        (status = 403, description = "Not the author")
    ),
    tag = "reports",
    security(("session_cookie" = []))
)]
pub async fn upload_images(
    RequireMember(user): RequireMember,
    State(service): State<Arc<ReportImageService>>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<Vec<ReportImageDto>>>)> {
    let images = read_images(&mut multipart).await?;
    let stored = service.upload(user.id, id, images).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(stored.into_iter().map(Into::into).collect()),
            None,
            None,
        )),
    ))
}
