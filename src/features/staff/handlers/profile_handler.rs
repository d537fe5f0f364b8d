use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};
use validator::Validate;

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::auth::RequireHandler;
use crate::features::staff::dtos::{HandlerResponseDto, UpdateHandlerProfileDto};
use crate::features::staff::services::HandlerProfileService;
use crate::modules::storage::read_single_image;
use crate::shared::types::ApiResponse;

#[utoipa::path(
    get,
    path = "/api/staff/me",
    responses(
        (status = 200, description = "Handler profile", body = ApiResponse<HandlerResponseDto>),
        (status = 303, description = "Login required")
    ),
    tag = "staff",
    security(("session_cookie" = []))
)]
pub async fn get_profile(
    RequireHandler(handler): RequireHandler,
    State(service): State<Arc<HandlerProfileService>>,
) -> Result<Json<ApiResponse<HandlerResponseDto>>> {
    let profile = service.get_profile(handler.id).await?;
    Ok(Json(ApiResponse::success(Some(profile), None, None)))
}

#[utoipa::path(
    patch,
    path = "/api/staff/me",
    request_body = UpdateHandlerProfileDto,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<HandlerResponseDto>),
        (status = 400, description = "Validation error or empty update")
    ),
    tag = "staff",
    security(("session_cookie" = []))
)]
pub async fn update_profile(
    RequireHandler(handler): RequireHandler,
    State(service): State<Arc<HandlerProfileService>>,
    AppJson(dto): AppJson<UpdateHandlerProfileDto>,
) -> Result<Json<ApiResponse<HandlerResponseDto>>> {
    dto.validate()?;

    let profile = service.update_profile(handler.id, dto).await?;
    Ok(Json(ApiResponse::success(
        Some(profile),
        Some("Your profile has been updated.".to_string()),
        None,
    )))
}

#[utoipa::path(
    post,
    path = "/api/staff/me/image",
    request_body(content_type = "multipart/form-data", description = "Image file"),
    responses(
        (status = 200, description = "Profile picture updated", body = ApiResponse<HandlerResponseDto>),
        (status = 400, description = "Missing, empty, oversized or disallowed file")
    ),
    tag = "staff",
    security(("session_cookie" = []))
)]
pub async fn upload_image(
    RequireHandler(handler): RequireHandler,
    State(service): State<Arc<HandlerProfileService>>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<HandlerResponseDto>>> {
    let image = read_single_image(&mut multipart).await?;
    let profile = service.upload_image(handler.id, image).await?;
    Ok(Json(ApiResponse::success(Some(profile), None, None)))
}

#[utoipa::path(
    delete,
    path = "/api/staff/me/image",
    responses(
        (status = 200, description = "Profile picture removed", body = ApiResponse<HandlerResponseDto>)
    ),
    tag = "staff",
    security(("session_cookie" = []))
)]
pub async fn remove_image(
    RequireHandler(handler): RequireHandler,
    State(service): State<Arc<HandlerProfileService>>,
) -> Result<Json<ApiResponse<HandlerResponseDto>>> {
    let profile = service.remove_image(handler.id).await?;
    Ok(Json(ApiResponse::success(Some(profile), None, None)))
}
