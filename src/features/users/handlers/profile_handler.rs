use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};
use validator::Validate;

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::auth::RequireUser;
use crate::features::users::dtos::{UpdatePhoneDto, UserResponseDto};
use crate::features::users::services::UserProfileService;
use crate::modules::storage::read_single_image;
use crate::shared::types::ApiResponse;

#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Profile retrieved successfully", body = ApiResponse<UserResponseDto>),
        (status = 303, description = "Login required")
    ),
    tag = "users",
    security(("session_cookie" = []))
)]
pub async fn get_profile(
    RequireUser(user): RequireUser,
    State(service): State<Arc<UserProfileService>>,
) -> Result<Json<ApiResponse<UserResponseDto>>> {
    let profile = service.get_profile(user.id).await?;
    Ok(Json(ApiResponse::success(Some(profile), None, None)))
}

#[utoipa::path(
    put,
    path = "/api/users/me/phone",
    request_body = UpdatePhoneDto,
    responses(
        (status = 200, description = "Phone number updated", body = ApiResponse<UserResponseDto>),
        (status = 400, description = "Validation error")
    ),
    tag = "users",
    security(("session_cookie" = []))
)]
pub async fn update_phone(
    RequireUser(user): RequireUser,
    State(service): State<Arc<UserProfileService>>,
    AppJson(dto): AppJson<UpdatePhoneDto>,
) -> Result<Json<ApiResponse<UserResponseDto>>> {
    dto.validate()?;

    let profile = service.update_phone(user.id, dto).await?;
    Ok(Json(ApiResponse::success(
        Some(profile),
        Some("Your phone number has been updated.".to_string()),
        None,
    )))
}

/// Upload a profile picture (multipart, first file field)
#[utoipa::path(
    post,
    path = "/api/users/me/image",
    request_body(content_type = "multipart/form-data", description = "Image file"),
    responses(
        (status = 200, description = "Profile picture updated", body = ApiResponse<UserResponseDto>),
        (status = 400, description = "Missing, empty, oversized or disallowed file")
    ),
    tag = "users",
    security(("session_cookie" = []))
)]
pub async fn upload_image(
    RequireUser(user): RequireUser,
    State(service): State<Arc<UserProfileService>>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<UserResponseDto>>> {
    let image = read_single_image(&mut multipart).await?;
    let profile = service.upload_image(user.id, image).await?;
    Ok(Json(ApiResponse::success(
        Some(profile),
        Some("Your profile picture has been updated.".to_string()),
        None,
    )))
}

#[utoipa::path(
    delete,
    path = "/api/users/me/image",
    responses(
        (status = 200, description = "Profile picture removed", body = ApiResponse<UserResponseDto>)
    ),
    tag = "users",
    security(("session_cookie" = []))
)]
pub async fn remove_image(
    RequireUser(user): RequireUser,
    State(service): State<Arc<UserProfileService>>,
) -> Result<Json<ApiResponse<UserResponseDto>>> {
    let profile = service.remove_image(user.id).await?;
    Ok(Json(ApiResponse::success(Some(profile), None, None)))
}
