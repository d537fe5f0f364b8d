use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::auth::RequireAdmin;
use crate::features::users::dtos::{SetRoleDto, SetUserActiveDto, UserResponseDto};
use crate::features::users::services::UserService;
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};

#[utoipa::path(
    get,
    path = "/api/admin/users",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Citizens, newest first", body = ApiResponse<Vec<UserResponseDto>>),
        (status = 403, description = "Administrator access required")
    ),
    tag = "users",
    security(("session_cookie" = []))
)]
pub async fn list_users(
    RequireAdmin(_principal): RequireAdmin,
    State(service): State<Arc<UserService>>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<UserResponseDto>>>> {
    let (users, total) = service.list(&pagination).await?;
    let users = users.into_iter().map(Into::into).collect();
    Ok(Json(ApiResponse::success(
        Some(users),
        None,
        Some(Meta { total }),
    )))
}

#[utoipa::path(
    get,
    path = "/api/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Citizen", body = ApiResponse<UserResponseDto>),
        (status = 404, description = "User not found")
    ),
    tag = "users",
    security(("session_cookie" = []))
)]
pub async fn get_user(
    RequireAdmin(_principal): RequireAdmin,
    State(service): State<Arc<UserService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<UserResponseDto>>> {
    let user = service.get_by_id(id).await?;
    Ok(Json(ApiResponse::success(Some(user.into()), None, None)))
}

/// Activate or deactivate a citizen account; inactive accounts cannot log in
#[utoipa::path(
    patch,
    path = "/api/admin/users/{id}/active",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = SetUserActiveDto,
    responses(
        (status = 200, description = "Account updated", body = ApiResponse<UserResponseDto>),
        (status = 404, description = "User not found")
    ),
    tag = "users",
    security(("session_cookie" = []))
)]
pub async fn set_active(
    RequireAdmin(admin): RequireAdmin,
    State(service): State<Arc<UserService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<SetUserActiveDto>,
) -> Result<Json<ApiResponse<UserResponseDto>>> {
    let user = service.set_active(id, dto.active).await?;
    tracing::info!("User {} active={} set by {:?}", id, dto.active, admin.id());
    Ok(Json(ApiResponse::success(Some(user.into()), None, None)))
}

#[utoipa::path(
    patch,
    path = "/api/admin/users/{id}/role",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = SetRoleDto,
    responses(
        (status = 200, description = "Role assigned", body = ApiResponse<UserResponseDto>),
        (status = 400, description = "Unknown role"),
        (status = 404, description = "User not found")
    ),
    tag = "users",
    security(("session_cookie" = []))
)]
pub async fn set_role(
    RequireAdmin(_principal): RequireAdmin,
    State(service): State<Arc<UserService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<SetRoleDto>,
) -> Result<Json<ApiResponse<UserResponseDto>>> {
    let user = service.set_role(id, dto.role_id).await?;
    Ok(Json(ApiResponse::success(Some(user.into()), None, None)))
}
