use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::auth::RequireAdmin;
use crate::features::roles::dtos::{RoleResponseDto, UpdateRolePermissionsDto};
use crate::features::roles::services::RoleService;
use crate::shared::types::ApiResponse;

/// List roles with their permissions
#[utoipa::path(
    get,
    path = "/api/admin/roles",
    responses(
        (status = 200, description = "Roles", body = ApiResponse<Vec<RoleResponseDto>>),
        (status = 403, description = "Administrator access required")
    ),
    tag = "roles",
    security(("session_cookie" = []))
)]
pub async fn list_roles(
    RequireAdmin(_principal): RequireAdmin,
    State(service): State<Arc<RoleService>>,
) -> Result<Json<ApiResponse<Vec<RoleResponseDto>>>> {
    let roles = service.list().await?;
    Ok(Json(ApiResponse::success(Some(roles), None, None)))
}

/// Grant or revoke permissions on a role
#[utoipa::path(
    patch,
    path = "/api/admin/roles/{id}/permissions",
    params(("id" = Uuid, Path, description = "Role ID")),
    request_body = UpdateRolePermissionsDto,
    responses(
        (status = 200, description = "Role updated", body = ApiResponse<RoleResponseDto>),
        (status = 400, description = "Unknown permission name"),
        (status = 403, description = "Administrator access required"),
        (status = 404, description = "Role not found")
    ),
    tag = "roles",
    security(("session_cookie" = []))
)]
pub async fn update_role_permissions(
    RequireAdmin(admin): RequireAdmin,
    State(service): State<Arc<RoleService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateRolePermissionsDto>,
) -> Result<Json<ApiResponse<RoleResponseDto>>> {
    let role = service.update_permissions(id, dto).await?;
    tracing::info!("Role {} updated by {:?}", role.title, admin.id());
    Ok(Json(ApiResponse::success(Some(role), None, None)))
}
