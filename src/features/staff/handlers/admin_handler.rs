use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::auth::RequireAdmin;
use crate::features::staff::dtos::{HandlerResponseDto, ListHandlersQuery, SetHandlerApprovalDto};
use crate::features::staff::services::HandlerService;
use crate::features::users::dtos::SetRoleDto;
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};

#[utoipa::path(
    get,
    path = "/api/admin/handlers",
    params(ListHandlersQuery, PaginationQuery),
    responses(
        (status = 200, description = "Handlers, newest first", body = ApiResponse<Vec<HandlerResponseDto>>),
        (status = 403, description = "Administrator access required")
    ),
    tag = "staff",
    security(("session_cookie" = []))
)]
pub async fn list_handlers(
    RequireAdmin(_principal): RequireAdmin,
    State(service): State<Arc<HandlerService>>,
    Query(filter): Query<ListHandlersQuery>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<HandlerResponseDto>>>> {
    let (handlers, total) = service.list(filter.pending, &pagination).await?;
    let handlers = handlers.into_iter().map(Into::into).collect();
    Ok(Json(ApiResponse::success(
        Some(handlers),
        None,
        Some(Meta { total }),
    )))
}

#[utoipa::path(
    get,
    path = "/api/admin/handlers/{id}",
    params(("id" = Uuid, Path, description = "Handler ID")),
    responses(
        (status = 200, description = "Handler", body = ApiResponse<HandlerResponseDto>),
        (status = 404, description = "Handler not found")
    ),
    tag = "staff",
    security(("session_cookie" = []))
)]
pub async fn get_handler(
    RequireAdmin(_principal): RequireAdmin,
    State(service): State<Arc<HandlerService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<HandlerResponseDto>>> {
    let handler = service.get_by_id(id).await?;
    Ok(Json(ApiResponse::success(Some(handler.into()), None, None)))
}

/// Approve (or withdraw approval of) a handler; only approved handlers take on reports
#[utoipa::path(
    patch,
    path = "/api/admin/handlers/{id}/approval",
    params(("id" = Uuid, Path, description = "Handler ID")),
    request_body = SetHandlerApprovalDto,
    responses(
        (status = 200, description = "Approval updated", body = ApiResponse<HandlerResponseDto>),
        (status = 404, description = "Handler not found")
    ),
    tag = "staff",
    security(("session_cookie" = []))
)]
pub async fn set_approval(
    RequireAdmin(admin): RequireAdmin,
    State(service): State<Arc<HandlerService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<SetHandlerApprovalDto>,
) -> Result<Json<ApiResponse<HandlerResponseDto>>> {
    let handler = service.set_approved(id, dto.approved).await?;
    tracing::info!(
        "Handler {} approval={} set by {:?}",
        id,
        dto.approved,
        admin.id()
    );
    Ok(Json(ApiResponse::success(Some(handler.into()), None, None)))
}

#[utoipa::path(
    patch,
    path = "/api/admin/handlers/{id}/role",
    params(("id" = Uuid, Path, description = "Handler ID")),
    request_body = SetRoleDto,
    responses(
        (status = 200, description = "Role assigned", body = ApiResponse<HandlerResponseDto>),
        (status = 400, description = "Unknown role"),
        (status = 404, description = "Handler not found")
    ),
    tag = "staff",
    security(("session_cookie" = []))
)]
pub async fn set_role(
    RequireAdmin(_principal): RequireAdmin,
    State(service): State<Arc<HandlerService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<SetRoleDto>,
) -> Result<Json<ApiResponse<HandlerResponseDto>>> {
    let handler = service.set_role(id, dto.role_id).await?;
    Ok(Json(ApiResponse::success(Some(handler.into()), None, None)))
}
