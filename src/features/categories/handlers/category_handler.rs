use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::auth::RequireAdmin;
use crate::features::categories::dtos::{
    CategoryResponseDto, CreateCategoryDto, UpdateCategoryDto,
};
use crate::features::categories::services::CategoryService;
use crate::shared::types::{ApiResponse, Meta};

/// List all categories
#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "List of categories", body = ApiResponse<Vec<CategoryResponseDto>>),
    ),
    tag = "categories"
)]
pub async fn list_categories(
    State(service): State<Arc<CategoryService>>,
) -> Result<Json<ApiResponse<Vec<CategoryResponseDto>>>> {
    let categories: Vec<CategoryResponseDto> = service
        .list()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let total = categories.len() as i64;
    Ok(Json(ApiResponse::success(
        Some(categories),
        None,
        Some(Meta { total }),
    )))
}

#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category found", body = ApiResponse<CategoryResponseDto>),
        (status = 404, description = "Category not found")
    ),
    tag = "categories"
)]
pub async fn get_category(
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CategoryResponseDto>>> {
    let category = service.get_by_id(id).await?;
    Ok(Json(ApiResponse::success(Some(category.into()), None, None)))
}

#[utoipa::path(
    post,
    path = "/api/admin/categories",
    request_body = CreateCategoryDto,
    responses(
        (status = 201, description = "Category created", body = ApiResponse<CategoryResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Administrator access required"),
        (status = 409, description = "Duplicate name")
    ),
    tag = "categories",
    security(("session_cookie" = []))
)]
pub async fn create_category(
    RequireAdmin(_principal): RequireAdmin,
    State(service): State<Arc<CategoryService>>,
    AppJson(dto): AppJson<CreateCategoryDto>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryResponseDto>>)> {
    dto.validate()?;

    let category = service.create(dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(category.into()),
            Some("Category created.".to_string()),
            None,
        )),
    ))
}

#[utoipa::path(
    put,
    path = "/api/admin/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = UpdateCategoryDto,
    responses(
        (status = 200, description = "Category updated", body = ApiResponse<CategoryResponseDto>),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Duplicate name")
    ),
    tag = "categories",
    security(("session_cookie" = []))
)]
pub async fn update_category(
    RequireAdmin(_principal): RequireAdmin,
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateCategoryDto>,
) -> Result<Json<ApiResponse<CategoryResponseDto>>> {
    dto.validate()?;

    let category = service.update(id, dto).await?;
    Ok(Json(ApiResponse::success(
        Some(category.into()),
        Some("Category updated.".to_string()),
        None,
    )))
}

#[utoipa::path(
    delete,
    path = "/api/admin/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category deleted"),
        (status = 404, description = "Category not found")
    ),
    tag = "categories",
    security(("session_cookie" = []))
)]
pub async fn delete_category(
    RequireAdmin(_principal): RequireAdmin,
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(id).await?;
    Ok(Json(ApiResponse::<()>::message("Category deleted.")))
}
