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
use crate::features::auth::{RequireAuthenticated, RequireMember};
use crate::features::reports::dtos::{CommentResponseDto, CreateCommentDto};
use crate::features::reports::services::CommentService;
use crate::shared::types::{ApiResponse, Meta};

#[utoipa::path(
    get,
    path = "/api/reports/{id}/comments",
    params(("id" = Uuid, Path, description = "Report ID")),
    responses(
        (status = 200, description = "Comments, oldest first", body = ApiResponse<Vec<CommentResponseDto>>),
        (status = 404, description = "Report not found")
    ),
    tag = "comments",
    security(("session_cookie" = []))
)]
pub async fn list_comments(
    RequireAuthenticated(_principal): RequireAuthenticated,
    State(service): State<Arc<CommentService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<CommentResponseDto>>>> {
    let comments: Vec<CommentResponseDto> =
        service.list(id).await?.into_iter().map(Into::into).collect();
    let total = comments.len() as i64;
    Ok(Json(ApiResponse::success(
        Some(comments),
        None,
        Some(Meta { total }),
    )))
}

#[utoipa::path(
    post,
    path = "/api/reports/{id}/comments",
    params(("id" = Uuid, Path, description = "Report ID")),
    request_body = CreateCommentDto,
    responses(
        (status = 201, description = "Comment posted", body = ApiResponse<CommentResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Report not found")
    ),
    tag = "comments",
    security(("session_cookie" = []))
)]
pub async fn create_comment(
    RequireMember(user): RequireMember,
    State(service): State<Arc<CommentService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<CreateCommentDto>,
) -> Result<(StatusCode, Json<ApiResponse<CommentResponseDto>>)> {
    dto.validate()?;

    let comment = service.create(id, user.id, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(comment.into()),
            Some("Your comment has been posted.".to_string()),
            None,
        )),
    ))
}
