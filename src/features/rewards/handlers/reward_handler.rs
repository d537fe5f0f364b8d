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
use crate::features::auth::{RequireAdmin, RequireUser};
use crate::features::rewards::dtos::{
    CreateRewardDto, GrantRewardDto, RewardResponseDto, UpdateRewardDto, UserRewardResponseDto,
};
use crate::features::rewards::services::RewardService;
use crate::shared::types::{ApiResponse, Meta};

/// List the reward catalog
#[utoipa::path(
    get,
    path = "/api/rewards",
    responses(
        (status = 200, description = "Reward tiers ordered by points required", body = ApiResponse<Vec<RewardResponseDto>>)
    ),
    tag = "rewards"
)]
pub async fn list_rewards(
    State(service): State<Arc<RewardService>>,
) -> Result<Json<ApiResponse<Vec<RewardResponseDto>>>> {
    let rewards: Vec<RewardResponseDto> = service
        .list()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let total = rewards.len() as i64;
    Ok(Json(ApiResponse::success(
        Some(rewards),
        None,
        Some(Meta { total }),
    )))
}

/// Rewards earned by the logged-in citizen
#[utoipa::path(
    get,
    path = "/api/rewards/mine",
    responses(
        (status = 200, description = "Rewards granted to the caller", body = ApiResponse<Vec<UserRewardResponseDto>>),
        (status = 303, description = "Login required")
    ),
    tag = "rewards",
    security(("session_cookie" = []))
)]
pub async fn my_rewards(
    RequireUser(user): RequireUser,
    State(service): State<Arc<RewardService>>,
) -> Result<Json<ApiResponse<Vec<UserRewardResponseDto>>>> {
    let rewards = service
        .list_for_user(user.id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(ApiResponse::success(Some(rewards), None, None)))
}

#[utoipa::path(
    post,
    path = "/api/admin/rewards",
    request_body = CreateRewardDto,
    responses(
        (status = 201, description = "Reward created", body = ApiResponse<RewardResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Administrator access required"),
        (status = 409, description = "Duplicate name")
    ),
    tag = "rewards",
    security(("session_cookie" = []))
)]
pub async fn create_reward(
    RequireAdmin(_principal): RequireAdmin,
    State(service): State<Arc<RewardService>>,
    AppJson(dto): AppJson<CreateRewardDto>,
) -> Result<(StatusCode, Json<ApiResponse<RewardResponseDto>>)> {
    dto.validate()?;
    let reward = service.create(dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(reward.into()),
            Some("Reward created.".to_string()),
            None,
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/admin/rewards/{id}",
    params(("id" = Uuid, Path, description = "Reward ID")),
    responses(
        (status = 200, description = "Reward", body = ApiResponse<RewardResponseDto>),
        (status = 404, description = "Reward not found")
    ),
    tag = "rewards",
    security(("session_cookie" = []))
)]
pub async fn get_reward(
    RequireAdmin(_principal): RequireAdmin,
    State(service): State<Arc<RewardService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RewardResponseDto>>> {
    let reward = service.get_by_id(id).await?;
    Ok(Json(ApiResponse::success(Some(reward.into()), None, None)))
}

#[utoipa::path(
    put,
    path = "/api/admin/rewards/{id}",
    params(("id" = Uuid, Path, description = "Reward ID")),
    request_body = UpdateRewardDto,
    responses(
        (status = 200, description = "Reward updated", body = ApiResponse<RewardResponseDto>),
        (status = 404, description = "Reward not found"),
        (status = 409, description = "Duplicate name")
    ),
    tag = "rewards",
    security(("session_cookie" = []))
)]
pub async fn update_reward(
    RequireAdmin(_principal): RequireAdmin,
    State(service): State<Arc<RewardService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateRewardDto>,
) -> Result<Json<ApiResponse<RewardResponseDto>>> {
    dto.validate()?;
    let reward = service.update(id, dto).await?;
    Ok(Json(ApiResponse::success(
        Some(reward.into()),
        Some("Reward updated.".to_string()),
        None,
    )))
}

#[utoipa::path(
    delete,
    path = "/api/admin/rewards/{id}",
    params(("id" = Uuid, Path, description = "Reward ID")),
    responses(
        (status = 200, description = "Reward deleted"),
        (status = 404, description = "Reward not found")
    ),
    tag = "rewards",
    security(("session_cookie" = []))
)]
pub async fn delete_reward(
    RequireAdmin(admin): RequireAdmin,
    State(service): State<Arc<RewardService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(id).await?;
    tracing::info!("Reward {} deleted by {:?}", id, admin.id());
    Ok(Json(ApiResponse::<()>::message("Reward deleted.")))
}

/// Grant a reward to a citizen outside the points threshold
#[utoipa::path(
    post,
    path = "/api/admin/rewards/{id}/grant",
    params(("id" = Uuid, Path, description = "Reward ID")),
    request_body = GrantRewardDto,
    responses(
        (status = 200, description = "Reward granted", body = ApiResponse<UserRewardResponseDto>),
        (status = 400, description = "Unknown user or reward")
    ),
    tag = "rewards",
    security(("session_cookie" = []))
)]
pub async fn grant_reward(
    RequireAdmin(_principal): RequireAdmin,
    State(service): State<Arc<RewardService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<GrantRewardDto>,
) -> Result<Json<ApiResponse<UserRewardResponseDto>>> {
    let granted = service.grant(id, dto.user_id).await?;
    Ok(Json(ApiResponse::success(
        Some(granted.into()),
        Some("Reward granted.".to_string()),
        None,
    )))
}

#[utoipa::path(
    post,
    path = "/api/admin/rewards/{id}/revoke",
    params(("id" = Uuid, Path, description = "Reward ID")),
    request_body = GrantRewardDto,
    responses(
        (status = 200, description = "Reward revoked", body = ApiResponse<UserRewardResponseDto>),
        (status = 404, description = "Reward was never granted to this user")
    ),
    tag = "rewards",
    security(("session_cookie" = []))
)]
pub async fn revoke_reward(
    RequireAdmin(_principal): RequireAdmin,
    State(service): State<Arc<RewardService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<GrantRewardDto>,
) -> Result<Json<ApiResponse<UserRewardResponseDto>>> {
    let revoked = service.revoke(id, dto.user_id).await?;
    Ok(Json(ApiResponse::success(
        Some(revoked.into()),
        Some("Reward revoked.".to_string()),
        None,
    )))
}

/// Rewards held by any citizen
#[utoipa::path(
    get,
    path = "/api/admin/users/{id}/rewards",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Rewards granted to the user", body = ApiResponse<Vec<UserRewardResponseDto>>)
    ),
    tag = "rewards",
    security(("session_cookie" = []))
)]
pub async fn user_rewards(
    RequireAdmin(_principal): RequireAdmin,
    State(service): State<Arc<RewardService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<UserRewardResponseDto>>>> {
    let rewards = service
        .list_for_user(id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(ApiResponse::success(Some(rewards), None, None)))
}
