use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::rewards::models::{Reward, UserReward};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RewardResponseDto {
    pub id: Uuid,
    pub name: String,
    pub points_required: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Reward> for RewardResponseDto {
    fn from(r: Reward) -> Self {
        Self {
            id: r.id,
            name: r.name,
            points_required: r.points_required,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserRewardResponseDto {
    pub id: Uuid,
    pub reward_id: Uuid,
    pub name: String,
    pub points_required: i32,
    pub is_assigned: bool,
    pub date_assigned: DateTime<Utc>,
}

impl From<UserReward> for UserRewardResponseDto {
    fn from(ur: UserReward) -> Self {
        Self {
            id: ur.id,
            reward_id: ur.reward_id,
            name: ur.reward_name,
            points_required: ur.points_required,
            is_assigned: ur.is_assigned,
            date_assigned: ur.date_assigned,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateRewardDto {
    #[validate(
        length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"),
        custom(function = "crate::shared::validation::not_blank")
    )]
    pub name: String,

    #[validate(range(min = 0, message = "Points required cannot be negative"))]
    pub points_required: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateRewardDto {
    #[validate(
        length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"),
        custom(function = "crate::shared::validation::not_blank")
    )]
    pub name: Option<String>,

    #[validate(range(min = 0, message = "Points required cannot be negative"))]
    pub points_required: Option<i32>,
}

/// Admin request to grant a reward to a citizen regardless of points
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GrantRewardDto {
    pub user_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_reward_validation() {
        let ok = CreateRewardDto {
            name: "Bronze Collector".to_string(),
            points_required: 50,
        };
        assert!(ok.validate().is_ok());

        let negative = CreateRewardDto {
            name: "Broken".to_string(),
            points_required: -1,
        };
        assert!(negative.validate().is_err());

        let blank = CreateRewardDto {
            name: "   ".to_string(),
            points_required: 10,
        };
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_update_reward_allows_partial_input() {
        let dto = UpdateRewardDto {
            name: None,
            points_required: Some(100),
        };
        assert!(dto.validate().is_ok());
    }
}
