use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for a reward tier
#[derive(Debug, Clone, FromRow)]
pub struct Reward {
    pub id: Uuid,
    pub name: String,
    pub points_required: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const REWARD_COLUMNS: &str = "id, name, points_required, created_at, updated_at";

/// A reward granted to a citizen, joined with the reward it refers to
#[derive(Debug, Clone, FromRow)]
pub struct UserReward {
    pub id: Uuid,
    pub user_id: Uuid,
    pub reward_id: Uuid,
    pub reward_name: String,
    pub points_required: i32,
    pub is_assigned: bool,
    pub date_assigned: DateTime<Utc>,
}

pub const USER_REWARD_SELECT: &str = "SELECT ur.id, ur.user_id, ur.reward_id, r.name AS reward_name, \
     r.points_required, ur.is_assigned, ur.date_assigned \
     FROM user_rewards ur JOIN rewards r ON r.id = ur.reward_id";
