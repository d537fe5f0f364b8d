use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::core::database::map_write_error;
use crate::core::error::{AppError, Result};
use crate::features::rewards::dtos::{CreateRewardDto, UpdateRewardDto};
use crate::features::rewards::models::{Reward, UserReward, REWARD_COLUMNS, USER_REWARD_SELECT};

const DUPLICATE_NAME: &str = "A reward with this name already exists";

/// Reward catalog and points accrual
pub struct RewardService {
    pool: PgPool,
}

impl RewardService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Catalog ordered by threshold
    pub async fn list(&self) -> Result<Vec<Reward>> {
        sqlx::query_as::<_, Reward>(&format!(
            "SELECT {} FROM rewards ORDER BY points_required, name",
            REWARD_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list rewards: {:?}", e);
            AppError::Database(e)
        })
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Reward> {
        sqlx::query_as::<_, Reward>(&format!(
            "SELECT {} FROM rewards WHERE id = $1",
            REWARD_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get reward: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound(format!("Reward with id {} not found", id)))
    }

    pub async fn create(&self, dto: CreateRewardDto) -> Result<Reward> {
        let reward = sqlx::query_as::<_, Reward>(&format!(
            "INSERT INTO rewards (name, points_required) VALUES ($1, $2) RETURNING {}",
            REWARD_COLUMNS
        ))
        .bind(dto.name.trim())
        .bind(dto.points_required)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Failed to create reward", DUPLICATE_NAME))?;

        tracing::info!(
            "Reward '{}' created at {} points",
            reward.name,
            reward.points_required
        );
        Ok(reward)
    }

    pub async fn update(&self, id: Uuid, dto: UpdateRewardDto) -> Result<Reward> {
        sqlx::query_as::<_, Reward>(&format!(
            "UPDATE rewards SET \
                name = COALESCE($2, name), \
                points_required = COALESCE($3, points_required), \
                updated_at = NOW() \
             WHERE id = $1 RETURNING {}",
            REWARD_COLUMNS
        ))
        .bind(id)
        .bind(dto.name.as_deref().map(str::trim))
        .bind(dto.points_required)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Failed to update reward", DUPLICATE_NAME))?
        .ok_or_else(|| AppError::NotFound(format!("Reward with id {} not found", id)))
    }

    /// Remove a reward; grants referencing it go with it
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM rewards WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete reward: {:?}", e);
                AppError::Database(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Reward with id {} not found", id)));
        }
        Ok(())
    }

    /// Rewards granted to a citizen, most recent first
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<UserReward>> {
        sqlx::query_as::<_, UserReward>(&format!(
            "{} WHERE ur.user_id = $1 ORDER BY ur.date_assigned DESC",
            USER_REWARD_SELECT
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list rewards for user {}: {:?}", user_id, e);
            AppError::Database(e)
        })
    }

    /// Grant a reward to a citizen by hand, re-activating a revoked grant
    pub async fn grant(&self, reward_id: Uuid, user_id: Uuid) -> Result<UserReward> {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO user_rewards (user_id, reward_id) VALUES ($1, $2) \
             ON CONFLICT (user_id, reward_id) \
             DO UPDATE SET is_assigned = TRUE, date_assigned = NOW() \
             RETURNING id",
        )
        .bind(user_id)
        .bind(reward_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Failed to grant reward", "Reward already granted"))?;

        self.get_user_reward(id).await
    }

    /// Mark a grant as withdrawn; automatic accrual will not re-grant it
    pub async fn revoke(&self, reward_id: Uuid, user_id: Uuid) -> Result<UserReward> {
        let id: Uuid = sqlx::query_scalar(
            "UPDATE user_rewards SET is_assigned = FALSE, date_assigned = NOW() \
             WHERE user_id = $1 AND reward_id = $2 RETURNING id",
        )
        .bind(user_id)
        .bind(reward_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to revoke reward: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound("This reward was never granted to the user".to_string()))?;

        self.get_user_reward(id).await
    }

    async fn get_user_reward(&self, id: Uuid) -> Result<UserReward> {
        sqlx::query_as::<_, UserReward>(&format!("{} WHERE ur.id = $1", USER_REWARD_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get user reward: {:?}", e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound(format!("User reward {} not found", id)))
    }

    /// Credit points to a citizen and grant every reward the new total reaches.
    ///
    /// Runs inside the caller's transaction. Returns the rewards granted by
    /// this call; tiers already held (or revoked) are left untouched.
    pub async fn award_points_tx(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        points: i32,
    ) -> Result<Vec<Reward>> {
        let total: i32 = sqlx::query_scalar(
            "UPDATE users SET points_acquired = points_acquired + $2, updated_at = NOW() \
             WHERE id = $1 RETURNING points_acquired",
        )
        .bind(user_id)
        .bind(points)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to award points: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", user_id)))?;

        let granted = sqlx::query_as::<_, Reward>(&format!(
            "WITH granted AS ( \
                INSERT INTO user_rewards (user_id, reward_id) \
                SELECT $1, id FROM rewards WHERE points_required <= $2 \
                ON CONFLICT (user_id, reward_id) DO NOTHING \
                RETURNING reward_id \
             ) \
             SELECT {} FROM rewards WHERE id IN (SELECT reward_id FROM granted) \
             ORDER BY points_required",
            REWARD_COLUMNS
        ))
        .bind(user_id)
        .bind(total)
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to grant rewards: {:?}", e);
            AppError::Database(e)
        })?;

        tracing::debug!(
            "User {} now has {} points ({} new rewards)",
            user_id,
            total,
            granted.len()
        );
        Ok(granted)
    }
}
