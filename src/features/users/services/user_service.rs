use sqlx::PgPool;
use uuid::Uuid;

use crate::core::database::map_write_error;
use crate::core::error::{AppError, Result};
use crate::features::users::models::{NewUser, User, USER_COLUMNS};
use crate::shared::avatar::avatar_hash;
use crate::shared::constants::{ROLE_GUEST, ROLE_REPORTER, STARTING_POINTS};
use crate::shared::types::PaginationQuery;

/// Persistence operations on citizen accounts
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to find user by email: {:?}", e);
            AppError::Database(e)
        })
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to check username: {:?}", e);
                AppError::Database(e)
            })
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<User> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get user by id: {:?}", e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    pub async fn create(&self, new_user: NewUser) -> Result<User> {
        let email = new_user.email.trim().to_lowercase();

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, username, phone_number, password_hash, confirmed,
                               avatar_hash, points_acquired, role_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&email)
        .bind(&new_user.username)
        .bind(&new_user.phone_number)
        .bind(&new_user.password_hash)
        .bind(new_user.confirmed)
        .bind(avatar_hash(&email))
        .bind(STARTING_POINTS)
        .bind(new_user.role_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_write_error(
                e,
                "Failed to create user",
                "Email or username is already registered",
            )
        })?;

        tracing::info!("Created user {} ({})", user.username, user.id);
        Ok(user)
    }

    /// Mark the account confirmed; a `Guest` becomes a `Reporter`
    pub async fn confirm(&self, id: Uuid) -> Result<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET
                confirmed = TRUE,
                role_id = CASE
                    WHEN role_id IS NULL OR role_id = (SELECT id FROM roles WHERE title = $2)
                    THEN (SELECT id FROM roles WHERE title = $3)
                    ELSE role_id
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(id)
        .bind(ROLE_GUEST)
        .bind(ROLE_REPORTER)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to confirm user: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    pub async fn set_password(&self, id: Uuid, password_hash: &str) -> Result<()> {
        self.execute(
            "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1",
            id,
            password_hash,
            "Failed to update user password",
        )
        .await
    }

    /// Replace the e-mail address; the new address has to be confirmed again
    pub async fn change_email(&self, id: Uuid, email: &str) -> Result<User> {
        let email = email.trim().to_lowercase();

        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET email = $2, avatar_hash = $3, confirmed = FALSE, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(id)
        .bind(&email)
        .bind(avatar_hash(&email))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Failed to change user email", "Email is already registered."))?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    pub async fn update_phone(&self, id: Uuid, phone_number: &str) -> Result<User> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET phone_number = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(phone_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update phone number: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    pub async fn set_image(&self, id: Uuid, image_file: Option<&str>) -> Result<User> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET image_file = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(image_file)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update profile image: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// List citizens, newest first
    pub async fn list(&self, pagination: &PaginationQuery) -> Result<(Vec<User>, i64)> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2",
            USER_COLUMNS
        ))
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list users: {:?}", e);
            AppError::Database(e)
        })?;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count users: {:?}", e);
                AppError::Database(e)
            })?;

        Ok((users, total))
    }

    pub async fn set_active(&self, id: Uuid, active: bool) -> Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET active = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update user status: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))?;

        tracing::info!("User {} active = {}", user.id, active);
        Ok(user)
    }

    pub async fn set_role(&self, id: Uuid, role_id: Uuid) -> Result<User> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET role_id = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(role_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Failed to assign user role", "Role assignment conflict"))?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    async fn execute(&self, sql: &str, id: Uuid, value: &str, context: &str) -> Result<()> {
        let result = sqlx::query(sql)
            .bind(id)
            .bind(value)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("{}: {:?}", context, e);
                AppError::Database(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User with id {} not found", id)));
        }
        Ok(())
    }
}
