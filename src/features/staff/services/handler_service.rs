use sqlx::PgPool;
use uuid::Uuid;

use crate::core::database::map_write_error;
use crate::core::error::{AppError, Result};
use crate::features::staff::models::{Handler, NewHandler, HANDLER_COLUMNS};
use crate::shared::avatar::avatar_hash;
use crate::shared::types::PaginationQuery;

/// Persistence operations on staff accounts
pub struct HandlerService {
    pool: PgPool,
}

impl HandlerService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Handler>> {
        sqlx::query_as::<_, Handler>(&format!(
            "SELECT {} FROM handlers WHERE email = $1",
            HANDLER_COLUMNS
        ))
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to find handler by email: {:?}", e);
            AppError::Database(e)
        })
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Handler> {
        sqlx::query_as::<_, Handler>(&format!(
            "SELECT {} FROM handlers WHERE id = $1",
            HANDLER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get handler by id: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound(format!("Handler with id {} not found", id)))
    }

    pub async fn create(&self, new_handler: NewHandler) -> Result<Handler> {
        let email = new_handler.email.trim().to_lowercase();

        let handler = sqlx::query_as::<_, Handler>(&format!(
            r#"
            INSERT INTO handlers (name, handler_type, resource_availability, email, phone_number,
                                  password_hash, avatar_hash, role_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            HANDLER_COLUMNS
        ))
        .bind(&new_handler.name)
        .bind(&new_handler.handler_type)
        .bind(&new_handler.resource_availability)
        .bind(&email)
        .bind(&new_handler.phone_number)
        .bind(&new_handler.password_hash)
        .bind(avatar_hash(&email))
        .bind(new_handler.role_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Failed to create handler", "Email is already registered."))?;

        tracing::info!("Created handler {} ({})", handler.name, handler.id);
        Ok(handler)
    }

    pub async fn confirm(&self, id: Uuid) -> Result<Handler> {
        self.update_one(
            "UPDATE handlers SET confirmed = TRUE, updated_at = NOW() WHERE id = $1",
            id,
            "Failed to confirm handler",
        )
        .await
    }

    pub async fn set_password(&self, id: Uuid, password_hash: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE handlers SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update handler password: {:?}", e);
            AppError::Database(e)
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Handler with id {} not found", id)));
        }
        Ok(())
    }

    pub async fn change_email(&self, id: Uuid, email: &str) -> Result<Handler> {
        let email = email.trim().to_lowercase();

        sqlx::query_as::<_, Handler>(&format!(
            r#"
            UPDATE handlers SET email = $2, avatar_hash = $3, confirmed = FALSE, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            HANDLER_COLUMNS
        ))
        .bind(id)
        .bind(&email)
        .bind(avatar_hash(&email))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Failed to change handler email", "Email is already registered."))?
        .ok_or_else(|| AppError::NotFound(format!("Handler with id {} not found", id)))
    }

    /// Update the descriptive profile fields; `None` leaves a field unchanged
    pub async fn update_profile(
        &self,
        id: Uuid,
        name: Option<&str>,
        handler_type: Option<&str>,
        resource_availability: Option<&str>,
        phone_number: Option<&str>,
    ) -> Result<Handler> {
        sqlx::query_as::<_, Handler>(&format!(
            r#"
            UPDATE handlers SET
                name = COALESCE($2, name),
                handler_type = COALESCE($3, handler_type),
                resource_availability = COALESCE($4, resource_availability),
                phone_number = COALESCE($5, phone_number),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            HANDLER_COLUMNS
        ))
        .bind(id)
        .bind(name)
        .bind(handler_type)
        .bind(resource_availability)
        .bind(phone_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update handler profile: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound(format!("Handler with id {} not found", id)))
    }

    pub async fn set_image(&self, id: Uuid, image_file: Option<&str>) -> Result<Handler> {
        sqlx::query_as::<_, Handler>(&format!(
            "UPDATE handlers SET image_file = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            HANDLER_COLUMNS
        ))
        .bind(id)
        .bind(image_file)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update handler image: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound(format!("Handler with id {} not found", id)))
    }

    /// List handlers, optionally only those awaiting approval
    pub async fn list(
        &self,
        pending_only: bool,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<Handler>, i64)> {
        let handlers = sqlx::query_as::<_, Handler>(&format!(
            r#"
            SELECT {} FROM handlers
            WHERE NOT $1 OR approved = FALSE
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
            HANDLER_COLUMNS
        ))
        .bind(pending_only)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list handlers: {:?}", e);
            AppError::Database(e)
        })?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM handlers WHERE NOT $1 OR approved = FALSE",
        )
        .bind(pending_only)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count handlers: {:?}", e);
            AppError::Database(e)
        })?;

        Ok((handlers, total))
    }

    pub async fn set_approved(&self, id: Uuid, approved: bool) -> Result<Handler> {
        let handler = sqlx::query_as::<_, Handler>(&format!(
            "UPDATE handlers SET approved = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            HANDLER_COLUMNS
        ))
        .bind(id)
        .bind(approved)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update handler approval: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound(format!("Handler with id {} not found", id)))?;

        tracing::info!("Handler {} approved = {}", handler.id, approved);
        Ok(handler)
    }

    pub async fn set_role(&self, id: Uuid, role_id: Uuid) -> Result<Handler> {
        sqlx::query_as::<_, Handler>(&format!(
            "UPDATE handlers SET role_id = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            HANDLER_COLUMNS
        ))
        .bind(id)
        .bind(role_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Failed to assign handler role", "Role assignment conflict"))?
        .ok_or_else(|| AppError::NotFound(format!("Handler with id {} not found", id)))
    }

    async fn update_one(&self, sql: &str, id: Uuid, context: &str) -> Result<Handler> {
        sqlx::query_as::<_, Handler>(&format!("{} RETURNING {}", sql, HANDLER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("{}: {:?}", context, e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound(format!("Handler with id {} not found", id)))
    }
}
