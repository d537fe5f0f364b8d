use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::roles::dtos::{RoleResponseDto, UpdateRolePermissionsDto};
use crate::features::roles::models::{Permission, Role};
use crate::shared::constants::{ROLE_ADMINISTRATOR, ROLE_GUEST, ROLE_HANDLER, ROLE_REPORTER};

const ROLE_COLUMNS: &str =
    "id, title, description, is_default, permissions, created_at, updated_at";

/// Role catalog asserted at startup: (title, description, permissions)
const ROLE_CATALOG: [(&str, &str, &[Permission]); 4] = [
    (
        ROLE_GUEST,
        "Unconfirmed citizen account",
        &[Permission::VISIT],
    ),
    (
        ROLE_REPORTER,
        "Confirmed citizen able to submit reports",
        &[Permission::VISIT, Permission::MEMBER],
    ),
    (
        ROLE_HANDLER,
        "Municipal staff handling reports",
        &[Permission::VISIT, Permission::MEMBER, Permission::MODERATE],
    ),
    (
        ROLE_ADMINISTRATOR,
        "Full administrative access",
        &[
            Permission::VISIT,
            Permission::MEMBER,
            Permission::MODERATE,
            Permission::ADMIN,
        ],
    ),
];

/// Service for role catalog operations
pub struct RoleService {
    pool: PgPool,
}

impl RoleService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Bring the stored catalog in line with the built-in role definitions.
    ///
    /// Missing roles are created, existing ones get their permissions reset and
    /// re-granted, and `Guest` becomes the only default role.
    pub async fn sync_catalog(&self) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            tracing::error!("Failed to begin role sync transaction: {:?}", e);
            AppError::Database(e)
        })?;

        // Clear the flag first so the partial unique index never sees two defaults
        sqlx::query("UPDATE roles SET is_default = FALSE WHERE is_default AND title <> $1")
            .bind(ROLE_GUEST)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!("Failed to clear default role flag: {:?}", e);
                AppError::Database(e)
            })?;

        for (title, description, grants) in ROLE_CATALOG {
            let mut role = match Self::find_by_title_tx(&mut tx, title).await? {
                Some(role) => role,
                None => Self::insert_tx(&mut tx, title, description).await?,
            };

            role.reset_permissions();
            for permission in grants {
                role.add_permission(*permission);
            }

            sqlx::query(
                "UPDATE roles SET permissions = $2, is_default = $3, updated_at = NOW() WHERE id = $1",
            )
            .bind(role.id)
            .bind(role.permissions)
            .bind(title == ROLE_GUEST)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!("Failed to sync role {}: {:?}", title, e);
                AppError::Database(e)
            })?;
        }

        tx.commit().await.map_err(|e| {
            tracing::error!("Failed to commit role sync: {:?}", e);
            AppError::Database(e)
        })?;

        tracing::info!("Role catalog synchronized ({} roles)", ROLE_CATALOG.len());
        Ok(())
    }

    async fn find_by_title_tx(
        tx: &mut Transaction<'_, Postgres>,
        title: &str,
    ) -> Result<Option<Role>> {
        sqlx::query_as::<_, Role>(&format!(
            "SELECT {} FROM roles WHERE title = $1",
            ROLE_COLUMNS
        ))
        .bind(title)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch role {}: {:?}", title, e);
            AppError::Database(e)
        })
    }

    async fn insert_tx(
        tx: &mut Transaction<'_, Postgres>,
        title: &str,
        description: &str,
    ) -> Result<Role> {
        sqlx::query_as::<_, Role>(&format!(
            "INSERT INTO roles (title, description) VALUES ($1, $2) RETURNING {}",
            ROLE_COLUMNS
        ))
        .bind(title)
        .bind(description)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert role {}: {:?}", title, e);
            AppError::Database(e)
        })
    }

    /// List all roles ordered by permission level
    pub async fn list(&self) -> Result<Vec<RoleResponseDto>> {
        let roles = sqlx::query_as::<_, Role>(&format!(
            "SELECT {} FROM roles ORDER BY permissions, title",
            ROLE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list roles: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(roles.into_iter().map(Into::into).collect())
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Role> {
        sqlx::query_as::<_, Role>(&format!("SELECT {} FROM roles WHERE id = $1", ROLE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get role by id: {:?}", e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound(format!("Role with id {} not found", id)))
    }

    pub async fn get_by_title(&self, title: &str) -> Result<Role> {
        sqlx::query_as::<_, Role>(&format!(
            "SELECT {} FROM roles WHERE title = $1",
            ROLE_COLUMNS
        ))
        .bind(title)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get role by title: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound(format!("Role '{}' not found", title)))
    }

    /// The role given to new citizens when none is specified
    pub async fn get_default(&self) -> Result<Role> {
        sqlx::query_as::<_, Role>(&format!(
            "SELECT {} FROM roles WHERE is_default = TRUE",
            ROLE_COLUMNS
        ))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get default role: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::Internal("No default role configured".to_string()))
    }

    /// Grant and revoke permissions on a role
    pub async fn update_permissions(
        &self,
        id: Uuid,
        dto: UpdateRolePermissionsDto,
    ) -> Result<RoleResponseDto> {
        let (grant, revoke) = dto.parse()?;
        let mut role = self.get_by_id(id).await?;

        for permission in grant {
            role.add_permission(permission);
        }
        for permission in revoke {
            role.remove_permission(permission);
        }

        let role = sqlx::query_as::<_, Role>(&format!(
            "UPDATE roles SET permissions = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            ROLE_COLUMNS
        ))
        .bind(role.id)
        .bind(role.permissions)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update role permissions: {:?}", e);
            AppError::Database(e)
        })?;

        tracing::info!(
            "Role {} permissions updated to {:?}",
            role.title,
            role.permission_mask().names()
        );
        Ok(role.into())
    }
}
