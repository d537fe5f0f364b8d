use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::principal::{CurrentHandler, CurrentUser, Principal, PrincipalKind};
use crate::features::roles::models::{Permission, RoleGrant};

#[derive(Debug, FromRow)]
struct UserPrincipalRow {
    id: Uuid,
    email: String,
    username: String,
    confirmed: bool,
    role_title: Option<String>,
    role_permissions: Option<i64>,
}

#[derive(Debug, FromRow)]
struct HandlerPrincipalRow {
    id: Uuid,
    email: String,
    name: String,
    confirmed: bool,
    approved: bool,
    role_title: Option<String>,
    role_permissions: Option<i64>,
}

fn role_grant(title: Option<String>, permissions: Option<i64>) -> Option<RoleGrant> {
    match (title, permissions) {
        (Some(title), Some(bits)) => Some(RoleGrant {
            title,
            permissions: Permission::from_bits(bits),
        }),
        _ => None,
    }
}

/// Resolves the principal referenced by a session, refreshing its last-seen time
pub struct PrincipalLoader {
    pool: PgPool,
}

impl PrincipalLoader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load the principal for `(kind, id)`; deleted or deactivated accounts resolve to `None`
    pub async fn load(&self, kind: PrincipalKind, id: Uuid) -> Result<Option<Principal>> {
        match kind {
            PrincipalKind::User => self.load_user(id).await,
            PrincipalKind::Handler => self.load_handler(id).await,
        }
    }

    async fn load_user(&self, id: Uuid) -> Result<Option<Principal>> {
        let row = sqlx::query_as::<_, UserPrincipalRow>(
            r#"
            WITH touched AS (
                UPDATE users SET last_seen = NOW()
                WHERE id = $1 AND active = TRUE
                RETURNING id, email, username, confirmed, role_id
            )
            SELECT t.id, t.email, t.username, t.confirmed,
                   r.title AS role_title, r.permissions AS role_permissions
            FROM touched t
            LEFT JOIN roles r ON r.id = t.role_id
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load session user: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(row.map(|r| {
            Principal::User(CurrentUser {
                id: r.id,
                email: r.email,
                username: r.username,
                confirmed: r.confirmed,
                role: role_grant(r.role_title, r.role_permissions),
            })
        }))
    }

    async fn load_handler(&self, id: Uuid) -> Result<Option<Principal>> {
        let row = sqlx::query_as::<_, HandlerPrincipalRow>(
            r#"
            WITH touched AS (
                UPDATE handlers SET last_seen = NOW()
                WHERE id = $1
                RETURNING id, email, name, confirmed, approved, role_id
            )
            SELECT t.id, t.email, t.name, t.confirmed, t.approved,
                   r.title AS role_title, r.permissions AS role_permissions
            FROM touched t
            LEFT JOIN roles r ON r.id = t.role_id
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load session handler: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(row.map(|r| {
            Principal::Handler(CurrentHandler {
                id: r.id,
                email: r.email,
                name: r.name,
                confirmed: r.confirmed,
                approved: r.approved,
                role: role_grant(r.role_title, r.role_permissions),
            })
        }))
    }
}
