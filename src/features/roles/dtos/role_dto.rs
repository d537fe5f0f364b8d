use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::roles::models::{Permission, Role};

/// Response DTO for role
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoleResponseDto {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub is_default: bool,
    /// Raw permission bitmask
    pub permissions: i64,
    /// Names of the permissions set in the mask
    pub permission_names: Vec<String>,
}

impl From<Role> for RoleResponseDto {
    fn from(r: Role) -> Self {
        let permission_names = r
            .permission_mask()
            .names()
            .into_iter()
            .map(String::from)
            .collect();
        Self {
            id: r.id,
            title: r.title,
            description: r.description,
            is_default: r.is_default,
            permissions: r.permissions,
            permission_names,
        }
    }
}

/// Request DTO for granting/revoking permissions on a role
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateRolePermissionsDto {
    /// Permission names to add (visit, member, moderate, admin)
    #[serde(default)]
    pub grant: Vec<String>,
    /// Permission names to remove
    #[serde(default)]
    pub revoke: Vec<String>,
}

impl UpdateRolePermissionsDto {
    /// Resolve names to flags, rejecting unknown names
    pub fn parse(&self) -> Result<(Vec<Permission>, Vec<Permission>)> {
        let resolve = |field: &'static str, names: &[String]| -> Result<Vec<Permission>> {
            names
                .iter()
                .map(|name| {
                    Permission::from_name(name).ok_or_else(|| {
                        AppError::field(field, format!("Unknown permission '{}'", name))
                    })
                })
                .collect()
        };

        let grant = resolve("grant", &self.grant)?;
        let revoke = resolve("revoke", &self.revoke)?;

        if grant.is_empty() && revoke.is_empty() {
            return Err(AppError::BadRequest(
                "At least one permission to grant or revoke is required".to_string(),
            ));
        }

        Ok((grant, revoke))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resolves_names() {
        let dto = UpdateRolePermissionsDto {
            grant: vec!["moderate".to_string()],
            revoke: vec!["ADMIN".to_string()],
        };
        let (grant, revoke) = dto.parse().unwrap();
        assert_eq!(grant, vec![Permission::MODERATE]);
        assert_eq!(revoke, vec![Permission::ADMIN]);
    }

    #[test]
    fn test_parse_rejects_unknown_and_empty() {
        let unknown = UpdateRolePermissionsDto {
            grant: vec!["root".to_string()],
            revoke: vec![],
        };
        assert!(matches!(unknown.parse(), Err(AppError::InvalidFields(_))));

        let empty = UpdateRolePermissionsDto::default();
        assert!(matches!(empty.parse(), Err(AppError::BadRequest(_))));
    }
}
