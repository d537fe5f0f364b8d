use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::Permission;

/// Database model for role
#[derive(Debug, Clone, FromRow)]
pub struct Role {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub is_default: bool,
    pub permissions: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Role {
    pub fn permission_mask(&self) -> Permission {
        Permission::from_bits(self.permissions)
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permission_mask().contains(permission)
    }

    /// No-op when the permission is already held
    pub fn add_permission(&mut self, permission: Permission) {
        if !self.has_permission(permission) {
            let mut mask = self.permission_mask();
            mask.insert(permission);
            self.permissions = mask.bits();
        }
    }

    /// No-op when the permission is not held
    pub fn remove_permission(&mut self, permission: Permission) {
        let mut mask = self.permission_mask();
        mask.remove(permission);
        self.permissions = mask.bits();
    }

    pub fn reset_permissions(&mut self) {
        self.permissions = Permission::NONE.bits();
    }
}

/// Title and permissions of the role attached to a principal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleGrant {
    pub title: String,
    pub permissions: Permission,
}

impl From<&Role> for RoleGrant {
    fn from(role: &Role) -> Self {
        Self {
            title: role.title.clone(),
            permissions: role.permission_mask(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLAGS: [Permission; 4] = [
        Permission::VISIT,
        Permission::MEMBER,
        Permission::MODERATE,
        Permission::ADMIN,
    ];

    fn role_with(bits: i64) -> Role {
        Role {
            id: Uuid::new_v4(),
            title: "Test".to_string(),
            description: None,
            is_default: false,
            permissions: bits,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_adding_held_permission_is_noop() {
        for bits in 0..16 {
            for flag in FLAGS {
                let mut role = role_with(bits);
                role.add_permission(flag);
                let once = role.permissions;
                role.add_permission(flag);
                assert_eq!(role.permissions, once);
                assert!(role.has_permission(flag));
            }
        }
    }

    #[test]
    fn test_removing_missing_permission_is_noop() {
        for bits in 0..16 {
            for flag in FLAGS {
                let mut role = role_with(bits);
                role.remove_permission(flag);
                let once = role.permissions;
                role.remove_permission(flag);
                assert_eq!(role.permissions, once);
                assert!(!role.has_permission(flag));
            }
        }
    }

    #[test]
    fn test_add_and_remove_leave_other_flags_untouched() {
        let mut role = role_with(Permission::VISIT.bits());
        role.add_permission(Permission::MODERATE);
        assert!(role.has_permission(Permission::VISIT));
        role.remove_permission(Permission::MODERATE);
        assert_eq!(role.permissions, Permission::VISIT.bits());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut role = role_with(15);
        role.reset_permissions();
        assert_eq!(role.permissions, 0);
        for flag in FLAGS {
            assert!(!role.has_permission(flag));
        }
    }
}
