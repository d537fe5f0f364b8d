//! Authenticated actors.
//!
//! A request is made by a citizen (`User`), a municipal staff member
//! (`Handler`) or nobody (`Anonymous`). Permission checks go through the role
//! loaded together with the principal; a principal without a role holds no
//! permissions.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::roles::models::{Permission, RoleGrant};
use crate::shared::constants::{HANDLER_DASHBOARD_PATH, USER_DASHBOARD_PATH};

/// Discriminator stored in the session to pick the principal table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    User,
    Handler,
}

impl PrincipalKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PrincipalKind::User => "user",
            PrincipalKind::Handler => "handler",
        }
    }

    pub fn login_path(self) -> &'static str {
        match self {
            PrincipalKind::User => "/api/auth/user/login",
            PrincipalKind::Handler => "/api/auth/handler/login",
        }
    }

    pub fn dashboard_path(self) -> &'static str {
        match self {
            PrincipalKind::User => USER_DASHBOARD_PATH,
            PrincipalKind::Handler => HANDLER_DASHBOARD_PATH,
        }
    }
}

impl std::fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub confirmed: bool,
    pub role: Option<RoleGrant>,
}

#[derive(Debug, Clone)]
pub struct CurrentHandler {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub confirmed: bool,
    pub approved: bool,
    pub role: Option<RoleGrant>,
}

#[derive(Debug, Clone)]
pub enum Principal {
    User(CurrentUser),
    Handler(CurrentHandler),
    Anonymous,
}

impl Principal {
    pub fn kind(&self) -> Option<PrincipalKind> {
        match self {
            Principal::User(_) => Some(PrincipalKind::User),
            Principal::Handler(_) => Some(PrincipalKind::Handler),
            Principal::Anonymous => None,
        }
    }

    pub fn id(&self) -> Option<Uuid> {
        match self {
            Principal::User(u) => Some(u.id),
            Principal::Handler(h) => Some(h.id),
            Principal::Anonymous => None,
        }
    }

    pub fn email(&self) -> Option<&str> {
        match self {
            Principal::User(u) => Some(&u.email),
            Principal::Handler(h) => Some(&h.email),
            Principal::Anonymous => None,
        }
    }

    pub fn role(&self) -> Option<&RoleGrant> {
        match self {
            Principal::User(u) => u.role.as_ref(),
            Principal::Handler(h) => h.role.as_ref(),
            Principal::Anonymous => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Principal::Anonymous)
    }

    pub fn is_confirmed(&self) -> bool {
        match self {
            Principal::User(u) => u.confirmed,
            Principal::Handler(h) => h.confirmed,
            Principal::Anonymous => false,
        }
    }

    pub fn can(&self, permission: Permission) -> bool {
        self.role()
            .is_some_and(|role| role.permissions.contains(permission))
    }

    pub fn is_administrator(&self) -> bool {
        self.can(Permission::ADMIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant(title: &str, bits: i64) -> Option<RoleGrant> {
        Some(RoleGrant {
            title: title.to_string(),
            permissions: Permission::from_bits(bits),
        })
    }

    fn user(role: Option<RoleGrant>) -> Principal {
        Principal::User(CurrentUser {
            id: Uuid::new_v4(),
            email: "a@x.com".to_string(),
            username: "alice".to_string(),
            confirmed: true,
            role,
        })
    }

    #[test]
    fn test_anonymous_has_no_permissions() {
        let anonymous = Principal::Anonymous;
        assert!(!anonymous.can(Permission::VISIT));
        assert!(!anonymous.is_administrator());
        assert!(!anonymous.is_authenticated());
        assert_eq!(anonymous.kind(), None);
    }

    #[test]
    fn test_missing_role_fails_closed() {
        let orphan = user(None);
        assert!(!orphan.can(Permission::VISIT));
        assert!(!orphan.is_administrator());
    }

    #[test]
    fn test_reporter_permissions() {
        let reporter = user(grant("Reporter", 3));
        assert!(reporter.can(Permission::VISIT));
        assert!(reporter.can(Permission::MEMBER));
        assert!(!reporter.can(Permission::MODERATE));
        assert!(!reporter.is_administrator());
        assert_eq!(reporter.kind(), Some(PrincipalKind::User));
    }

    #[test]
    fn test_administrator_handler() {
        let handler = Principal::Handler(CurrentHandler {
            id: Uuid::new_v4(),
            email: "h@x.com".to_string(),
            name: "County Crew".to_string(),
            confirmed: true,
            approved: true,
            role: grant("Administrator", 15),
        });
        assert!(handler.is_administrator());
        assert!(handler.can(Permission::MODERATE));
        assert_eq!(handler.kind(), Some(PrincipalKind::Handler));
    }

    #[test]
    fn test_kind_paths() {
        assert_eq!(PrincipalKind::User.login_path(), "/api/auth/user/login");
        assert_eq!(PrincipalKind::Handler.login_path(), "/api/auth/handler/login");
    }
}
