use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Bitmask of permissions held by a role.
///
/// A single flag (`Permission::MODERATE`) and a combination of flags share
/// the same type, so a role's mask can be tested against either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct Permission(i64);

impl Permission {
    /// Browse public content
    pub const VISIT: Permission = Permission(1);
    /// Submit reports and comments
    pub const MEMBER: Permission = Permission(2);
    /// Verify and handle reports
    pub const MODERATE: Permission = Permission(4);
    /// Manage accounts, roles and catalogs
    pub const ADMIN: Permission = Permission(8);

    pub const NONE: Permission = Permission(0);

    const NAMED: [(Permission, &'static str); 4] = [
        (Self::VISIT, "visit"),
        (Self::MEMBER, "member"),
        (Self::MODERATE, "moderate"),
        (Self::ADMIN, "admin"),
    ];

    pub const fn from_bits(bits: i64) -> Self {
        Permission(bits)
    }

    pub const fn bits(self) -> i64 {
        self.0
    }

    /// Every bit of `permission` is set in `self`
    pub fn contains(self, permission: Permission) -> bool {
        self.0 & permission.0 == permission.0
    }

    /// Union of two masks
    pub const fn union(self, other: Permission) -> Permission {
        Permission(self.0 | other.0)
    }

    pub fn insert(&mut self, permission: Permission) {
        self.0 |= permission.0;
    }

    pub fn remove(&mut self, permission: Permission) {
        self.0 &= !permission.0;
    }

    /// Lower-case names of the flags set in this mask
    pub fn names(self) -> Vec<&'static str> {
        Self::NAMED
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }

    /// Parse a single flag name as produced by [`Permission::names`]
    pub fn from_name(name: &str) -> Option<Permission> {
        Self::NAMED
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name.trim()))
            .map(|(flag, _)| *flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_single_and_combined_flags() {
        let reporter = Permission::VISIT.union(Permission::MEMBER);
        assert!(reporter.contains(Permission::VISIT));
        assert!(reporter.contains(Permission::MEMBER));
        assert!(!reporter.contains(Permission::MODERATE));
        assert!(reporter.contains(Permission::VISIT.union(Permission::MEMBER)));
        assert!(!reporter.contains(Permission::MEMBER.union(Permission::ADMIN)));
    }

    #[test]
    fn test_names_and_parsing() {
        let mask = Permission::VISIT.union(Permission::ADMIN);
        assert_eq!(mask.names(), vec!["visit", "admin"]);
        assert_eq!(Permission::from_name("Moderate"), Some(Permission::MODERATE));
        assert_eq!(Permission::from_name("superuser"), None);
    }

    #[test]
    fn test_remove_only_clears_requested_bits() {
        let mut mask = Permission::from_bits(15);
        mask.remove(Permission::MODERATE);
        assert_eq!(mask.bits(), 11);
    }
}
