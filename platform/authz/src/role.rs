use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Permission;

#[derive(Debug, Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

/// Named bundle of permissions assignable to a subject.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    Manager,
    User,
    Guest,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::SuperAdmin,
        Role::Admin,
        Role::Manager,
        Role::User,
        Role::Guest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::User => "user",
            Role::Guest => "guest",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == value)
            .ok_or_else(|| UnknownRole(value.to_string()))
    }
}

/// Static role → permission expansion table.
///
/// The single source of truth for deriving default permissions from roles.
/// Only role-assignment flows consult it; the route predicate reads the
/// subject's explicit permission set instead.
pub fn role_permissions(role: Role) -> &'static [Permission] {
    match role {
        Role::SuperAdmin => &Permission::ALL,
        Role::Admin => &[
            Permission::UserView,
            Permission::UserCreate,
            Permission::UserEdit,
            Permission::UserDelete,
            Permission::RoleView,
            Permission::SystemConfig,
            Permission::AnalyticsView,
        ],
        Role::Manager => &[
            Permission::UserView,
            Permission::UserCreate,
            Permission::UserEdit,
            Permission::AnalyticsView,
        ],
        Role::User => &[Permission::UserView],
        Role::Guest => &[],
    }
}

/// Deduplicating union of the default permissions for a set of roles.
pub fn permissions_for_roles<'a, I>(roles: I) -> HashSet<Permission>
where
    I: IntoIterator<Item = &'a Role>,
{
    let mut permissions = HashSet::new();
    for role in roles {
        permissions.extend(role_permissions(*role).iter().copied());
    }
    permissions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_role_has_an_entry() {
        // The map must be total, even if the entry is empty.
        for role in Role::ALL {
            let _ = role_permissions(role);
        }
    }

    #[test]
    fn super_admin_holds_the_full_set() {
        let perms = role_permissions(Role::SuperAdmin);
        assert_eq!(perms.len(), Permission::ALL.len());
    }

    #[test]
    fn guest_holds_nothing() {
        assert!(role_permissions(Role::Guest).is_empty());
    }

    #[test]
    fn union_deduplicates_across_roles() {
        // Admin and manager overlap on user:view, user:create, user:edit
        // and analytics:view; the union must not double-count them.
        let roles = [Role::Admin, Role::Manager];
        let union = permissions_for_roles(&roles);
        assert_eq!(union.len(), role_permissions(Role::Admin).len());
        assert!(union.contains(&Permission::UserEdit));
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&Role::SuperAdmin).expect("serialize");
        assert_eq!(json, "\"super_admin\"");
    }
}
