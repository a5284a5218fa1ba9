use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{Permission, Role};

/// The current actor's authorization state.
///
/// Roles and permissions are independently settable: permissions usually come
/// from the role expansion table at login, but explicit overrides win and are
/// never re-derived on read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub is_authenticated: bool,
    pub roles: HashSet<Role>,
    pub permissions: HashSet<Permission>,
}

impl Default for Subject {
    /// The guest subject: unauthenticated, `{guest}` role, no permissions.
    fn default() -> Self {
        Self {
            is_authenticated: false,
            roles: HashSet::from([Role::Guest]),
            permissions: HashSet::new(),
        }
    }
}

impl Subject {
    pub fn guest() -> Self {
        Self::default()
    }

    /// An authenticated subject carrying the given roles and permissions.
    pub fn authenticated<R, P>(roles: R, permissions: P) -> Self
    where
        R: IntoIterator<Item = Role>,
        P: IntoIterator<Item = Permission>,
    {
        Self {
            is_authenticated: true,
            roles: roles.into_iter().collect(),
            permissions: permissions.into_iter().collect(),
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// True iff `permissions` is non-empty and at least one element is held.
    ///
    /// Any-of-nothing is false: an empty list here is a query about nothing,
    /// not the absence of a restriction. Callers that mean "no restriction"
    /// must not call this with an empty list (see the route predicate).
    pub fn has_any_permission(&self, permissions: &[Permission]) -> bool {
        permissions.iter().any(|p| self.has_permission(*p))
    }

    /// True iff every element of `permissions` is held. All-of-nothing is true.
    pub fn has_all_permissions(&self, permissions: &[Permission]) -> bool {
        permissions.iter().all(|p| self.has_permission(*p))
    }

    /// True iff `roles` is non-empty and at least one element is held.
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.iter().any(|r| self.has_role(*r))
    }

    /// True iff every element of `roles` is held. All-of-nothing is true.
    pub fn has_all_roles(&self, roles: &[Role]) -> bool {
        roles.iter().all(|r| self.has_role(*r))
    }

    pub fn is_super_admin(&self) -> bool {
        self.has_role(Role::SuperAdmin)
    }

    pub fn is_admin(&self) -> bool {
        self.has_any_role(&[Role::Admin, Role::SuperAdmin])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_user() -> Subject {
        Subject::authenticated([Role::User], [Permission::UserView])
    }

    #[test]
    fn guest_default_invariant() {
        let subject = Subject::default();
        assert!(!subject.is_authenticated);
        assert_eq!(subject.roles, HashSet::from([Role::Guest]));
        assert!(subject.permissions.is_empty());
    }

    #[test]
    fn membership_checks() {
        let subject = plain_user();
        assert!(subject.has_permission(Permission::UserView));
        assert!(!subject.has_permission(Permission::UserDelete));
        assert!(subject.has_role(Role::User));
        assert!(!subject.has_role(Role::Admin));
    }

    #[test]
    fn empty_input_asymmetry() {
        // any([]) is false, all([]) is true -- for both axes.
        let subject = plain_user();
        assert!(!subject.has_any_permission(&[]));
        assert!(subject.has_all_permissions(&[]));
        assert!(!subject.has_any_role(&[]));
        assert!(subject.has_all_roles(&[]));
    }

    #[test]
    fn all_implies_any_on_non_empty_input() {
        let subject = Subject::authenticated(
            [Role::Manager],
            [Permission::UserView, Permission::UserEdit],
        );
        let wanted = [Permission::UserView, Permission::UserEdit];
        assert!(subject.has_all_permissions(&wanted));
        assert!(subject.has_any_permission(&wanted));
    }

    #[test]
    fn any_without_all() {
        let subject = plain_user();
        let wanted = [Permission::UserView, Permission::UserCreate];
        assert!(subject.has_any_permission(&wanted));
        assert!(!subject.has_all_permissions(&wanted));
    }

    #[test]
    fn admin_shortcuts() {
        let admin = Subject::authenticated([Role::Admin], []);
        let root = Subject::authenticated([Role::SuperAdmin], []);
        assert!(admin.is_admin());
        assert!(!admin.is_super_admin());
        assert!(root.is_admin());
        assert!(root.is_super_admin());
        assert!(!plain_user().is_admin());
    }

    #[test]
    fn permissions_do_not_follow_roles() {
        // Explicit permission overrides are independent of the role set.
        let subject = Subject::authenticated([Role::Guest], [Permission::SystemLogs]);
        assert!(subject.has_permission(Permission::SystemLogs));
        assert!(!subject.has_permission(Permission::UserView));
    }
}
