use serde::{Deserialize, Serialize};

use console_authz::{Permission, Role, Subject};

/// Identity details returned by the authentication transport.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: u64,
    pub username: String,
    pub name: String,
}

/// The authenticated context: subject plus the profile and opaque token
/// behind it. Fresh sessions are guests.
///
/// All transitions here are synchronous single-writer updates; a logged-out
/// or failed session always restores the guest invariant (guest role, empty
/// permissions, no token).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub subject: Subject,
    pub user: Option<UserProfile>,
    pub token: Option<String>,
}

impl AuthSession {
    pub fn login_success(
        &mut self,
        user: UserProfile,
        token: String,
        roles: Vec<Role>,
        permissions: Vec<Permission>,
    ) {
        self.subject = Subject::authenticated(roles, permissions);
        self.user = Some(user);
        self.token = Some(token);
    }

    pub fn login_failure(&mut self) {
        self.reset_to_guest();
    }

    pub fn logout(&mut self) {
        self.reset_to_guest();
    }

    pub fn reset_to_guest(&mut self) {
        *self = Self::default();
    }

    /// Replace the role set. Permissions are left untouched: explicit grants
    /// are independent of roles and never re-derived.
    pub fn set_roles(&mut self, roles: Vec<Role>) {
        self.subject.roles = roles.into_iter().collect();
    }

    pub fn set_permissions(&mut self, permissions: Vec<Permission>) {
        self.subject.permissions = permissions.into_iter().collect();
    }

    /// Set union; granting an already-held permission is a no-op.
    pub fn add_permissions(&mut self, permissions: &[Permission]) {
        self.subject.permissions.extend(permissions.iter().copied());
    }

    /// Set difference; removing an absent permission is a no-op.
    pub fn remove_permissions(&mut self, permissions: &[Permission]) {
        for permission in permissions {
            self.subject.permissions.remove(permission);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn profile() -> UserProfile {
        UserProfile {
            id: 1,
            username: "admin".into(),
            name: "Admin User".into(),
        }
    }

    #[test]
    fn fresh_session_is_guest() {
        let session = AuthSession::default();
        assert!(!session.subject.is_authenticated);
        assert_eq!(session.subject.roles, HashSet::from([Role::Guest]));
        assert!(session.subject.permissions.is_empty());
        assert!(session.token.is_none());
    }

    #[test]
    fn login_success_replaces_the_guest_subject() {
        let mut session = AuthSession::default();
        session.login_success(
            profile(),
            "tok".into(),
            vec![Role::Admin],
            vec![Permission::UserView],
        );
        assert!(session.subject.is_authenticated);
        assert!(session.subject.has_role(Role::Admin));
        assert!(!session.subject.has_role(Role::Guest));
        assert_eq!(session.token.as_deref(), Some("tok"));
    }

    #[test]
    fn logout_and_failure_restore_the_guest_invariant() {
        let mut session = AuthSession::default();
        session.login_success(profile(), "tok".into(), vec![Role::User], vec![]);
        session.logout();
        assert_eq!(session, AuthSession::default());

        session.login_success(profile(), "tok".into(), vec![Role::User], vec![]);
        session.login_failure();
        assert_eq!(session, AuthSession::default());
    }

    #[test]
    fn add_permissions_deduplicates() {
        let mut session = AuthSession::default();
        session.set_permissions(vec![Permission::UserView]);
        session.add_permissions(&[Permission::UserView, Permission::UserEdit]);
        assert_eq!(session.subject.permissions.len(), 2);
        assert!(session.subject.has_permission(Permission::UserEdit));
    }

    #[test]
    fn remove_absent_permission_is_a_noop() {
        let mut session = AuthSession::default();
        session.set_permissions(vec![Permission::UserView]);
        session.remove_permissions(&[Permission::UserDelete]);
        assert_eq!(
            session.subject.permissions,
            HashSet::from([Permission::UserView])
        );
    }

    #[test]
    fn set_roles_leaves_permissions_alone() {
        let mut session = AuthSession::default();
        session.set_permissions(vec![Permission::AnalyticsView]);
        session.set_roles(vec![Role::Manager]);
        assert!(session.subject.has_role(Role::Manager));
        assert!(session.subject.has_permission(Permission::AnalyticsView));
    }
}
