use uuid::Uuid;

use console_authn::{AuthError, Authenticator, LoginOutcome, UserProfile};
use console_authz::permissions_for_roles;

use crate::config::UserEntry;

/// Credential backend over the configured user directory.
///
/// Default permissions are derived from the role expansion table at login;
/// afterwards the session's permission set lives its own life (explicit
/// grants and revocations never loop back through the roles).
#[derive(Clone, Debug)]
pub struct StaticDirectory {
    users: Vec<UserEntry>,
}

impl StaticDirectory {
    pub fn new(users: Vec<UserEntry>) -> Self {
        Self { users }
    }
}

impl Authenticator for StaticDirectory {
    async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let entry = self
            .users
            .iter()
            .find(|user| user.username == username && user.password == password)
            .ok_or(AuthError::InvalidCredentials)?;

        let mut permissions: Vec<_> = permissions_for_roles(&entry.roles).into_iter().collect();
        permissions.sort_by_key(|p| p.as_str());

        Ok(LoginOutcome {
            token: Uuid::new_v4().simple().to_string(),
            user: UserProfile {
                id: entry.id,
                username: entry.username.clone(),
                name: entry.name.clone(),
            },
            roles: entry.roles.clone(),
            permissions,
        })
    }

    async fn logout(&self, _token: &str) -> Result<(), AuthError> {
        // Tokens are revoked in the session registry; the directory holds no
        // per-session state.
        Ok(())
    }
}
