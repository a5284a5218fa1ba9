use thiserror::Error;

use console_authz::{Permission, Role};

use crate::UserProfile;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("authentication transport failed: {0}")]
    Transport(#[from] anyhow::Error),
}

/// Successful login payload from the transport collaborator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginOutcome {
    pub token: String,
    pub user: UserProfile,
    pub roles: Vec<Role>,
    pub permissions: Vec<Permission>,
}

/// Authentication transport seam. The engine treats tokens as opaque; how
/// credentials are verified (static directory, upstream IdP) is the
/// implementor's concern.
pub trait Authenticator {
    fn login(
        &self,
        username: &str,
        password: &str,
    ) -> impl Future<Output = Result<LoginOutcome, AuthError>> + Send;

    fn logout(&self, token: &str) -> impl Future<Output = Result<(), AuthError>> + Send;
}
