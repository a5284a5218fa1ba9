use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use console_authz::{Permission, Role, Subject};

use crate::{AuthSession, UserProfile};

#[derive(Clone, Debug)]
struct SessionEntry {
    session: AuthSession,
    expires_at: DateTime<Utc>,
}

/// Token-indexed session map for multi-session deployments.
///
/// Each issued token maps to its own [`AuthSession`]; resolving an unknown or
/// expired token yields the guest subject. Expired entries are dropped on
/// touch.
pub struct SessionRegistry {
    ttl: Duration,
    sessions: RwLock<HashMap<String, SessionEntry>>,
}

impl SessionRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Issue a fresh opaque token for an authenticated session.
    pub fn issue(
        &self,
        user: UserProfile,
        roles: Vec<Role>,
        permissions: Vec<Permission>,
    ) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.admit(token.clone(), user, roles, permissions);
        token
    }

    /// Register a session under a token minted by the transport collaborator.
    pub fn admit(
        &self,
        token: String,
        user: UserProfile,
        roles: Vec<Role>,
        permissions: Vec<Permission>,
    ) {
        let mut session = AuthSession::default();
        session.login_success(user, token.clone(), roles, permissions);
        let entry = SessionEntry {
            session,
            expires_at: Utc::now() + self.ttl,
        };
        self.sessions
            .write()
            .expect("registry lock")
            .insert(token, entry);
    }

    /// Look up the session behind a token, dropping it when expired.
    pub fn resolve(&self, token: &str) -> Option<AuthSession> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().expect("registry lock");
        match sessions.get(token) {
            Some(entry) if entry.expires_at > now => Some(entry.session.clone()),
            Some(_) => {
                sessions.remove(token);
                None
            }
            None => None,
        }
    }

    /// Subject snapshot for a token; unknown tokens resolve to guest.
    pub fn subject_for(&self, token: Option<&str>) -> Subject {
        token
            .and_then(|t| self.resolve(t))
            .map(|session| session.subject)
            .unwrap_or_default()
    }

    pub fn revoke(&self, token: &str) -> bool {
        self.sessions
            .write()
            .expect("registry lock")
            .remove(token)
            .is_some()
    }

    /// Apply a mutation to a live session; false when the token is unknown.
    pub fn update<F>(&self, token: &str, mutate: F) -> bool
    where
        F: FnOnce(&mut AuthSession),
    {
        let mut sessions = self.sessions.write().expect("registry lock");
        match sessions.get_mut(token) {
            Some(entry) if entry.expires_at > Utc::now() => {
                mutate(&mut entry.session);
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.read().expect("registry lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
