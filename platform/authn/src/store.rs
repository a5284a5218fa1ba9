use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

use serde::{Deserialize, Serialize};

use console_authz::{Permission, Role, Subject};

use crate::{AuthSession, LoginOutcome, UserProfile};

/// Persisted-session collaborator: an opaque blob of bytes the resolver reads
/// once at initialization and rewrites on login/logout.
pub trait SessionStorage: Send + Sync {
    fn load(&self) -> Option<String>;
    fn save(&self, payload: &str);
    fn clear(&self);
}

/// In-memory storage, used by tests and by deployments that opt out of
/// persistence.
#[derive(Default)]
pub struct MemoryStorage {
    payload: Mutex<Option<String>>,
}

impl MemoryStorage {
    pub fn with_payload(payload: impl Into<String>) -> Self {
        Self {
            payload: Mutex::new(Some(payload.into())),
        }
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self) -> Option<String> {
        self.payload.lock().expect("storage lock").clone()
    }

    fn save(&self, payload: &str) {
        *self.payload.lock().expect("storage lock") = Some(payload.to_string());
    }

    fn clear(&self) {
        *self.payload.lock().expect("storage lock") = None;
    }
}

/// Serialized session shape written to storage.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionRecord {
    pub token: String,
    pub user: UserProfile,
    pub roles: Vec<Role>,
    pub permissions: Vec<Permission>,
}

/// Process-wide session subject resolver.
///
/// The one piece of shared mutable state in the engine: a single writer path
/// (the mutation methods below) over an [`AuthSession`], with snapshot reads
/// everywhere else. Login attempts carry a monotonic id so that when a second
/// attempt supersedes an in-flight one, only the latest resolution commits.
pub struct SessionStore {
    session: RwLock<AuthSession>,
    storage: Box<dyn SessionStorage>,
    latest_attempt: AtomicU64,
}

impl SessionStore {
    pub fn new(storage: Box<dyn SessionStorage>) -> Self {
        Self {
            session: RwLock::new(AuthSession::default()),
            storage,
            latest_attempt: AtomicU64::new(0),
        }
    }

    /// Reconstruct the session from persisted data, if any.
    ///
    /// Malformed payloads are discarded and cleared from storage; the subject
    /// stays guest rather than surfacing a parse error.
    pub fn initialize(&self) {
        let Some(payload) = self.storage.load() else {
            return;
        };
        match serde_json::from_str::<SessionRecord>(&payload) {
            Ok(record) => {
                let mut session = self.session.write().expect("session lock");
                session.login_success(record.user, record.token, record.roles, record.permissions);
            }
            Err(_) => self.storage.clear(),
        }
    }

    /// Snapshot of the current subject.
    pub fn subject(&self) -> Subject {
        self.session.read().expect("session lock").subject.clone()
    }

    /// Snapshot of the full session.
    pub fn current(&self) -> AuthSession {
        self.session.read().expect("session lock").clone()
    }

    pub fn token(&self) -> Option<String> {
        self.session.read().expect("session lock").token.clone()
    }

    /// Register a login attempt and obtain its id.
    pub fn begin_login(&self) -> u64 {
        self.latest_attempt.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Commit a resolved login if the attempt is still the most recent one.
    /// Stale resolutions are dropped and the call reports false.
    pub fn complete_login(&self, attempt: u64, outcome: LoginOutcome) -> bool {
        if self.latest_attempt.load(Ordering::SeqCst) != attempt {
            return false;
        }
        let mut session = self.session.write().expect("session lock");
        session.login_success(
            outcome.user.clone(),
            outcome.token.clone(),
            outcome.roles.clone(),
            outcome.permissions.clone(),
        );
        let record = SessionRecord {
            token: outcome.token,
            user: outcome.user,
            roles: outcome.roles,
            permissions: outcome.permissions,
        };
        if let Ok(payload) = serde_json::to_string(&record) {
            self.storage.save(&payload);
        }
        true
    }

    /// Record a failed login for the given attempt: the subject is reset to
    /// guest and no partial state is retained. Stale failures are ignored.
    pub fn fail_login(&self, attempt: u64) -> bool {
        if self.latest_attempt.load(Ordering::SeqCst) != attempt {
            return false;
        }
        self.session.write().expect("session lock").login_failure();
        self.storage.clear();
        true
    }

    pub fn logout(&self) {
        self.session.write().expect("session lock").logout();
        self.storage.clear();
    }

    pub fn reset_to_guest(&self) {
        self.session.write().expect("session lock").reset_to_guest();
        self.storage.clear();
    }

    pub fn set_roles(&self, roles: Vec<Role>) {
        self.session.write().expect("session lock").set_roles(roles);
    }

    pub fn set_permissions(&self, permissions: Vec<Permission>) {
        self.session
            .write()
            .expect("session lock")
            .set_permissions(permissions);
    }

    pub fn add_permissions(&self, permissions: &[Permission]) {
        self.session
            .write()
            .expect("session lock")
            .add_permissions(permissions);
    }

    pub fn remove_permissions(&self, permissions: &[Permission]) {
        self.session
            .write()
            .expect("session lock")
            .remove_permissions(permissions);
    }
}
