//! Session subject resolution: the single-writer session state behind the
//! authorization engine, its persistence seam, and the authentication
//! transport trait implemented by credential backends.

mod registry;
mod session;
mod store;
mod transport;

pub use registry::SessionRegistry;
pub use session::{AuthSession, UserProfile};
pub use store::{MemoryStorage, SessionRecord, SessionStorage, SessionStore};
pub use transport::{AuthError, Authenticator, LoginOutcome};
