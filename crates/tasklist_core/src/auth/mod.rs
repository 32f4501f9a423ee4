//! Identity resolution for owner-scoped task procedures.
//!
//! # Responsibility
//! - Turn request credentials (a session token) into an [`Identity`].
//! - Provide a SQLite session store usable as the default provider.
//!
//! # Invariants
//! - Unknown, revoked or expired tokens resolve to `None`, never to an error.
//! - Providers do not decide authorization; the task service does.

mod session_store;

pub use session_store::{SqliteSessionStore, DEFAULT_SESSION_TTL};

use crate::model::user::Identity;
use crate::repo::task_repo::RepoResult;

/// Resolves session credentials into the calling user.
pub trait IdentityProvider {
    /// Returns `Ok(None)` when the token does not name a live session.
    fn resolve(&self, token: &str) -> RepoResult<Option<Identity>>;
}
