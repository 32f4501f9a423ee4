//! User, session and identity records.
//!
//! # Responsibility
//! - Describe who owns tasks and how a request proves it.
//!
//! # Invariants
//! - `User::id` is non-empty and immutable; tasks reference it.
//! - A `Session` resolves to an identity only before `expires_at`.

use serde::{Deserialize, Serialize};

/// Registered user. Tasks hold `id` as their owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Bearer session bound to one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    /// Unix epoch milliseconds after which the token is rejected.
    pub expires_at: i64,
}

impl Session {
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at
    }
}

/// Caller identity resolved from request credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub name: String,
}
