//! SQLite session store backing [`IdentityProvider`].

use super::IdentityProvider;
use crate::model::task::now_epoch_ms;
use crate::model::user::{Identity, Session};
use crate::repo::task_repo::{RepoError, RepoResult};
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension};
use std::time::Duration;
use uuid::Uuid;

/// Session lifetime used when callers do not pick one.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Session issuance, revocation and lookup over the `sessions` table.
pub struct SqliteSessionStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSessionStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Issues a fresh random token for an existing user.
    ///
    /// # Errors
    /// - `InvalidInput` for a blank user id.
    /// - `Db` when the user does not exist (foreign key) or SQL fails.
    pub fn issue(&self, user_id: &str, ttl: Duration) -> RepoResult<Session> {
        self.issue_at(user_id, ttl, now_epoch_ms())
    }

    /// Same as [`SqliteSessionStore::issue`] with an explicit clock.
    pub fn issue_at(&self, user_id: &str, ttl: Duration, now_ms: i64) -> RepoResult<Session> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(RepoError::InvalidInput("session user id must not be empty".into()));
        }

        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let session = Session {
            token: format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple()),
            user_id: user_id.to_string(),
            expires_at: now_ms.saturating_add(ttl_ms),
        };
        self.conn.execute(
            "INSERT INTO sessions (token, user_id, expires_at, created_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![session.token, session.user_id, session.expires_at, now_ms],
        )?;

        info!(
            "event=session_issue module=auth status=ok user_id={} expires_at={}",
            session.user_id, session.expires_at
        );
        Ok(session)
    }

    /// Deletes a session. Returns whether one existed.
    pub fn revoke(&self, token: &str) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM sessions WHERE token = ?1;", [token])?;
        info!("event=session_revoke module=auth status=ok rows={changed}");
        Ok(changed > 0)
    }

    /// Resolves a token against an explicit clock.
    pub fn resolve_at(&self, token: &str, now_ms: i64) -> RepoResult<Option<Identity>> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(None);
        }

        let found = self
            .conn
            .query_row(
                "SELECT s.user_id, s.expires_at, u.name
                 FROM sessions s
                 JOIN users u ON u.id = s.user_id
                 WHERE s.token = ?1;",
                [token],
                |row| {
                    let session = Session {
                        token: token.to_string(),
                        user_id: row.get(0)?,
                        expires_at: row.get(1)?,
                    };
                    Ok((session, row.get::<_, String>(2)?))
                },
            )
            .optional()?;

        match found {
            Some((session, name)) if !session.is_expired_at(now_ms) => Ok(Some(Identity {
                user_id: session.user_id,
                name,
            })),
            Some((session, _)) => {
                debug!(
                    "event=session_resolve module=auth status=expired user_id={}",
                    session.user_id
                );
                Ok(None)
            }
            None => Ok(None),
        }
    }
}

impl IdentityProvider for SqliteSessionStore<'_> {
    fn resolve(&self, token: &str) -> RepoResult<Option<Identity>> {
        self.resolve_at(token, now_epoch_ms())
    }
}
