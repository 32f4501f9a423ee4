//! User repository over the `users` table.
//!
//! # Responsibility
//! - Register and remove the users that own tasks.
//!
//! # Invariants
//! - User ids are non-empty after trimming and never reassigned.
//! - Deleting a user cascades to that user's sessions and tasks through
//!   foreign keys; no task outlives its owner.

use crate::db::DbError;
use crate::model::task::now_epoch_ms;
use crate::model::user::User;
use crate::repo::task_repo::{RepoError, RepoResult};
use log::info;
use rusqlite::{params, Connection, OptionalExtension};

/// Repository interface for user records.
pub trait UserRepository {
    fn create_user(&self, id: &str, name: &str, email: &str) -> RepoResult<User>;
    fn get_user(&self, id: &str) -> RepoResult<Option<User>>;
    /// Removes the user and, by cascade, everything the user owns.
    ///
    /// Returns whether a row was removed.
    fn delete_user(&self, id: &str) -> RepoResult<bool>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, id: &str, name: &str, email: &str) -> RepoResult<User> {
        let id = id.trim();
        if id.is_empty() {
            return Err(RepoError::InvalidInput("user id must not be empty".into()));
        }
        let email = email.trim();
        if email.is_empty() {
            return Err(RepoError::InvalidInput("user email must not be empty".into()));
        }

        let user = User {
            id: id.to_string(),
            name: name.trim().to_string(),
            email: email.to_string(),
            created_at: now_epoch_ms(),
        };
        self.conn
            .execute(
                "INSERT INTO users (id, name, email, created_at) VALUES (?1, ?2, ?3, ?4);",
                params![user.id, user.name, user.email, user.created_at],
            )
            .map_err(|err| match DbError::from(err) {
                db if db.is_constraint_violation() => {
                    RepoError::InvalidInput(format!("user `{id}` or email `{email}` already exists"))
                }
                db => RepoError::Db(db),
            })?;

        info!("event=user_create module=repo status=ok user_id={}", user.id);
        Ok(user)
    }

    fn get_user(&self, id: &str) -> RepoResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, name, email, created_at FROM users WHERE id = ?1;",
                [id],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        email: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    fn delete_user(&self, id: &str) -> RepoResult<bool> {
        let changed = self.conn.execute("DELETE FROM users WHERE id = ?1;", [id])?;
        info!("event=user_delete module=repo status=ok user_id={id} rows={changed}");
        Ok(changed > 0)
    }
}
