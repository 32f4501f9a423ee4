//! Task repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide the five task store statements over the `tasks` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths validate text before any SQL runs.
//! - Every statement is scoped by owner; a foreign task looks exactly like a missing one.
//! - Read paths reject invalid persisted state instead of masking it.
//! - List order is `pending` before `completed`, then newest `created_at` first,
//!   ties broken by insertion order (newest first).

use crate::db::DbError;
use crate::model::task::{
    now_epoch_ms, validate_text, Task, TaskId, TaskStatus, TaskValidationError,
};
use log::debug;
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const TASK_SELECT_SQL: &str = "SELECT
    id,
    owner,
    text,
    status,
    created_at,
    updated_at
FROM tasks";

/// Must stay textually equal to the expression in `tasks_owner_list_order_idx`.
const TASK_ORDER_SQL: &str = "ORDER BY
    CASE status WHEN 'pending' THEN 0 ELSE 1 END ASC,
    created_at DESC,
    rowid DESC";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by task, user and session stores.
#[derive(Debug)]
pub enum RepoError {
    Validation(TaskValidationError),
    /// Non-task input rejected before SQL (user/session fields).
    InvalidInput(String),
    Db(DbError),
    NotFound(TaskId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::InvalidInput(_) | Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<TaskValidationError> for RepoError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for task persistence.
pub trait TaskRepository {
    /// Lists one owner's tasks in display order. Unknown owners yield an empty list.
    fn list_by_owner(&self, owner: &str) -> RepoResult<Vec<Task>>;
    fn get(&self, owner: &str, id: &str) -> RepoResult<Option<Task>>;
    /// Persists a new pending task and returns the stored row.
    fn insert(&self, owner: &str, text: &str) -> RepoResult<Task>;
    /// Replaces the text and refreshes `updated_at`.
    fn update_text(&self, owner: &str, id: &str, text: &str) -> RepoResult<()>;
    /// Writes the opposite of `current` and returns the written status.
    ///
    /// The caller's `current` is trusted; concurrent toggles are last-writer-wins.
    fn toggle_status(&self, owner: &str, id: &str, current: TaskStatus)
        -> RepoResult<TaskStatus>;
    /// Removes the row if present. Missing rows are not an error.
    fn delete(&self, owner: &str, id: &str) -> RepoResult<()>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn list_by_owner(&self, owner: &str) -> RepoResult<Vec<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE owner = ?1 {TASK_ORDER_SQL};"))?;
        let mut rows = stmt.query([owner])?;
        let mut tasks = Vec::new();

        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }

        Ok(tasks)
    }

    fn get(&self, owner: &str, id: &str) -> RepoResult<Option<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL}
             WHERE id = ?1
               AND owner = ?2;"
        ))?;

        let mut rows = stmt.query(params![id, owner])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }

        Ok(None)
    }

    fn insert(&self, owner: &str, text: &str) -> RepoResult<Task> {
        let task = Task::new(owner, text, now_epoch_ms());
        task.validate()?;

        self.conn.execute(
            "INSERT INTO tasks (
                id,
                owner,
                text,
                status,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                task.id.as_str(),
                task.owner.as_str(),
                task.text.as_str(),
                task.status.as_str(),
                task.created_at,
                task.updated_at,
            ],
        )?;

        debug!(
            "event=task_insert module=repo status=ok task_id={} owner={}",
            task.id, task.owner
        );
        Ok(task)
    }

    fn update_text(&self, owner: &str, id: &str, text: &str) -> RepoResult<()> {
        validate_text(text)?;

        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                text = ?1,
                updated_at = MAX(?2, created_at)
             WHERE id = ?3
               AND owner = ?4;",
            params![text.trim(), now_epoch_ms(), id, owner],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id.to_string()));
        }

        Ok(())
    }

    fn toggle_status(
        &self,
        owner: &str,
        id: &str,
        current: TaskStatus,
    ) -> RepoResult<TaskStatus> {
        let next = current.toggled();
        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                status = ?1,
                updated_at = MAX(?2, created_at)
             WHERE id = ?3
               AND owner = ?4;",
            params![next.as_str(), now_epoch_ms(), id, owner],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id.to_string()));
        }

        Ok(next)
    }

    fn delete(&self, owner: &str, id: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM tasks WHERE id = ?1 AND owner = ?2;",
            params![id, owner],
        )?;

        debug!("event=task_delete module=repo status=ok task_id={id} rows={changed}");
        Ok(())
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let status_text: String = row.get("status")?;
    let status = TaskStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid task status `{status_text}` in tasks.status"))
    })?;

    let task = Task {
        id: row.get("id")?,
        owner: row.get("owner")?,
        text: row.get("text")?,
        status,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    task.validate()?;
    Ok(task)
}
