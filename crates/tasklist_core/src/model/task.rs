//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical to-do record shared by store, service and clients.
//! - Provide the two-state status machine (`pending <-> completed`).
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - `owner` never changes after creation.
//! - `text` is never empty or whitespace-only.
//! - `updated_at` is never earlier than `created_at`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable identifier for a task row.
///
/// Kept as a string so optimistic client-side ids and server UUIDs share one shape.
pub type TaskId = String;

/// Identifier of the user owning a task.
pub type OwnerId = String;

/// Task completion state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created and not yet done. Every task starts here.
    Pending,
    /// Marked done by its owner.
    Completed,
}

impl TaskStatus {
    /// Returns the opposite status.
    pub fn toggled(self) -> Self {
        match self {
            Self::Pending => Self::Completed,
            Self::Completed => Self::Pending,
        }
    }

    /// Storage/wire label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }

    /// Parses a storage/wire label. Unknown labels yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

impl Display for TaskStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation errors for task invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Text is empty after trimming.
    EmptyText,
    /// Owner id is empty after trimming.
    EmptyOwner,
    /// `updated_at` precedes `created_at`.
    UpdatedBeforeCreated { created_at: i64, updated_at: i64 },
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyText => write!(f, "task text must not be empty"),
            Self::EmptyOwner => write!(f, "task owner must not be empty"),
            Self::UpdatedBeforeCreated {
                created_at,
                updated_at,
            } => write!(
                f,
                "updated_at ({updated_at}) must be >= created_at ({created_at})"
            ),
        }
    }
}

impl Error for TaskValidationError {}

/// Canonical to-do record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub owner: OwnerId,
    pub text: String,
    pub status: TaskStatus,
    /// Unix epoch milliseconds, set once.
    pub created_at: i64,
    /// Unix epoch milliseconds, refreshed on edit and toggle.
    pub updated_at: i64,
}

impl Task {
    /// Creates a pending task with a generated id and `created_at == updated_at == now_ms`.
    ///
    /// Text is trimmed; call [`Task::validate`] before persisting.
    pub fn new(owner: impl Into<OwnerId>, text: &str, now_ms: i64) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), owner, text, now_ms)
    }

    /// Same as [`Task::new`] with a caller-provided id.
    pub fn with_id(
        id: impl Into<TaskId>,
        owner: impl Into<OwnerId>,
        text: &str,
        now_ms: i64,
    ) -> Self {
        Self {
            id: id.into(),
            owner: owner.into(),
            text: text.trim().to_string(),
            status: TaskStatus::Pending,
            created_at: now_ms,
            updated_at: now_ms,
        }
    }

    /// Checks text, owner and timestamp invariants.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        validate_text(&self.text)?;
        if self.owner.trim().is_empty() {
            return Err(TaskValidationError::EmptyOwner);
        }
        if self.updated_at < self.created_at {
            return Err(TaskValidationError::UpdatedBeforeCreated {
                created_at: self.created_at,
                updated_at: self.updated_at,
            });
        }
        Ok(())
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

/// Rejects empty or whitespace-only task text.
pub fn validate_text(text: &str) -> Result<(), TaskValidationError> {
    if text.trim().is_empty() {
        return Err(TaskValidationError::EmptyText);
    }
    Ok(())
}

/// Current wall clock as Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
