//! Task use-case service: the five remote procedures.
//!
//! # Responsibility
//! - Check caller identity and input shape before any storage access.
//! - Delegate to a [`TaskRepository`] and translate store failures into a
//!   small set of service-level errors.
//!
//! # Invariants
//! - Validation and auth failures never touch storage.
//! - Storage failure detail is logged here and never returned to the caller.
//! - Only `update_status` touches `status`.
//! - No procedure is transactional with another.

use crate::model::task::{Task, TaskStatus, TaskValidationError};
use crate::model::user::Identity;
use crate::repo::task_repo::{RepoError, TaskRepository};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service-level error taxonomy exposed to remote callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Missing or empty required field.
    Validation {
        field: &'static str,
        message: String,
    },
    /// No resolved identity, or the identity does not own the target.
    Auth(String),
    /// Target task does not exist for this owner.
    NotFound(String),
    /// Underlying store failed. Detail is logged server-side only.
    Storage,
}

impl ServiceError {
    /// Stable machine-readable code for wire envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Auth(_) => "AUTH_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Storage => "STORAGE_ERROR",
        }
    }

    fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation { field, message } => write!(f, "invalid `{field}`: {message}"),
            Self::Auth(message) => write!(f, "unauthorized: {message}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::Storage => write!(f, "storage failure"),
        }
    }
}

impl Error for ServiceError {}

/// Input for `getTasks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListTasksInput {
    pub owner: String,
}

/// Input for `createTask`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTaskInput {
    pub owner: String,
    pub text: String,
}

/// Input for `editTask`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditTaskInput {
    pub id: String,
    pub text: String,
}

/// Input for `updateTask`. `status` is the value being toggled FROM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateStatusInput {
    pub id: String,
    pub status: TaskStatus,
}

/// Input for `deleteTask`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteTaskInput {
    pub id: String,
}

/// Task procedures over a repository implementation.
pub struct TaskService<R: TaskRepository> {
    repo: R,
}

impl<R: TaskRepository> TaskService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists the caller's tasks, pending first then newest first.
    pub fn list_tasks(
        &self,
        caller: Option<&Identity>,
        input: &ListTasksInput,
    ) -> ServiceResult<Vec<Task>> {
        let caller = require_identity(caller, "getTasks")?;
        let owner = required("owner", &input.owner)?;
        ensure_owner(caller, owner, "getTasks")?;

        self.repo
            .list_by_owner(owner)
            .map_err(|err| store_failure("getTasks", err))
    }

    /// Persists a new pending task for the caller.
    pub fn create_task(
        &self,
        caller: Option<&Identity>,
        input: &CreateTaskInput,
    ) -> ServiceResult<()> {
        let caller = require_identity(caller, "createTask")?;
        let owner = required("owner", &input.owner)?;
        let text = required("text", &input.text)?;
        ensure_owner(caller, owner, "createTask")?;

        let task = self
            .repo
            .insert(owner, text)
            .map_err(|err| store_failure("createTask", err))?;
        info!(
            "event=task_create module=service status=ok task_id={} owner={}",
            task.id, owner
        );
        Ok(())
    }

    /// Replaces one task's text.
    pub fn edit_task(&self, caller: Option<&Identity>, input: &EditTaskInput) -> ServiceResult<()> {
        let caller = require_identity(caller, "editTask")?;
        let id = required("id", &input.id)?;
        let text = required("text", &input.text)?;

        self.repo
            .update_text(&caller.user_id, id, text)
            .map_err(|err| store_failure("editTask", err))?;
        info!("event=task_edit module=service status=ok task_id={id}");
        Ok(())
    }

    /// Flips one task's status away from `input.status`.
    pub fn update_status(
        &self,
        caller: Option<&Identity>,
        input: &UpdateStatusInput,
    ) -> ServiceResult<()> {
        let caller = require_identity(caller, "updateTask")?;
        let id = required("id", &input.id)?;

        let next = self
            .repo
            .toggle_status(&caller.user_id, id, input.status)
            .map_err(|err| store_failure("updateTask", err))?;
        info!(
            "event=task_toggle module=service status=ok task_id={id} from={} to={next}",
            input.status
        );
        Ok(())
    }

    /// Removes one task. Missing ids succeed.
    pub fn delete_task(
        &self,
        caller: Option<&Identity>,
        input: &DeleteTaskInput,
    ) -> ServiceResult<()> {
        let caller = require_identity(caller, "deleteTask")?;
        let id = required("id", &input.id)?;

        self.repo
            .delete(&caller.user_id, id)
            .map_err(|err| store_failure("deleteTask", err))?;
        info!("event=task_delete module=service status=ok task_id={id}");
        Ok(())
    }
}

fn require_identity<'a>(
    caller: Option<&'a Identity>,
    procedure: &'static str,
) -> ServiceResult<&'a Identity> {
    caller.ok_or_else(|| {
        warn!("event=rpc_auth module=service status=rejected procedure={procedure} reason=no_identity");
        ServiceError::Auth("sign-in required".to_string())
    })
}

fn ensure_owner(caller: &Identity, owner: &str, procedure: &'static str) -> ServiceResult<()> {
    if caller.user_id != owner {
        warn!(
            "event=rpc_auth module=service status=rejected procedure={procedure} reason=owner_mismatch user_id={}",
            caller.user_id
        );
        return Err(ServiceError::Auth(
            "cannot access tasks of another user".to_string(),
        ));
    }
    Ok(())
}

fn required<'a>(field: &'static str, value: &'a str) -> ServiceResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::validation(field, "must not be empty"));
    }
    Ok(trimmed)
}

fn store_failure(procedure: &'static str, err: RepoError) -> ServiceError {
    match err {
        RepoError::NotFound(id) => ServiceError::NotFound(id),
        RepoError::Validation(TaskValidationError::EmptyText) => {
            ServiceError::validation("text", "must not be empty")
        }
        other => {
            error!(
                "event=rpc_call module=service status=error procedure={procedure} error_code=storage_failed error={other}"
            );
            ServiceError::Storage
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{required, ServiceError};

    #[test]
    fn required_trims_and_rejects_blank() {
        assert_eq!(required("id", "  abc ").unwrap(), "abc");
        assert!(matches!(
            required("text", "   "),
            Err(ServiceError::Validation { field: "text", .. })
        ));
    }

    #[test]
    fn storage_error_display_is_opaque() {
        assert_eq!(ServiceError::Storage.to_string(), "storage failure");
        assert_eq!(ServiceError::Storage.code(), "STORAGE_ERROR");
    }
}
