//! Core domain logic for TaskList.
//! This crate is the single source of truth for task invariants.

pub mod auth;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod rpc;
pub mod service;

pub use auth::{IdentityProvider, SqliteSessionStore, DEFAULT_SESSION_TTL};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget, LoggingError};
pub use model::task::{now_epoch_ms, OwnerId, Task, TaskId, TaskStatus, TaskValidationError};
pub use model::user::{Identity, Session, User};
pub use repo::task_repo::{RepoError, RepoResult, SqliteTaskRepository, TaskRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use rpc::{BatchCall, Procedure, RpcEnvelope, RpcErrorBody};
pub use service::task_service::{
    CreateTaskInput, DeleteTaskInput, EditTaskInput, ListTasksInput, ServiceError,
    ServiceResult, TaskService, UpdateStatusInput,
};

