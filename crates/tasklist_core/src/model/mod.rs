//! Domain model for tasks and the users who own them.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId` and owned by exactly one user.
//! - Deletion is a hard delete; there is no tombstone state.

pub mod task;
pub mod user;
