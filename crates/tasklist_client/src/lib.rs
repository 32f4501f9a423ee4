//! Client side of the task procedures.
//!
//! # Responsibility
//! - Keep a per-owner task list cache and apply writes optimistically.
//! - Roll back to the pre-write snapshot when the server rejects a write.
//! - Refetch after every write, successful or not.
//!
//! Network access goes through [`TaskApi`]; [`HttpTaskApi`] is the HTTP implementation.

pub mod api;
pub mod cache;
pub mod client;
pub mod error;
pub mod filter;
pub mod patch;

pub use api::{HttpTaskApi, TaskApi};
pub use cache::{CacheEntry, PendingMutation, ReadTicket, Settlement, TaskCache};
pub use client::TaskClient;
pub use error::{ClientError, ClientResult};
pub use filter::filter_tasks;
pub use patch::{apply_patch, is_optimistic_id, Mutation, OPTIMISTIC_ID_PREFIX};
