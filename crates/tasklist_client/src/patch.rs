//! Optimistic list transforms.
//!
//! # Invariants
//! - `apply_patch` never mutates its input; the caller keeps the original as a snapshot.
//! - Unknown ids leave the list unchanged.

use tasklist_core::{OwnerId, Task, TaskId, TaskStatus};
use uuid::Uuid;

/// Id prefix for tasks that exist only in the local cache.
pub const OPTIMISTIC_ID_PREFIX: &str = "optimistic-";

/// One user intent, as sent to the server and as applied locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Create { owner: OwnerId, text: String },
    Edit { id: TaskId, text: String },
    /// `status` is the status the caller saw; the server flips it.
    Toggle { id: TaskId, status: TaskStatus },
    Delete { id: TaskId },
}

impl Mutation {
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::Create { .. } => "create",
            Mutation::Edit { .. } => "edit",
            Mutation::Toggle { .. } => "toggle",
            Mutation::Delete { .. } => "delete",
        }
    }

    /// Text carried by create/edit, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Mutation::Create { text, .. } | Mutation::Edit { text, .. } => Some(text),
            Mutation::Toggle { .. } | Mutation::Delete { .. } => None,
        }
    }
}

pub fn is_optimistic_id(id: &str) -> bool {
    id.starts_with(OPTIMISTIC_ID_PREFIX)
}

/// Returns the list as it should look once `mutation` succeeds.
pub fn apply_patch(tasks: &[Task], mutation: &Mutation, now_ms: i64) -> Vec<Task> {
    match mutation {
        Mutation::Create { owner, text } => {
            let id = format!("{OPTIMISTIC_ID_PREFIX}{}", Uuid::new_v4().simple());
            let mut next = Vec::with_capacity(tasks.len() + 1);
            next.push(Task::with_id(id, owner.as_str(), text, now_ms));
            next.extend_from_slice(tasks);
            next
        }
        Mutation::Edit { id, text } => map_task(tasks, id, |task| {
            task.text = text.trim().to_string();
            task.updated_at = now_ms.max(task.created_at);
        }),
        Mutation::Toggle { id, status } => map_task(tasks, id, |task| {
            task.status = status.toggled();
            task.updated_at = now_ms.max(task.created_at);
        }),
        Mutation::Delete { id } => tasks.iter().filter(|task| task.id != *id).cloned().collect(),
    }
}

fn map_task(tasks: &[Task], id: &str, update: impl Fn(&mut Task)) -> Vec<Task> {
    tasks
        .iter()
        .cloned()
        .map(|mut task| {
            if task.id == id {
                update(&mut task);
            }
            task
        })
        .collect()
}
