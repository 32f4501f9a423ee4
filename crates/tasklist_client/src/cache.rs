//! Per-owner task list cache with a two-phase optimistic write protocol.
//!
//! # Responsibility
//! - Hold the last known list for each owner and whether it must be refetched.
//! - Snapshot before an optimistic patch and restore that exact snapshot on failure.
//! - Drop read results that started before an optimistic write on the same owner.
//!
//! # Invariants
//! - Every write to an entry (fetch result, patch, rollback) bumps its `version`.
//! - `settle` always leaves the entry stale; the next `tasks` call refetches.

use std::collections::HashMap;

use log::{debug, info};
use tasklist_core::{OwnerId, Task};

use crate::{
    error::{ClientError, ClientResult},
    patch::{apply_patch, Mutation},
};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CacheEntry {
    pub tasks: Vec<Task>,
    pub version: u64,
    pub stale: bool,
}

/// Handed out by [`TaskCache::begin_read`]; only lands if no write started since.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadTicket {
    owner: OwnerId,
    generation: u64,
}

/// An applied optimistic patch waiting for the server outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMutation {
    owner: OwnerId,
    mutation: Mutation,
    /// `None` when nothing was cached for the owner before the patch.
    snapshot: Option<Vec<Task>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Committed,
    RolledBack,
}

#[derive(Debug, Default)]
pub struct TaskCache {
    entries: HashMap<OwnerId, CacheEntry>,
    read_generations: HashMap<OwnerId, u64>,
    next_version: u64,
}

impl TaskCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(&self, owner: &str) -> Option<&CacheEntry> {
        self.entries.get(owner)
    }

    pub fn tasks(&self, owner: &str) -> Option<&[Task]> {
        self.entries.get(owner).map(|entry| entry.tasks.as_slice())
    }

    /// True when the owner has no entry or the entry was invalidated.
    pub fn needs_fetch(&self, owner: &str) -> bool {
        self.entries.get(owner).map_or(true, |entry| entry.stale)
    }

    pub fn invalidate(&mut self, owner: &str) {
        if let Some(entry) = self.entries.get_mut(owner) {
            entry.stale = true;
        }
    }

    pub fn begin_read(&self, owner: &str) -> ReadTicket {
        ReadTicket {
            owner: owner.to_string(),
            generation: self.read_generation(owner),
        }
    }

    /// Stores a fetched list. Returns `false` and keeps the cache as is when an
    /// optimistic write started after the ticket was issued.
    pub fn finish_read(&mut self, ticket: ReadTicket, tasks: Vec<Task>) -> bool {
        if ticket.generation != self.read_generation(&ticket.owner) {
            debug!(
                "event=cache_read module=client status=discarded owner={}",
                ticket.owner
            );
            return false;
        }
        self.write(&ticket.owner, tasks, false);
        true
    }

    /// Validates, snapshots and applies `mutation` to the owner's list.
    pub fn begin_optimistic(
        &mut self,
        owner: &str,
        mutation: Mutation,
        now_ms: i64,
    ) -> ClientResult<PendingMutation> {
        if mutation.text().is_some_and(|text| text.trim().is_empty()) {
            return Err(ClientError::EmptyText);
        }

        *self.read_generations.entry(owner.to_string()).or_insert(0) += 1;

        let snapshot = self.entries.get(owner).map(|entry| entry.tasks.clone());
        let current = snapshot.as_deref().unwrap_or_default();
        let patched = apply_patch(current, &mutation, now_ms);
        let stale = self.entries.get(owner).is_some_and(|entry| entry.stale);
        self.write(owner, patched, stale);

        debug!(
            "event=cache_patch module=client status=applied owner={owner} mutation={}",
            mutation.name()
        );
        Ok(PendingMutation {
            owner: owner.to_string(),
            mutation,
            snapshot,
        })
    }

    /// Resolves a pending patch. On failure the pre-patch list is restored exactly.
    pub fn settle<T, E>(&mut self, pending: PendingMutation, outcome: &Result<T, E>) -> Settlement {
        let settlement = match outcome {
            Ok(_) => Settlement::Committed,
            Err(_) => {
                match pending.snapshot {
                    Some(tasks) => self.write(&pending.owner, tasks, true),
                    None => {
                        self.entries.remove(&pending.owner);
                    }
                }
                info!(
                    "event=cache_rollback module=client status=ok owner={} mutation={}",
                    pending.owner,
                    pending.mutation.name()
                );
                Settlement::RolledBack
            }
        };
        self.invalidate(&pending.owner);
        settlement
    }

    fn read_generation(&self, owner: &str) -> u64 {
        self.read_generations.get(owner).copied().unwrap_or(0)
    }

    fn write(&mut self, owner: &str, tasks: Vec<Task>, stale: bool) {
        self.next_version += 1;
        self.entries.insert(
            owner.to_string(),
            CacheEntry {
                tasks,
                version: self.next_version,
                stale,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{Settlement, TaskCache};
    use crate::{error::ClientError, patch::Mutation};
    use tasklist_core::{Task, TaskStatus};

    fn loaded() -> TaskCache {
        let mut cache = TaskCache::new();
        let ticket = cache.begin_read("u1");
        assert!(cache.finish_read(
            ticket,
            vec![
                Task::with_id("t2", "u1", "b", 20),
                Task::with_id("t1", "u1", "a", 10),
            ],
        ));
        cache
    }

    fn failed() -> Result<(), ClientError> {
        Err(ClientError::Remote {
            code: "STORAGE_ERROR".to_string(),
            message: "storage failure".to_string(),
        })
    }

    #[test]
    fn rollback_restores_the_exact_snapshot() {
        let mut cache = loaded();
        let before = cache.tasks("u1").unwrap().to_vec();

        let pending = cache
            .begin_optimistic(
                "u1",
                Mutation::Toggle {
                    id: "t1".to_string(),
                    status: TaskStatus::Pending,
                },
                30,
            )
            .unwrap();
        assert_eq!(cache.tasks("u1").unwrap()[1].status, TaskStatus::Completed);

        assert_eq!(cache.settle(pending, &failed()), Settlement::RolledBack);
        assert_eq!(cache.tasks("u1").unwrap(), &before[..]);
        assert!(cache.needs_fetch("u1"));
    }

    #[test]
    fn commit_keeps_patch_and_marks_stale() {
        let mut cache = loaded();
        let version = cache.entry("u1").unwrap().version;
        let pending = cache
            .begin_optimistic("u1", Mutation::Delete { id: "t2".to_string() }, 30)
            .unwrap();
        assert!(cache.entry("u1").unwrap().version > version);

        assert_eq!(
            cache.settle(pending, &Ok::<(), ClientError>(())),
            Settlement::Committed
        );
        assert_eq!(cache.tasks("u1").unwrap().len(), 1);
        assert!(cache.needs_fetch("u1"));
    }

    #[test]
    fn blank_text_is_rejected_before_touching_the_cache() {
        let mut cache = loaded();
        let entry = cache.entry("u1").cloned();
        let ticket = cache.begin_read("u1");

        let err = cache
            .begin_optimistic(
                "u1",
                Mutation::Create {
                    owner: "u1".to_string(),
                    text: "   ".to_string(),
                },
                30,
            )
            .unwrap_err();
        assert!(matches!(err, ClientError::EmptyText));
        assert_eq!(cache.entry("u1").cloned(), entry);
        assert!(cache.finish_read(ticket, Vec::new()));
    }

    #[test]
    fn read_started_before_a_write_is_discarded() {
        let mut cache = loaded();
        let ticket = cache.begin_read("u1");
        let pending = cache
            .begin_optimistic(
                "u1",
                Mutation::Create {
                    owner: "u1".to_string(),
                    text: "c".to_string(),
                },
                30,
            )
            .unwrap();

        assert!(!cache.finish_read(ticket, Vec::new()));
        assert_eq!(cache.tasks("u1").unwrap().len(), 3);

        cache.settle(pending, &Ok::<(), ClientError>(()));
        let ticket = cache.begin_read("u1");
        assert!(cache.finish_read(ticket, Vec::new()));
        assert!(!cache.needs_fetch("u1"));
    }

    #[test]
    fn overlapping_writes_roll_back_to_their_own_snapshots() {
        let mut cache = loaded();
        let original = cache.tasks("u1").unwrap().to_vec();

        let toggle = cache
            .begin_optimistic(
                "u1",
                Mutation::Toggle {
                    id: "t1".to_string(),
                    status: TaskStatus::Pending,
                },
                30,
            )
            .unwrap();
        let after_toggle = cache.tasks("u1").unwrap().to_vec();

        let delete = cache
            .begin_optimistic("u1", Mutation::Delete { id: "t2".to_string() }, 31)
            .unwrap();
        assert_eq!(cache.tasks("u1").unwrap().len(), 1);

        assert_eq!(cache.settle(delete, &failed()), Settlement::RolledBack);
        assert_eq!(cache.tasks("u1").unwrap(), &after_toggle[..]);
        assert_eq!(cache.tasks("u1").unwrap()[1].status, TaskStatus::Completed);

        assert_eq!(cache.settle(toggle, &failed()), Settlement::RolledBack);
        assert_eq!(cache.tasks("u1").unwrap(), &original[..]);
        assert!(cache.needs_fetch("u1"));
    }

    #[test]
    fn rollback_without_prior_entry_removes_it() {
        let mut cache = TaskCache::new();
        let pending = cache
            .begin_optimistic(
                "u1",
                Mutation::Create {
                    owner: "u1".to_string(),
                    text: "x".to_string(),
                },
                1,
            )
            .unwrap();
        assert_eq!(cache.tasks("u1").unwrap().len(), 1);

        cache.settle(pending, &failed());
        assert!(cache.entry("u1").is_none());
        assert!(cache.needs_fetch("u1"));
    }

    #[test]
    fn owners_are_cached_independently() {
        let mut cache = loaded();
        let pending = cache
            .begin_optimistic("u2", Mutation::Delete { id: "t1".to_string() }, 5)
            .unwrap();
        cache.settle(pending, &failed());
        assert_eq!(cache.tasks("u1").unwrap().len(), 2);
        assert!(!cache.needs_fetch("u1"));
    }
}
