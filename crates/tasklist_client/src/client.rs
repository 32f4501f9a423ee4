//! Cache-backed task client.
//!
//! Every mutation runs begin → remote call → settle → refetch. The cache lock is
//! only held between awaits, never across one.

use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{info, warn};
use tasklist_core::{now_epoch_ms, Task, TaskStatus};

use crate::{
    api::TaskApi,
    cache::{Settlement, TaskCache},
    error::ClientResult,
    patch::Mutation,
};

pub struct TaskClient<A: TaskApi> {
    api: A,
    cache: Mutex<TaskCache>,
}

impl<A: TaskApi> TaskClient<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            cache: Mutex::new(TaskCache::new()),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Cached list for `owner`, fetched first when missing or stale.
    pub async fn tasks(&self, owner: &str) -> ClientResult<Vec<Task>> {
        let cached = {
            let cache = self.lock();
            (!cache.needs_fetch(owner))
                .then(|| cache.tasks(owner).map(<[Task]>::to_vec))
                .flatten()
        };
        match cached {
            Some(tasks) => Ok(tasks),
            None => self.refetch(owner).await,
        }
    }

    /// Current cache contents without touching the network.
    pub fn cached(&self, owner: &str) -> Option<Vec<Task>> {
        self.lock().tasks(owner).map(<[Task]>::to_vec)
    }

    /// Fetches from the server. If an optimistic write started meanwhile, the
    /// fetched list is dropped and the cached (patched) list is returned instead.
    pub async fn refetch(&self, owner: &str) -> ClientResult<Vec<Task>> {
        let ticket = self.lock().begin_read(owner);
        let fetched = self.api.get_tasks(owner).await?;

        let mut cache = self.lock();
        if cache.finish_read(ticket, fetched.clone()) {
            return Ok(fetched);
        }
        Ok(cache.tasks(owner).map(<[Task]>::to_vec).unwrap_or(fetched))
    }

    pub async fn create(&self, owner: &str, text: &str) -> ClientResult<()> {
        let mutation = Mutation::Create {
            owner: owner.to_string(),
            text: text.trim().to_string(),
        };
        self.mutate(owner, mutation).await
    }

    pub async fn edit(&self, owner: &str, id: &str, text: &str) -> ClientResult<()> {
        let mutation = Mutation::Edit {
            id: id.to_string(),
            text: text.trim().to_string(),
        };
        self.mutate(owner, mutation).await
    }

    /// `status` is the status currently shown for the task.
    pub async fn toggle(&self, owner: &str, id: &str, status: TaskStatus) -> ClientResult<()> {
        let mutation = Mutation::Toggle {
            id: id.to_string(),
            status,
        };
        self.mutate(owner, mutation).await
    }

    pub async fn delete(&self, owner: &str, id: &str) -> ClientResult<()> {
        let mutation = Mutation::Delete { id: id.to_string() };
        self.mutate(owner, mutation).await
    }

    async fn mutate(&self, owner: &str, mutation: Mutation) -> ClientResult<()> {
        let pending = self
            .lock()
            .begin_optimistic(owner, mutation.clone(), now_epoch_ms())?;

        let outcome = self.send(&mutation).await;
        let settlement = self.lock().settle(pending, &outcome);
        if settlement == Settlement::RolledBack {
            if let Err(err) = &outcome {
                warn!(
                    "event=task_mutation module=client status=rolled_back mutation={} error={err}",
                    mutation.name()
                );
            }
        } else {
            info!(
                "event=task_mutation module=client status=ok mutation={}",
                mutation.name()
            );
        }

        // A failed refetch leaves the entry stale for the next read.
        if let Err(err) = self.refetch(owner).await {
            warn!("event=cache_refetch module=client status=error owner={owner} error={err}");
        }
        outcome
    }

    async fn send(&self, mutation: &Mutation) -> ClientResult<()> {
        match mutation {
            Mutation::Create { owner, text } => self.api.create_task(owner, text).await,
            Mutation::Edit { id, text } => self.api.edit_task(id, text).await,
            Mutation::Toggle { id, status } => self.api.update_task(id, *status).await,
            Mutation::Delete { id } => self.api.delete_task(id).await,
        }
    }

    fn lock(&self) -> MutexGuard<'_, TaskCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
