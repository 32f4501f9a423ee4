use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Mutex,
};

use async_trait::async_trait;
use tokio::sync::Notify;
use tasklist_client::{is_optimistic_id, ClientError, ClientResult, TaskApi, TaskClient};
use tasklist_core::{Task, TaskStatus};

/// In-memory stand-in for the server.
#[derive(Default)]
struct FakeApi {
    tasks: Mutex<Vec<Task>>,
    clock: AtomicUsize,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
    reads: AtomicUsize,
    writes: AtomicUsize,
    hold_toggles: AtomicBool,
    toggle_parked: Notify,
    toggle_gate: Notify,
}

impl FakeApi {
    fn seeded(tasks: Vec<Task>) -> Self {
        Self {
            tasks: Mutex::new(tasks),
            clock: AtomicUsize::new(100),
            ..Self::default()
        }
    }

    fn write(&self) -> ClientResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ClientError::Remote {
                code: "STORAGE_ERROR".to_string(),
                message: "storage failure".to_string(),
            });
        }
        Ok(())
    }

    fn tick(&self) -> i64 {
        self.clock.fetch_add(1, Ordering::SeqCst) as i64
    }
}

#[async_trait]
impl TaskApi for FakeApi {
    async fn get_tasks(&self, owner: &str) -> ClientResult<Vec<Task>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ClientError::Decode("connection reset".to_string()));
        }
        let tasks = self.tasks.lock().unwrap();
        Ok(tasks.iter().filter(|t| t.owner == owner).cloned().collect())
    }

    async fn create_task(&self, owner: &str, text: &str) -> ClientResult<()> {
        self.write()?;
        let now = self.tick();
        let id = format!("srv-{now}");
        self.tasks
            .lock()
            .unwrap()
            .insert(0, Task::with_id(id, owner, text, now));
        Ok(())
    }

    async fn edit_task(&self, id: &str, text: &str) -> ClientResult<()> {
        self.write()?;
        let now = self.tick();
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks.iter_mut().find(|t| t.id == id).unwrap();
        task.text = text.to_string();
        task.updated_at = now;
        Ok(())
    }

    async fn update_task(&self, id: &str, status: TaskStatus) -> ClientResult<()> {
        if self.hold_toggles.load(Ordering::SeqCst) {
            self.toggle_parked.notify_one();
            self.toggle_gate.notified().await;
        }
        self.write()?;
        let now = self.tick();
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks.iter_mut().find(|t| t.id == id).unwrap();
        task.status = status.toggled();
        task.updated_at = now;
        Ok(())
    }

    async fn delete_task(&self, id: &str) -> ClientResult<()> {
        self.write()?;
        self.tasks.lock().unwrap().retain(|t| t.id != id);
        Ok(())
    }
}

fn seeded_client() -> TaskClient<FakeApi> {
    TaskClient::new(FakeApi::seeded(vec![
        Task::with_id("t2", "u1", "second", 20),
        Task::with_id("t1", "u1", "first", 10),
        Task::with_id("x1", "u2", "someone else", 15),
    ]))
}

#[tokio::test]
async fn first_read_fetches_then_serves_from_cache() {
    let client = seeded_client();

    let tasks = client.tasks("u1").await.unwrap();
    assert_eq!(tasks.len(), 2);
    client.tasks("u1").await.unwrap();
    assert_eq!(client.api().reads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn create_is_replaced_by_server_list_after_settle() {
    let client = seeded_client();
    client.tasks("u1").await.unwrap();

    client.create("u1", "  third ").await.unwrap();

    let cached = client.cached("u1").unwrap();
    assert_eq!(cached.len(), 3);
    assert_eq!(cached[0].text, "third");
    assert!(!is_optimistic_id(&cached[0].id));
    assert_eq!(client.api().reads.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failed_toggle_rolls_back_and_surfaces_the_error() {
    let client = seeded_client();
    let before = client.tasks("u1").await.unwrap();
    client.api().fail_writes.store(true, Ordering::SeqCst);

    let err = client
        .toggle("u1", "t1", TaskStatus::Pending)
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Remote { ref code, .. } if code == "STORAGE_ERROR"));
    assert_eq!(client.cached("u1").unwrap(), before);
    assert_eq!(client.api().reads.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failed_refetch_leaves_entry_stale() {
    let client = seeded_client();
    client.tasks("u1").await.unwrap();
    client.api().fail_reads.store(true, Ordering::SeqCst);

    client.delete("u1", "t2").await.unwrap();
    let cached = client.cached("u1").unwrap();
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].id, "t1");

    client.api().fail_reads.store(false, Ordering::SeqCst);
    let tasks = client.tasks("u1").await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(client.api().reads.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn blank_text_never_reaches_the_server() {
    let client = seeded_client();
    let before = client.tasks("u1").await.unwrap();

    let err = client.create("u1", "   ").await.unwrap_err();
    assert!(matches!(err, ClientError::EmptyText));
    let err = client.edit("u1", "t1", "").await.unwrap_err();
    assert!(matches!(err, ClientError::EmptyText));

    assert_eq!(client.api().writes.load(Ordering::SeqCst), 0);
    assert_eq!(client.cached("u1").unwrap(), before);
}

#[tokio::test]
async fn edit_and_toggle_reach_the_server() {
    let client = seeded_client();
    client.tasks("u1").await.unwrap();

    client.edit("u1", "t1", "first, revised").await.unwrap();
    client.toggle("u1", "t1", TaskStatus::Pending).await.unwrap();

    let tasks = client.tasks("u1").await.unwrap();
    let t1 = tasks.iter().find(|t| t.id == "t1").unwrap();
    assert_eq!(t1.text, "first, revised");
    assert_eq!(t1.status, TaskStatus::Completed);
    assert!(t1.updated_at >= t1.created_at);
}

#[tokio::test]
async fn write_settling_under_a_held_toggle_keeps_the_toggle() {
    let client = seeded_client();
    client.tasks("u1").await.unwrap();
    client.api().hold_toggles.store(true, Ordering::SeqCst);

    let toggle = client.toggle("u1", "t1", TaskStatus::Pending);
    let delete_meanwhile = async {
        client.api().toggle_parked.notified().await;
        let patched = client.cached("u1").unwrap();
        assert_eq!(patched[1].status, TaskStatus::Completed);

        client.api().fail_writes.store(true, Ordering::SeqCst);
        let err = client.delete("u1", "t2").await.unwrap_err();
        assert!(matches!(err, ClientError::Remote { .. }));
        let after_delete = client.cached("u1").unwrap();
        assert!(after_delete.iter().any(|t| t.id == "t2"));

        client.api().fail_writes.store(false, Ordering::SeqCst);
        client.api().toggle_gate.notify_one();
    };
    let (toggled, ()) = tokio::join!(toggle, delete_meanwhile);
    toggled.unwrap();

    let server: Vec<Task> = client
        .api()
        .tasks
        .lock()
        .unwrap()
        .iter()
        .filter(|t| t.owner == "u1")
        .cloned()
        .collect();
    let cached = client.cached("u1").unwrap();
    assert_eq!(cached, server);
    assert_eq!(cached.len(), 2);
    assert_eq!(cached[1].status, TaskStatus::Completed);
    assert_eq!(client.api().writes.load(Ordering::SeqCst), 2);
    assert_eq!(client.api().reads.load(Ordering::SeqCst), 3);
}
