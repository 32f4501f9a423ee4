//! Remote task procedures as seen from the client.

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use tasklist_core::{
    CreateTaskInput, DeleteTaskInput, EditTaskInput, ListTasksInput, Procedure, RpcEnvelope,
    Task, TaskStatus, UpdateStatusInput,
};

use crate::error::{ClientError, ClientResult};

#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn get_tasks(&self, owner: &str) -> ClientResult<Vec<Task>>;

    async fn create_task(&self, owner: &str, text: &str) -> ClientResult<()>;

    async fn edit_task(&self, id: &str, text: &str) -> ClientResult<()>;

    /// `status` is the current status; the server stores its opposite.
    async fn update_task(&self, id: &str, status: TaskStatus) -> ClientResult<()>;

    async fn delete_task(&self, id: &str) -> ClientResult<()>;
}

/// [`TaskApi`] over the server's `/rpc/{procedure}` routes.
#[derive(Debug, Clone)]
pub struct HttpTaskApi {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpTaskApi {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url, token)
    }

    /// Reuses an existing `reqwest::Client` and its connection pool.
    pub fn with_client(client: Client, base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            token: token.into(),
        }
    }

    async fn call<I, O>(&self, procedure: Procedure, input: &I) -> ClientResult<O>
    where
        I: Serialize + Sync,
        O: DeserializeOwned,
    {
        let url = format!("{}/rpc/{}", self.base_url, procedure.name());
        debug!("event=rpc_request module=client status=start procedure={procedure}");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(input)
            .send()
            .await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        let envelope: RpcEnvelope = serde_json::from_slice(&bytes)
            .map_err(|err| ClientError::Decode(format!("status {status}: {err}")))?;
        match envelope {
            RpcEnvelope::Result(value) => Ok(serde_json::from_value(value)?),
            RpcEnvelope::Error(body) => {
                debug!(
                    "event=rpc_request module=client status=error procedure={procedure} code={}",
                    body.code
                );
                Err(body.into())
            }
        }
    }
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    async fn get_tasks(&self, owner: &str) -> ClientResult<Vec<Task>> {
        let input = ListTasksInput {
            owner: owner.to_string(),
        };
        self.call(Procedure::GetTasks, &input).await
    }

    async fn create_task(&self, owner: &str, text: &str) -> ClientResult<()> {
        let input = CreateTaskInput {
            owner: owner.to_string(),
            text: text.to_string(),
        };
        self.call(Procedure::CreateTask, &input).await
    }

    async fn edit_task(&self, id: &str, text: &str) -> ClientResult<()> {
        let input = EditTaskInput {
            id: id.to_string(),
            text: text.to_string(),
        };
        self.call(Procedure::EditTask, &input).await
    }

    async fn update_task(&self, id: &str, status: TaskStatus) -> ClientResult<()> {
        let input = UpdateStatusInput {
            id: id.to_string(),
            status,
        };
        self.call(Procedure::UpdateTask, &input).await
    }

    async fn delete_task(&self, id: &str) -> ClientResult<()> {
        let input = DeleteTaskInput { id: id.to_string() };
        self.call(Procedure::DeleteTask, &input).await
    }
}
