//! Procedure dispatch: decode input, run the task service, encode output.

use log::debug;
use rusqlite::Connection;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tasklist_core::{
    BatchCall, CreateTaskInput, DeleteTaskInput, EditTaskInput, Identity, ListTasksInput,
    Procedure, RpcEnvelope, SqliteTaskRepository, TaskService, UpdateStatusInput,
};

use crate::error::ApiError;

pub fn parse_procedure(name: &str) -> Result<Procedure, ApiError> {
    Procedure::from_name(name).ok_or_else(|| ApiError::UnknownProcedure(name.to_string()))
}

/// Runs one procedure for an already-resolved caller.
pub fn dispatch(
    conn: &Connection,
    caller: Option<&Identity>,
    procedure: Procedure,
    input: Value,
) -> Result<Value, ApiError> {
    let service = TaskService::new(SqliteTaskRepository::new(conn));
    debug!("event=rpc_call module=server status=start procedure={procedure}");

    match procedure {
        Procedure::GetTasks => {
            let input: ListTasksInput = decode(input)?;
            encode(service.list_tasks(caller, &input)?)
        }
        Procedure::CreateTask => {
            let input: CreateTaskInput = decode(input)?;
            encode(service.create_task(caller, &input)?)
        }
        Procedure::EditTask => {
            let input: EditTaskInput = decode(input)?;
            encode(service.edit_task(caller, &input)?)
        }
        Procedure::UpdateTask => {
            let input: UpdateStatusInput = decode(input)?;
            encode(service.update_status(caller, &input)?)
        }
        Procedure::DeleteTask => {
            let input: DeleteTaskInput = decode(input)?;
            encode(service.delete_task(caller, &input)?)
        }
    }
}

/// Runs every call independently; one failing call does not affect the others.
pub fn dispatch_batch(
    conn: &Connection,
    caller: Option<&Identity>,
    calls: Vec<BatchCall>,
) -> Vec<RpcEnvelope> {
    calls
        .into_iter()
        .map(|call| {
            parse_procedure(&call.procedure)
                .and_then(|procedure| dispatch(conn, caller, procedure, call.input))
                .map_or_else(|err| RpcEnvelope::Error(err.body()), RpcEnvelope::Result)
        })
        .collect()
}

fn decode<T: DeserializeOwned>(input: Value) -> Result<T, ApiError> {
    serde_json::from_value(input).map_err(|err| ApiError::MalformedInput(err.to_string()))
}

fn encode<T: Serialize>(output: T) -> Result<Value, ApiError> {
    serde_json::to_value(output).map_err(|_| ApiError::Internal)
}
