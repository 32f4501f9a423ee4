//! Wire vocabulary of the task remote procedures.
//!
//! # Responsibility
//! - Name the five procedures and their stable wire names.
//! - Define the response envelope shared by the server and clients.
//!
//! # Invariants
//! - A response envelope is exactly one of `{"result": …}` or `{"error": …}`.
//! - Batch responses keep request order, one envelope per call.

use crate::service::task_service::ServiceError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{Display, Formatter};

/// Remote procedures exposed by the task service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Procedure {
    GetTasks,
    CreateTask,
    EditTask,
    UpdateTask,
    DeleteTask,
}

impl Procedure {
    pub const ALL: [Procedure; 5] = [
        Self::GetTasks,
        Self::CreateTask,
        Self::EditTask,
        Self::UpdateTask,
        Self::DeleteTask,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::GetTasks => "getTasks",
            Self::CreateTask => "createTask",
            Self::EditTask => "editTask",
            Self::UpdateTask => "updateTask",
            Self::DeleteTask => "deleteTask",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|procedure| procedure.name() == name)
    }
}

impl Display for Procedure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Error payload carried by [`RpcEnvelope::Error`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcErrorBody {
    pub code: String,
    pub message: String,
}

impl RpcErrorBody {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<&ServiceError> for RpcErrorBody {
    fn from(value: &ServiceError) -> Self {
        Self::new(value.code(), value.to_string())
    }
}

/// One procedure response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RpcEnvelope {
    Result(Value),
    Error(RpcErrorBody),
}

/// One call inside a batch request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchCall {
    pub procedure: String,
    #[serde(default)]
    pub input: Value,
}

#[cfg(test)]
mod tests {
    use super::{Procedure, RpcEnvelope, RpcErrorBody};
    use serde_json::json;

    #[test]
    fn procedure_names_round_trip() {
        for procedure in Procedure::ALL {
            assert_eq!(Procedure::from_name(procedure.name()), Some(procedure));
        }
        assert_eq!(Procedure::from_name("dropTables"), None);
    }

    #[test]
    fn envelope_wire_shape_is_single_keyed() {
        let ok = serde_json::to_value(RpcEnvelope::Result(json!(null))).unwrap();
        assert_eq!(ok, json!({ "result": null }));

        let err = serde_json::to_value(RpcEnvelope::Error(RpcErrorBody::new(
            "AUTH_ERROR",
            "unauthorized: sign-in required",
        )))
        .unwrap();
        assert_eq!(err["error"]["code"], "AUTH_ERROR");
    }
}
