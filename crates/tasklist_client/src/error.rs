use tasklist_core::RpcErrorBody;
use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Rejected locally; nothing was sent and the cache was not touched.
    #[error("task text must not be empty")]
    EmptyText,

    /// The server answered with an error envelope.
    #[error("{code}: {message}")]
    Remote { code: String, message: String },

    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ClientError {
    pub fn is_auth(&self) -> bool {
        matches!(self, ClientError::Remote { code, .. } if code == "AUTH_ERROR")
    }
}

impl From<RpcErrorBody> for ClientError {
    fn from(body: RpcErrorBody) -> Self {
        ClientError::Remote {
            code: body.code,
            message: body.message,
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}
