use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tasklist_core::{RpcEnvelope, RpcErrorBody, ServiceError};
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("unknown procedure `{0}`")]
    UnknownProcedure(String),

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("not authenticated")]
    Unauthenticated,

    #[error("internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Service(ServiceError::Validation { .. }) | ApiError::MalformedInput(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Service(ServiceError::Auth(_)) | ApiError::Unauthenticated => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Service(ServiceError::NotFound(_)) | ApiError::UnknownProcedure(_) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Service(ServiceError::Storage) | ApiError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn body(&self) -> RpcErrorBody {
        match self {
            ApiError::Service(err) => RpcErrorBody::from(err),
            ApiError::UnknownProcedure(_) => RpcErrorBody::new("UNKNOWN_PROCEDURE", self.to_string()),
            ApiError::MalformedInput(_) => RpcErrorBody::new("VALIDATION_ERROR", self.to_string()),
            ApiError::Unauthenticated => RpcErrorBody::new("AUTH_ERROR", self.to_string()),
            ApiError::Internal => RpcErrorBody::new("INTERNAL_ERROR", self.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(RpcEnvelope::Error(self.body()))).into_response()
    }
}

/// Startup failures of the server process.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("logging: {0}")]
    Logging(#[from] tasklist_core::LoggingError),

    #[error("database: {0}")]
    Database(#[from] tasklist_core::db::DbError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
