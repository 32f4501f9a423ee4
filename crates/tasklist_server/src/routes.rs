use axum::{
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use log::warn;
use serde_json::{json, Value};
use tasklist_core::{now_epoch_ms, BatchCall, RpcEnvelope};

use crate::{
    error::ApiError,
    rpc::{dispatch, dispatch_batch, parse_procedure},
    session::{resolve_identity, session_token},
    state::AppState,
};

/// `POST /rpc/{procedure}`: one call, JSON input in the body.
pub async fn rpc_handler(
    State(state): State<AppState>,
    Path(procedure): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<RpcEnvelope>, ApiError> {
    let procedure = parse_procedure(&procedure).inspect_err(|_| {
        warn!("event=rpc_call module=server status=rejected reason=unknown_procedure");
    })?;
    let input = parse_body::<Value>(&body)?;
    let token = session_token(&headers, &state.config.session_cookie);

    let result = state
        .with_connection(move |conn| {
            let caller = resolve_identity(conn, token.as_deref())?;
            dispatch(conn, caller.as_ref(), procedure, input)
        })
        .await?;

    Ok(Json(RpcEnvelope::Result(result)))
}

/// `POST /rpc`: JSON array of calls, answered in order.
pub async fn rpc_batch_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Vec<RpcEnvelope>>, ApiError> {
    let calls = parse_body::<Vec<BatchCall>>(&body)?;
    let token = session_token(&headers, &state.config.session_cookie);

    let responses = state
        .with_connection(move |conn| {
            let caller = resolve_identity(conn, token.as_deref())?;
            Ok(dispatch_batch(conn, caller.as_ref(), calls))
        })
        .await?;

    Ok(Json(responses))
}

/// `GET /api/health`
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": now_epoch_ms(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// `GET /api/me`: the identity behind the request credentials.
pub async fn me_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let token = session_token(&headers, &state.config.session_cookie);
    let identity = state
        .with_connection(move |conn| resolve_identity(conn, token.as_deref()))
        .await?
        .ok_or(ApiError::Unauthenticated)?;

    Ok(Json(json!({ "user": { "id": identity.user_id, "name": identity.name } })))
}

fn parse_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return serde_json::from_value(Value::Null)
            .map_err(|err| ApiError::MalformedInput(err.to_string()));
    }
    serde_json::from_slice(body).map_err(|err| ApiError::MalformedInput(err.to_string()))
}
