//! Session credential extraction and identity resolution.

use axum::http::{header, HeaderMap};
use log::error;
use rusqlite::Connection;
use tasklist_core::{Identity, IdentityProvider, ServiceError, SqliteSessionStore};

use crate::error::ApiError;

/// Reads the session token from `Authorization: Bearer …`, falling back to the session cookie.
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    bearer_token(headers).or_else(|| cookie_token(headers, cookie_name))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

fn cookie_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Resolves an optional token to the calling identity.
///
/// Store failures surface as an opaque storage error.
pub fn resolve_identity(
    conn: &Connection,
    token: Option<&str>,
) -> Result<Option<Identity>, ApiError> {
    let Some(token) = token else {
        return Ok(None);
    };
    SqliteSessionStore::new(conn).resolve(token).map_err(|err| {
        error!("event=session_resolve module=server status=error error_code=storage_failed error={err}");
        ApiError::Service(ServiceError::Storage)
    })
}
