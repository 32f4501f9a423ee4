//! Environment-driven server configuration.
//!
//! Every key has a default; missing keys are recorded so they can be reported
//! once logging is up. Present-but-unparsable values are hard errors.

use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use log::{info, warn};
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_DATABASE_PATH: &str = "tasklist.sqlite3";
pub const DEFAULT_SESSION_COOKIE: &str = "session_token";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {key} value `{value}`: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub database_path: PathBuf,
    /// Exact origins allowed to call with credentials. Empty means same-origin only.
    pub allowed_origins: Vec<String>,
    pub log_level: String,
    /// Absolute directory for rolling log files; `None` logs to stderr.
    pub log_dir: Option<String>,
    pub session_cookie: String,
    defaulted: Vec<&'static str>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            allowed_origins: Vec::new(),
            log_level: tasklist_core::default_log_level().to_string(),
            log_dir: None,
            session_cookie: DEFAULT_SESSION_COOKIE.to_string(),
            defaulted: Vec::new(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(|key| env::var(key).ok())
    }

    /// Loads from an arbitrary key lookup; `load` passes the process environment.
    pub fn load_from(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut defaulted = Vec::new();
        let mut var = |key: &'static str| {
            let value = lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty());
            if value.is_none() {
                defaulted.push(key);
            }
            value
        };

        let port = parse_or("PORT", var("PORT"), DEFAULT_PORT)?;
        let database_path = var("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH));
        let allowed_origins = var("ALLOWED_ORIGINS")
            .map(|raw| split_origins(&raw))
            .unwrap_or_default();
        let log_level = var("LOG_LEVEL")
            .unwrap_or_else(|| tasklist_core::default_log_level().to_string());
        let log_dir = var("LOG_DIR");
        let session_cookie =
            var("SESSION_COOKIE").unwrap_or_else(|| DEFAULT_SESSION_COOKIE.to_string());

        Ok(Self {
            port,
            database_path,
            allowed_origins,
            log_level,
            log_dir,
            session_cookie,
            defaulted,
        })
    }

    /// Logs the effective configuration. Call after logging is initialized.
    pub fn log_summary(&self) {
        for key in &self.defaulted {
            info!("event=config_load module=server status=default key={key}");
        }
        if self.allowed_origins.is_empty() {
            warn!("event=config_load module=server status=warn key=ALLOWED_ORIGINS reason=empty_same_origin_only");
        }
        info!(
            "event=config_load module=server status=ok port={} database_path={} origins={}",
            self.port,
            self.database_path.display(),
            self.allowed_origins.len()
        );
    }

    pub fn address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

fn parse_or<T: FromStr>(
    key: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|err: T::Err| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: err.to_string(),
        }),
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| origin.trim_end_matches('/').to_string())
        .collect()
}
