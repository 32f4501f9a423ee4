use std::sync::{Arc, Mutex};

use log::error;
use rusqlite::Connection;

use crate::{config::Config, error::ApiError};

/// Shared handler state. Requests serialize on the single SQLite connection.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(conn: Connection, config: Config) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            config: Arc::new(config),
        }
    }

    /// Runs blocking SQLite work off the async runtime.
    pub async fn with_connection<T, F>(&self, work: F) -> Result<T, ApiError>
    where
        F: FnOnce(&Connection) -> Result<T, ApiError> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || {
            let conn = db.lock().map_err(|_| {
                error!("event=db_lock module=server status=error error_code=lock_poisoned");
                ApiError::Internal
            })?;
            work(&conn)
        })
        .await
        .map_err(|err| {
            error!("event=db_task module=server status=error error_code=join_failed error={err}");
            ApiError::Internal
        })?
    }
}
