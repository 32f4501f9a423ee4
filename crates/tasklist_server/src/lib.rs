//! HTTP transport for the task remote procedures.
//!
//! # Routes
//! - `POST /rpc/{procedure}`: one call (`getTasks`, `createTask`, `editTask`,
//!   `updateTask`, `deleteTask`), JSON input, `{"result": …}` or `{"error": …}` out.
//! - `POST /rpc`: batch of `{ "procedure", "input" }` calls, answered in order.
//! - `GET /api/health`: liveness probe.
//! - `GET /api/me`: identity behind the session credentials.
//!
//! # Sessions
//! Credentials are read from `Authorization: Bearer <token>` or the session cookie
//! (`SESSION_COOKIE`, default `session_token`). Sessions are issued out of band,
//! e.g. `tasklist_cli session issue <user-id>`.
//!
//! # Configuration
//! `PORT`, `DATABASE_PATH`, `ALLOWED_ORIGINS` (comma-separated), `LOG_LEVEL`,
//! `LOG_DIR`, `SESSION_COOKIE`. See [`config::Config`].

use std::time::Duration;

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method,
    },
    routing::{get, post},
    Router,
};
use log::{error, info, warn};
use tasklist_core::LogTarget;
use tokio::{net::TcpListener, signal};
use tower_http::cors::{AllowOrigin, CorsLayer};

pub mod config;
pub mod error;
pub mod routes;
pub mod rpc;
pub mod session;
pub mod state;

use config::Config;
use error::ServerError;
use routes::{health_handler, me_handler, rpc_batch_handler, rpc_handler};
use state::AppState;

const X_REQUESTED_WITH: HeaderName = HeaderName::from_static("x-requested-with");

pub async fn start_server() -> Result<(), ServerError> {
    let config = Config::load()?;

    let target = match config.log_dir.as_deref() {
        Some(dir) => LogTarget::dir(dir)?,
        None => LogTarget::Stderr,
    };
    tasklist_core::init_logging(&config.log_level, target)?;
    config.log_summary();

    info!("event=server_start module=server status=start");
    let conn = tasklist_core::db::open_db(&config.database_path)?;
    let address = config.address();
    let state = AppState::new(conn, config);
    let app = router(state);

    let listener = TcpListener::bind(&address).await?;
    info!("event=server_start module=server status=ok address={address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("event=server_stop module=server status=ok");
    Ok(())
}

/// Builds the application router with CORS applied.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.allowed_origins);

    Router::new()
        .route("/rpc", post(rpc_batch_handler))
        .route("/rpc/{procedure}", post(rpc_handler))
        .route("/api/health", get(health_handler))
        .route("/api/me", get(me_handler))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| {
            HeaderValue::from_str(origin)
                .inspect_err(|_| {
                    warn!("event=cors_config module=server status=skip reason=invalid_origin");
                })
                .ok()
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION, X_REQUESTED_WITH])
        .max_age(Duration::from_secs(60 * 60))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("event=server_signal module=server status=ok signal=ctrl_c"),
            Err(err) => {
                error!("event=server_signal module=server status=error signal=ctrl_c error={err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("event=server_signal module=server status=ok signal=terminate");
            }
            Err(err) => {
                error!("event=server_signal module=server status=error signal=terminate error={err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
