//! Operational endpoints mounted at `/actuator`, outside the API base path.
//!
//! These answer with bare JSON rather than the response envelope so probes
//! can read `status` directly.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

use super::AppState;
use super::types::{ComponentHealth, HealthComponents, HealthResponse, InfoResponse};
use crate::config::Config;

const UP: &str = "UP";
const DOWN: &str = "DOWN";

/// GET /actuator/health
///
/// 200 when the database answers, 503 otherwise.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let db = match state.store.ping().await {
        Ok(()) => ComponentHealth {
            status: UP,
            error: None,
        },
        Err(e) => {
            tracing::error!(error = %e, "Database health check failed");
            ComponentHealth {
                status: DOWN,
                error: Some(e.to_string()),
            }
        }
    };

    let (code, status) = if db.status == UP {
        (StatusCode::OK, UP)
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, DOWN)
    };

    (
        code,
        Json(HealthResponse {
            status,
            components: HealthComponents { db },
        }),
    )
}

/// GET /actuator/info
pub async fn info(State(state): State<Arc<AppState>>) -> Json<InfoResponse> {
    Json(InfoResponse {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

/// GET /actuator/config
/// Running configuration with secrets masked
pub async fn config(State(state): State<Arc<AppState>>) -> Json<Config> {
    Json(state.config.redacted())
}
