//! Liveness and status.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::http::response::ApiError;
use crate::http::server::AppState;

#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub uptime_secs: u64,
    pub pending_tasks: usize,
}

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

pub async fn status(State(state): State<AppState>) -> Result<Json<SystemStatus>, ApiError> {
    Ok(Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        uptime_secs: state.started_at.elapsed().as_secs(),
        pending_tasks: state.tasks.pending_len()?,
    }))
}
