//! Task scheduling and status.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::guard::{content, path};
use crate::guard::{Rejection, Role};
use crate::http::extract::{ValidJson, ValidPath};
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::services::tasks::Task;

#[derive(Debug, Deserialize)]
pub struct ScheduleRequest {
    pub filename: String,
}

pub async fn schedule(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidJson(body): ValidJson<ScheduleRequest>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let filename = content::check(&body.filename, &state.policy.task_filename)?;
    let input = path::check(
        filename.as_str(),
        &state.policy.storage_root,
        state.policy.max_path_len,
    )?;
    let principal = state.authenticate(&headers)?;

    let task = state.tasks.submit(&principal, filename, input)?;
    tracing::info!(task_id = %task.id, user_id = principal.user_id, "Task scheduled");
    Ok((StatusCode::ACCEPTED, Json(task)))
}

/// Owners see their own tasks, admins see all; anyone else gets 404.
pub async fn status(
    State(state): State<AppState>,
    ValidPath(raw_id): ValidPath<String>,
    headers: HeaderMap,
) -> Result<Json<Task>, ApiError> {
    let id = Uuid::parse_str(&raw_id)
        .map_err(|_| Rejection::malformed(format!("task id ({} bytes)", raw_id.len())))?;
    let principal = state.authenticate(&headers)?;

    let task = state.tasks.get(&id)?.ok_or(ApiError::NotFound)?;
    if task.owner_id != principal.user_id && principal.role != Role::Admin {
        return Err(ApiError::NotFound);
    }
    Ok(Json(task))
}
