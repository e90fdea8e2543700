use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};

use crate::admin::auth::require_admin;
use crate::guard::{authz, bound};
use crate::http::extract::ValidPath;
use crate::http::response::ApiError;
use crate::http::server::AppState;

/// `DELETE /api/v1/admin/users/{id}`
pub async fn delete_user(
    State(state): State<AppState>,
    ValidPath(raw_id): ValidPath<String>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let target = bound::check_str(&raw_id, state.policy.max_resource_id)?;
    let admin = require_admin(&state, &headers)?;
    let target = authz::forbid_self_target(&admin, target)?;

    if !state.users.delete(target).await? {
        return Err(ApiError::NotFound);
    }
    tracing::info!(admin_id = admin.user_id, deleted_id = target.get(), "User deleted");
    Ok(StatusCode::NO_CONTENT)
}
