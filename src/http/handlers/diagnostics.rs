//! Host reachability check (admin only).

use std::time::Duration;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::guard::authz::{self, ADMIN_ONLY};
use crate::guard::network;
use crate::http::extract::ValidJson;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::services::commands::{self, HostStatus};

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub target_host: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub host: String,
    pub status: HostStatus,
    /// Raw command output, only when `diagnostics.expose_output` is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

pub async fn verify(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidJson(body): ValidJson<VerifyRequest>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let host = network::check_hostname(&body.target_host, &state.policy.network)?;
    let principal = state.authenticate(&headers)?;
    authz::authorize(&principal, ADMIN_ONLY)?;

    let diagnostics = &state.config.diagnostics;
    let result = commands::verify_host(
        state.commands.as_ref(),
        &diagnostics.ping_program,
        host,
        Duration::from_secs(diagnostics.timeout_secs),
    )
    .await?;

    tracing::info!(
        user_id = principal.user_id,
        host = %result.host.as_str(),
        status = ?result.status,
        "Host verified"
    );
    tracing::debug!(stdout = %result.output.stdout, stderr = %result.output.stderr, "Verify output");

    Ok(Json(VerifyResponse {
        host: result.host.as_str().to_string(),
        status: result.status,
        output: diagnostics
            .expose_output
            .then(|| result.output.stdout.clone()),
    }))
}
