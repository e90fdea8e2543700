//! Profile picture import from a client-supplied URL.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::guard::network;
use crate::http::extract::ValidJson;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;

#[derive(Debug, Deserialize)]
pub struct PictureRequest {
    pub image_url: String,
}

#[derive(Debug, Serialize)]
pub struct PictureResponse {
    pub status: &'static str,
    pub bytes: usize,
    pub content_type: Option<String>,
}

pub async fn profile_picture(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidJson(body): ValidJson<PictureRequest>,
) -> Result<Json<PictureResponse>, ApiError> {
    let target = network::check_url(
        &body.image_url,
        &state.policy.network,
        state.resolver.as_ref(),
    )
    .await?;
    let principal = state.authenticate(&headers)?;

    let fetched = state.fetcher.fetch(&target).await?;
    metrics::record_fetch("ok");

    tracing::info!(
        user_id = principal.user_id,
        host = %target.host(),
        bytes = fetched.bytes,
        "Profile picture fetched"
    );
    Ok(Json(PictureResponse {
        status: "updated",
        bytes: fetched.bytes,
        content_type: fetched.content_type,
    }))
}
