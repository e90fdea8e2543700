//! File download confined to the storage root.

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::guard::path;
use crate::http::extract::ValidQuery;
use crate::http::response::ApiError;
use crate::http::server::AppState;

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub filename: String,
}

pub async fn download(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<DownloadQuery>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let policy = &state.policy;
    let safe = path::check(&query.filename, &policy.storage_root, policy.max_path_len)?;
    let principal = state.authenticate(&headers)?;

    let metadata = tokio::fs::metadata(safe.as_path())
        .await
        .map_err(|_| ApiError::NotFound)?;
    if !metadata.is_file() {
        return Err(ApiError::NotFound);
    }
    let bytes = tokio::fs::read(safe.as_path())
        .await
        .map_err(|_| ApiError::NotFound)?;

    tracing::info!(
        user_id = principal.user_id,
        bytes = bytes.len(),
        "File served"
    );

    let disposition = safe
        .file_name()
        .filter(|n| n.bytes().all(|b| b.is_ascii_graphic() && b != b'"' && b != b'\\'))
        .and_then(|n| HeaderValue::from_str(&format!("attachment; filename=\"{}\"", n)).ok())
        .unwrap_or_else(|| HeaderValue::from_static("attachment"));

    Ok((
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from(bytes),
    )
        .into_response())
}
