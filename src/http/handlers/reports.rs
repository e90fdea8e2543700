//! Bounded report generation.

use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::guard::bound::{self, RawCount};
use crate::http::extract::ValidJson;
use crate::http::response::ApiError;
use crate::http::server::AppState;

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    pub record_count: RawCount,
}

pub async fn generate(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidJson(body): ValidJson<ReportRequest>,
) -> Result<Response, ApiError> {
    let count = bound::check(&body.record_count, state.policy.max_record_limit)?;
    let principal = state.authenticate(&headers)?;

    let records = state.data_source.fetch_records(count).await?;
    let report = state.renderer.render(&records)?;

    tracing::info!(
        user_id = principal.user_id,
        records = count.get(),
        "Report generated"
    );

    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", report.file_name))
        .map_err(ApiError::internal)?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(report.content_type)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        report.body,
    )
        .into_response())
}
