//! Topic comments.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

use crate::guard::{bound, content};
use crate::http::extract::{ValidJson, ValidPath, ValidQuery};
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::services::comments::{Comment, CommentPage};

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

/// `?page=&per_page=`; both optional, both bounded.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub per_page: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    ValidPath(topic_id): ValidPath<String>,
    headers: HeaderMap,
    ValidJson(body): ValidJson<CommentRequest>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let topic = bound::check_str(&topic_id, state.policy.max_resource_id)?;
    let text = content::check(&body.content, &state.policy.comment)?;
    let principal = state.authenticate(&headers)?;

    let comment = state.comments.put(topic, &principal, text)?;
    tracing::info!(
        topic_id = topic.get(),
        comment_id = comment.id,
        user_id = principal.user_id,
        "Comment stored"
    );
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn list(
    State(state): State<AppState>,
    ValidPath(topic_id): ValidPath<String>,
    ValidQuery(query): ValidQuery<PageQuery>,
) -> Result<Json<CommentPage>, ApiError> {
    let policy = &state.policy;
    let topic = bound::check_str(&topic_id, policy.max_resource_id)?;
    let page = bound::check_str(query.page.as_deref().unwrap_or("1"), policy.max_resource_id)?;
    let per_page = match query.per_page.as_deref() {
        Some(raw) => bound::check_str(raw, policy.max_page_size)?,
        None => bound::check_uint(policy.max_page_size.get(), policy.max_page_size)?,
    };
    Ok(Json(state.comments.list(topic, page, per_page)?))
}
