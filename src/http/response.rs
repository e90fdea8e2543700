//! Error responses.
//!
//! # Responsibilities
//! - Map guard rejections and collaborator failures to HTTP status codes
//! - Render a fixed JSON body per failure class, never the internal detail
//! - Log the detail server-side (warn for rejections, error for 5xx)
//!
//! # Status Mapping
//! ```text
//! Malformed, OutOfBounds, ContentTooLong,
//! ContentInvalidChars, SchemeDisallowed          → 400
//! Unauthenticated, invalid credentials           → 401
//! InsufficientRole, SelfTargetForbidden,
//! PrivateNetworkTarget                           → 403
//! TraversalDetected, NotFound                    → 404
//! username conflict                              → 409
//! Unresolvable, upstream failure                 → 502
//! queue full                                     → 503
//! Timeout (DNS, fetch, command)                  → 504
//! storage / spawn / internal                     → 500
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::guard::{Rejection, RejectionReason};
use crate::observability::metrics;
use crate::services::commands::CommandError;
use crate::services::fetcher::FetchError;
use crate::services::reports::ReportError;
use crate::services::StoreError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
}

/// Handler-level error.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("rejected: {0}")]
    Rejected(#[from] Rejection),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("resource not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        ApiError::Internal(detail.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Rejected(r) => rejection_status(r.reason()),
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Store(StoreError::Conflict(_)) => StatusCode::CONFLICT,
            ApiError::Store(StoreError::CapacityExceeded(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Store(StoreError::Unavailable(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Fetch(FetchError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Fetch(_) => StatusCode::BAD_GATEWAY,
            ApiError::Command(CommandError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Command(CommandError::Spawn { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Report(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Fixed per class.
    pub fn public_message(&self) -> &'static str {
        match self {
            ApiError::Rejected(r) => rejection_message(r.reason()),
            ApiError::InvalidCredentials => "invalid credentials",
            ApiError::NotFound => "not found",
            ApiError::Store(StoreError::Conflict(_)) => "already exists",
            ApiError::Store(StoreError::CapacityExceeded(_)) => "service busy, retry later",
            ApiError::Fetch(FetchError::Timeout(_)) | ApiError::Command(CommandError::Timeout(_)) => {
                "upstream timed out"
            }
            ApiError::Fetch(_) => "upstream fetch failed",
            ApiError::Store(_) | ApiError::Command(_) | ApiError::Report(_) | ApiError::Internal(_) => {
                "internal error"
            }
        }
    }
}

pub fn rejection_status(reason: RejectionReason) -> StatusCode {
    match reason {
        RejectionReason::Malformed
        | RejectionReason::OutOfBounds
        | RejectionReason::SchemeDisallowed
        | RejectionReason::ContentTooLong
        | RejectionReason::ContentInvalidChars => StatusCode::BAD_REQUEST,
        RejectionReason::TraversalDetected | RejectionReason::NotFound => StatusCode::NOT_FOUND,
        RejectionReason::Unauthenticated => StatusCode::UNAUTHORIZED,
        RejectionReason::InsufficientRole
        | RejectionReason::SelfTargetForbidden
        | RejectionReason::PrivateNetworkTarget => StatusCode::FORBIDDEN,
        RejectionReason::Unresolvable => StatusCode::BAD_GATEWAY,
        RejectionReason::Timeout => StatusCode::GATEWAY_TIMEOUT,
        RejectionReason::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn rejection_message(reason: RejectionReason) -> &'static str {
    match reason {
        RejectionReason::Malformed => "malformed request",
        RejectionReason::OutOfBounds => "value out of range",
        // Same body as a missing file, so probing learns nothing about layout.
        RejectionReason::TraversalDetected | RejectionReason::NotFound => "not found",
        RejectionReason::SchemeDisallowed => "url scheme not allowed",
        RejectionReason::PrivateNetworkTarget => "target not allowed",
        RejectionReason::Unresolvable => "target could not be resolved",
        RejectionReason::Unauthenticated => "authentication required",
        RejectionReason::InsufficientRole => "forbidden",
        RejectionReason::SelfTargetForbidden => "operation not permitted on own account",
        RejectionReason::ContentTooLong => "content too long",
        RejectionReason::ContentInvalidChars => "content contains invalid characters",
        RejectionReason::Timeout => "upstream timed out",
        RejectionReason::Internal => "internal error",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Rejected(r) => {
                metrics::record_rejection(r.reason());
                tracing::warn!(
                    reason = %r.reason(),
                    detail = %r.detail(),
                    status = status.as_u16(),
                    "Request rejected"
                );
            }
            ApiError::Fetch(e) => {
                metrics::record_fetch(e.outcome());
                tracing::warn!(error = %e, status = status.as_u16(), "Outbound fetch failed");
            }
            other if status.is_server_error() => {
                tracing::error!(error = %other, status = status.as_u16(), "Request failed");
            }
            other => {
                tracing::info!(error = %other, status = status.as_u16(), "Request refused");
            }
        }

        (
            status,
            Json(ErrorBody {
                error: self.public_message(),
            }),
        )
            .into_response()
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        ApiError::Rejected(self).into_response()
    }
}
