//! Classified guard rejections.
//!
//! A [`Rejection`] pairs a [`RejectionReason`] tag with a server-side detail
//! string. The detail is for logs only; the HTTP layer renders a fixed
//! message per reason (see `http::response`).

use serde::Serialize;
use thiserror::Error;

/// Why a guard refused an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// Input could not be parsed or is structurally invalid.
    Malformed,
    /// Numeric input outside `[1, max]`.
    OutOfBounds,
    /// Path escapes the storage root after canonicalization.
    TraversalDetected,
    /// URL scheme is not allow-listed.
    SchemeDisallowed,
    /// Target resolves into a private, loopback, link-local or reserved block.
    PrivateNetworkTarget,
    /// Target host did not resolve to any address.
    Unresolvable,
    /// Missing, malformed, forged or expired credential.
    Unauthenticated,
    /// Principal role is not in the endpoint's required set.
    InsufficientRole,
    /// Principal attempted a destructive operation on itself.
    SelfTargetForbidden,
    /// Free text exceeds the configured maximum length.
    ContentTooLong,
    /// Free text contains characters outside the allowed class.
    ContentInvalidChars,
    /// Input was valid but names nothing that exists.
    NotFound,
    /// Guard-side deadline (DNS resolution) expired.
    Timeout,
    /// Guard could not complete for reasons unrelated to the input.
    Internal,
}

impl RejectionReason {
    /// Stable tag used in logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionReason::Malformed => "malformed",
            RejectionReason::OutOfBounds => "out_of_bounds",
            RejectionReason::TraversalDetected => "traversal_detected",
            RejectionReason::SchemeDisallowed => "scheme_disallowed",
            RejectionReason::PrivateNetworkTarget => "private_network_target",
            RejectionReason::Unresolvable => "unresolvable",
            RejectionReason::Unauthenticated => "unauthenticated",
            RejectionReason::InsufficientRole => "insufficient_role",
            RejectionReason::SelfTargetForbidden => "self_target_forbidden",
            RejectionReason::ContentTooLong => "content_too_long",
            RejectionReason::ContentInvalidChars => "content_invalid_chars",
            RejectionReason::NotFound => "not_found",
            RejectionReason::Timeout => "timeout",
            RejectionReason::Internal => "internal",
        }
    }
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A guard refusal: reason tag plus log-only detail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}: {detail}")]
pub struct Rejection {
    reason: RejectionReason,
    detail: String,
}

impl Rejection {
    pub fn new(reason: RejectionReason, detail: impl Into<String>) -> Self {
        Self {
            reason,
            detail: detail.into(),
        }
    }

    pub fn reason(&self) -> RejectionReason {
        self.reason
    }

    /// Server-side detail. Never send this to the client.
    pub fn detail(&self) -> &str {
        &self.detail
    }

    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::new(RejectionReason::Malformed, detail)
    }

    pub fn unauthenticated(detail: impl Into<String>) -> Self {
        Self::new(RejectionReason::Unauthenticated, detail)
    }
}

/// Outcome of a guard: a trusted value or a classified rejection.
pub type GuardResult<T> = Result<T, Rejection>;
