//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0, timeouts > 0, min ≤ max)
//! - Check that patterns, CIDRs and schemes parse
//! - Reject weak signing secrets
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use regex::Regex;
use thiserror::Error;

use crate::config::schema::ServiceConfig;
use crate::guard::cidr::CidrBlock;
use crate::guard::identity::Role;

/// Minimum HS256 secret length in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Longest token lifetime accepted (30 days).
pub const MAX_TOKEN_TTL_SECS: u64 = 30 * 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("policy.max_record_limit must be at least 1")]
    ZeroRecordLimit,
    #[error("policy.max_resource_id must be at least 1")]
    ZeroResourceId,
    #[error("auth.jwt_secret must be at least {MIN_SECRET_LEN} bytes (got {0})")]
    WeakSecret(usize),
    #[error("auth.token_ttl_secs must be positive")]
    ZeroTokenTtl,
    #[error("auth.token_ttl_secs must be at most {MAX_TOKEN_TTL_SECS} (got {0})")]
    TokenTtlTooLong(u64),
    #[error("policy.content_max_len ({max}) is below content_min_len ({min})")]
    ContentBounds { min: usize, max: usize },
    #[error("policy.allowed_schemes contains unsupported scheme {0:?}")]
    UnsupportedScheme(String),
    #[error("policy.allowed_schemes is empty")]
    NoSchemes,
    #[error("policy.blocked_ranges: {0}")]
    Cidr(String),
    #[error("policy.filename_pattern: {0}")]
    Pattern(String),
    #[error("policy.filename_pattern must be anchored with ^ and $")]
    UnanchoredPattern,
    #[error("storage.root is empty")]
    EmptyStorageRoot,
    #[error("listener.bind_address {0:?} is not a socket address")]
    BindAddress(String),
    #[error("observability.metrics_address {0:?} is not a socket address")]
    MetricsAddress(String),
    #[error("{field} must be positive")]
    ZeroValue { field: &'static str },
    #[error("auth.seed_users[{index}]: unknown role {role:?}")]
    SeedRole { index: usize, role: String },
    #[error("rate_limit.requests_per_second and burst_size must be positive when enabled")]
    RateLimit,
}

/// Run every semantic check and collect all failures.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let policy = &config.policy;
    if policy.max_record_limit == 0 {
        errors.push(ValidationError::ZeroRecordLimit);
    }
    if policy.max_resource_id == 0 {
        errors.push(ValidationError::ZeroResourceId);
    }
    if policy.content_max_len < policy.content_min_len {
        errors.push(ValidationError::ContentBounds {
            min: policy.content_min_len,
            max: policy.content_max_len,
        });
    }
    if policy.content_max_len == 0 {
        errors.push(ValidationError::ZeroValue {
            field: "policy.content_max_len",
        });
    }
    if policy.filename_max_len == 0 {
        errors.push(ValidationError::ZeroValue {
            field: "policy.filename_max_len",
        });
    }

    if policy.allowed_schemes.is_empty() {
        errors.push(ValidationError::NoSchemes);
    }
    for scheme in &policy.allowed_schemes {
        if scheme != "http" && scheme != "https" {
            errors.push(ValidationError::UnsupportedScheme(scheme.clone()));
        }
    }
    for range in &policy.blocked_ranges {
        if let Err(e) = range.parse::<CidrBlock>() {
            errors.push(ValidationError::Cidr(e.to_string()));
        }
    }
    if let Err(e) = Regex::new(&policy.filename_pattern) {
        errors.push(ValidationError::Pattern(e.to_string()));
    }
    // An unanchored pattern matches any string containing a valid run.
    if !policy.filename_pattern.starts_with('^') || !policy.filename_pattern.ends_with('$') {
        errors.push(ValidationError::UnanchoredPattern);
    }

    let secret_len = config.auth.jwt_secret.len();
    if secret_len < MIN_SECRET_LEN {
        errors.push(ValidationError::WeakSecret(secret_len));
    }
    if config.auth.token_ttl_secs == 0 {
        errors.push(ValidationError::ZeroTokenTtl);
    }
    if config.auth.token_ttl_secs > MAX_TOKEN_TTL_SECS {
        errors.push(ValidationError::TokenTtlTooLong(config.auth.token_ttl_secs));
    }
    for (index, seed) in config.auth.seed_users.iter().enumerate() {
        if seed.role.parse::<Role>().is_err() {
            errors.push(ValidationError::SeedRole {
                index,
                role: seed.role.clone(),
            });
        }
    }

    if config.storage.root.trim().is_empty() {
        errors.push(ValidationError::EmptyStorageRoot);
    }
    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    for (field, value) in [
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("timeouts.outbound_secs", config.timeouts.outbound_secs),
        ("timeouts.dns_secs", config.timeouts.dns_secs),
        ("diagnostics.timeout_secs", config.diagnostics.timeout_secs),
        ("tasks.timeout_secs", config.tasks.timeout_secs),
        ("tasks.poll_interval_ms", config.tasks.poll_interval_ms),
        ("limits.max_page_size", config.limits.max_page_size),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroValue { field });
        }
    }
    for (field, value) in [
        ("limits.max_body_bytes", config.limits.max_body_bytes),
        ("limits.max_fetch_bytes", config.limits.max_fetch_bytes),
        ("limits.max_path_len", config.limits.max_path_len),
        ("limits.max_comments_per_topic", config.limits.max_comments_per_topic),
        ("limits.max_topics", config.limits.max_topics),
        ("tasks.max_pending", config.tasks.max_pending),
        ("tasks.max_finished", config.tasks.max_finished),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroValue { field });
        }
    }

    if config.rate_limit.enabled
        && (config.rate_limit.requests_per_second == 0 || config.rate_limit.burst_size == 0)
    {
        errors.push(ValidationError::RateLimit);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
