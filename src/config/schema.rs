//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files; every
//! section has defaults so a minimal file only needs `auth.jwt_secret`.

use serde::{Deserialize, Serialize};

use crate::guard::cidr::DEFAULT_BLOCKED_RANGES;

/// Root configuration for the admission-control service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Size limits applied before guards run.
    pub limits: LimitsConfig,

    /// Guard policy parameters.
    pub policy: PolicySection,

    /// Token signing and seeded accounts.
    pub auth: AuthConfig,

    /// File storage.
    pub storage: StorageConfig,

    /// Host verification command.
    pub diagnostics: DiagnosticsConfig,

    /// Background file-processing queue.
    pub tasks: TaskConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Whole-request deadline in seconds.
    pub request_secs: u64,

    /// Outbound fetch deadline in seconds (connect + body).
    pub outbound_secs: u64,

    /// DNS resolution deadline in seconds.
    pub dns_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            outbound_secs: 10,
            dns_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Maximum bytes read from an outbound fetch response.
    pub max_fetch_bytes: usize,

    /// Maximum length of a client-supplied relative path.
    pub max_path_len: usize,

    /// Comments kept per topic; the oldest are dropped beyond it.
    pub max_comments_per_topic: usize,

    /// Distinct topics the comment store accepts.
    pub max_topics: usize,

    /// Largest `limit` a comment listing may request.
    pub max_page_size: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 64 * 1024,
            max_fetch_bytes: 5 * 1024 * 1024,
            max_path_len: 255,
            max_comments_per_topic: 1000,
            max_topics: 10_000,
            max_page_size: 100,
        }
    }
}

/// Guard policy parameters. Validated and frozen into a
/// [`PolicyConfig`](crate::guard::PolicyConfig) at startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PolicySection {
    /// Upper bound for record counts (`M`). Zero is a configuration error.
    pub max_record_limit: u64,

    /// Upper bound for numeric resource ids in paths.
    pub max_resource_id: u64,

    /// URL schemes an outbound fetch may use.
    pub allowed_schemes: Vec<String>,

    /// Blocked networks in CIDR notation.
    pub blocked_ranges: Vec<String>,

    /// Minimum comment length in characters.
    pub content_min_len: usize,

    /// Maximum comment length in characters.
    pub content_max_len: usize,

    /// Regex a task filename must match in full.
    pub filename_pattern: String,

    /// Maximum task filename length in characters.
    pub filename_max_len: usize,
}

impl Default for PolicySection {
    fn default() -> Self {
        Self {
            max_record_limit: 5000,
            max_resource_id: i32::MAX as u64,
            allowed_schemes: vec!["http".to_string(), "https".to_string()],
            blocked_ranges: DEFAULT_BLOCKED_RANGES.iter().map(|s| s.to_string()).collect(),
            content_min_len: 1,
            content_max_len: 2000,
            filename_pattern: "^[A-Za-z0-9_-][A-Za-z0-9._-]*$".to_string(),
            filename_max_len: 128,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for HS256 tokens. Overridden by `ADMISSION_JWT_SECRET`.
    pub jwt_secret: String,

    /// Token lifetime in seconds.
    pub token_ttl_secs: u64,

    /// Clock-skew allowance for `exp` in seconds.
    pub leeway_secs: u64,

    /// Accounts created at startup.
    pub seed_users: Vec<SeedUser>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_secs: 24 * 60 * 60,
            leeway_secs: 0,
            seed_users: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SeedUser {
    pub username: String,
    pub password: String,
    #[serde(default = "default_seed_role")]
    pub role: String,
}

fn default_seed_role() -> String {
    "user".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory downloads and task inputs are confined to.
    pub root: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: "./data/docs".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Program used for reachability checks.
    pub ping_program: String,

    /// Deadline for one check in seconds.
    pub timeout_secs: u64,

    /// Return raw command output in the response body.
    pub expose_output: bool,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            ping_program: "ping".to_string(),
            timeout_secs: 5,
            expose_output: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TaskConfig {
    /// Run the background worker.
    pub enabled: bool,

    /// Worker poll interval in milliseconds.
    pub poll_interval_ms: u64,

    /// Deadline for one processor run in seconds.
    pub timeout_secs: u64,

    /// Program invoked as `<command> --input=<path>`.
    pub processor_command: String,

    /// Queue capacity; new tasks are refused beyond it.
    pub max_pending: usize,

    /// Finished tasks kept for status lookups; the oldest are evicted.
    pub max_finished: usize,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_ms: 500,
            timeout_secs: 30,
            processor_command: "process-file".to_string(),
            max_pending: 1000,
            max_finished: 10_000,
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Maximum requests per second per IP.
    pub requests_per_second: u32,

    /// Burst capacity.
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            requests_per_second: 100,
            burst_size: 50,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins.
    pub log_level: String,

    /// Emit JSON log lines instead of human-readable ones.
    pub json_logs: bool,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
