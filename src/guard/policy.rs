//! Process-wide guard policy.
//!
//! Built once from a validated [`ServiceConfig`] and shared read-only.

use std::collections::HashSet;
use std::net::IpAddr;
use std::num::NonZeroU64;
use std::time::Duration;

use regex::Regex;

use crate::config::schema::ServiceConfig;
use crate::config::ConfigError;
use crate::guard::cidr::CidrBlock;
use crate::guard::content::{CharClass, ContentPolicy};
use crate::guard::identity::SigningKey;
use crate::guard::path::StorageRoot;

/// RFC 1123 labels joined by dots.
pub const HOSTNAME_PATTERN: &str =
    r"^[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$";

const USERNAME_PATTERN: &str = r"^[A-Za-z0-9_.-]+$";

/// Parameters of the network-target guard.
#[derive(Debug, Clone)]
pub struct NetworkPolicy {
    pub allowed_schemes: HashSet<String>,
    pub blocked_ranges: Vec<CidrBlock>,
    pub hostname_pattern: Regex,
    pub dns_timeout: Duration,
}

impl NetworkPolicy {
    pub fn is_blocked(&self, ip: IpAddr) -> bool {
        self.blocked_ranges.iter().any(|block| block.contains(ip))
    }

    pub fn with_dns_timeout(&self, dns_timeout: Duration) -> Self {
        Self {
            dns_timeout,
            ..self.clone()
        }
    }
}

impl Default for NetworkPolicy {
    fn default() -> Self {
        Self {
            allowed_schemes: ["http", "https"].iter().map(|s| s.to_string()).collect(),
            blocked_ranges: CidrBlock::defaults(),
            hostname_pattern: Regex::new(HOSTNAME_PATTERN).expect("hostname pattern compiles"),
            dns_timeout: Duration::from_secs(5),
        }
    }
}

/// Immutable policy every guard reads from.
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    pub max_record_limit: NonZeroU64,
    pub max_resource_id: NonZeroU64,
    pub max_page_size: NonZeroU64,
    pub storage_root: StorageRoot,
    pub max_path_len: usize,
    pub network: NetworkPolicy,
    pub signing_key: SigningKey,
    pub token_ttl: Duration,
    pub token_leeway_secs: u64,
    pub comment: ContentPolicy,
    pub username: ContentPolicy,
    pub password: ContentPolicy,
    pub task_filename: ContentPolicy,
}

impl PolicyConfig {
    /// Compile patterns, parse ranges and canonicalize the storage root.
    ///
    /// Expects a config that already passed `validate_config`; anything that
    /// still fails here is reported rather than panicking.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, ConfigError> {
        let policy = &config.policy;

        let max_record_limit = NonZeroU64::new(policy.max_record_limit)
            .ok_or_else(|| ConfigError::Policy("max_record_limit is zero".to_string()))?;
        let max_resource_id = NonZeroU64::new(policy.max_resource_id)
            .ok_or_else(|| ConfigError::Policy("max_resource_id is zero".to_string()))?;
        let max_page_size = NonZeroU64::new(config.limits.max_page_size)
            .ok_or_else(|| ConfigError::Policy("max_page_size is zero".to_string()))?;

        let storage_root =
            StorageRoot::open(&config.storage.root).map_err(|source| ConfigError::StorageRoot {
                path: config.storage.root.clone().into(),
                source,
            })?;

        let blocked_ranges = policy
            .blocked_ranges
            .iter()
            .map(|s| s.parse::<CidrBlock>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ConfigError::Policy(e.to_string()))?;

        let network = NetworkPolicy {
            allowed_schemes: policy.allowed_schemes.iter().cloned().collect(),
            blocked_ranges,
            hostname_pattern: compile(HOSTNAME_PATTERN)?,
            dns_timeout: Duration::from_secs(config.timeouts.dns_secs),
        };

        Ok(Self {
            max_record_limit,
            max_resource_id,
            max_page_size,
            storage_root,
            max_path_len: config.limits.max_path_len,
            network,
            signing_key: SigningKey::new(config.auth.jwt_secret.as_bytes()),
            token_ttl: Duration::from_secs(config.auth.token_ttl_secs),
            token_leeway_secs: config.auth.leeway_secs,
            comment: ContentPolicy::new(
                policy.content_min_len,
                policy.content_max_len,
                CharClass::PlainText,
            ),
            username: ContentPolicy::new(3, 32, CharClass::Pattern(compile(USERNAME_PATTERN)?)),
            password: ContentPolicy::new(8, 128, CharClass::Printable),
            task_filename: ContentPolicy::new(
                1,
                policy.filename_max_len,
                CharClass::Pattern(compile(&policy.filename_pattern)?),
            ),
        })
    }
}

fn compile(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|e| ConfigError::Policy(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(root: &std::path::Path) -> ServiceConfig {
        let mut cfg = ServiceConfig::default();
        cfg.storage.root = root.to_string_lossy().into_owned();
        cfg.auth.jwt_secret = "s".repeat(32);
        cfg
    }

    #[test]
    fn test_builds_from_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let policy = PolicyConfig::from_config(&config(dir.path())).unwrap();
        assert_eq!(policy.max_record_limit.get(), 5000);
        assert_eq!(policy.storage_root.as_path(), dir.path().canonicalize().unwrap());
        assert!(policy.network.is_blocked("169.254.169.254".parse().unwrap()));
        assert!(!policy.network.is_blocked("93.184.216.34".parse().unwrap()));
        assert_eq!(policy.signing_key.len(), 32);
    }

    #[test]
    fn test_creates_missing_storage_root() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let policy = PolicyConfig::from_config(&config(&nested)).unwrap();
        assert!(policy.storage_root.as_path().is_dir());
    }

    #[test]
    fn test_zero_limit_fails_at_build() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path());
        cfg.policy.max_record_limit = 0;
        assert!(matches!(
            PolicyConfig::from_config(&cfg),
            Err(ConfigError::Policy(_))
        ));
    }

    #[test]
    fn test_storage_root_must_be_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        std::fs::write(&file, b"x").unwrap();
        assert!(matches!(
            PolicyConfig::from_config(&config(&file)),
            Err(ConfigError::StorageRoot { .. })
        ));
    }
}
