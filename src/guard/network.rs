//! Network-target guard.
//!
//! Two sinks, two mechanisms:
//!
//! ```text
//! URL (outbound fetch):
//!     parse → scheme ∈ allowed → host present, no userinfo
//!     → resolve host (under deadline)
//!     → every resolved address outside blocked CIDRs
//!     → ResolvedTarget { url, addrs }   (fetch connects to these addrs only)
//!
//! Hostname (diagnostic command):
//!     length ≤ 253 → strict label syntax (alnum, hyphen, dot)
//!     → SafeHostname   (passed to the command as one argv entry)
//! ```

use std::io;
use std::net::{IpAddr, SocketAddr};

use async_trait::async_trait;
use url::{Host, Url};

use crate::guard::policy::NetworkPolicy;
use crate::guard::rejection::{GuardResult, Rejection, RejectionReason};

/// Host name resolution, injectable for tests.
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<SocketAddr>>;
}

/// Resolver backed by the operating system (`getaddrinfo`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[async_trait]
impl Resolver for SystemResolver {
    async fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<SocketAddr>> {
        Ok(tokio::net::lookup_host((host, port)).await?.collect())
    }
}

/// A URL that passed the syntactic checks but has not been resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetUrl {
    url: Url,
    port: u16,
}

impl TargetUrl {
    pub fn as_url(&self) -> &Url {
        &self.url
    }
}

/// A URL whose host resolved exclusively to public addresses.
///
/// Outbound connections must use `addrs()`, never a fresh lookup, so the
/// address that was checked is the address that gets connected to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    url: Url,
    host: String,
    addrs: Vec<SocketAddr>,
}

impl ResolvedTarget {
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn addrs(&self) -> &[SocketAddr] {
        &self.addrs
    }
}

/// A hostname restricted to `[A-Za-z0-9.-]` label syntax.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SafeHostname(String);

impl SafeHostname {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SafeHostname {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

const MAX_HOSTNAME_LEN: usize = 253;
const MAX_URL_LEN: usize = 2048;

/// Syntactic URL checks: parse, scheme allow-list, host presence.
pub fn parse_url(raw: &str, policy: &NetworkPolicy) -> GuardResult<TargetUrl> {
    if raw.len() > MAX_URL_LEN {
        return Err(Rejection::malformed(format!("url length {}", raw.len())));
    }
    let url = Url::parse(raw).map_err(|e| Rejection::malformed(format!("url parse: {}", e)))?;

    if !policy.allowed_schemes.contains(url.scheme()) {
        return Err(Rejection::new(
            RejectionReason::SchemeDisallowed,
            format!("scheme {:?}", url.scheme()),
        ));
    }
    if url.host().is_none() {
        return Err(Rejection::malformed("url has no host"));
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(Rejection::malformed("url carries userinfo"));
    }
    let port = url
        .port_or_known_default()
        .ok_or_else(|| Rejection::malformed("url has no usable port"))?;

    Ok(TargetUrl { url, port })
}

/// Resolve the target and refuse any blocked address.
pub async fn resolve(
    target: TargetUrl,
    policy: &NetworkPolicy,
    resolver: &dyn Resolver,
) -> GuardResult<ResolvedTarget> {
    let TargetUrl { url, port } = target;

    let (host, addrs) = match url.host() {
        Some(Host::Ipv4(v4)) => (v4.to_string(), vec![SocketAddr::new(IpAddr::V4(v4), port)]),
        Some(Host::Ipv6(v6)) => (v6.to_string(), vec![SocketAddr::new(IpAddr::V6(v6), port)]),
        Some(Host::Domain(domain)) => {
            let domain = domain.to_string();
            let lookup = tokio::time::timeout(policy.dns_timeout, resolver.resolve(&domain, port));
            let addrs = match lookup.await {
                Ok(Ok(addrs)) => addrs,
                Ok(Err(e)) => {
                    return Err(Rejection::new(
                        RejectionReason::Unresolvable,
                        format!("lookup failed: {}", e.kind()),
                    ))
                }
                Err(_) => {
                    return Err(Rejection::new(
                        RejectionReason::Timeout,
                        format!("lookup exceeded {:?}", policy.dns_timeout),
                    ))
                }
            };
            (domain, addrs)
        }
        None => return Err(Rejection::malformed("url has no host")),
    };

    if addrs.is_empty() {
        return Err(Rejection::new(RejectionReason::Unresolvable, "no addresses"));
    }
    if let Some(blocked) = addrs.iter().find(|a| policy.is_blocked(a.ip())) {
        return Err(Rejection::new(
            RejectionReason::PrivateNetworkTarget,
            format!("{} resolves to blocked address {}", host, blocked.ip()),
        ));
    }

    Ok(ResolvedTarget { url, host, addrs })
}

/// Full URL guard: syntactic checks then resolution.
pub async fn check_url(
    raw: &str,
    policy: &NetworkPolicy,
    resolver: &dyn Resolver,
) -> GuardResult<ResolvedTarget> {
    let target = parse_url(raw, policy)?;
    resolve(target, policy, resolver).await
}

/// Hostname guard for command arguments.
pub fn check_hostname(raw: &str, policy: &NetworkPolicy) -> GuardResult<SafeHostname> {
    if raw.is_empty() {
        return Err(Rejection::malformed("empty hostname"));
    }
    if raw.len() > MAX_HOSTNAME_LEN {
        return Err(Rejection::malformed(format!("hostname length {}", raw.len())));
    }
    if !policy.hostname_pattern.is_match(raw) {
        return Err(Rejection::malformed(format!(
            "hostname fails syntax check ({} bytes)",
            raw.len()
        )));
    }
    Ok(SafeHostname(raw.to_string()))
}
