//! CIDR blocks for address classification.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Private, loopback, link-local and reserved ranges blocked by default.
pub const DEFAULT_BLOCKED_RANGES: &[&str] = &[
    "0.0.0.0/8",
    "10.0.0.0/8",
    "100.64.0.0/10",
    "127.0.0.0/8",
    "169.254.0.0/16",
    "172.16.0.0/12",
    "192.0.0.0/24",
    "192.168.0.0/16",
    "198.18.0.0/15",
    "224.0.0.0/4",
    "240.0.0.0/4",
    "::/128",
    "::1/128",
    "fc00::/7",
    "fe80::/10",
    "ff00::/8",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CidrError {
    #[error("missing '/' in CIDR {0:?}")]
    MissingPrefix(String),
    #[error("invalid address in CIDR {0:?}")]
    Address(String),
    #[error("prefix length {prefix} too long for {family} in {cidr:?}")]
    PrefixLength {
        cidr: String,
        prefix: u8,
        family: &'static str,
    },
}

/// An IPv4 or IPv6 network in `addr/prefix` notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CidrBlock {
    network: IpAddr,
    prefix: u8,
}

impl CidrBlock {
    /// True if `ip` falls inside this block. IPv4-mapped IPv6 addresses
    /// (`::ffff:a.b.c.d`) are matched against IPv4 blocks.
    pub fn contains(&self, ip: IpAddr) -> bool {
        let ip = match ip {
            IpAddr::V6(v6) => v6
                .to_ipv4_mapped()
                .map(IpAddr::V4)
                .unwrap_or(IpAddr::V6(v6)),
            v4 => v4,
        };
        match (self.network, ip) {
            (IpAddr::V4(net), IpAddr::V4(addr)) => {
                let mask = v4_mask(self.prefix);
                u32::from(net) & mask == u32::from(addr) & mask
            }
            (IpAddr::V6(net), IpAddr::V6(addr)) => {
                let mask = v6_mask(self.prefix);
                u128::from(net) & mask == u128::from(addr) & mask
            }
            _ => false,
        }
    }

    /// Parse the built-in block list.
    pub fn defaults() -> Vec<CidrBlock> {
        DEFAULT_BLOCKED_RANGES
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect()
    }
}

fn v4_mask(prefix: u8) -> u32 {
    if prefix == 0 {
        0
    } else {
        u32::MAX << (32 - u32::from(prefix))
    }
}

fn v6_mask(prefix: u8) -> u128 {
    if prefix == 0 {
        0
    } else {
        u128::MAX << (128 - u32::from(prefix))
    }
}

impl FromStr for CidrBlock {
    type Err = CidrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, prefix) = s
            .split_once('/')
            .ok_or_else(|| CidrError::MissingPrefix(s.to_string()))?;
        let prefix: u8 = prefix
            .parse()
            .map_err(|_| CidrError::Address(s.to_string()))?;

        let network = if let Ok(v4) = addr.parse::<Ipv4Addr>() {
            if prefix > 32 {
                return Err(CidrError::PrefixLength {
                    cidr: s.to_string(),
                    prefix,
                    family: "IPv4",
                });
            }
            IpAddr::V4(v4)
        } else if let Ok(v6) = addr.parse::<Ipv6Addr>() {
            if prefix > 128 {
                return Err(CidrError::PrefixLength {
                    cidr: s.to_string(),
                    prefix,
                    family: "IPv6",
                });
            }
            IpAddr::V6(v6)
        } else {
            return Err(CidrError::Address(s.to_string()));
        };

        Ok(Self { network, prefix })
    }
}

impl fmt::Display for CidrBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}

impl<'de> Deserialize<'de> for CidrBlock {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
