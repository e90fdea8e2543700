//! Identity guard (authentication).
//!
//! # Algorithm
//! ```text
//! Authorization header
//!     → must be exactly "Bearer <token>"
//!     → header alg must be HS256 ("none" and every other alg fail)
//!     → HMAC signature verified with the configured key
//!     → exp checked against now (+ configured leeway)
//!     → claims decoded with strict types (no coercion)
//!     → sub must agree with user_id
//!     → Principal { user_id, username, role }
//! ```
//!
//! Every failure collapses to `Unauthenticated`; the detail names the
//! failing step for the server log only.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::guard::rejection::{GuardResult, Rejection};

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role {:?}", other)),
        }
    }
}

/// Authenticated identity for the duration of one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub user_id: u64,
    pub username: String,
    pub role: Role,
}

/// JWT claim set. `sub` carries the user id as a string per RFC 7519.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub user_id: u64,
    pub username: String,
    pub role: Role,
    pub iat: u64,
    pub exp: u64,
}

/// HMAC secret. Debug output never shows the bytes.
#[derive(Clone)]
pub struct SigningKey(Vec<u8>);

impl SigningKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningKey(<{} bytes redacted>)", self.0.len())
    }
}

/// Verifies bearer credentials and produces a [`Principal`].
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(key: &SigningKey, leeway_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = leeway_secs;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            key: DecodingKey::from_secret(&key.0),
            validation,
        }
    }

    /// Authenticate from the raw `Authorization` header value, if any.
    pub fn authenticate(&self, authorization: Option<&str>) -> GuardResult<Principal> {
        let header = authorization.ok_or_else(|| Rejection::unauthenticated("missing header"))?;
        let token = header
            .strip_prefix(BEARER_PREFIX)
            .ok_or_else(|| Rejection::unauthenticated("not a bearer credential"))?;
        if token.is_empty() || token.contains(char::is_whitespace) {
            return Err(Rejection::unauthenticated("malformed bearer token"));
        }
        self.verify(token)
    }

    /// Verify a bare token.
    pub fn verify(&self, token: &str) -> GuardResult<Principal> {
        let data = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| Rejection::unauthenticated(format!("token rejected: {:?}", e.kind())))?;
        let claims = data.claims;

        if claims.sub != claims.user_id.to_string() {
            return Err(Rejection::unauthenticated("sub does not match user_id"));
        }

        Ok(Principal {
            user_id: claims.user_id,
            username: claims.username,
            role: claims.role,
        })
    }
}

impl fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("algorithms", &self.validation.algorithms)
            .field("leeway", &self.validation.leeway)
            .finish()
    }
}

/// Mints HS256 tokens for successful logins.
#[derive(Clone)]
pub struct TokenIssuer {
    key: EncodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(key: &SigningKey, ttl: Duration) -> Self {
        Self {
            key: EncodingKey::from_secret(&key.0),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, principal: &Principal) -> Result<String, jsonwebtoken::errors::Error> {
        self.issue_at(principal, jsonwebtoken::get_current_timestamp())
    }

    /// Mint a token as if issued at `iat` (unix seconds).
    pub fn issue_at(
        &self,
        principal: &Principal,
        iat: u64,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Claims {
            sub: principal.user_id.to_string(),
            user_id: principal.user_id,
            username: principal.username.clone(),
            role: principal.role,
            iat,
            exp: iat.saturating_add(self.ttl.as_secs()),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.key)
    }
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer").field("ttl", &self.ttl).finish()
    }
}
