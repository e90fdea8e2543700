//! Salted password hashes.
//!
//! `HMAC-SHA256(key = salt, msg = password)` with a random 16-byte salt.
//! Verification goes through `Mac::verify_slice`, which compares in
//! constant time.

use std::fmt;
use std::str::FromStr;

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const SALT_LEN: usize = 16;
const DIGEST_LEN: usize = 32;

#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash {
    salt: [u8; SALT_LEN],
    digest: [u8; DIGEST_LEN],
}

impl PasswordHash {
    /// Hash `password` under a fresh random salt.
    pub fn derive(password: &str) -> Self {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        Self::derive_with_salt(password, salt)
    }

    pub fn derive_with_salt(password: &str, salt: [u8; SALT_LEN]) -> Self {
        let mut digest = [0u8; DIGEST_LEN];
        digest.copy_from_slice(&mac(&salt, password).finalize().into_bytes());
        Self { salt, digest }
    }

    pub fn verify(&self, password: &str) -> bool {
        mac(&self.salt, password).verify_slice(&self.digest).is_ok()
    }

    /// `hex(salt)$hex(digest)`
    pub fn encode(&self) -> String {
        format!("{}${}", hex::encode(self.salt), hex::encode(self.digest))
    }
}

fn mac(salt: &[u8], password: &str) -> HmacSha256 {
    // HMAC takes keys of any length.
    let mut mac = HmacSha256::new_from_slice(salt).expect("HMAC accepts any key length");
    mac.update(password.as_bytes());
    mac
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}

impl FromStr for PasswordHash {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (salt_hex, digest_hex) = s.split_once('$').ok_or("missing separator")?;
        let mut salt = [0u8; SALT_LEN];
        let mut digest = [0u8; DIGEST_LEN];
        hex::decode_to_slice(salt_hex, &mut salt).map_err(|e| format!("salt: {}", e))?;
        hex::decode_to_slice(digest_hex, &mut digest).map_err(|e| format!("digest: {}", e))?;
        Ok(Self { salt, digest })
    }
}
