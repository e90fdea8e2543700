//! Bound guard.
//!
//! Numeric input must fall within `[1, max]` before it reaches any code
//! that allocates or loops proportionally to it. `max` is a `NonZeroU64`,
//! so a zero limit is rejected when the policy is built, not per request.

use std::num::NonZeroU64;

use serde::Deserialize;

use crate::guard::rejection::{GuardResult, Rejection, RejectionReason};

/// A count or identifier already proven to lie in `[1, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoundedCount(u64);

impl BoundedCount {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Untrusted numeric input as it arrives in a JSON body: a JSON integer
/// (signed, or unsigned past `i64::MAX`) or a string that should contain one.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawCount {
    Int(i64),
    UInt(u64),
    Text(String),
}

/// Validate a raw decimal string.
pub fn check_str(raw: &str, max: NonZeroU64) -> GuardResult<BoundedCount> {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Rejection::malformed(format!(
            "non-numeric count ({} bytes)",
            raw.len()
        )));
    }

    match raw.parse::<i64>() {
        Ok(value) => check_int(value, max),
        // All digits but wider than i64: definitely over any limit.
        Err(_) => Err(Rejection::new(
            RejectionReason::OutOfBounds,
            format!("count overflows i64 ({} digits)", digits.len()),
        )),
    }
}

/// Validate an already-parsed integer.
pub fn check_int(value: i64, max: NonZeroU64) -> GuardResult<BoundedCount> {
    if value <= 0 {
        return Err(Rejection::new(
            RejectionReason::OutOfBounds,
            format!("count {} below 1", value),
        ));
    }
    let value = value as u64;
    if value > max.get() {
        return Err(Rejection::new(
            RejectionReason::OutOfBounds,
            format!("count {} exceeds limit {}", value, max),
        ));
    }
    Ok(BoundedCount(value))
}

/// Validate an unsigned integer.
pub fn check_uint(value: u64, max: NonZeroU64) -> GuardResult<BoundedCount> {
    match i64::try_from(value) {
        Ok(signed) => check_int(signed, max),
        Err(_) => Err(Rejection::new(
            RejectionReason::OutOfBounds,
            format!("count {} exceeds limit {}", value, max),
        )),
    }
}

/// Validate any representation.
pub fn check(raw: &RawCount, max: NonZeroU64) -> GuardResult<BoundedCount> {
    match raw {
        RawCount::Int(v) => check_int(*v, max),
        RawCount::UInt(v) => check_uint(*v, max),
        RawCount::Text(s) => check_str(s, max),
    }
}
