//! Response hardening and per-client throttling.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (per-IP token bucket, optional)
//!     → handler
//! Outgoing response:
//!     → headers.rs (nosniff, frame deny, CSP, no-store)
//! ```

pub mod headers;
pub mod rate_limit;
