//! Business collaborators behind the guards.
//!
//! # Data Flow
//! ```text
//! handler (typed values only)
//!     → users.rs       UserRepository (accounts, login lookups)
//!     → credentials.rs salted password hashes
//!     → reports.rs     DataSource + ReportRenderer (BoundedCount in)
//!     → fetcher.rs     Fetcher (ResolvedTarget in, pinned connection)
//!     → commands.rs    CommandRunner (SafeHostname / file path as argv)
//!     → tasks.rs       TaskQueue + TaskWorker
//!     → comments.rs    CommentStore (ValidContent in)
//! ```
//!
//! # Design Decisions
//! - Each capability is a trait with one production implementation;
//!   tests swap in doubles through `AppState` builders
//! - Signatures take guard-produced types, so raw input cannot reach a
//!   collaborator by construction

pub mod commands;
pub mod comments;
pub mod credentials;
pub mod fetcher;
pub mod reports;
pub mod tasks;
pub mod users;

use thiserror::Error;

/// Storage-layer failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Unique key already taken.
    #[error("{0} already exists")]
    Conflict(&'static str),
    /// Bounded collection is full.
    #[error("capacity of {0} reached")]
    CapacityExceeded(usize),
    /// Lock poisoned or backend unreachable.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Seconds since the unix epoch.
pub(crate) fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
