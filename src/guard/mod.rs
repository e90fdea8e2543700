//! Request admission guards.
//!
//! # Responsibilities
//! - Turn untrusted request input into typed, trusted values
//! - Classify every refusal with a [`RejectionReason`]
//! - Keep raw input from reaching files, sockets, processes and storage
//!
//! # Data Flow
//! ```text
//! Received
//!     → bound.rs      record counts, numeric ids      → BoundedCount
//!     → path.rs       filenames under the storage root → SafePath
//!     → network.rs    URLs (resolved) and hostnames    → ResolvedTarget / SafeHostname
//!     → content.rs    free text                        → ValidContent
//!     → identity.rs   bearer token                     → Principal
//!     → authz.rs      role set, self-target rule       → authorized Principal
//! Dispatched (handler receives only the typed values)
//!
//! first Err(Rejection) short-circuits the chain via `?`
//! ```
//!
//! # Design Decisions
//! - Guards are plain functions over `(input, &PolicyConfig)`; no hidden state
//! - Trusted wrappers have private fields, so the only way to obtain one is
//!   through its guard
//! - Only the network guard does I/O (DNS, under a deadline)

pub mod authz;
pub mod bound;
pub mod cidr;
pub mod content;
pub mod identity;
pub mod network;
pub mod path;
pub mod policy;
pub mod rejection;

pub use bound::{BoundedCount, RawCount};
pub use content::{ContentPolicy, ValidContent};
pub use identity::{Principal, Role, SigningKey, TokenIssuer, TokenVerifier};
pub use network::{ResolvedTarget, Resolver, SafeHostname, SystemResolver};
pub use path::{SafePath, StorageRoot};
pub use policy::{NetworkPolicy, PolicyConfig};
pub use rejection::{GuardResult, Rejection, RejectionReason};
