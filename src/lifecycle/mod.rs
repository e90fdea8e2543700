//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Build policy → Seed users → Spawn worker
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Broadcast → Server drains, worker stops → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners bind last, after users are seeded

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
