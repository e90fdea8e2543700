//! Admission-control HTTP service.
//!
//! Every request passes a chain of guards (bounds, path, network, content,
//! identity, authorization) before any collaborator sees its input.

pub mod admin;
pub mod config;
pub mod guard;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod security;
pub mod services;

pub use config::schema::ServiceConfig;
pub use guard::{PolicyConfig, Rejection, RejectionReason};
pub use http::{AppState, HttpServer};
pub use lifecycle::Shutdown;
