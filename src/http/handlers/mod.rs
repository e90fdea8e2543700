//! Endpoint handlers.
//!
//! Every handler follows the same order: input guards on the extracted
//! values, then the identity guard, then authorization where the route
//! needs it, then the collaborator call with the typed values. A guard
//! failure returns through `?` and the rest of the handler never runs.

pub mod auth;
pub mod comments;
pub mod diagnostics;
pub mod files;
pub mod media;
pub mod reports;
pub mod status;
pub mod tasks;
