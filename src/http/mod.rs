//! HTTP surface of the admission-control service.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, tracing span)
//!     → extract.rs (framework parsing only; failures become Malformed)
//!     → handlers/ (guard chain, then collaborator)
//!     → response.rs (RejectionReason → status + fixed message)
//!     → Send to client
//! ```

pub mod extract;
pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::ApiError;
pub use server::{AppState, HttpServer};
