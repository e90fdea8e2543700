//! Transport setup.
//!
//! Plain TCP uses `tokio::net::TcpListener` directly; this module only
//! covers loading certificate material for the TLS listener.

pub mod tls;
