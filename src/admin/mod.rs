//! Administrative endpoints.
//!
//! Every route here runs the identity guard, then `require_admin`, before
//! touching state. The self-target rule applies to destructive operations.

pub mod auth;
pub mod handlers;

use axum::routing::delete;
use axum::Router;

use self::handlers::*;
use crate::http::server::AppState;

pub fn setup_admin_router() -> Router<AppState> {
    Router::new().route("/api/v1/admin/users/{id}", delete(delete_user))
}
