use axum::http::HeaderMap;

use crate::guard::authz::{self, ADMIN_ONLY};
use crate::guard::Principal;
use crate::http::response::ApiError;
use crate::http::server::AppState;

/// Identity then role check. The principal comes back by value so the
/// handler can apply further rules to it.
pub fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<Principal, ApiError> {
    let principal = state.authenticate(headers)?;
    authz::authorize(&principal, ADMIN_ONLY)?;
    Ok(principal)
}
