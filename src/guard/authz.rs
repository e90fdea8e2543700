//! Authorization guard.
//!
//! Runs only on a [`Principal`] the identity guard produced. Role membership
//! first, then business rules such as refusing self-targeted deletes.

use crate::guard::bound::BoundedCount;
use crate::guard::identity::{Principal, Role};
use crate::guard::rejection::{GuardResult, Rejection, RejectionReason};

pub const ADMIN_ONLY: &[Role] = &[Role::Admin];
pub const ANY_ROLE: &[Role] = &[Role::User, Role::Admin];

/// Require `principal.role ∈ required`.
pub fn authorize<'p>(principal: &'p Principal, required: &[Role]) -> GuardResult<&'p Principal> {
    if required.contains(&principal.role) {
        Ok(principal)
    } else {
        Err(Rejection::new(
            RejectionReason::InsufficientRole,
            format!(
                "user {} has role {}, needs one of {:?}",
                principal.user_id, principal.role, required
            ),
        ))
    }
}

/// Refuse destructive operations aimed at the caller's own account.
pub fn forbid_self_target(principal: &Principal, target: BoundedCount) -> GuardResult<BoundedCount> {
    if target.get() == principal.user_id {
        return Err(Rejection::new(
            RejectionReason::SelfTargetForbidden,
            format!("user {} targeted itself", principal.user_id),
        ));
    }
    Ok(target)
}
