use procura_core::{DomainError, DomainResult};

use crate::{Approver, ApproverRoster, Role};

/// Check that an approver may act on a level bound to `required`.
///
/// - No IO
/// - No panics
/// - Pure policy check: exact role match, no hierarchy
pub fn authorize_level(approver: &Approver, required: Role) -> DomainResult<()> {
    if approver.role == required {
        Ok(())
    } else {
        Err(DomainError::unauthorized(format!(
            "actor {} holds role '{}' but level requires '{}'",
            approver.actor_id, approver.role, required
        )))
    }
}

/// Check role *and* roster membership (for levels that need every roster holder).
///
/// An empty roster for `required` places no membership constraint.
pub fn authorize_roster_member(
    approver: &Approver,
    roster: &ApproverRoster,
    required: Role,
) -> DomainResult<()> {
    authorize_level(approver, required)?;

    if roster.has_members(required) && !roster.is_member(required, approver.actor_id) {
        return Err(DomainError::unauthorized(format!(
            "actor {} is not on the '{}' roster",
            approver.actor_id, required
        )));
    }
    Ok(())
}
