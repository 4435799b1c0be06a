//! `procura-auth`: approver roles and level authorization.
//!
//! Pure policy checks; identity and role assignment are owned by the caller.

pub mod authorize;
pub mod principal;
pub mod roles;
pub mod roster;

pub use authorize::{authorize_level, authorize_roster_member};
pub use principal::Approver;
pub use roles::Role;
pub use roster::ApproverRoster;
