use serde::{Deserialize, Serialize};

use procura_core::ActorId;

use crate::Role;

/// An approver as seen by the engine: who is acting, and in which role.
///
/// The role is asserted by the caller (it owns authentication and role
/// assignment); the engine only checks it against what a level requires.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Approver {
    pub actor_id: ActorId,
    pub role: Role,
}

impl Approver {
    pub fn new(actor_id: ActorId, role: Role) -> Self {
        Self { actor_id, role }
    }
}
