use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use procura_core::ActorId;

use crate::Role;

/// Externally supplied mapping of roles to the actors eligible to approve in them.
///
/// Used for `require_all` levels: such a level is satisfied once every actor
/// listed here for its role has approved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApproverRoster {
    members: BTreeMap<Role, BTreeSet<ActorId>>,
}

impl ApproverRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_member(mut self, role: Role, actor_id: ActorId) -> Self {
        self.add(role, actor_id);
        self
    }

    pub fn add(&mut self, role: Role, actor_id: ActorId) {
        self.members.entry(role).or_default().insert(actor_id);
    }

    /// Distinct actors registered for `role` (empty if none).
    pub fn members(&self, role: Role) -> Vec<ActorId> {
        self.members
            .get(&role)
            .map(|m| m.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn is_member(&self, role: Role, actor_id: ActorId) -> bool {
        self.members.get(&role).is_some_and(|m| m.contains(&actor_id))
    }

    pub fn has_members(&self, role: Role) -> bool {
        self.members.get(&role).is_some_and(|m| !m.is_empty())
    }
}
