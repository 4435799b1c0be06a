//! Approval service: selects rules, persists instances and publishes events.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use procura_approvals::{
    ApprovalAction, ApprovalEvent, ApprovalInstance, DefaultApproval, OrderCandidate, Transition,
    open_approval, record_action, select_rule,
};
use procura_core::{AggregateRoot, DomainError, ExpectedVersion, PurchaseOrderId, TenantId};
use procura_events::{Event, EventBus, EventEnvelope};

use crate::job::JobError;
use crate::sources::ApprovalDirectory;
use crate::store::InstanceStore;

pub const STREAM_TYPE: &str = "approvals.instance";

pub type ApprovalEnvelope = EventEnvelope<ApprovalEvent>;

/// Drives approval instances through the resolver.
///
/// Every transition is saved with an exact-version check before its events
/// are published, so concurrent actions on one order serialize through the
/// store and the loser gets `ConcurrentModification`. Once the save succeeds
/// the transition stands: a failed publish is logged, not returned.
#[derive(Debug)]
pub struct ApprovalService<D, S, B> {
    directory: D,
    store: S,
    bus: B,
    fallback: DefaultApproval,
}

impl<D, S, B> ApprovalService<D, S, B>
where
    D: ApprovalDirectory,
    S: InstanceStore,
    B: EventBus<ApprovalEnvelope>,
{
    pub fn new(directory: D, store: S, bus: B) -> Self {
        Self {
            directory,
            store,
            bus,
            fallback: DefaultApproval::default(),
        }
    }

    pub fn with_fallback(mut self, fallback: DefaultApproval) -> Self {
        self.fallback = fallback;
        self
    }

    /// Route `order` to its governing rule and open an approval instance.
    pub fn open(
        &self,
        tenant_id: TenantId,
        order: &OrderCandidate,
        at: DateTime<Utc>,
    ) -> Result<ApprovalInstance, JobError> {
        if self.store.load(tenant_id, order.order_id)?.is_some() {
            return Err(DomainError::invalid_state(format!(
                "approval for order {} already exists",
                order.order_id
            ))
            .into());
        }

        let rules = self
            .directory
            .rules(tenant_id)
            .map_err(JobError::source_failed)?;
        let selection = select_rule(&rules, order, self.fallback);
        let transition = open_approval(order, &selection, at)?;

        self.commit(tenant_id, ExpectedVersion::Exact(0), &transition)?;

        info!(
            tenant = %tenant_id,
            order_id = %order.order_id,
            rule_id = ?selection.rule_id(),
            levels = transition.instance.levels().len(),
            "approval opened"
        );
        Ok(transition.instance)
    }

    /// Record an approver action on the order's pending level.
    pub fn act(
        &self,
        tenant_id: TenantId,
        order_id: PurchaseOrderId,
        action: &ApprovalAction,
    ) -> Result<Transition, JobError> {
        let instance = self
            .store
            .load(tenant_id, order_id)?
            .ok_or_else(DomainError::not_found)?;
        let roster = self
            .directory
            .roster(tenant_id)
            .map_err(JobError::source_failed)?;

        let transition = match record_action(&instance, action, &roster) {
            Ok(t) => t,
            Err(e) => {
                warn!(
                    tenant = %tenant_id,
                    order_id = %order_id,
                    actor = %action.approver.actor_id,
                    kind = e.kind(),
                    error = %e,
                    "approval action refused"
                );
                return Err(e.into());
            }
        };

        self.commit(tenant_id, ExpectedVersion::Exact(instance.version()), &transition)?;

        if let Some(terminal) = transition.terminal_event() {
            info!(
                tenant = %tenant_id,
                order_id = %order_id,
                outcome = terminal.event_type(),
                "approval closed"
            );
        }
        Ok(transition)
    }

    pub fn get(
        &self,
        tenant_id: TenantId,
        order_id: PurchaseOrderId,
    ) -> Result<Option<ApprovalInstance>, JobError> {
        Ok(self.store.load(tenant_id, order_id)?)
    }

    fn commit(
        &self,
        tenant_id: TenantId,
        expected: ExpectedVersion,
        transition: &Transition,
    ) -> Result<(), JobError> {
        self.store.save(tenant_id, &transition.instance, expected)?;

        let stream_id = *transition.instance.id();
        let first = transition.instance.version() - transition.events.len() as u64 + 1;
        for (seq, event) in (first..).zip(transition.events.iter()) {
            let envelope =
                EventEnvelope::new(tenant_id, stream_id, STREAM_TYPE, seq, event.clone());
            if let Err(error) = self.bus.publish(envelope) {
                warn!(
                    tenant = %tenant_id,
                    order_id = %transition.instance.order_id(),
                    sequence = seq,
                    ?error,
                    "failed to publish approval event"
                );
            }
        }
        Ok(())
    }
}
