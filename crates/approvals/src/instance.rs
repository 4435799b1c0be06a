//! Approval instance aggregate: tracks one purchase order through its level chain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use procura_auth::{Approver, ApproverRoster, Role, authorize_level, authorize_roster_member};
use procura_core::{
    ActorId, Aggregate, AggregateRoot, DomainError, DomainResult, PurchaseOrderId, RuleId,
};
use procura_events::Event;

use crate::order::OrderCandidate;
use crate::rule::{ApprovalLevel, validate_levels};
use crate::select::RuleSelection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ApprovalStatus::Pending)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Reject,
}

/// An approver action as recorded on a level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedAction {
    pub actor_id: ActorId,
    pub role: Role,
    pub decision: Decision,
    pub at: DateTime<Utc>,
}

/// Runtime state of one level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelState {
    pub definition: ApprovalLevel,
    pub actions: Vec<RecordedAction>,
    pub satisfied: bool,
}

impl LevelState {
    fn new(definition: ApprovalLevel) -> Self {
        Self {
            definition,
            actions: Vec::new(),
            satisfied: false,
        }
    }

    pub fn level(&self) -> u32 {
        self.definition.level
    }

    pub fn has_approved(&self, actor_id: ActorId) -> bool {
        self.actions
            .iter()
            .any(|a| a.actor_id == actor_id && a.decision == Decision::Approve)
    }
}

/// Aggregate root: ApprovalInstance (one per purchase order under review).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalInstance {
    order_id: PurchaseOrderId,
    rule_id: Option<RuleId>,
    levels: Vec<LevelState>,
    current: usize,
    status: ApprovalStatus,
    version: u64,
    opened: bool,
}

impl ApprovalInstance {
    /// Create an empty, not-yet-opened instance for rehydration.
    pub fn empty(order_id: PurchaseOrderId) -> Self {
        Self {
            order_id,
            rule_id: None,
            levels: Vec::new(),
            current: 0,
            status: ApprovalStatus::Pending,
            version: 0,
            opened: false,
        }
    }

    /// Rebuild an instance from its event history.
    pub fn from_events<'a>(
        order_id: PurchaseOrderId,
        events: impl IntoIterator<Item = &'a ApprovalEvent>,
    ) -> Self {
        let mut instance = Self::empty(order_id);
        for event in events {
            instance.apply(event);
        }
        instance
    }

    pub fn order_id(&self) -> PurchaseOrderId {
        self.order_id
    }

    /// Governing rule; `None` when routed through the default approval.
    pub fn rule_id(&self) -> Option<RuleId> {
        self.rule_id
    }

    pub fn levels(&self) -> &[LevelState] {
        &self.levels
    }

    pub fn status(&self) -> ApprovalStatus {
        self.status
    }

    pub fn is_opened(&self) -> bool {
        self.opened
    }

    /// The level awaiting action, `None` once terminal.
    pub fn current_level(&self) -> Option<&LevelState> {
        if self.status.is_terminal() {
            return None;
        }
        self.levels.get(self.current)
    }

    /// Run a command and return the evolved copy with the emitted events.
    ///
    /// `self` is never touched; on error nothing is produced.
    pub fn execute(&self, command: &ApprovalCommand) -> DomainResult<Transition> {
        let events = self.handle(command)?;
        let mut instance = self.clone();
        for event in &events {
            instance.apply(event);
        }
        Ok(Transition { instance, events })
    }
}

impl AggregateRoot for ApprovalInstance {
    type Id = PurchaseOrderId;

    fn id(&self) -> &Self::Id {
        &self.order_id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// An approver acting on a level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalAction {
    pub level: u32,
    pub approver: Approver,
    pub decision: Decision,
    pub occurred_at: DateTime<Utc>,
}

impl ApprovalAction {
    pub fn approve(level: u32, approver: Approver, occurred_at: DateTime<Utc>) -> Self {
        Self {
            level,
            approver,
            decision: Decision::Approve,
            occurred_at,
        }
    }

    pub fn reject(level: u32, approver: Approver, occurred_at: DateTime<Utc>) -> Self {
        Self {
            level,
            approver,
            decision: Decision::Reject,
            occurred_at,
        }
    }
}

/// Command: OpenApproval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenApproval {
    pub order_id: PurchaseOrderId,
    pub rule_id: Option<RuleId>,
    pub levels: Vec<ApprovalLevel>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RecordAction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordAction {
    pub order_id: PurchaseOrderId,
    pub action: ApprovalAction,
    pub roster: ApproverRoster,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalCommand {
    OpenApproval(OpenApproval),
    RecordAction(RecordAction),
}

/// Event: ApprovalOpened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalOpened {
    pub order_id: PurchaseOrderId,
    pub rule_id: Option<RuleId>,
    pub levels: Vec<ApprovalLevel>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ActionRecorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecorded {
    pub order_id: PurchaseOrderId,
    pub level: u32,
    pub actor_id: ActorId,
    pub role: Role,
    pub decision: Decision,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LevelSatisfied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSatisfied {
    pub order_id: PurchaseOrderId,
    pub level: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderApproved. The purchase order may now be executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderApproved {
    pub order_id: PurchaseOrderId,
    pub rule_id: Option<RuleId>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderRejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRejected {
    pub order_id: PurchaseOrderId,
    pub level: u32,
    pub actor_id: ActorId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalEvent {
    ApprovalOpened(ApprovalOpened),
    ActionRecorded(ActionRecorded),
    LevelSatisfied(LevelSatisfied),
    OrderApproved(OrderApproved),
    OrderRejected(OrderRejected),
}

impl Event for ApprovalEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ApprovalEvent::ApprovalOpened(_) => "approvals.instance.opened",
            ApprovalEvent::ActionRecorded(_) => "approvals.instance.action_recorded",
            ApprovalEvent::LevelSatisfied(_) => "approvals.instance.level_satisfied",
            ApprovalEvent::OrderApproved(_) => "approvals.instance.approved",
            ApprovalEvent::OrderRejected(_) => "approvals.instance.rejected",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ApprovalEvent::ApprovalOpened(e) => e.occurred_at,
            ApprovalEvent::ActionRecorded(e) => e.occurred_at,
            ApprovalEvent::LevelSatisfied(e) => e.occurred_at,
            ApprovalEvent::OrderApproved(e) => e.occurred_at,
            ApprovalEvent::OrderRejected(e) => e.occurred_at,
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(
            self,
            ApprovalEvent::OrderApproved(_) | ApprovalEvent::OrderRejected(_)
        )
    }
}

impl Aggregate for ApprovalInstance {
    type Command = ApprovalCommand;
    type Event = ApprovalEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ApprovalEvent::ApprovalOpened(e) => {
                self.order_id = e.order_id;
                self.rule_id = e.rule_id;
                self.levels = e.levels.iter().copied().map(LevelState::new).collect();
                self.current = 0;
                self.status = ApprovalStatus::Pending;
                self.opened = true;
            }
            ApprovalEvent::ActionRecorded(e) => {
                if let Some(state) = self.levels.iter_mut().find(|l| l.level() == e.level) {
                    state.actions.push(RecordedAction {
                        actor_id: e.actor_id,
                        role: e.role,
                        decision: e.decision,
                        at: e.occurred_at,
                    });
                }
            }
            ApprovalEvent::LevelSatisfied(e) => {
                if let Some(idx) = self.levels.iter().position(|l| l.level() == e.level) {
                    self.levels[idx].satisfied = true;
                    self.current = idx + 1;
                }
            }
            ApprovalEvent::OrderApproved(_) => {
                self.status = ApprovalStatus::Approved;
            }
            ApprovalEvent::OrderRejected(_) => {
                self.status = ApprovalStatus::Rejected;
            }
        }

        // +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ApprovalCommand::OpenApproval(cmd) => self.handle_open(cmd),
            ApprovalCommand::RecordAction(cmd) => self.handle_record(cmd),
        }
    }
}

impl ApprovalInstance {
    fn ensure_order_id(&self, order_id: PurchaseOrderId) -> DomainResult<()> {
        if self.order_id != order_id {
            return Err(DomainError::invalid_state("order_id mismatch"));
        }
        Ok(())
    }

    fn handle_open(&self, cmd: &OpenApproval) -> DomainResult<Vec<ApprovalEvent>> {
        if self.opened {
            return Err(DomainError::invalid_state("approval already opened"));
        }
        self.ensure_order_id(cmd.order_id)?;
        validate_levels(&cmd.levels)?;

        Ok(vec![ApprovalEvent::ApprovalOpened(ApprovalOpened {
            order_id: cmd.order_id,
            rule_id: cmd.rule_id,
            levels: cmd.levels.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_record(&self, cmd: &RecordAction) -> DomainResult<Vec<ApprovalEvent>> {
        if !self.opened {
            return Err(DomainError::not_found());
        }
        self.ensure_order_id(cmd.order_id)?;

        if self.status.is_terminal() {
            return Err(DomainError::invalid_state(format!(
                "approval for order {} is already {:?}",
                self.order_id, self.status
            )));
        }

        let Some(state) = self.levels.get(self.current) else {
            return Err(DomainError::invalid_state("no pending level"));
        };
        let action = &cmd.action;
        let required = state.definition;

        if action.level != required.level {
            return Err(DomainError::out_of_sequence(required.level, action.level));
        }
        authorize_level(&action.approver, required.required_role)?;
        if required.require_all {
            authorize_roster_member(&action.approver, &cmd.roster, required.required_role)?;
        }

        let recorded = ApprovalEvent::ActionRecorded(ActionRecorded {
            order_id: self.order_id,
            level: required.level,
            actor_id: action.approver.actor_id,
            role: action.approver.role,
            decision: action.decision,
            occurred_at: action.occurred_at,
        });

        if action.decision == Decision::Reject {
            return Ok(vec![
                recorded,
                ApprovalEvent::OrderRejected(OrderRejected {
                    order_id: self.order_id,
                    level: required.level,
                    actor_id: action.approver.actor_id,
                    occurred_at: action.occurred_at,
                }),
            ]);
        }

        if state.has_approved(action.approver.actor_id) {
            return Err(DomainError::invalid_state(format!(
                "actor {} already approved level {}",
                action.approver.actor_id, required.level
            )));
        }

        let satisfied = !required.require_all
            || cmd
                .roster
                .members(required.required_role)
                .into_iter()
                .all(|m| m == action.approver.actor_id || state.has_approved(m));

        let mut events = vec![recorded];
        if satisfied {
            events.push(ApprovalEvent::LevelSatisfied(LevelSatisfied {
                order_id: self.order_id,
                level: required.level,
                occurred_at: action.occurred_at,
            }));
            if self.current + 1 == self.levels.len() {
                events.push(ApprovalEvent::OrderApproved(OrderApproved {
                    order_id: self.order_id,
                    rule_id: self.rule_id,
                    occurred_at: action.occurred_at,
                }));
            }
        }
        Ok(events)
    }
}

/// New instance state plus the events that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub instance: ApprovalInstance,
    pub events: Vec<ApprovalEvent>,
}

impl Transition {
    /// The terminal event, if this transition closed the approval.
    pub fn terminal_event(&self) -> Option<&ApprovalEvent> {
        self.events.iter().find(|e| e.is_terminal())
    }
}

/// Open an approval instance for `order` governed by `selection`.
pub fn open_approval(
    order: &OrderCandidate,
    selection: &RuleSelection<'_>,
    occurred_at: DateTime<Utc>,
) -> DomainResult<Transition> {
    ApprovalInstance::empty(order.order_id).execute(&ApprovalCommand::OpenApproval(OpenApproval {
        order_id: order.order_id,
        rule_id: selection.rule_id(),
        levels: selection.levels(),
        occurred_at,
    }))
}

/// Apply one approver action to `instance`.
///
/// Checks run in order: terminal status, level sequence, role, roster
/// membership (require-all levels, for approvals and rejections alike),
/// duplicate approval. Any failure leaves `instance` as it was.
pub fn record_action(
    instance: &ApprovalInstance,
    action: &ApprovalAction,
    roster: &ApproverRoster,
) -> DomainResult<Transition> {
    instance.execute(&ApprovalCommand::RecordAction(RecordAction {
        order_id: instance.order_id(),
        action: action.clone(),
        roster: roster.clone(),
    }))
}
