//! `procura-approvals`: purchase-order approval routing.
//!
//! Selects the rule governing an order, expands it into an ordered level
//! chain and advances an event-sourced approval instance as approvers act.
//! No IO; persistence and notifications belong to the caller.

pub mod instance;
pub mod order;
pub mod rule;
pub mod select;

pub use instance::{
    ActionRecorded, ApprovalAction, ApprovalCommand, ApprovalEvent, ApprovalInstance,
    ApprovalOpened, ApprovalStatus, Decision, LevelSatisfied, LevelState, OpenApproval,
    OrderApproved, OrderRejected, RecordAction, RecordedAction, Transition, open_approval,
    record_action,
};
pub use order::OrderCandidate;
pub use rule::{ApprovalLevel, ApprovalRule, ApprovalRuleRecord, RuleTrigger, validate_levels};
pub use select::{DefaultApproval, RuleSelection, select_rule};
