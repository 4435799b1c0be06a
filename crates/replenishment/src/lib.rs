//! `procura-replenishment`: reorder suggestions from stock and sales velocity.
//!
//! Deterministic, side-effect free: callers supply product and sales snapshots
//! plus the set of products that already have a pending suggestion, and get
//! back a prioritized list of new suggestions. Persisting them is the
//! caller's job.

pub mod calculator;
pub mod policy;
pub mod snapshot;
pub mod suggestion;
pub mod summary;

pub use calculator::{ReplenishmentCalculator, compute_suggestions};
pub use policy::ReplenishmentPolicy;
pub use snapshot::{ProductSnapshot, SaleLine, SaleSnapshot};
pub use suggestion::{DaysOfStock, PriorityTier, ReorderSuggestion};
pub use summary::{ReplenishmentSummary, SupplierGroup, group_by_supplier, summarize};
