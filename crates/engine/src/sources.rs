//! Reader and sink seams between the engine and the caller's record store.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use procura_approvals::ApprovalRule;
use procura_auth::ApproverRoster;
use procura_core::{DomainError, ProductId, TenantId};
use procura_replenishment::{
    ProductSnapshot, ReorderSuggestion, ReplenishmentSummary, SaleSnapshot, SupplierGroup,
};

/// Everything the calculator needs for one tenant, captured at `as_of`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplenishmentSnapshot {
    pub tenant_id: TenantId,
    #[serde(default = "Utc::now")]
    pub as_of: DateTime<Utc>,
    #[serde(default)]
    pub products: Vec<ProductSnapshot>,
    #[serde(default)]
    pub sales: Vec<SaleSnapshot>,
    /// Products that already have a pending suggestion.
    #[serde(default)]
    pub pending: HashSet<ProductId>,
}

impl ReplenishmentSnapshot {
    pub fn new(tenant_id: TenantId, as_of: DateTime<Utc>) -> Self {
        Self {
            tenant_id,
            as_of,
            products: Vec::new(),
            sales: Vec::new(),
            pending: HashSet::new(),
        }
    }
}

/// Output of one replenishment run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplenishmentRun {
    pub tenant_id: TenantId,
    pub as_of: DateTime<Utc>,
    pub suggestions: Vec<ReorderSuggestion>,
    pub summary: ReplenishmentSummary,
    pub by_supplier: Vec<SupplierGroup>,
}

pub trait SnapshotReader: Send + Sync {
    type Error: core::fmt::Debug;

    fn get_snapshot(&self, tenant_id: TenantId) -> Result<ReplenishmentSnapshot, Self::Error>;
}

impl<R> SnapshotReader for Arc<R>
where
    R: SnapshotReader + ?Sized,
{
    type Error = R::Error;

    fn get_snapshot(&self, tenant_id: TenantId) -> Result<ReplenishmentSnapshot, Self::Error> {
        (**self).get_snapshot(tenant_id)
    }
}

/// Receives computed suggestions (the caller persists them as pending).
pub trait SuggestionSink: Send + Sync {
    fn emit(&self, run: ReplenishmentRun);
}

impl<S> SuggestionSink for Arc<S>
where
    S: SuggestionSink + ?Sized,
{
    fn emit(&self, run: ReplenishmentRun) {
        (**self).emit(run)
    }
}

#[derive(Debug, Default)]
struct TenantRecords {
    snapshot: Option<ReplenishmentSnapshot>,
    suggestions: Vec<ReorderSuggestion>,
}

/// In-memory snapshot source and suggestion sink for tests/dev.
///
/// Emitted suggestions become pending, so later snapshots exclude their
/// products until [`InMemoryReplenishmentStore::clear_pending`] is called.
#[derive(Debug, Default)]
pub struct InMemoryReplenishmentStore {
    inner: RwLock<HashMap<TenantId, TenantRecords>>,
}

impl InMemoryReplenishmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_snapshot(&self, snapshot: ReplenishmentSnapshot) {
        let tenant_id = snapshot.tenant_id;
        if let Ok(mut map) = self.inner.write() {
            map.entry(tenant_id).or_default().snapshot = Some(snapshot);
        }
    }

    /// Suggestions emitted so far for `tenant_id`, in emission order.
    pub fn suggestions(&self, tenant_id: TenantId) -> Vec<ReorderSuggestion> {
        self.inner
            .read()
            .ok()
            .and_then(|map| map.get(&tenant_id).map(|r| r.suggestions.clone()))
            .unwrap_or_default()
    }

    /// Drop pending suggestions (e.g. after they were turned into orders).
    pub fn clear_pending(&self, tenant_id: TenantId) {
        if let Ok(mut map) = self.inner.write() {
            if let Some(records) = map.get_mut(&tenant_id) {
                records.suggestions.clear();
            }
        }
    }
}

impl SnapshotReader for InMemoryReplenishmentStore {
    type Error = DomainError;

    fn get_snapshot(&self, tenant_id: TenantId) -> Result<ReplenishmentSnapshot, DomainError> {
        let map = self
            .inner
            .read()
            .map_err(|_| DomainError::invalid_state("replenishment store lock poisoned"))?;
        let records = map.get(&tenant_id).ok_or_else(DomainError::not_found)?;
        let mut snapshot = records.snapshot.clone().ok_or_else(DomainError::not_found)?;
        snapshot
            .pending
            .extend(records.suggestions.iter().map(|s| s.product_id));
        Ok(snapshot)
    }
}

impl SuggestionSink for InMemoryReplenishmentStore {
    fn emit(&self, run: ReplenishmentRun) {
        if let Ok(mut map) = self.inner.write() {
            map.entry(run.tenant_id)
                .or_default()
                .suggestions
                .extend(run.suggestions);
        }
    }
}

/// Approval rules and rosters per tenant.
pub trait ApprovalDirectory: Send + Sync {
    type Error: core::fmt::Debug;

    /// All rules for the tenant, in the caller's priority-tie order.
    fn rules(&self, tenant_id: TenantId) -> Result<Vec<ApprovalRule>, Self::Error>;

    fn roster(&self, tenant_id: TenantId) -> Result<ApproverRoster, Self::Error>;
}

impl<D> ApprovalDirectory for Arc<D>
where
    D: ApprovalDirectory + ?Sized,
{
    type Error = D::Error;

    fn rules(&self, tenant_id: TenantId) -> Result<Vec<ApprovalRule>, Self::Error> {
        (**self).rules(tenant_id)
    }

    fn roster(&self, tenant_id: TenantId) -> Result<ApproverRoster, Self::Error> {
        (**self).roster(tenant_id)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryApprovalDirectory {
    rules: RwLock<HashMap<TenantId, Vec<ApprovalRule>>>,
    rosters: RwLock<HashMap<TenantId, ApproverRoster>>,
}

impl InMemoryApprovalDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_rules(&self, tenant_id: TenantId, rules: Vec<ApprovalRule>) {
        if let Ok(mut map) = self.rules.write() {
            map.insert(tenant_id, rules);
        }
    }

    pub fn set_roster(&self, tenant_id: TenantId, roster: ApproverRoster) {
        if let Ok(mut map) = self.rosters.write() {
            map.insert(tenant_id, roster);
        }
    }
}

impl ApprovalDirectory for InMemoryApprovalDirectory {
    type Error = DomainError;

    fn rules(&self, tenant_id: TenantId) -> Result<Vec<ApprovalRule>, DomainError> {
        let map = self
            .rules
            .read()
            .map_err(|_| DomainError::invalid_state("rule directory lock poisoned"))?;
        Ok(map.get(&tenant_id).cloned().unwrap_or_default())
    }

    fn roster(&self, tenant_id: TenantId) -> Result<ApproverRoster, DomainError> {
        let map = self
            .rosters
            .read()
            .map_err(|_| DomainError::invalid_state("roster directory lock poisoned"))?;
        Ok(map.get(&tenant_id).cloned().unwrap_or_default())
    }
}
