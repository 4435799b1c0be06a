use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use procura_approvals::ApprovalInstance;
use procura_core::{
    AggregateRoot, DomainError, DomainResult, ExpectedVersion, PurchaseOrderId, TenantId,
};

/// Tenant-isolated storage for approval instances with optimistic versioning.
pub trait InstanceStore: Send + Sync {
    fn load(
        &self,
        tenant_id: TenantId,
        order_id: PurchaseOrderId,
    ) -> DomainResult<Option<ApprovalInstance>>;

    /// Save `instance` if the stored version matches `expected`
    /// (an absent instance counts as version 0).
    fn save(
        &self,
        tenant_id: TenantId,
        instance: &ApprovalInstance,
        expected: ExpectedVersion,
    ) -> DomainResult<()>;
}

impl<S> InstanceStore for Arc<S>
where
    S: InstanceStore + ?Sized,
{
    fn load(
        &self,
        tenant_id: TenantId,
        order_id: PurchaseOrderId,
    ) -> DomainResult<Option<ApprovalInstance>> {
        (**self).load(tenant_id, order_id)
    }

    fn save(
        &self,
        tenant_id: TenantId,
        instance: &ApprovalInstance,
        expected: ExpectedVersion,
    ) -> DomainResult<()> {
        (**self).save(tenant_id, instance, expected)
    }
}

/// In-memory instance store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryInstanceStore {
    inner: RwLock<HashMap<(TenantId, PurchaseOrderId), ApprovalInstance>>,
}

impl InMemoryInstanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self, tenant_id: TenantId) -> Vec<ApprovalInstance> {
        let map = match self.inner.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };
        let mut out: Vec<_> = map
            .iter()
            .filter(|((t, _), _)| *t == tenant_id)
            .map(|(_, v)| v.clone())
            .collect();
        out.sort_by_key(|i| i.order_id());
        out
    }
}

impl InstanceStore for InMemoryInstanceStore {
    fn load(
        &self,
        tenant_id: TenantId,
        order_id: PurchaseOrderId,
    ) -> DomainResult<Option<ApprovalInstance>> {
        let map = self
            .inner
            .read()
            .map_err(|_| DomainError::invalid_state("instance store lock poisoned"))?;
        Ok(map.get(&(tenant_id, order_id)).cloned())
    }

    fn save(
        &self,
        tenant_id: TenantId,
        instance: &ApprovalInstance,
        expected: ExpectedVersion,
    ) -> DomainResult<()> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| DomainError::invalid_state("instance store lock poisoned"))?;

        let key = (tenant_id, *instance.id());
        let current = map.get(&key).map(|i| i.version()).unwrap_or(0);
        expected.check(current)?;

        map.insert(key, instance.clone());
        Ok(())
    }
}
