use tracing::info;

use procura_core::TenantId;
use procura_replenishment::{
    ReplenishmentCalculator, ReplenishmentPolicy, group_by_supplier, summarize,
};

use crate::job::{DecisionJob, JobError};
use crate::sources::{ReplenishmentRun, ReplenishmentSnapshot};

/// Computes reorder suggestions for one tenant snapshot.
#[derive(Debug, Clone)]
pub struct ReplenishmentJob {
    tenant_id: TenantId,
    input: ReplenishmentSnapshot,
    policy: ReplenishmentPolicy,
}

impl ReplenishmentJob {
    pub fn new(tenant_id: TenantId, input: ReplenishmentSnapshot) -> Self {
        Self {
            tenant_id,
            input,
            policy: ReplenishmentPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ReplenishmentPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl DecisionJob for ReplenishmentJob {
    type Input = ReplenishmentSnapshot;
    type Output = ReplenishmentRun;

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    fn input(&self) -> &Self::Input {
        &self.input
    }

    fn run(&self) -> Result<ReplenishmentRun, JobError> {
        if self.input.tenant_id != self.tenant_id {
            return Err(JobError::InvalidInput(
                "tenant_id mismatch between job and snapshot".to_string(),
            ));
        }

        let calculator = ReplenishmentCalculator::new(self.policy)?;
        let snapshot = &self.input;
        let suggestions = calculator.compute(
            &snapshot.products,
            &snapshot.sales,
            &snapshot.pending,
            snapshot.as_of,
        );
        let summary = summarize(&suggestions);

        info!(
            tenant = %self.tenant_id,
            products = snapshot.products.len(),
            suggested = summary.total,
            critical = summary.critical,
            "replenishment computed"
        );

        Ok(ReplenishmentRun {
            tenant_id: self.tenant_id,
            as_of: snapshot.as_of,
            by_supplier: group_by_supplier(&suggestions),
            summary,
            suggestions,
        })
    }
}
