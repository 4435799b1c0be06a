use thiserror::Error;

use procura_core::{DomainError, TenantId};

#[derive(Debug, Error)]
pub enum JobError {
    #[error("invalid job input: {0}")]
    InvalidInput(String),

    /// An external collaborator (reader, store, bus) failed.
    #[error("source failed: {0}")]
    Source(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl JobError {
    pub fn source_failed(err: impl core::fmt::Debug) -> Self {
        Self::Source(format!("{err:?}"))
    }
}

/// A tenant-scoped decision unit.
///
/// Inputs are snapshots provided by callers; jobs never reach out to storage.
pub trait DecisionJob: Send + Sync + 'static {
    type Input: Send + Sync + 'static;
    type Output: Send + 'static;

    fn tenant_id(&self) -> TenantId;

    fn input(&self) -> &Self::Input;

    /// Compute the decision. Must not mutate anything outside the job.
    fn run(&self) -> Result<Self::Output, JobError>;
}

/// Tenant scope for execution.
///
/// - `Any`: run jobs for any tenant (shared workers).
/// - `Tenant`: only accept jobs for the specified tenant.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TenantScope {
    Any,
    Tenant(TenantId),
}

impl TenantScope {
    pub fn allows(&self, tenant_id: TenantId) -> bool {
        match self {
            TenantScope::Any => true,
            TenantScope::Tenant(t) => *t == tenant_id,
        }
    }
}

pub trait JobScheduler: Send + Sync + 'static {
    fn scope(&self) -> TenantScope;

    fn run<J: DecisionJob>(&self, job: J) -> Result<J::Output, JobError> {
        if !self.scope().allows(job.tenant_id()) {
            return Err(JobError::InvalidInput(
                "tenant scope violation (job tenant not allowed by scheduler)".to_string(),
            ));
        }
        job.run()
    }
}

/// Runs jobs immediately on the calling thread.
#[derive(Debug, Copy, Clone)]
pub struct LocalJobScheduler {
    scope: TenantScope,
}

impl LocalJobScheduler {
    pub fn new(scope: TenantScope) -> Self {
        Self { scope }
    }

    pub fn for_tenant(tenant_id: TenantId) -> Self {
        Self::new(TenantScope::Tenant(tenant_id))
    }
}

impl JobScheduler for LocalJobScheduler {
    fn scope(&self) -> TenantScope {
        self.scope
    }
}
