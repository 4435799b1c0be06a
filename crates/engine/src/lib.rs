//! `procura-engine`: orchestration shell around the decision components.
//!
//! Reads tenant snapshots through caller-provided traits, runs the
//! replenishment calculator and the approval resolver, and hands results to
//! sinks, stores and the event bus. The components themselves stay pure.

pub mod config;
pub mod job;
pub mod replenishment_job;
pub mod runner;
pub mod service;
pub mod sources;
pub mod store;

pub use config::EngineConfig;
pub use job::{DecisionJob, JobError, JobScheduler, LocalJobScheduler, TenantScope};
pub use replenishment_job::ReplenishmentJob;
pub use runner::{ReplenishmentRunner, ReplenishmentRunnerHandle};
pub use service::{ApprovalEnvelope, ApprovalService, STREAM_TYPE};
pub use sources::{
    ApprovalDirectory, InMemoryApprovalDirectory, InMemoryReplenishmentStore, ReplenishmentRun,
    ReplenishmentSnapshot, SnapshotReader, SuggestionSink,
};
pub use store::{InMemoryInstanceStore, InstanceStore};
