//! `procura-core`: shared building blocks of the decision engine.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the error taxonomy, aggregate traits and lenient decoding of
//! snapshot records.

pub mod aggregate;
pub mod error;
pub mod id;
pub mod lenient;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use error::{DomainError, DomainResult};
pub use id::{ActorId, ProductId, PurchaseOrderId, RuleId, SaleId, SupplierId, TenantId};
