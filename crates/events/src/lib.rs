//! `procura-events`: event trait, envelopes and the publish/subscribe seam.
//!
//! Aggregates in the engine emit events; callers wrap them in envelopes and
//! hand them to a bus so side effects (notifications, PO execution) happen
//! outside the pure core.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
