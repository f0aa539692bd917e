//! `loomerp-events` — lifecycle event distribution.
//!
//! The [`Event`] trait describes a domain event; [`EventBus`] is the pub/sub
//! seam the lifecycle engine publishes into. Delivery is best-effort: the bus
//! is a notification channel, not a system of record.

pub mod bus;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
