//! `loomerp-orders` — the order lifecycle engine.
//!
//! Orders move through per-type state graphs (custom-manufacture,
//! stock-production, direct-sale). Each state owns its entry/exit side
//! effects (stock reservation/release, variant creation, event emission);
//! the [`engine::LifecycleEngine`] validates and sequences transitions and
//! persists the result through an [`repository::OrderRepository`].

pub mod engine;
pub mod events;
pub mod order;
pub mod repository;
pub mod state;
pub mod states;
pub mod strategy;

pub use engine::{EngineError, LifecycleEngine, Transition, MAX_AUTO_ADVANCE};
pub use events::{EventSink, OrderEvent};
pub use order::{NewOrder, NewOrderItem, Order, OrderItem, OrderStatus, OrderType};
pub use repository::{InMemoryOrderRepository, OrderRepository, RepositoryError};
pub use state::{OrderState, ProducedQuantities, TransitionContext};
pub use strategy::{OrderStrategy, StrategyRegistry};
