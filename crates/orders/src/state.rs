//! Per-status behavior values.
//!
//! One [`OrderState`] exists per (order type, status) pair. It carries the
//! outbound edges of the state graph, an entry hook, an optional exit hook
//! and an optional auto-advance predicate. Hooks own the side effects of a
//! transition (stock movements, variant creation, event emission); the
//! engine only sequences them.

use std::collections::HashMap;

use loomerp_catalog::CatalogGateway;
use loomerp_core::OrderItemId;

use crate::engine::EngineError;
use crate::events::EventSink;
use crate::order::{Order, OrderStatus};

/// Caller-supplied produced counts, item-ID → units. Only consulted by
/// "finished" entry hooks.
pub type ProducedQuantities = HashMap<OrderItemId, i64>;

/// Collaborators and inputs a hook may touch during one transition.
pub struct TransitionContext<'a> {
    pub catalog: &'a dyn CatalogGateway,
    pub events: &'a dyn EventSink,
    pub produced: &'a ProducedQuantities,
    /// Status the order held before this transition; `None` on initial entry.
    pub previous: Option<OrderStatus>,
}

/// Entry/exit hook: side-effecting, may fail and thereby abort the transition.
pub type Hook = fn(&mut Order, &TransitionContext<'_>) -> Result<(), EngineError>;

/// Auto-advance predicate: pure and idempotent, advises the engine only.
pub type AdvancePredicate = fn(&Order) -> Option<OrderStatus>;

/// Behavior of one status within one order type's state graph.
pub struct OrderState {
    status: OrderStatus,
    allowed: &'static [OrderStatus],
    on_enter: Hook,
    on_exit: Option<Hook>,
    auto_advance: Option<AdvancePredicate>,
}

impl OrderState {
    pub(crate) const fn new(
        status: OrderStatus,
        allowed: &'static [OrderStatus],
        on_enter: Hook,
    ) -> Self {
        Self {
            status,
            allowed,
            on_enter,
            on_exit: None,
            auto_advance: None,
        }
    }

    pub(crate) const fn with_exit(mut self, hook: Hook) -> Self {
        self.on_exit = Some(hook);
        self
    }

    pub(crate) const fn with_auto_advance(mut self, predicate: AdvancePredicate) -> Self {
        self.auto_advance = Some(predicate);
        self
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Outbound edges: the statuses this state may legally transition to.
    pub fn allowed_transitions(&self) -> &'static [OrderStatus] {
        self.allowed
    }

    pub fn allows(&self, target: OrderStatus) -> bool {
        self.allowed.contains(&target)
    }

    pub(crate) fn enter(
        &self,
        order: &mut Order,
        ctx: &TransitionContext<'_>,
    ) -> Result<(), EngineError> {
        (self.on_enter)(order, ctx)
    }

    pub(crate) fn exit(
        &self,
        order: &mut Order,
        ctx: &TransitionContext<'_>,
    ) -> Result<(), EngineError> {
        match self.on_exit {
            Some(hook) => hook(order, ctx),
            None => Ok(()),
        }
    }

    /// Ask whether this state unconditionally advances further given the
    /// order as it now stands. Pure; never mutates.
    pub fn next_status(&self, order: &Order) -> Option<OrderStatus> {
        self.auto_advance.and_then(|predicate| predicate(order))
    }
}

impl core::fmt::Debug for OrderState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OrderState")
            .field("status", &self.status)
            .field("allowed", &self.allowed)
            .field("has_exit", &self.on_exit.is_some())
            .field("auto_advance", &self.auto_advance.is_some())
            .finish()
    }
}
