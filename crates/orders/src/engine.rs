//! Order lifecycle engine (application-level orchestration).
//!
//! The engine validates and executes a single status transition:
//!
//! ```text
//! ChangeStatus(order, target)
//!   ↓
//! 1. Load order (with items)
//!   ↓
//! 2. Resolve strategy for the order's type, current + target states
//!   ↓
//! 3. Validate the transition against the current state's allowed set
//!   ↓
//! 4. Exit hook → flip status → entry hook (stock moves, events)
//!   ↓
//! 5. Persist order + items atomically
//!   ↓
//! 6. Auto-advance if the new state says so (loop, capped)
//! ```
//!
//! Side effects live in the state hooks; the engine only sequences them. The
//! in-memory status is flipped only after the exit hook succeeds, and
//! persistence is the last step of each iteration, so a failed hook leaves
//! the stored order untouched. A persistence failure *after* hooks ran is
//! the known risk window: catalog side effects are already applied, so the
//! engine logs a reconciliation record and surfaces the failure as
//! [`EngineError::Repository`].

use chrono::Utc;
use thiserror::Error;

use loomerp_catalog::{CatalogError, CatalogGateway};
use loomerp_core::{DomainError, OrderId, OrderItemId, ProductVariantId};

use crate::events::EventSink;
use crate::order::{NewOrder, Order, OrderItem, OrderStatus, OrderType};
use crate::repository::{OrderRepository, RepositoryError};
use crate::state::{ProducedQuantities, TransitionContext};
use crate::strategy::StrategyRegistry;

/// Hard cap on automatic follow-on transitions within one call; a cycle in
/// an auto-advance predicate must surface as a fatal error, not a hang.
pub const MAX_AUTO_ADVANCE: usize = 10;

/// Lifecycle operation error. Every variant is a stable machine-readable kind.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("order not found")]
    OrderNotFound,

    #[error("no strategy for order type {0}")]
    UnsupportedOrderType(OrderType),

    #[error("order is already in status {0}")]
    AlreadyInStatus(OrderStatus),

    #[error("status {status} is not part of the {order_type} state graph")]
    InvalidTargetStatus {
        order_type: OrderType,
        status: OrderStatus,
    },

    #[error("transition {from} -> {to} is not allowed")]
    InvalidTransition {
        from: OrderStatus,
        to: OrderStatus,
    },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("insufficient stock on variant {variant_id}: requested {requested}, available {available}")]
    InsufficientStock {
        variant_id: ProductVariantId,
        requested: i64,
        available: i64,
    },

    #[error("catalog failure: {0}")]
    Catalog(CatalogError),

    #[error("order persistence failure: {0}")]
    Repository(RepositoryError),

    #[error("auto-advance did not settle after {limit} transitions on order {order_id}")]
    AutoAdvanceOverflow { order_id: OrderId, limit: usize },
}

impl From<CatalogError> for EngineError {
    fn from(value: CatalogError) -> Self {
        match value {
            CatalogError::InsufficientStock {
                variant_id,
                requested,
                available,
            } => EngineError::InsufficientStock {
                variant_id,
                requested,
                available,
            },
            other => EngineError::Catalog(other),
        }
    }
}

impl From<DomainError> for EngineError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::NotFound => EngineError::OrderNotFound,
            DomainError::Validation(msg) => EngineError::Validation(msg),
            other => EngineError::Validation(other.to_string()),
        }
    }
}

/// Outcome of a successful transition: the updated order and the statuses
/// legally reachable from where it landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub order: Order,
    pub allowed_next: Vec<OrderStatus>,
}

/// Validates and executes status transitions, sequencing strategy lookup,
/// state hooks, automatic follow-on transitions and persistence.
///
/// Request-scoped and stateless between calls: every operation runs
/// synchronously to completion within the caller's thread, suspending only
/// for repository/gateway/sink I/O.
pub struct LifecycleEngine<R, C, S> {
    repository: R,
    catalog: C,
    events: S,
    strategies: StrategyRegistry,
}

impl<R, C, S> LifecycleEngine<R, C, S>
where
    R: OrderRepository,
    C: CatalogGateway,
    S: EventSink,
{
    pub fn new(repository: R, catalog: C, events: S) -> Self {
        Self::with_strategies(repository, catalog, events, StrategyRegistry::new())
    }

    pub fn with_strategies(
        repository: R,
        catalog: C,
        events: S,
        strategies: StrategyRegistry,
    ) -> Self {
        Self {
            repository,
            catalog,
            events,
            strategies,
        }
    }

    /// Move an order to `target`, running exit/entry hooks and any automatic
    /// follow-on transitions, and persist the result.
    ///
    /// `produced` maps item IDs to produced counts; it is only consulted
    /// when a transition enters a "finished" state.
    pub fn change_status(
        &self,
        order_id: OrderId,
        target: OrderStatus,
        produced: &ProducedQuantities,
    ) -> Result<Transition, EngineError> {
        let mut order = self.load(order_id)?;
        let allowed_next = self.apply_transition(&mut order, target, produced)?;
        Ok(Transition {
            order,
            allowed_next,
        })
    }

    /// Read-only query: which statuses can the order legally move to next?
    pub fn allowed_next_statuses(&self, order_id: OrderId) -> Result<Vec<OrderStatus>, EngineError> {
        let order = self.load(order_id)?;
        let strategy = self
            .strategies
            .for_type(order.order_type())
            .ok_or(EngineError::UnsupportedOrderType(order.order_type()))?;
        let state = strategy
            .state(order.status())
            .ok_or(EngineError::InvalidTargetStatus {
                order_type: order.order_type(),
                status: order.status(),
            })?;
        Ok(state.allowed_transitions().to_vec())
    }

    /// Create an order in its type's initial status and enter that state
    /// exactly as a transition would.
    ///
    /// Items are enriched against the catalog first: an existing product and
    /// variant matching (name, color, size) is linked instead of duplicated,
    /// and its unit price adopted where the draft has none.
    pub fn create_order(&self, draft: NewOrder) -> Result<Order, EngineError> {
        draft.validate()?;

        let strategy = self
            .strategies
            .for_type(draft.order_type)
            .ok_or(EngineError::UnsupportedOrderType(draft.order_type))?;

        let items = self.enrich_items(&draft)?;
        let items_total: u64 = items.iter().map(OrderItem::subtotal).sum();
        if draft.discount > items_total {
            return Err(EngineError::Validation(format!(
                "discount {} exceeds item total {items_total}",
                draft.discount
            )));
        }

        let id = OrderId::new();
        let mut order = Order {
            id,
            order_number: draft.order_number.unwrap_or_else(|| order_number_for(id)),
            customer_name: draft.customer_name,
            customer_id: draft.customer_id,
            seller: draft.seller,
            order_type: draft.order_type,
            status: strategy.initial_status(),
            total: items_total - draft.discount,
            discount: draft.discount,
            items,
            notes: draft.notes,
            created_at: Utc::now(),
            estimated_delivery: draft.estimated_delivery,
            delivered_at: None,
        };

        self.repository
            .create(&order)
            .map_err(EngineError::Repository)?;

        // "Created" is an entry into the first state, not a separate code
        // path: run the entry hook, persist its effects, then follow any
        // auto-advance the state advises.
        let initial_state =
            strategy
                .state(order.status())
                .ok_or(EngineError::InvalidTargetStatus {
                    order_type: order.order_type(),
                    status: order.status(),
                })?;

        let produced = ProducedQuantities::new();
        let ctx = TransitionContext {
            catalog: &self.catalog,
            events: &self.events,
            produced: &produced,
            previous: None,
        };
        initial_state.enter(&mut order, &ctx)?;
        self.persist(&order, None)?;

        if let Some(next) = initial_state.next_status(&order) {
            self.apply_transition(&mut order, next, &produced)?;
        }

        Ok(order)
    }

    /// One full transition plus its automatic follow-ons, as an explicit
    /// loop rather than unbounded recursion.
    fn apply_transition(
        &self,
        order: &mut Order,
        target: OrderStatus,
        produced: &ProducedQuantities,
    ) -> Result<Vec<OrderStatus>, EngineError> {
        let mut target = target;

        for _ in 0..MAX_AUTO_ADVANCE {
            let strategy = self
                .strategies
                .for_type(order.order_type())
                .ok_or(EngineError::UnsupportedOrderType(order.order_type()))?;

            if target == order.status() {
                return Err(EngineError::AlreadyInStatus(target));
            }

            let new_state =
                strategy
                    .state(target)
                    .ok_or(EngineError::InvalidTargetStatus {
                        order_type: order.order_type(),
                        status: target,
                    })?;

            // The current status may be a legacy value outside the state
            // graph; then there is no allowed-set to validate against and no
            // exit hook to run.
            let current_state = strategy.state(order.status());
            if let Some(current) = current_state {
                if !current.allows(target) {
                    return Err(EngineError::InvalidTransition {
                        from: order.status(),
                        to: target,
                    });
                }
            }

            let previous = order.status();
            let ctx = TransitionContext {
                catalog: &self.catalog,
                events: &self.events,
                produced,
                previous: Some(previous),
            };

            if let Some(current) = current_state {
                current.exit(order, &ctx)?;
            }

            // Only mutated after exit-hook success; a failure above leaves
            // the order exactly as loaded.
            order.set_status(target);
            new_state.enter(order, &ctx)?;

            self.persist(order, Some(previous))?;

            tracing::debug!(
                order_id = %order.id(),
                from = %previous,
                to = %order.status(),
                "order transition applied"
            );

            match new_state.next_status(order) {
                Some(next) => {
                    tracing::debug!(
                        order_id = %order.id(),
                        from = %order.status(),
                        to = %next,
                        "auto-advancing"
                    );
                    target = next;
                }
                None => return Ok(new_state.allowed_transitions().to_vec()),
            }
        }

        Err(EngineError::AutoAdvanceOverflow {
            order_id: order.id(),
            limit: MAX_AUTO_ADVANCE,
        })
    }

    fn load(&self, order_id: OrderId) -> Result<Order, EngineError> {
        self.repository.get(order_id).map_err(|err| match err {
            RepositoryError::NotFound => EngineError::OrderNotFound,
            other => EngineError::Repository(other),
        })
    }

    fn persist(&self, order: &Order, previous: Option<OrderStatus>) -> Result<(), EngineError> {
        if let Err(err) = self.repository.update(order) {
            // Entry-hook side effects (reservations, variant creation) are
            // already applied against the catalog; this order/status write
            // did not commit. Manual reconciliation required.
            tracing::error!(
                order_id = %order.id(),
                previous = previous.map(|s| s.as_str()),
                status = %order.status(),
                error = %err,
                "order persistence failed after entry hook side effects"
            );
            return Err(EngineError::Repository(err));
        }
        Ok(())
    }

    fn enrich_items(&self, draft: &NewOrder) -> Result<Vec<OrderItem>, EngineError> {
        let mut items = Vec::with_capacity(draft.items.len());
        for (idx, draft_item) in draft.items.iter().enumerate() {
            let product = self.catalog.product_by_name(&draft_item.product_name)?;
            let variant = match &product {
                Some(product) => self.catalog.find_variant(
                    product.id,
                    &draft_item.color,
                    draft_item.size_id,
                )?,
                None => None,
            };

            let unit_price = draft_item
                .unit_price
                .or_else(|| variant.as_ref().map(|v| v.unit_price))
                .ok_or_else(|| {
                    EngineError::Validation(format!(
                        "item {idx}: no price given and no catalog price to adopt"
                    ))
                })?;

            items.push(OrderItem {
                id: OrderItemId::new(),
                product_id: product.map(|p| p.id),
                variant_id: variant.map(|v| v.id),
                product_name: draft_item.product_name.clone(),
                category: draft_item.category.clone(),
                color: draft_item.color.clone(),
                size_id: draft_item.size_id,
                size_name: draft_item.size_name.clone(),
                quantity: draft_item.quantity,
                reserved_quantity: 0,
                unit_price,
            });
        }
        Ok(items)
    }
}

fn order_number_for(id: OrderId) -> String {
    let hex = id.as_uuid().simple().to_string();
    format!("SO-{}", hex[..8].to_ascii_uppercase())
}
