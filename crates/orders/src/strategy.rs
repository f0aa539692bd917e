//! Per-order-type strategies: a read-only registry of state tables.
//!
//! The set of order types is fixed and finite, so the registry is a closed
//! lookup table built once at startup — no open-ended runtime registration.

use std::collections::HashMap;

use crate::order::{OrderStatus, OrderType};
use crate::state::OrderState;
use crate::states;

/// The state graph of exactly one order type, plus its initial status.
#[derive(Debug)]
pub struct OrderStrategy {
    order_type: OrderType,
    initial: OrderStatus,
    states: HashMap<OrderStatus, OrderState>,
}

impl OrderStrategy {
    pub(crate) fn new(
        order_type: OrderType,
        initial: OrderStatus,
        states: Vec<OrderState>,
    ) -> Self {
        let states: HashMap<OrderStatus, OrderState> =
            states.into_iter().map(|s| (s.status(), s)).collect();
        debug_assert!(
            states.contains_key(&initial),
            "initial status must be part of the state table"
        );
        Self {
            order_type,
            initial,
            states,
        }
    }

    pub fn order_type(&self) -> OrderType {
        self.order_type
    }

    /// Status a freshly created order of this type starts in.
    pub fn initial_status(&self) -> OrderStatus {
        self.initial
    }

    /// Resolve a status to its behavior.
    ///
    /// `None` means "not part of this order type's state graph" — not an
    /// error by itself; callers turn it into one where it matters.
    pub fn state(&self, status: OrderStatus) -> Option<&OrderState> {
        self.states.get(&status)
    }

    /// All statuses defined for this order type.
    pub fn statuses(&self) -> impl Iterator<Item = OrderStatus> + '_ {
        self.states.keys().copied()
    }
}

/// Lookup table from order type to strategy.
#[derive(Debug)]
pub struct StrategyRegistry {
    strategies: HashMap<OrderType, OrderStrategy>,
}

impl StrategyRegistry {
    /// The three built-in strategies.
    pub fn new() -> Self {
        Self::with_strategies(vec![
            states::custom::strategy(),
            states::stock::strategy(),
            states::direct::strategy(),
        ])
    }

    /// Build a registry from an explicit strategy set (tests exercise the
    /// unsupported-type path with a partial set).
    pub fn with_strategies(strategies: Vec<OrderStrategy>) -> Self {
        Self {
            strategies: strategies
                .into_iter()
                .map(|s| (s.order_type(), s))
                .collect(),
        }
    }

    pub fn for_type(&self, order_type: OrderType) -> Option<&OrderStrategy> {
        self.strategies.get(&order_type)
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}
