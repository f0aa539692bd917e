//! Order persistence contract consumed by the lifecycle engine.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use thiserror::Error;

use loomerp_core::OrderId;

use crate::order::Order;

/// Order storage error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("order not found")]
    NotFound,

    #[error("order already exists")]
    AlreadyExists,

    #[error("order storage failure: {0}")]
    Storage(String),
}

/// Durable storage of orders and their line items.
///
/// `create` and `update` persist the order row and all item rows **atomically**
/// (one transaction or equivalent) — a half-written transition (status updated
/// but an item's reserved quantity not, or the reverse) breaks the
/// stock-coverage invariant.
pub trait OrderRepository: Send + Sync {
    /// Load an order with its items.
    fn get(&self, id: OrderId) -> Result<Order, RepositoryError>;

    fn create(&self, order: &Order) -> Result<(), RepositoryError>;

    fn update(&self, order: &Order) -> Result<(), RepositoryError>;
}

impl<R> OrderRepository for Arc<R>
where
    R: OrderRepository + ?Sized,
{
    fn get(&self, id: OrderId) -> Result<Order, RepositoryError> {
        (**self).get(id)
    }

    fn create(&self, order: &Order) -> Result<(), RepositoryError> {
        (**self).create(order)
    }

    fn update(&self, order: &Order) -> Result<(), RepositoryError> {
        (**self).update(order)
    }
}

/// In-memory order store for tests/dev.
///
/// Whole orders (items included) are swapped under one write lock, which
/// trivially satisfies the atomicity requirement.
#[derive(Debug, Default)]
pub struct InMemoryOrderRepository {
    orders: RwLock<HashMap<OrderId, Order>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OrderRepository for InMemoryOrderRepository {
    fn get(&self, id: OrderId) -> Result<Order, RepositoryError> {
        let orders = self
            .orders
            .read()
            .map_err(|_| RepositoryError::Storage("lock poisoned".to_string()))?;

        orders.get(&id).cloned().ok_or(RepositoryError::NotFound)
    }

    fn create(&self, order: &Order) -> Result<(), RepositoryError> {
        let mut orders = self
            .orders
            .write()
            .map_err(|_| RepositoryError::Storage("lock poisoned".to_string()))?;

        if orders.contains_key(&order.id()) {
            return Err(RepositoryError::AlreadyExists);
        }
        orders.insert(order.id(), order.clone());
        Ok(())
    }

    fn update(&self, order: &Order) -> Result<(), RepositoryError> {
        let mut orders = self
            .orders
            .write()
            .map_err(|_| RepositoryError::Storage("lock poisoned".to_string()))?;

        match orders.get_mut(&order.id()) {
            Some(stored) => {
                *stored = order.clone();
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{OrderStatus, OrderType};
    use chrono::Utc;

    fn test_order() -> Order {
        Order {
            id: OrderId::new(),
            order_number: "SO-TEST0001".to_string(),
            customer_name: "Aldo Rossi".to_string(),
            customer_id: None,
            seller: "ines".to_string(),
            order_type: OrderType::CustomManufacture,
            status: OrderStatus::Quote,
            total: 0,
            discount: 0,
            items: Vec::new(),
            notes: String::new(),
            created_at: Utc::now(),
            estimated_delivery: None,
            delivered_at: None,
        }
    }

    #[test]
    fn get_returns_what_create_stored() {
        let repo = InMemoryOrderRepository::new();
        let order = test_order();

        repo.create(&order).unwrap();
        assert_eq!(repo.get(order.id()).unwrap(), order);
    }

    #[test]
    fn get_unknown_order_is_not_found() {
        let repo = InMemoryOrderRepository::new();
        assert_eq!(
            repo.get(OrderId::new()).unwrap_err(),
            RepositoryError::NotFound
        );
    }

    #[test]
    fn create_twice_conflicts() {
        let repo = InMemoryOrderRepository::new();
        let order = test_order();

        repo.create(&order).unwrap();
        assert_eq!(
            repo.create(&order).unwrap_err(),
            RepositoryError::AlreadyExists
        );
    }

    #[test]
    fn update_replaces_order_and_items_together() {
        let repo = InMemoryOrderRepository::new();
        let mut order = test_order();
        repo.create(&order).unwrap();

        order.set_status(OrderStatus::Approved);
        repo.update(&order).unwrap();

        assert_eq!(repo.get(order.id()).unwrap().status(), OrderStatus::Approved);
    }

    #[test]
    fn update_unknown_order_is_not_found() {
        let repo = InMemoryOrderRepository::new();
        assert_eq!(
            repo.update(&test_order()).unwrap_err(),
            RepositoryError::NotFound
        );
    }
}
