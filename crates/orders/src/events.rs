//! Lifecycle events emitted by state entry hooks.
//!
//! Publication is fire-and-forget: the engine never consumes a publish
//! result, and a slow or failing subscriber must not block or fail a status
//! transition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use loomerp_core::{OrderId, OrderItemId, ProductVariantId};
use loomerp_events::{Event, EventBus};

use crate::order::{OrderStatus, OrderType};

/// Event: OrderCreated — an order entered its type's initial state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreated {
    pub order_id: OrderId,
    pub order_number: String,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderApproved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderApproved {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockReserved — existing stock was promised to an order item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReserved {
    pub order_id: OrderId,
    pub item_id: OrderItemId,
    pub variant_id: ProductVariantId,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ManufacturingStarted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManufacturingStarted {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockProduced — manufactured units entered a variant's stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockProduced {
    pub order_id: OrderId,
    pub item_id: OrderItemId,
    pub variant_id: ProductVariantId,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderFinished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFinished {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderDelivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDelivered {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockReleased — a reservation was returned to the free pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReleased {
    pub order_id: OrderId,
    pub item_id: OrderItemId,
    pub variant_id: ProductVariantId,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderCancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelled {
    pub order_id: OrderId,
    pub previous_status: Option<OrderStatus>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderEvent {
    OrderCreated(OrderCreated),
    OrderApproved(OrderApproved),
    StockReserved(StockReserved),
    ManufacturingStarted(ManufacturingStarted),
    StockProduced(StockProduced),
    OrderFinished(OrderFinished),
    OrderDelivered(OrderDelivered),
    StockReleased(StockReleased),
    OrderCancelled(OrderCancelled),
}

impl Event for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderCreated(_) => "orders.order.created",
            OrderEvent::OrderApproved(_) => "orders.order.approved",
            OrderEvent::StockReserved(_) => "orders.stock.reserved",
            OrderEvent::ManufacturingStarted(_) => "orders.order.manufacturing_started",
            OrderEvent::StockProduced(_) => "orders.stock.produced",
            OrderEvent::OrderFinished(_) => "orders.order.finished",
            OrderEvent::OrderDelivered(_) => "orders.order.delivered",
            OrderEvent::StockReleased(_) => "orders.stock.released",
            OrderEvent::OrderCancelled(_) => "orders.order.cancelled",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::OrderCreated(e) => e.occurred_at,
            OrderEvent::OrderApproved(e) => e.occurred_at,
            OrderEvent::StockReserved(e) => e.occurred_at,
            OrderEvent::ManufacturingStarted(e) => e.occurred_at,
            OrderEvent::StockProduced(e) => e.occurred_at,
            OrderEvent::OrderFinished(e) => e.occurred_at,
            OrderEvent::OrderDelivered(e) => e.occurred_at,
            OrderEvent::StockReleased(e) => e.occurred_at,
            OrderEvent::OrderCancelled(e) => e.occurred_at,
        }
    }
}

/// Fire-and-forget publication seam consumed by state hooks.
///
/// Every [`EventBus`] carrying [`OrderEvent`]s is a sink: publish failures
/// are logged and swallowed, never propagated into the transition.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: OrderEvent);
}

impl<B> EventSink for B
where
    B: EventBus<OrderEvent>,
{
    fn publish(&self, event: OrderEvent) {
        let event_type = event.event_type();
        if let Err(err) = EventBus::publish(self, event) {
            tracing::warn!(event_type, error = ?err, "order event publication failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loomerp_events::InMemoryEventBus;

    #[test]
    fn event_types_are_stable_strings() {
        let event = OrderEvent::OrderApproved(OrderApproved {
            order_id: OrderId::new(),
            occurred_at: Utc::now(),
        });
        assert_eq!(event.event_type(), "orders.order.approved");
        assert_eq!(Event::version(&event), 1);
    }

    #[test]
    fn any_event_bus_is_a_sink() {
        let bus: InMemoryEventBus<OrderEvent> = InMemoryEventBus::new();
        let subscription = bus.subscribe();

        let sink: &dyn EventSink = &bus;
        sink.publish(OrderEvent::OrderFinished(OrderFinished {
            order_id: OrderId::new(),
            occurred_at: Utc::now(),
        }));

        assert_eq!(subscription.drain().len(), 1);
    }
}
