//! Direct-sale orders: pending → delivered.
//!
//! A direct sale sells on-hand goods: entry into the initial state reserves
//! every item's full quantity or fails the creation outright.

use chrono::Utc;

use crate::engine::EngineError;
use crate::events::{OrderCancelled, OrderCreated, OrderDelivered, OrderEvent};
use crate::order::{Order, OrderStatus, OrderType};
use crate::state::{OrderState, TransitionContext};
use crate::states;
use crate::strategy::OrderStrategy;

pub(crate) fn strategy() -> OrderStrategy {
    OrderStrategy::new(
        OrderType::DirectSale,
        OrderStatus::Pending,
        vec![
            OrderState::new(
                OrderStatus::Pending,
                &[OrderStatus::Delivered, OrderStatus::Cancelled],
                enter_pending,
            ),
            OrderState::new(OrderStatus::Delivered, &[], enter_delivered),
            OrderState::new(OrderStatus::Cancelled, &[], enter_cancelled),
        ],
    )
}

fn enter_pending(order: &mut Order, ctx: &TransitionContext<'_>) -> Result<(), EngineError> {
    states::reserve_full(order, ctx)?;
    ctx.events.publish(OrderEvent::OrderCreated(OrderCreated {
        order_id: order.id(),
        order_number: order.order_number().to_string(),
        order_type: order.order_type(),
        status: order.status(),
        occurred_at: Utc::now(),
    }));
    Ok(())
}

fn enter_delivered(order: &mut Order, ctx: &TransitionContext<'_>) -> Result<(), EngineError> {
    states::consume_reserved(order, ctx)?;
    order.mark_delivered(Utc::now());
    ctx.events.publish(OrderEvent::OrderDelivered(OrderDelivered {
        order_id: order.id(),
        occurred_at: Utc::now(),
    }));
    Ok(())
}

fn enter_cancelled(order: &mut Order, ctx: &TransitionContext<'_>) -> Result<(), EngineError> {
    states::release_reserved(order, ctx)?;
    ctx.events.publish(OrderEvent::OrderCancelled(OrderCancelled {
        order_id: order.id(),
        previous_status: ctx.previous,
        occurred_at: Utc::now(),
    }));
    Ok(())
}
