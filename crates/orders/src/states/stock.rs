//! Stock-production orders: planned → manufacturing → finished.
//!
//! A production run for the shelf. Nothing is reserved along the way and
//! there is no delivery leg; finishing books the produced units into free
//! stock.

use chrono::Utc;

use crate::engine::EngineError;
use crate::events::{
    ManufacturingStarted, OrderCancelled, OrderCreated, OrderEvent, OrderFinished,
};
use crate::order::{Order, OrderStatus, OrderType};
use crate::state::{OrderState, TransitionContext};
use crate::states;
use crate::strategy::OrderStrategy;

pub(crate) fn strategy() -> OrderStrategy {
    OrderStrategy::new(
        OrderType::StockProduction,
        OrderStatus::Planned,
        vec![
            OrderState::new(
                OrderStatus::Planned,
                &[OrderStatus::Manufacturing, OrderStatus::Cancelled],
                enter_planned,
            ),
            OrderState::new(
                OrderStatus::Manufacturing,
                &[OrderStatus::Finished, OrderStatus::Cancelled],
                enter_manufacturing,
            ),
            OrderState::new(OrderStatus::Finished, &[], enter_finished),
            OrderState::new(OrderStatus::Cancelled, &[], enter_cancelled),
        ],
    )
}

fn enter_planned(order: &mut Order, ctx: &TransitionContext<'_>) -> Result<(), EngineError> {
    ctx.events.publish(OrderEvent::OrderCreated(OrderCreated {
        order_id: order.id(),
        order_number: order.order_number().to_string(),
        order_type: order.order_type(),
        status: order.status(),
        occurred_at: Utc::now(),
    }));
    Ok(())
}

fn enter_manufacturing(order: &mut Order, ctx: &TransitionContext<'_>) -> Result<(), EngineError> {
    ctx.events
        .publish(OrderEvent::ManufacturingStarted(ManufacturingStarted {
            order_id: order.id(),
            occurred_at: Utc::now(),
        }));
    Ok(())
}

fn enter_finished(order: &mut Order, ctx: &TransitionContext<'_>) -> Result<(), EngineError> {
    // Produced goods go to free stock; no reservation, there is no buyer yet.
    states::record_production(order, ctx, false)?;
    ctx.events.publish(OrderEvent::OrderFinished(OrderFinished {
        order_id: order.id(),
        occurred_at: Utc::now(),
    }));
    Ok(())
}

fn enter_cancelled(order: &mut Order, ctx: &TransitionContext<'_>) -> Result<(), EngineError> {
    // Production orders hold no reservations; the release is a no-op guard.
    states::release_reserved(order, ctx)?;
    ctx.events.publish(OrderEvent::OrderCancelled(OrderCancelled {
        order_id: order.id(),
        previous_status: ctx.previous,
        occurred_at: Utc::now(),
    }));
    Ok(())
}
