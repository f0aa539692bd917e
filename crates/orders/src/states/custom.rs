//! Custom-manufacture orders: quote → approved → manufacturing → finished →
//! delivered, with cancellation possible until manufacturing completes.
//!
//! Approval reserves whatever existing stock can cover; the remainder is the
//! manufacturing gap. An order whose every item is already covered skips the
//! manufacturing phase entirely.

use chrono::Utc;

use crate::engine::EngineError;
use crate::events::{
    ManufacturingStarted, OrderApproved, OrderCancelled, OrderCreated, OrderDelivered,
    OrderEvent, OrderFinished,
};
use crate::order::{Order, OrderStatus, OrderType};
use crate::state::{OrderState, TransitionContext};
use crate::states;
use crate::strategy::OrderStrategy;

pub(crate) fn strategy() -> OrderStrategy {
    OrderStrategy::new(
        OrderType::CustomManufacture,
        OrderStatus::Quote,
        vec![
            OrderState::new(
                OrderStatus::Quote,
                &[OrderStatus::Approved, OrderStatus::Cancelled],
                enter_quote,
            ),
            OrderState::new(
                OrderStatus::Approved,
                &[
                    OrderStatus::Manufacturing,
                    OrderStatus::Finished,
                    OrderStatus::Cancelled,
                ],
                enter_approved,
            )
            .with_auto_advance(skip_manufacturing_when_covered),
            OrderState::new(
                OrderStatus::Manufacturing,
                &[OrderStatus::Finished, OrderStatus::Cancelled],
                enter_manufacturing,
            ),
            OrderState::new(OrderStatus::Finished, &[OrderStatus::Delivered], enter_finished)
                .with_exit(exit_finished),
            OrderState::new(OrderStatus::Delivered, &[], enter_delivered),
            OrderState::new(OrderStatus::Cancelled, &[], enter_cancelled),
        ],
    )
}

fn enter_quote(order: &mut Order, ctx: &TransitionContext<'_>) -> Result<(), EngineError> {
    ctx.events.publish(OrderEvent::OrderCreated(OrderCreated {
        order_id: order.id(),
        order_number: order.order_number().to_string(),
        order_type: order.order_type(),
        status: order.status(),
        occurred_at: Utc::now(),
    }));
    Ok(())
}

fn enter_approved(order: &mut Order, ctx: &TransitionContext<'_>) -> Result<(), EngineError> {
    states::reserve_available(order, ctx)?;
    ctx.events.publish(OrderEvent::OrderApproved(OrderApproved {
        order_id: order.id(),
        occurred_at: Utc::now(),
    }));
    Ok(())
}

/// Every item covered by reserved stock: nothing to manufacture.
fn skip_manufacturing_when_covered(order: &Order) -> Option<OrderStatus> {
    if order.fully_covered_by_stock() {
        Some(OrderStatus::Finished)
    } else {
        None
    }
}

fn enter_manufacturing(order: &mut Order, ctx: &TransitionContext<'_>) -> Result<(), EngineError> {
    // No stock change; gaps stay recorded on the items.
    ctx.events
        .publish(OrderEvent::ManufacturingStarted(ManufacturingStarted {
            order_id: order.id(),
            occurred_at: Utc::now(),
        }));
    Ok(())
}

fn enter_finished(order: &mut Order, ctx: &TransitionContext<'_>) -> Result<(), EngineError> {
    // Produced units are reserved for this order the moment they enter
    // stock; delivery will take the full covered quantity back out.
    states::record_production(order, ctx, true)?;
    ctx.events.publish(OrderEvent::OrderFinished(OrderFinished {
        order_id: order.id(),
        occurred_at: Utc::now(),
    }));
    Ok(())
}

/// Guard: only fully covered orders may leave finished toward delivery —
/// you cannot ship what was never produced.
fn exit_finished(order: &mut Order, _ctx: &TransitionContext<'_>) -> Result<(), EngineError> {
    if let Some(item) = order.items().iter().find(|item| item.needs_manufacturing()) {
        return Err(EngineError::Validation(format!(
            "item {} still needs manufacturing",
            item.id()
        )));
    }
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
