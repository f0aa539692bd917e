//! State tables and entry/exit hooks, one module per order type.
//!
//! The helpers here are the shared vocabulary of the hooks: reserve what
//! stock can cover, release or consume what an order holds, and record
//! produced units (creating missing catalog entries first). All stock
//! movement goes through the catalog gateway's atomic operations.

pub mod custom;
pub mod direct;
pub mod stock;

use chrono::Utc;

use loomerp_catalog::{NewProduct, NewVariant};
use loomerp_core::ProductVariantId;

use crate::engine::EngineError;
use crate::events::{OrderEvent, StockProduced, StockReleased, StockReserved};
use crate::order::{Order, OrderItem};
use crate::state::TransitionContext;

/// Reserve existing stock for each item, up to what is available. The
/// shortfall stays on the item as its manufacturing gap.
pub(crate) fn reserve_available(
    order: &mut Order,
    ctx: &TransitionContext<'_>,
) -> Result<(), EngineError> {
    let order_id = order.id();
    for item in order.items_mut() {
        let Some(variant_id) = item.variant_id else {
            continue;
        };
        let gap = item.manufacturing_gap();
        if gap == 0 {
            continue;
        }

        let variant = ctx.catalog.variant_by_id(variant_id)?;
        let want = gap.min(variant.available());
        if want <= 0 {
            continue;
        }

        ctx.catalog.reserve_stock(variant_id, want)?;
        item.reserved_quantity += want;

        ctx.events.publish(OrderEvent::StockReserved(StockReserved {
            order_id,
            item_id: item.id,
            variant_id,
            quantity: want,
            occurred_at: Utc::now(),
        }));
    }
    Ok(())
}

/// Reserve each item's full ordered quantity. Fails the whole transition on
/// the first shortfall; used where partial coverage is not an option.
pub(crate) fn reserve_full(
    order: &mut Order,
    ctx: &TransitionContext<'_>,
) -> Result<(), EngineError> {
    let order_id = order.id();
    for item in order.items_mut() {
        let Some(variant_id) = item.variant_id else {
            return Err(EngineError::Validation(format!(
                "item {} has no catalog variant; only on-hand goods can be sold directly",
                item.id
            )));
        };
        let gap = item.manufacturing_gap();
        if gap == 0 {
            continue;
        }

        ctx.catalog.reserve_stock(variant_id, gap)?;
        item.reserved_quantity += gap;

        ctx.events.publish(OrderEvent::StockReserved(StockReserved {
            order_id,
            item_id: item.id,
            variant_id,
            quantity: gap,
            occurred_at: Utc::now(),
        }));
    }
    Ok(())
}

/// Return every reservation the order still holds to the free pool. Total
/// stock is untouched (nothing was produced or shipped).
pub(crate) fn release_reserved(
    order: &mut Order,
    ctx: &TransitionContext<'_>,
) -> Result<(), EngineError> {
    let order_id = order.id();
    for item in order.items_mut() {
        let Some(variant_id) = item.variant_id else {
            continue;
        };
        if item.reserved_quantity <= 0 {
            continue;
        }

        ctx.catalog.release_stock(variant_id, item.reserved_quantity)?;

        ctx.events.publish(OrderEvent::StockReleased(StockReleased {
            order_id,
            item_id: item.id,
            variant_id,
            quantity: item.reserved_quantity,
            occurred_at: Utc::now(),
        }));

        item.reserved_quantity = 0;
    }
    Ok(())
}

/// Ship every reservation the order holds out of inventory (total and
/// reserved drop together). Item reservations stay recorded: they document
/// how much of the line stock covered.
pub(crate) fn consume_reserved(
    order: &mut Order,
    ctx: &TransitionContext<'_>,
) -> Result<(), EngineError> {
    for item in order.items_mut() {
        let Some(variant_id) = item.variant_id else {
            continue;
        };
        if item.reserved_quantity <= 0 {
            continue;
        }
        ctx.catalog.consume_stock(variant_id, item.reserved_quantity)?;
    }
    Ok(())
}

/// Book caller-supplied produced quantities into the catalog.
///
/// An item can never reference a stock increment for a variant that does not
/// exist yet: missing products/variants are created from the item's
/// snapshots first, then the increment is applied. With `reserve_for_order`
/// the produced units are immediately promised to this order (custom
/// manufacture); without it they land in free stock (stock production).
pub(crate) fn record_production(
    order: &mut Order,
    ctx: &TransitionContext<'_>,
    reserve_for_order: bool,
) -> Result<(), EngineError> {
    let order_id = order.id();
    for item in order.items_mut() {
        let Some(&produced) = ctx.produced.get(&item.id) else {
            continue;
        };
        if produced <= 0 {
            return Err(EngineError::Validation(format!(
                "produced quantity for item {} must be positive, got {produced}",
                item.id
            )));
        }

        let variant_id = ensure_variant(item, ctx)?;
        ctx.catalog.increment_stock(variant_id, produced)?;

        if reserve_for_order {
            // The total was just raised by `produced`, so this cannot fail
            // on availability.
            ctx.catalog.reserve_stock(variant_id, produced)?;
            item.reserved_quantity += produced;
        }

        ctx.events.publish(OrderEvent::StockProduced(StockProduced {
            order_id,
            item_id: item.id,
            variant_id,
            quantity: produced,
            occurred_at: Utc::now(),
        }));
    }
    Ok(())
}

/// Resolve the item's variant, creating the owning product and/or the
/// variant from the item's snapshots when the catalog has no match yet.
fn ensure_variant(
    item: &mut OrderItem,
    ctx: &TransitionContext<'_>,
) -> Result<ProductVariantId, EngineError> {
    if let Some(variant_id) = item.variant_id {
        return Ok(variant_id);
    }

    let product_id = match item.product_id {
        Some(product_id) => product_id,
        // Re-check by name: the product may have appeared since the order
        // was taken.
        None => match ctx.catalog.product_by_name(&item.product_name)? {
            Some(product) => product.id,
            None => {
                ctx.catalog
                    .create_product(NewProduct {
                        name: item.product_name.clone(),
                        category: item.category.clone(),
                    })?
                    .id
            }
        },
    };
    item.product_id = Some(product_id);

    let variant = match ctx
        .catalog
        .find_variant(product_id, &item.color, item.size_id)?
    {
        Some(variant) => variant,
        None => ctx.catalog.create_variant(NewVariant {
            product_id,
            color: item.color.clone(),
            size_id: item.size_id,
            unit_price: item.unit_price,
        })?,
    };
    item.variant_id = Some(variant.id);

    Ok(variant.id)
}
