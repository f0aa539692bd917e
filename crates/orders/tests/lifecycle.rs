//! End-to-end lifecycle tests over the in-memory adapters: the engine, the
//! catalog gateway and the event bus wired together the way an application
//! composes them.

use std::sync::Arc;

use loomerp_catalog::{CatalogGateway, InMemoryCatalog, NewProduct, NewVariant};
use loomerp_core::{ProductId, ProductVariantId, SizeId};
use loomerp_events::{Event, EventBus, InMemoryEventBus};
use loomerp_orders::{
    EngineError, InMemoryOrderRepository, LifecycleEngine, NewOrder, NewOrderItem, Order,
    OrderEvent, OrderRepository, OrderStatus, OrderType, ProducedQuantities,
};

type Engine = LifecycleEngine<
    Arc<InMemoryOrderRepository>,
    Arc<InMemoryCatalog>,
    Arc<InMemoryEventBus<OrderEvent>>,
>;

struct Harness {
    engine: Engine,
    repository: Arc<InMemoryOrderRepository>,
    catalog: Arc<InMemoryCatalog>,
    bus: Arc<InMemoryEventBus<OrderEvent>>,
}

fn harness() -> Harness {
    loomerp_observability::init();
    let repository = Arc::new(InMemoryOrderRepository::new());
    let catalog = Arc::new(InMemoryCatalog::new());
    let bus = Arc::new(InMemoryEventBus::new());
    let engine = LifecycleEngine::new(repository.clone(), catalog.clone(), bus.clone());
    Harness {
        engine,
        repository,
        catalog,
        bus,
    }
}

fn seed_variant(
    catalog: &InMemoryCatalog,
    name: &str,
    color: &str,
    size_id: SizeId,
    stock: i64,
) -> (ProductId, ProductVariantId) {
    let product = catalog
        .create_product(NewProduct {
            name: name.to_string(),
            category: "shirts".to_string(),
        })
        .unwrap();
    let variant = catalog
        .create_variant(NewVariant {
            product_id: product.id,
            color: color.to_string(),
            size_id,
            unit_price: 3_900,
        })
        .unwrap();
    if stock > 0 {
        catalog.increment_stock(variant.id, stock).unwrap();
    }
    (product.id, variant.id)
}

fn shirt_order(order_type: OrderType, size_id: SizeId, quantity: i64) -> NewOrder {
    NewOrder {
        order_number: None,
        customer_name: "Aldo Rossi".to_string(),
        customer_id: None,
        seller: "ines".to_string(),
        order_type,
        discount: 0,
        notes: String::new(),
        estimated_delivery: None,
        items: vec![NewOrderItem {
            product_name: "Oxford Shirt".to_string(),
            category: "shirts".to_string(),
            color: "white".to_string(),
            size_id,
            size_name: "M".to_string(),
            quantity,
            unit_price: Some(3_900),
        }],
    }
}

fn advance(harness: &Harness, order: &Order, target: OrderStatus) -> Order {
    harness
        .engine
        .change_status(order.id(), target, &ProducedQuantities::new())
        .unwrap()
        .order
}

// Scenario A: custom order, no matching catalog entries.
#[test]
fn custom_order_without_catalog_match_starts_as_unlinked_quote() {
    let h = harness();
    let order = h
        .engine
        .create_order(shirt_order(OrderType::CustomManufacture, SizeId::new(), 5))
        .unwrap();

    assert_eq!(order.status(), OrderStatus::Quote);
    assert_eq!(order.total(), 19_500);
    let item = &order.items()[0];
    assert!(item.product_id().is_none());
    assert!(item.variant_id().is_none());
    assert_eq!(item.reserved_quantity(), 0);

    // The stored order matches what was returned.
    assert_eq!(h.repository.get(order.id()).unwrap(), order);
}

// Scenario B: approval reserves what stock can cover, the rest is the gap.
#[test]
fn approval_reserves_up_to_available_stock() {
    let h = harness();
    let size_id = SizeId::new();
    let (_, variant_id) = seed_variant(&h.catalog, "Oxford Shirt", "white", size_id, 3);

    let order = h
        .engine
        .create_order(shirt_order(OrderType::CustomManufacture, size_id, 5))
        .unwrap();
    // Enrichment linked the existing variant.
    assert_eq!(order.items()[0].variant_id(), Some(variant_id));

    let order = advance(&h, &order, OrderStatus::Approved);

    let variant = h.catalog.variant_by_id(variant_id).unwrap();
    assert_eq!(variant.reserved_stock, 3);
    assert_eq!(variant.total_stock, 3);

    let item = &order.items()[0];
    assert_eq!(item.reserved_quantity(), 3);
    assert!(item.needs_manufacturing());
    assert_eq!(item.manufacturing_gap(), 2);
}

// Scenarios C + D on one order: finish fills the gap, delivery empties stock.
#[test]
fn finishing_books_produced_units_and_delivery_consumes_them() {
    let h = harness();
    let size_id = SizeId::new();
    let (_, variant_id) = seed_variant(&h.catalog, "Oxford Shirt", "white", size_id, 3);

    let order = h
        .engine
        .create_order(shirt_order(OrderType::CustomManufacture, size_id, 5))
        .unwrap();
    let order = advance(&h, &order, OrderStatus::Approved);
    let order = advance(&h, &order, OrderStatus::Manufacturing);

    let mut produced = ProducedQuantities::new();
    produced.insert(order.items()[0].id(), 2);
    let transition = h
        .engine
        .change_status(order.id(), OrderStatus::Finished, &produced)
        .unwrap();
    let order = transition.order;

    // The manufactured gap entered stock and is promised to this order.
    let variant = h.catalog.variant_by_id(variant_id).unwrap();
    assert_eq!(variant.total_stock, 5);
    assert_eq!(variant.reserved_stock, 5);
    assert!(order.items()[0].covered_by_stock());
    assert_eq!(transition.allowed_next, vec![OrderStatus::Delivered]);

    let order = advance(&h, &order, OrderStatus::Delivered);

    // Goods left inventory: both counters drop by the full quantity.
    let variant = h.catalog.variant_by_id(variant_id).unwrap();
    assert_eq!(variant.total_stock, 0);
    assert_eq!(variant.reserved_stock, 0);
    assert!(order.delivered_at().is_some());
}

// Scenario C variant-creation half: an item with no prior variant gets its
// product and variant created before any stock increment is applied.
#[test]
fn finishing_creates_missing_catalog_entries_first() {
    let h = harness();
    let order = h
        .engine
        .create_order(shirt_order(OrderType::CustomManufacture, SizeId::new(), 5))
        .unwrap();
    let order = advance(&h, &order, OrderStatus::Approved);
    let order = advance(&h, &order, OrderStatus::Manufacturing);

    let mut produced = ProducedQuantities::new();
    produced.insert(order.items()[0].id(), 5);
    let order = h
        .engine
        .change_status(order.id(), OrderStatus::Finished, &produced)
        .unwrap()
        .order;

    let item = &order.items()[0];
    let variant_id = item.variant_id().expect("variant created on finish");
    let variant = h.catalog.variant_by_id(variant_id).unwrap();
    assert_eq!(variant.total_stock, 5);
    assert_eq!(variant.reserved_stock, 5);
    assert_eq!(variant.unit_price, 3_900);

    let product = h
        .catalog
        .product_by_name("Oxford Shirt")
        .unwrap()
        .expect("product created on finish");
    assert_eq!(item.product_id(), Some(product.id));
}

// Scenario E: cancellation releases reservations, total stock intact.
#[test]
fn cancelling_an_approved_order_releases_reserved_stock_only() {
    let h = harness();
    let size_id = SizeId::new();
    let (_, variant_id) = seed_variant(&h.catalog, "Oxford Shirt", "white", size_id, 3);

    let order = h
        .engine
        .create_order(shirt_order(OrderType::CustomManufacture, size_id, 5))
        .unwrap();
    let order = advance(&h, &order, OrderStatus::Approved);
    assert_eq!(h.catalog.variant_by_id(variant_id).unwrap().reserved_stock, 3);

    let order = advance(&h, &order, OrderStatus::Cancelled);

    let variant = h.catalog.variant_by_id(variant_id).unwrap();
    assert_eq!(variant.reserved_stock, 0);
    assert_eq!(variant.total_stock, 3);
    assert_eq!(order.items()[0].reserved_quantity(), 0);
}

#[test]
fn delivery_is_refused_while_items_still_need_manufacturing() {
    let h = harness();
    let order = h
        .engine
        .create_order(shirt_order(OrderType::CustomManufacture, SizeId::new(), 5))
        .unwrap();
    let order = advance(&h, &order, OrderStatus::Approved);
    let order = advance(&h, &order, OrderStatus::Manufacturing);

    // Only 3 of 5 were produced; the gap survives the finish.
    let mut produced = ProducedQuantities::new();
    produced.insert(order.items()[0].id(), 3);
    let order = h
        .engine
        .change_status(order.id(), OrderStatus::Finished, &produced)
        .unwrap()
        .order;
    assert!(order.items()[0].needs_manufacturing());

    let err = h
        .engine
        .change_status(order.id(), OrderStatus::Delivered, &ProducedQuantities::new())
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    // The exit guard fired before anything was mutated.
    assert_eq!(
        h.repository.get(order.id()).unwrap().status(),
        OrderStatus::Finished
    );
}

#[test]
fn fully_covered_order_skips_manufacturing() {
    let h = harness();
    let size_id = SizeId::new();
    let (_, variant_id) = seed_variant(&h.catalog, "Oxford Shirt", "white", size_id, 10);

    let order = h
        .engine
        .create_order(shirt_order(OrderType::CustomManufacture, size_id, 5))
        .unwrap();
    let transition = h
        .engine
        .change_status(order.id(), OrderStatus::Approved, &ProducedQuantities::new())
        .unwrap();

    // Every item was covered on approval, so the order auto-advanced
    // straight to finished.
    assert_eq!(transition.order.status(), OrderStatus::Finished);
    assert_eq!(transition.allowed_next, vec![OrderStatus::Delivered]);
    assert_eq!(h.catalog.variant_by_id(variant_id).unwrap().reserved_stock, 5);

    // The stored order reflects the final state of the chain.
    assert_eq!(
        h.repository.get(order.id()).unwrap().status(),
        OrderStatus::Finished
    );
}

#[test]
fn rejected_transition_changes_nothing_and_publishes_nothing() {
    let h = harness();
    let size_id = SizeId::new();
    let (_, variant_id) = seed_variant(&h.catalog, "Oxford Shirt", "white", size_id, 3);

    let order = h
        .engine
        .create_order(shirt_order(OrderType::CustomManufacture, size_id, 5))
        .unwrap();
    let stored_before = h.repository.get(order.id()).unwrap();

    let subscription = h.bus.subscribe();
    let err = h
        .engine
        .change_status(order.id(), OrderStatus::Quote, &ProducedQuantities::new())
        .unwrap_err();
    assert_eq!(err, EngineError::AlreadyInStatus(OrderStatus::Quote));

    assert_eq!(h.repository.get(order.id()).unwrap(), stored_before);
    assert_eq!(h.catalog.variant_by_id(variant_id).unwrap().reserved_stock, 0);
    assert!(subscription.drain().is_empty());
}

#[test]
fn direct_sale_reserves_fully_then_ships() {
    let h = harness();
    let size_id = SizeId::new();
    let (_, variant_id) = seed_variant(&h.catalog, "Oxford Shirt", "white", size_id, 5);

    let order = h
        .engine
        .create_order(shirt_order(OrderType::DirectSale, size_id, 3))
        .unwrap();

    assert_eq!(order.status(), OrderStatus::Pending);
    assert_eq!(order.items()[0].reserved_quantity(), 3);
    assert_eq!(h.catalog.variant_by_id(variant_id).unwrap().reserved_stock, 3);

    let order = advance(&h, &order, OrderStatus::Delivered);

    let variant = h.catalog.variant_by_id(variant_id).unwrap();
    assert_eq!(variant.total_stock, 2);
    assert_eq!(variant.reserved_stock, 0);
    assert!(order.delivered_at().is_some());
}

#[test]
fn direct_sale_fails_outright_on_insufficient_stock() {
    let h = harness();
    let size_id = SizeId::new();
    let (_, variant_id) = seed_variant(&h.catalog, "Oxford Shirt", "white", size_id, 5);

    let err = h
        .engine
        .create_order(shirt_order(OrderType::DirectSale, size_id, 9))
        .unwrap_err();

    assert_eq!(
        err,
        EngineError::InsufficientStock {
            variant_id,
            requested: 9,
            available: 5,
        }
    );
    // Nothing was reserved: reservations are all-or-nothing.
    assert_eq!(h.catalog.variant_by_id(variant_id).unwrap().reserved_stock, 0);
}

#[test]
fn stock_production_finishes_into_free_stock() {
    let h = harness();
    let size_id = SizeId::new();

    let order = h
        .engine
        .create_order(shirt_order(OrderType::StockProduction, size_id, 20))
        .unwrap();
    assert_eq!(order.status(), OrderStatus::Planned);

    let order = advance(&h, &order, OrderStatus::Manufacturing);

    let mut produced = ProducedQuantities::new();
    produced.insert(order.items()[0].id(), 20);
    let transition = h
        .engine
        .change_status(order.id(), OrderStatus::Finished, &produced)
        .unwrap();

    // Production runs land in free stock: nothing reserved, no delivery leg.
    let variant_id = transition.order.items()[0].variant_id().unwrap();
    let variant = h.catalog.variant_by_id(variant_id).unwrap();
    assert_eq!(variant.total_stock, 20);
    assert_eq!(variant.reserved_stock, 0);
    assert!(transition.allowed_next.is_empty());
}

#[test]
fn variant_counters_stay_legal_across_a_full_lifecycle() {
    let h = harness();
    let size_id = SizeId::new();
    let (_, variant_id) = seed_variant(&h.catalog, "Oxford Shirt", "white", size_id, 3);

    let order = h
        .engine
        .create_order(shirt_order(OrderType::CustomManufacture, size_id, 5))
        .unwrap();

    let mut produced = ProducedQuantities::new();
    produced.insert(order.items()[0].id(), 2);

    let steps = [
        (OrderStatus::Approved, None),
        (OrderStatus::Manufacturing, None),
        (OrderStatus::Finished, Some(&produced)),
        (OrderStatus::Delivered, None),
    ];

    let empty = ProducedQuantities::new();
    for (target, produced) in steps {
        h.engine
            .change_status(order.id(), target, produced.unwrap_or(&empty))
            .unwrap();

        let variant = h.catalog.variant_by_id(variant_id).unwrap();
        assert!(variant.reserved_stock >= 0, "after {target}");
        assert!(
            variant.reserved_stock <= variant.total_stock,
            "after {target}"
        );
    }
}

#[test]
fn lifecycle_publishes_the_documented_event_sequence() {
    let h = harness();
    let size_id = SizeId::new();
    seed_variant(&h.catalog, "Oxford Shirt", "white", size_id, 3);
    let subscription = h.bus.subscribe();

    let order = h
        .engine
        .create_order(shirt_order(OrderType::CustomManufacture, size_id, 5))
        .unwrap();
    let order = advance(&h, &order, OrderStatus::Approved);
    let order = advance(&h, &order, OrderStatus::Manufacturing);

    let mut produced = ProducedQuantities::new();
    produced.insert(order.items()[0].id(), 2);
    h.engine
        .change_status(order.id(), OrderStatus::Finished, &produced)
        .unwrap();
    h.engine
        .change_status(order.id(), OrderStatus::Delivered, &ProducedQuantities::new())
        .unwrap();

    let types: Vec<&'static str> = subscription
        .drain()
        .iter()
        .map(Event::event_type)
        .collect();
    assert_eq!(
        types,
        vec![
            "orders.order.created",
            "orders.stock.reserved",
            "orders.order.approved",
            "orders.order.manufacturing_started",
            "orders.stock.produced",
            "orders.order.finished",
            "orders.order.delivered",
        ]
    );
}
