use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use loomerp_core::{
    CustomerId, DomainError, DomainResult, Entity, OrderId, OrderItemId, ProductId,
    ProductVariantId, SizeId,
};

/// The three fixed kinds of commercial order. Immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    /// Made to a customer's measure; the gap between ordered and on-hand
    /// stock is manufactured.
    CustomManufacture,
    /// Production run for the shelf; no customer, no delivery leg.
    StockProduction,
    /// Sale of on-hand goods; nothing is manufactured.
    DirectSale,
}

impl OrderType {
    pub const ALL: [OrderType; 3] = [
        OrderType::CustomManufacture,
        OrderType::StockProduction,
        OrderType::DirectSale,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::CustomManufacture => "custom_manufacture",
            OrderType::StockProduction => "stock_production",
            OrderType::DirectSale => "direct_sale",
        }
    }
}

impl core::fmt::Display for OrderType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order status lifecycle.
///
/// One enum across all order types; which statuses belong to which type is
/// the strategy tables' business (`OrderStrategy::state` returns `None` for
/// statuses foreign to its type).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Quote,
    Approved,
    Manufacturing,
    Finished,
    Delivered,
    Planned,
    Pending,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 8] = [
        OrderStatus::Quote,
        OrderStatus::Approved,
        OrderStatus::Manufacturing,
        OrderStatus::Finished,
        OrderStatus::Delivered,
        OrderStatus::Planned,
        OrderStatus::Pending,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Quote => "quote",
            OrderStatus::Approved => "approved",
            OrderStatus::Manufacturing => "manufacturing",
            OrderStatus::Finished => "finished",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Planned => "planned",
            OrderStatus::Pending => "pending",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order line: a variant reference (or the promise of one) plus catalog
/// snapshots taken at order time.
///
/// Snapshots (`product_name`, `category`, `color`, `size_name`) keep
/// historical orders stable even if catalog entries later change. A `None`
/// variant means "does not exist yet and must be created when manufacturing
/// finishes".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub(crate) id: OrderItemId,
    pub(crate) product_id: Option<ProductId>,
    pub(crate) variant_id: Option<ProductVariantId>,
    pub(crate) product_name: String,
    pub(crate) category: String,
    pub(crate) color: String,
    pub(crate) size_id: SizeId,
    pub(crate) size_name: String,
    pub(crate) quantity: i64,
    /// Units covered from existing stock. May lag `quantity`; the shortfall
    /// is the manufacturing gap.
    pub(crate) reserved_quantity: i64,
    /// Price in smallest currency unit (e.g., cents).
    pub(crate) unit_price: u64,
}

impl OrderItem {
    pub fn id(&self) -> OrderItemId {
        self.id
    }

    pub fn product_id(&self) -> Option<ProductId> {
        self.product_id
    }

    pub fn variant_id(&self) -> Option<ProductVariantId> {
        self.variant_id
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn size_id(&self) -> SizeId {
        self.size_id
    }

    pub fn size_name(&self) -> &str {
        &self.size_name
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn reserved_quantity(&self) -> i64 {
        self.reserved_quantity
    }

    pub fn unit_price(&self) -> u64 {
        self.unit_price
    }

    /// Always recomputed, never stored or edited independently.
    pub fn subtotal(&self) -> u64 {
        // Quantities are validated positive at order creation.
        self.quantity.max(0) as u64 * self.unit_price
    }

    /// True when the variant is new or ordered quantity exceeds what stock
    /// could cover.
    pub fn needs_manufacturing(&self) -> bool {
        self.variant_id.is_none() || self.quantity > self.reserved_quantity
    }

    /// True when an existing variant covers the full ordered quantity.
    pub fn covered_by_stock(&self) -> bool {
        self.variant_id.is_some() && self.reserved_quantity >= self.quantity
    }

    /// Units still to be produced.
    pub fn manufacturing_gap(&self) -> i64 {
        (self.quantity - self.reserved_quantity).max(0)
    }
}

impl Entity for OrderItem {
    type Id = OrderItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Aggregate root: Order.
///
/// `status` is always a member of the type's state graph and is mutated
/// exclusively through the lifecycle engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub(crate) id: OrderId,
    pub(crate) order_number: String,
    pub(crate) customer_name: String,
    pub(crate) customer_id: Option<CustomerId>,
    pub(crate) seller: String,
    pub(crate) order_type: OrderType,
    pub(crate) status: OrderStatus,
    pub(crate) total: u64,
    pub(crate) discount: u64,
    pub(crate) items: Vec<OrderItem>,
    pub(crate) notes: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) estimated_delivery: Option<DateTime<Utc>>,
    pub(crate) delivered_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn order_number(&self) -> &str {
        &self.order_number
    }

    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    pub fn seller(&self) -> &str {
        &self.seller
    }

    pub fn order_type(&self) -> OrderType {
        self.order_type
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn discount(&self) -> u64 {
        self.discount
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn estimated_delivery(&self) -> Option<DateTime<Utc>> {
        self.estimated_delivery
    }

    pub fn delivered_at(&self) -> Option<DateTime<Utc>> {
        self.delivered_at
    }

    /// True when every item is fully covered by reserved stock.
    pub fn fully_covered_by_stock(&self) -> bool {
        self.items.iter().all(OrderItem::covered_by_stock)
    }

    pub(crate) fn set_status(&mut self, status: OrderStatus) {
        self.status = status;
    }

    pub(crate) fn items_mut(&mut self) -> &mut [OrderItem] {
        &mut self.items
    }

    pub(crate) fn mark_delivered(&mut self, at: DateTime<Utc>) {
        self.delivered_at = Some(at);
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Draft of a new order, before catalog enrichment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    /// Human-readable number; generated from the order id when absent.
    pub order_number: Option<String>,
    pub customer_name: String,
    pub customer_id: Option<CustomerId>,
    pub seller: String,
    pub order_type: OrderType,
    pub discount: u64,
    pub notes: String,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub items: Vec<NewOrderItem>,
}

/// Draft of an order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub product_name: String,
    pub category: String,
    pub color: String,
    pub size_id: SizeId,
    pub size_name: String,
    pub quantity: i64,
    /// Explicit price; when absent the matching catalog variant's price is
    /// adopted during enrichment.
    pub unit_price: Option<u64>,
}

impl NewOrder {
    pub fn validate(&self) -> DomainResult<()> {
        if self.customer_name.trim().is_empty() {
            return Err(DomainError::validation("customer is required"));
        }
        if self.seller.trim().is_empty() {
            return Err(DomainError::validation("seller is required"));
        }
        if self.items.is_empty() {
            return Err(DomainError::validation("order requires at least one item"));
        }
        for (idx, item) in self.items.iter().enumerate() {
            if item.product_name.trim().is_empty() {
                return Err(DomainError::validation(format!(
                    "item {idx}: product name is required"
                )));
            }
            if item.quantity <= 0 {
                return Err(DomainError::validation(format!(
                    "item {idx}: quantity must be positive"
                )));
            }
        }
        Ok(())
    }
}
