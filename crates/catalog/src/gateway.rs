//! Catalog gateway contract consumed by the order lifecycle engine.
//!
//! Stock counters are moved **only** through these operations, and every
//! mutation is atomic at the gateway (one guarded section / one arithmetic
//! UPDATE equivalent). The engine never does read-modify-write on counters;
//! two orders contending for the same variant serialize here.

use std::sync::Arc;
use thiserror::Error;

use loomerp_core::{ProductId, ProductVariantId, SizeId};

use crate::product::{NewProduct, Product};
use crate::variant::{NewVariant, ProductVariant};

/// Catalog operation error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    #[error("product variant {0} not found")]
    VariantNotFound(ProductVariantId),

    /// A reservation asked for more than the variant has available.
    /// Reservations are all-or-nothing; nothing was reserved.
    #[error("insufficient stock on variant {variant_id}: requested {requested}, available {available}")]
    InsufficientStock {
        variant_id: ProductVariantId,
        requested: i64,
        available: i64,
    },

    /// A release/consume would push a counter below zero.
    #[error("stock counters would go negative on variant {variant_id}: {operation} {quantity}")]
    CounterUnderflow {
        variant_id: ProductVariantId,
        operation: &'static str,
        quantity: i64,
    },

    #[error("quantity must be positive, got {0}")]
    InvalidQuantity(i64),

    #[error("catalog storage failure: {0}")]
    Storage(String),
}

/// Read/write access to products and variants.
///
/// Lookup operations return `Ok(None)` for absent entries so callers can
/// distinguish "no such catalog entry" (a normal outcome during order
/// enrichment) from gateway failures.
pub trait CatalogGateway: Send + Sync {
    fn product_by_name(&self, name: &str) -> Result<Option<Product>, CatalogError>;

    fn create_product(&self, new: NewProduct) -> Result<Product, CatalogError>;

    fn variant_by_id(&self, id: ProductVariantId) -> Result<ProductVariant, CatalogError>;

    fn find_variant(
        &self,
        product_id: ProductId,
        color: &str,
        size_id: SizeId,
    ) -> Result<Option<ProductVariant>, CatalogError>;

    fn create_variant(&self, new: NewVariant) -> Result<ProductVariant, CatalogError>;

    /// Reserve `quantity` units: `reserved += quantity`.
    ///
    /// Fails with [`CatalogError::InsufficientStock`] when `available < quantity`;
    /// never partially reserves.
    fn reserve_stock(&self, id: ProductVariantId, quantity: i64) -> Result<(), CatalogError>;

    /// Return `quantity` reserved units to the free pool: `reserved -= quantity`.
    /// Total stock is untouched (nothing was produced or shipped).
    fn release_stock(&self, id: ProductVariantId, quantity: i64) -> Result<(), CatalogError>;

    /// Add `quantity` produced units: `total += quantity`.
    fn increment_stock(&self, id: ProductVariantId, quantity: i64) -> Result<(), CatalogError>;

    /// Ship `quantity` reserved units out of inventory:
    /// `total -= quantity` and `reserved -= quantity`, as one atomic step.
    fn consume_stock(&self, id: ProductVariantId, quantity: i64) -> Result<(), CatalogError>;
}

impl<G> CatalogGateway for Arc<G>
where
    G: CatalogGateway + ?Sized,
{
    fn product_by_name(&self, name: &str) -> Result<Option<Product>, CatalogError> {
        (**self).product_by_name(name)
    }

    fn create_product(&self, new: NewProduct) -> Result<Product, CatalogError> {
        (**self).create_product(new)
    }

    fn variant_by_id(&self, id: ProductVariantId) -> Result<ProductVariant, CatalogError> {
        (**self).variant_by_id(id)
    }

    fn find_variant(
        &self,
        product_id: ProductId,
        color: &str,
        size_id: SizeId,
    ) -> Result<Option<ProductVariant>, CatalogError> {
        (**self).find_variant(product_id, color, size_id)
    }

    fn create_variant(&self, new: NewVariant) -> Result<ProductVariant, CatalogError> {
        (**self).create_variant(new)
    }

    fn reserve_stock(&self, id: ProductVariantId, quantity: i64) -> Result<(), CatalogError> {
        (**self).reserve_stock(id, quantity)
    }

    fn release_stock(&self, id: ProductVariantId, quantity: i64) -> Result<(), CatalogError> {
        (**self).release_stock(id, quantity)
    }

    fn increment_stock(&self, id: ProductVariantId, quantity: i64) -> Result<(), CatalogError> {
        (**self).increment_stock(id, quantity)
    }

    fn consume_stock(&self, id: ProductVariantId, quantity: i64) -> Result<(), CatalogError> {
        (**self).consume_stock(id, quantity)
    }
}
