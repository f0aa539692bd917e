use serde::{Deserialize, Serialize};

use loomerp_core::{Entity, ProductId, ProductVariantId, SizeId};

/// One color + size combination of a product, with its own stock counters.
///
/// Counter invariant, enforced by every gateway mutation:
/// `0 <= reserved_stock <= total_stock`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductVariant {
    pub id: ProductVariantId,
    pub product_id: ProductId,
    pub color: String,
    pub size_id: SizeId,
    /// Price in smallest currency unit (e.g., cents).
    pub unit_price: u64,
    pub total_stock: i64,
    pub reserved_stock: i64,
    pub active: bool,
}

impl ProductVariant {
    /// Stock not yet promised to any order.
    pub fn available(&self) -> i64 {
        self.total_stock - self.reserved_stock
    }
}

impl Entity for ProductVariant {
    type Id = ProductVariantId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Input for creating a variant through the gateway.
///
/// New variants start with zero stock; manufacturing increments come later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVariant {
    pub product_id: ProductId,
    pub color: String,
    pub size_id: SizeId,
    pub unit_price: u64,
}
