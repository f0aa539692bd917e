use serde::{Deserialize, Serialize};

use loomerp_core::{Entity, ProductId};

/// A sellable product (e.g. "Oxford Shirt"). Stock lives on its variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub active: bool,
}

impl Product {
    /// Check if new variants/orders may reference this product.
    pub fn can_be_sold(&self) -> bool {
        self.active
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Input for creating a product through the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
}
