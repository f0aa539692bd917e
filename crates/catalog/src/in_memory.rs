//! In-memory catalog for tests/dev.

use std::collections::HashMap;
use std::sync::RwLock;

use loomerp_core::{ProductId, ProductVariantId, SizeId};

use crate::gateway::{CatalogError, CatalogGateway};
use crate::product::{NewProduct, Product};
use crate::variant::{NewVariant, ProductVariant};

/// In-memory catalog.
///
/// Intended for tests/dev. Stock mutations take the write lock for the whole
/// check-and-update, which gives the same atomicity a single arithmetic
/// UPDATE gives a SQL adapter.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    products: RwLock<HashMap<ProductId, Product>>,
    variants: RwLock<HashMap<ProductVariantId, ProductVariant>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing product (test setup helper).
    pub fn insert_product(&self, product: Product) {
        if let Ok(mut products) = self.products.write() {
            products.insert(product.id, product);
        }
    }

    /// Seed an existing variant (test setup helper).
    pub fn insert_variant(&self, variant: ProductVariant) {
        if let Ok(mut variants) = self.variants.write() {
            variants.insert(variant.id, variant);
        }
    }

    fn ensure_positive(quantity: i64) -> Result<(), CatalogError> {
        if quantity <= 0 {
            return Err(CatalogError::InvalidQuantity(quantity));
        }
        Ok(())
    }

    fn with_variant<F>(&self, id: ProductVariantId, mutate: F) -> Result<(), CatalogError>
    where
        F: FnOnce(&mut ProductVariant) -> Result<(), CatalogError>,
    {
        let mut variants = self
            .variants
            .write()
            .map_err(|_| CatalogError::Storage("lock poisoned".to_string()))?;

        let variant = variants
            .get_mut(&id)
            .ok_or(CatalogError::VariantNotFound(id))?;

        mutate(variant)
    }
}

impl CatalogGateway for InMemoryCatalog {
    fn product_by_name(&self, name: &str) -> Result<Option<Product>, CatalogError> {
        let products = self
            .products
            .read()
            .map_err(|_| CatalogError::Storage("lock poisoned".to_string()))?;

        Ok(products
            .values()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    fn create_product(&self, new: NewProduct) -> Result<Product, CatalogError> {
        let product = Product {
            id: ProductId::new(),
            name: new.name,
            category: new.category,
            active: true,
        };

        let mut products = self
            .products
            .write()
            .map_err(|_| CatalogError::Storage("lock poisoned".to_string()))?;
        products.insert(product.id, product.clone());

        Ok(product)
    }

    fn variant_by_id(&self, id: ProductVariantId) -> Result<ProductVariant, CatalogError> {
        let variants = self
            .variants
            .read()
            .map_err(|_| CatalogError::Storage("lock poisoned".to_string()))?;

        variants
            .get(&id)
            .cloned()
            .ok_or(CatalogError::VariantNotFound(id))
    }

    fn find_variant(
        &self,
        product_id: ProductId,
        color: &str,
        size_id: SizeId,
    ) -> Result<Option<ProductVariant>, CatalogError> {
        let variants = self
            .variants
            .read()
            .map_err(|_| CatalogError::Storage("lock poisoned".to_string()))?;

        Ok(variants
            .values()
            .find(|v| {
                v.product_id == product_id
                    && v.size_id == size_id
                    && v.color.eq_ignore_ascii_case(color)
            })
            .cloned())
    }

    fn create_variant(&self, new: NewVariant) -> Result<ProductVariant, CatalogError> {
        {
            let products = self
                .products
                .read()
                .map_err(|_| CatalogError::Storage("lock poisoned".to_string()))?;
            if !products.contains_key(&new.product_id) {
                return Err(CatalogError::ProductNotFound(new.product_id));
            }
        }

        let variant = ProductVariant {
            id: ProductVariantId::new(),
            product_id: new.product_id,
            color: new.color,
            size_id: new.size_id,
            unit_price: new.unit_price,
            total_stock: 0,
            reserved_stock: 0,
            active: true,
        };

        let mut variants = self
            .variants
            .write()
            .map_err(|_| CatalogError::Storage("lock poisoned".to_string()))?;
        variants.insert(variant.id, variant.clone());

        Ok(variant)
    }

    fn reserve_stock(&self, id: ProductVariantId, quantity: i64) -> Result<(), CatalogError> {
        Self::ensure_positive(quantity)?;
        self.with_variant(id, |variant| {
            let available = variant.available();
            if available < quantity {
                return Err(CatalogError::InsufficientStock {
                    variant_id: id,
                    requested: quantity,
                    available,
                });
            }
            variant.reserved_stock += quantity;
            Ok(())
        })
    }

    fn release_stock(&self, id: ProductVariantId, quantity: i64) -> Result<(), CatalogError> {
        Self::ensure_positive(quantity)?;
        self.with_variant(id, |variant| {
            if variant.reserved_stock < quantity {
                return Err(CatalogError::CounterUnderflow {
                    variant_id: id,
                    operation: "release",
                    quantity,
                });
            }
            variant.reserved_stock -= quantity;
            Ok(())
        })
    }

    fn increment_stock(&self, id: ProductVariantId, quantity: i64) -> Result<(), CatalogError> {
        Self::ensure_positive(quantity)?;
        self.with_variant(id, |variant| {
            variant.total_stock += quantity;
            Ok(())
        })
    }

    fn consume_stock(&self, id: ProductVariantId, quantity: i64) -> Result<(), CatalogError> {
        Self::ensure_positive(quantity)?;
        self.with_variant(id, |variant| {
            if variant.reserved_stock < quantity || variant.total_stock < quantity {
                return Err(CatalogError::CounterUnderflow {
                    variant_id: id,
                    operation: "consume",
                    quantity,
                });
            }
            variant.reserved_stock -= quantity;
            variant.total_stock -= quantity;
            Ok(())
        })
    }
}
