//! `loomerp-catalog` — products, variants and the stock gateway.
//!
//! The catalog is a **collaborator** of the order lifecycle engine, not part
//! of it: the engine reads products/variants and moves stock counters
//! exclusively through the [`CatalogGateway`] contract.

pub mod gateway;
pub mod in_memory;
pub mod product;
pub mod variant;

pub use gateway::{CatalogGateway, CatalogError};
pub use in_memory::InMemoryCatalog;
pub use product::{NewProduct, Product};
pub use variant::{NewVariant, ProductVariant};
