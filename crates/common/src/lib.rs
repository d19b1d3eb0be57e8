//! Shared identifiers and value objects for the catalog service.

pub mod price;
pub mod types;

pub use price::{PRICE_SCALE, Price, PriceError};
pub use types::{CatalogBrandId, CatalogItemId, CatalogTypeId};
