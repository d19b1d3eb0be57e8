//! Catalog records.

use serde::{Deserialize, Serialize};

use crate::{CatalogBrandId, CatalogItemId, CatalogTypeId, Price};

/// A product record in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: CatalogItemId,
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub picture_uri: Option<String>,
    pub catalog_brand_id: CatalogBrandId,
    pub catalog_type_id: CatalogTypeId,
}

/// Item data handed to the store before an id has been assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCatalogItem {
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub picture_uri: Option<String>,
    pub catalog_brand_id: CatalogBrandId,
    pub catalog_type_id: CatalogTypeId,
}

impl NewCatalogItem {
    /// Attaches the store-assigned id.
    pub fn into_item(self, id: CatalogItemId) -> CatalogItem {
        CatalogItem {
            id,
            name: self.name,
            description: self.description,
            price: self.price,
            picture_uri: self.picture_uri,
            catalog_brand_id: self.catalog_brand_id,
            catalog_type_id: self.catalog_type_id,
        }
    }
}

/// A brand items can be filed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogBrand {
    pub id: CatalogBrandId,
    pub brand: String,
}

/// A product type items can be filed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogType {
    pub id: CatalogTypeId,
    #[serde(rename = "type")]
    pub type_name: String,
}
