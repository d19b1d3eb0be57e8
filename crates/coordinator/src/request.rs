//! Write requests accepted by the coordinator.

use catalog_store::{CatalogItem, NewCatalogItem};
use common::{CatalogBrandId, CatalogItemId, CatalogTypeId, Price};
use serde::{Deserialize, Serialize};

use crate::error::WriteError;

/// Longest item name the catalog accepts, in characters.
pub const MAX_NAME_LEN: usize = 50;

fn validate_name(name: &str) -> Result<(), WriteError> {
    if name.trim().is_empty() {
        return Err(WriteError::ValidationFailed(
            "name must not be empty".to_string(),
        ));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(WriteError::ValidationFailed(format!(
            "name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

/// Request to create a catalog item. The id is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCatalogItem {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Price,
    #[serde(default)]
    pub picture_uri: Option<String>,
    pub catalog_brand_id: CatalogBrandId,
    pub catalog_type_id: CatalogTypeId,
}

impl CreateCatalogItem {
    pub fn validate(&self) -> Result<(), WriteError> {
        validate_name(&self.name)
    }

    pub fn into_new_item(self) -> NewCatalogItem {
        NewCatalogItem {
            name: self.name,
            description: self.description,
            price: self.price,
            picture_uri: self.picture_uri,
            catalog_brand_id: self.catalog_brand_id,
            catalog_type_id: self.catalog_type_id,
        }
    }
}

/// Request to replace every field of an existing catalog item.
///
/// `quantity` is the stock level forwarded to inventory; when absent the
/// coordinator's configured initial quantity is sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCatalogItem {
    pub id: CatalogItemId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Price,
    #[serde(default)]
    pub picture_uri: Option<String>,
    pub catalog_brand_id: CatalogBrandId,
    pub catalog_type_id: CatalogTypeId,
    #[serde(default)]
    pub quantity: Option<u32>,
}

impl UpdateCatalogItem {
    pub fn validate(&self) -> Result<(), WriteError> {
        validate_name(&self.name)
    }

    pub fn to_item(&self) -> CatalogItem {
        CatalogItem {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price,
            picture_uri: self.picture_uri.clone(),
            catalog_brand_id: self.catalog_brand_id,
            catalog_type_id: self.catalog_type_id,
        }
    }
}
