//! Bootstrap catalog contents.
//!
//! Mirrors the rows inserted by `migrations/001_create_catalog_tables.sql`, so
//! an in-memory store and a freshly migrated database start out identical.

use crate::{
    CatalogBrand, CatalogBrandId, CatalogItem, CatalogItemId, CatalogType, CatalogTypeId, Price,
};

const BRANDS: [&str; 5] = ["Azure", ".NET", "Visual Studio", "SQL Server", "Other"];

const TYPES: [&str; 4] = ["Mug", "T-Shirt", "Sheet", "USB Memory Stick"];

// (name, price in cents, type id, brand id)
const ITEMS: [(&str, u32, i32, i32); 12] = [
    (".NET Bot Black Sweatshirt", 1950, 2, 2),
    (".NET Black & White Mug", 850, 1, 2),
    ("Prism White T-Shirt", 1200, 2, 5),
    (".NET Foundation Sweatshirt", 1200, 2, 2),
    ("Roslyn Red Sheet", 850, 3, 5),
    (".NET Blue Sweatshirt", 1200, 2, 2),
    ("Roslyn Red T-Shirt", 1200, 2, 5),
    ("Kudu Purple Sweatshirt", 850, 2, 5),
    ("Cup<T> White Mug", 1200, 1, 5),
    (".NET Foundation Sheet", 1200, 3, 2),
    ("Cup<T> Sheet", 850, 3, 2),
    ("Prism White TShirt", 1200, 2, 5),
];

/// Base URL the seeded picture references point at.
pub const PICTURE_BASE_URL: &str = "http://catalogbaseurltobereplaced/images/products";

/// Seeded brands, ids starting at 1.
pub fn brands() -> Vec<CatalogBrand> {
    (1..)
        .zip(BRANDS)
        .map(|(id, brand)| CatalogBrand {
            id: CatalogBrandId::new(id),
            brand: brand.to_string(),
        })
        .collect()
}

/// Seeded types, ids starting at 1.
pub fn types() -> Vec<CatalogType> {
    (1..)
        .zip(TYPES)
        .map(|(id, type_name)| CatalogType {
            id: CatalogTypeId::new(id),
            type_name: type_name.to_string(),
        })
        .collect()
}

/// Seeded items, ids starting at 1.
pub fn items() -> Vec<CatalogItem> {
    (1..)
        .zip(ITEMS)
        .map(|(id, (name, cents, type_id, brand_id))| CatalogItem {
            id: CatalogItemId::new(id),
            name: name.to_string(),
            description: Some(name.to_string()),
            price: Price::from_cents(cents),
            picture_uri: Some(format!("{PICTURE_BASE_URL}/{id}.png")),
            catalog_brand_id: CatalogBrandId::new(brand_id),
            catalog_type_id: CatalogTypeId::new(type_id),
        })
        .collect()
}
