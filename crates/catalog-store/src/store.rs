use async_trait::async_trait;

use crate::{
    CatalogBrand, CatalogBrandId, CatalogItem, CatalogItemId, CatalogType, CatalogTypeId,
    NewCatalogItem, PendingMutation, Result,
};

/// Core trait for catalog store implementations.
///
/// Reads run outside any transaction. The `begin_*` methods stage a change
/// inside an open transaction and return the handle that finalizes it; nothing
/// is visible to other readers until the handle is committed.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Handle returned by the `begin_*` methods.
    type Mutation: PendingMutation + 'static;

    /// Looks up a brand by id.
    async fn lookup_brand(&self, id: CatalogBrandId) -> Result<Option<CatalogBrand>>;

    /// Looks up a type by id.
    async fn lookup_type(&self, id: CatalogTypeId) -> Result<Option<CatalogType>>;

    /// Looks up a committed item by id.
    async fn lookup_item(&self, id: CatalogItemId) -> Result<Option<CatalogItem>>;

    /// Lists all brands ordered by id.
    async fn list_brands(&self) -> Result<Vec<CatalogBrand>>;

    /// Lists all types ordered by id.
    async fn list_types(&self) -> Result<Vec<CatalogType>>;

    /// Counts committed items.
    async fn item_count(&self) -> Result<usize>;

    /// Allocates the next item id and stages the insert.
    ///
    /// Id allocation is atomic: concurrent inserts never receive the same id,
    /// and ids handed out by inserts that are later rolled back are not reused.
    async fn begin_insert(&self, item: NewCatalogItem) -> Result<(CatalogItemId, Self::Mutation)>;

    /// Stages an update of an existing item.
    ///
    /// Fails with `ItemNotFound` if no row matches `item.id`.
    async fn begin_update(&self, item: CatalogItem) -> Result<Self::Mutation>;

    /// Stages the deletion of an existing item.
    ///
    /// Fails with `ItemNotFound` if no row matches `id`.
    async fn begin_delete(&self, id: CatalogItemId) -> Result<Self::Mutation>;
}

/// Extension trait providing convenience methods for catalog stores.
#[async_trait]
pub trait CatalogStoreExt: CatalogStore {
    /// Checks if a committed item exists.
    async fn item_exists(&self, id: CatalogItemId) -> Result<bool> {
        Ok(self.lookup_item(id).await?.is_some())
    }

    /// Checks if a brand exists.
    async fn brand_exists(&self, id: CatalogBrandId) -> Result<bool> {
        Ok(self.lookup_brand(id).await?.is_some())
    }

    /// Checks if a type exists.
    async fn type_exists(&self, id: CatalogTypeId) -> Result<bool> {
        Ok(self.lookup_type(id).await?.is_some())
    }
}

// Blanket implementation for all CatalogStore implementations
impl<T: CatalogStore + ?Sized> CatalogStoreExt for T {}
