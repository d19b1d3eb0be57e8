use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{OwnedSemaphorePermit, RwLock, Semaphore};

use crate::mutation::record_finalized;
use crate::{
    CatalogBrand, CatalogBrandId, CatalogItem, CatalogItemId, CatalogStore, CatalogType,
    CatalogTypeId, MutationKind, MutationState, NewCatalogItem, PendingMutation, Result,
    StoreError, seed,
};

/// Configuration for [`InMemoryCatalogStore`].
#[derive(Debug, Clone)]
pub struct InMemoryStoreConfig {
    /// Number of sessions that may hold a pending mutation at once.
    pub max_sessions: usize,
}

impl Default for InMemoryStoreConfig {
    fn default() -> Self {
        Self { max_sessions: 10 }
    }
}

#[derive(Debug, Default)]
struct CatalogTables {
    brands: BTreeMap<CatalogBrandId, CatalogBrand>,
    types: BTreeMap<CatalogTypeId, CatalogType>,
    items: BTreeMap<CatalogItemId, CatalogItem>,
}

#[derive(Debug, Default)]
struct SessionLedger {
    opened: AtomicUsize,
    closed: AtomicUsize,
    abandoned: AtomicUsize,
}

#[derive(Debug)]
struct Shared {
    tables: RwLock<CatalogTables>,
    next_id: AtomicI32,
    sessions: Arc<Semaphore>,
    ledger: SessionLedger,
    fail_on_commit: AtomicBool,
}

/// In-memory catalog store for testing and for running without a database.
///
/// Pending mutations draw a session from a bounded pool and apply their change
/// to the tables only on commit. A ledger counts every session opened and
/// closed, so tests can assert that no operation leaked one.
#[derive(Debug, Clone)]
pub struct InMemoryCatalogStore {
    shared: Arc<Shared>,
}

impl InMemoryCatalogStore {
    /// Creates an empty store.
    pub fn new(config: InMemoryStoreConfig) -> Self {
        Self::with_contents(config, Vec::new(), Vec::new(), Vec::new())
    }

    /// Creates a store holding the bootstrap catalog.
    pub fn seeded(config: InMemoryStoreConfig) -> Self {
        Self::with_contents(config, seed::brands(), seed::types(), seed::items())
    }

    /// Creates a store holding the given rows.
    ///
    /// The next allocated item id follows the highest id present.
    pub fn with_contents(
        config: InMemoryStoreConfig,
        brands: Vec<CatalogBrand>,
        types: Vec<CatalogType>,
        items: Vec<CatalogItem>,
    ) -> Self {
        let next_id = items
            .iter()
            .map(|item| item.id.as_i32())
            .max()
            .map_or(1, |max| max.saturating_add(1));

        let tables = CatalogTables {
            brands: brands.into_iter().map(|b| (b.id, b)).collect(),
            types: types.into_iter().map(|t| (t.id, t)).collect(),
            items: items.into_iter().map(|i| (i.id, i)).collect(),
        };

        Self {
            shared: Arc::new(Shared {
                tables: RwLock::new(tables),
                next_id: AtomicI32::new(next_id),
                sessions: Arc::new(Semaphore::new(config.max_sessions)),
                ledger: SessionLedger::default(),
                fail_on_commit: AtomicBool::new(false),
            }),
        }
    }

    /// Returns the number of sessions currently held by pending mutations.
    pub fn open_sessions(&self) -> usize {
        let ledger = &self.shared.ledger;
        ledger
            .opened
            .load(Ordering::SeqCst)
            .saturating_sub(ledger.closed.load(Ordering::SeqCst))
    }

    /// Returns the total number of sessions opened.
    pub fn sessions_opened(&self) -> usize {
        self.shared.ledger.opened.load(Ordering::SeqCst)
    }

    /// Returns the total number of sessions closed.
    pub fn sessions_closed(&self) -> usize {
        self.shared.ledger.closed.load(Ordering::SeqCst)
    }

    /// Returns how many pending mutations were dropped without being finalized.
    pub fn mutations_abandoned(&self) -> usize {
        self.shared.ledger.abandoned.load(Ordering::SeqCst)
    }

    /// Configures every subsequent commit to fail.
    pub fn set_fail_on_commit(&self, fail: bool) {
        self.shared.fail_on_commit.store(fail, Ordering::SeqCst);
    }

    /// Returns all committed items ordered by id.
    pub async fn items(&self) -> Vec<CatalogItem> {
        self.shared.tables.read().await.items.values().cloned().collect()
    }

    fn allocate_id(&self) -> Result<CatalogItemId> {
        self.shared
            .next_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |id| id.checked_add(1))
            .map(CatalogItemId::new)
            .map_err(|_| StoreError::IdentityExhausted)
    }

    async fn open_session(&self) -> Result<Session> {
        let permit = self
            .shared
            .sessions
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        self.shared.ledger.opened.fetch_add(1, Ordering::SeqCst);

        Ok(Session {
            _permit: permit,
            shared: self.shared.clone(),
        })
    }

    fn stage(
        &self,
        session: Session,
        item_id: CatalogItemId,
        change: StagedChange,
    ) -> InMemoryPendingMutation {
        InMemoryPendingMutation {
            item_id,
            change,
            state: MutationState::Staged,
            session: Some(session),
            shared: self.shared.clone(),
        }
    }
}

/// A claim on one slot of the session pool; closing is recorded on drop.
#[derive(Debug)]
struct Session {
    _permit: OwnedSemaphorePermit,
    shared: Arc<Shared>,
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shared.ledger.closed.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone)]
enum StagedChange {
    Insert(CatalogItem),
    Update(CatalogItem),
    Delete,
}

/// Pending mutation of an [`InMemoryCatalogStore`].
#[derive(Debug)]
pub struct InMemoryPendingMutation {
    item_id: CatalogItemId,
    change: StagedChange,
    state: MutationState,
    session: Option<Session>,
    shared: Arc<Shared>,
}

impl InMemoryPendingMutation {
    fn finish(&mut self, state: MutationState) {
        self.state = state;
        self.session.take();
        record_finalized(self.kind(), state);
    }

    fn already_finalized(&self) -> StoreError {
        StoreError::AlreadyFinalized {
            item_id: self.item_id,
            kind: self.kind(),
            state: self.state,
        }
    }
}

#[async_trait]
impl PendingMutation for InMemoryPendingMutation {
    fn kind(&self) -> MutationKind {
        match self.change {
            StagedChange::Insert(_) => MutationKind::Insert,
            StagedChange::Update(_) => MutationKind::Update,
            StagedChange::Delete => MutationKind::Delete,
        }
    }

    fn item_id(&self) -> CatalogItemId {
        self.item_id
    }

    fn state(&self) -> MutationState {
        self.state
    }

    async fn commit(&mut self) -> Result<()> {
        if self.state == MutationState::Committed {
            return Ok(());
        }
        if !self.state.can_finalize() {
            return Err(self.already_finalized());
        }

        if self.shared.fail_on_commit.load(Ordering::SeqCst) {
            self.finish(MutationState::Abandoned);
            return Err(StoreError::CommitFailed {
                item_id: self.item_id,
                kind: self.kind(),
                reason: "commit failure injected".to_string(),
            });
        }

        let shared = Arc::clone(&self.shared);
        let mut tables = shared.tables.write().await;
        let applied = match &self.change {
            StagedChange::Insert(item) => {
                tables.items.insert(item.id, item.clone());
                true
            }
            // Deleted by a concurrent writer after staging.
            StagedChange::Update(item) if !tables.items.contains_key(&item.id) => false,
            StagedChange::Update(item) => {
                tables.items.insert(item.id, item.clone());
                true
            }
            StagedChange::Delete => {
                tables.items.remove(&self.item_id);
                true
            }
        };
        drop(tables);

        if !applied {
            self.finish(MutationState::RolledBack);
            return Err(StoreError::ItemNotFound(self.item_id));
        }

        self.finish(MutationState::Committed);
        tracing::debug!(item_id = %self.item_id, kind = %self.kind(), "mutation committed");
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        if self.state == MutationState::RolledBack {
            return Ok(());
        }
        if !self.state.can_finalize() {
            return Err(self.already_finalized());
        }

        self.finish(MutationState::RolledBack);
        tracing::debug!(item_id = %self.item_id, kind = %self.kind(), "mutation rolled back");
        Ok(())
    }
}

impl Drop for InMemoryPendingMutation {
    fn drop(&mut self) {
        if !self.state.is_terminal() {
            self.shared.ledger.abandoned.fetch_add(1, Ordering::SeqCst);
            tracing::warn!(
                item_id = %self.item_id,
                kind = %self.kind(),
                "pending mutation dropped without commit or rollback, discarding staged change"
            );
        }
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    type Mutation = InMemoryPendingMutation;

    async fn lookup_brand(&self, id: CatalogBrandId) -> Result<Option<CatalogBrand>> {
        Ok(self.shared.tables.read().await.brands.get(&id).cloned())
    }

    async fn lookup_type(&self, id: CatalogTypeId) -> Result<Option<CatalogType>> {
        Ok(self.shared.tables.read().await.types.get(&id).cloned())
    }

    async fn lookup_item(&self, id: CatalogItemId) -> Result<Option<CatalogItem>> {
        Ok(self.shared.tables.read().await.items.get(&id).cloned())
    }

    async fn list_brands(&self) -> Result<Vec<CatalogBrand>> {
        Ok(self.shared.tables.read().await.brands.values().cloned().collect())
    }

    async fn list_types(&self) -> Result<Vec<CatalogType>> {
        Ok(self.shared.tables.read().await.types.values().cloned().collect())
    }

    async fn item_count(&self) -> Result<usize> {
        Ok(self.shared.tables.read().await.items.len())
    }

    async fn begin_insert(&self, item: NewCatalogItem) -> Result<(CatalogItemId, Self::Mutation)> {
        let session = self.open_session().await?;
        let id = self.allocate_id()?;
        let change = StagedChange::Insert(item.into_item(id));
        Ok((id, self.stage(session, id, change)))
    }

    async fn begin_update(&self, item: CatalogItem) -> Result<Self::Mutation> {
        let session = self.open_session().await?;
        if !self.shared.tables.read().await.items.contains_key(&item.id) {
            return Err(StoreError::ItemNotFound(item.id));
        }
        let id = item.id;
        Ok(self.stage(session, id, StagedChange::Update(item)))
    }

    async fn begin_delete(&self, id: CatalogItemId) -> Result<Self::Mutation> {
        let session = self.open_session().await?;
        if !self.shared.tables.read().await.items.contains_key(&id) {
            return Err(StoreError::ItemNotFound(id));
        }
        Ok(self.stage(session, id, StagedChange::Delete))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{CatalogStoreExt, Price};

    fn seeded() -> InMemoryCatalogStore {
        InMemoryCatalogStore::seeded(InMemoryStoreConfig::default())
    }

    fn mug() -> NewCatalogItem {
        NewCatalogItem {
            name: "Mug".to_string(),
            description: None,
            price: Price::from_cents(850),
            picture_uri: None,
            catalog_brand_id: CatalogBrandId::new(2),
            catalog_type_id: CatalogTypeId::new(1),
        }
    }

    #[tokio::test]
    async fn test_seeded_lookups() {
        let store = seeded();

        assert_eq!(store.item_count().await.unwrap(), 12);
        assert_eq!(store.list_brands().await.unwrap().len(), 5);
        assert_eq!(store.list_types().await.unwrap().len(), 4);

        let brand = store
            .lookup_brand(CatalogBrandId::new(2))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(brand.brand, ".NET");
        assert!(
            store
                .lookup_type(CatalogTypeId::new(9))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_insert_invisible_until_commit() {
        let store = seeded();

        let (id, mut mutation) = store.begin_insert(mug()).await.unwrap();
        assert_eq!(id, CatalogItemId::new(13));
        assert_eq!(mutation.kind(), MutationKind::Insert);
        assert!(!store.item_exists(id).await.unwrap());
        assert_eq!(store.open_sessions(), 1);

        mutation.commit().await.unwrap();

        let item = store.lookup_item(id).await.unwrap().unwrap();
        assert_eq!(item.name, "Mug");
        assert_eq!(store.item_count().await.unwrap(), 13);
        assert_eq!(store.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_rollback_discards_insert_and_releases_session() {
        let store = seeded();

        let (id, mut mutation) = store.begin_insert(mug()).await.unwrap();
        mutation.rollback().await.unwrap();

        assert_eq!(mutation.state(), MutationState::RolledBack);
        assert!(!store.item_exists(id).await.unwrap());
        assert_eq!(store.item_count().await.unwrap(), 12);
        assert_eq!(store.open_sessions(), 0);
        assert_eq!(store.sessions_opened(), store.sessions_closed());
    }

    #[tokio::test]
    async fn test_rolled_back_ids_are_not_reused() {
        let store = seeded();

        let (first, mut mutation) = store.begin_insert(mug()).await.unwrap();
        mutation.rollback().await.unwrap();
        let (second, mut mutation) = store.begin_insert(mug()).await.unwrap();
        mutation.commit().await.unwrap();

        assert!(second > first);
    }

    #[tokio::test]
    async fn test_commit_twice_is_noop() {
        let store = seeded();

        let (_, mut mutation) = store.begin_insert(mug()).await.unwrap();
        mutation.commit().await.unwrap();
        mutation.commit().await.unwrap();

        assert_eq!(store.item_count().await.unwrap(), 13);
        assert_eq!(store.sessions_closed(), 1);
    }

    #[tokio::test]
    async fn test_rollback_twice_is_noop() {
        let store = seeded();

        let mut mutation = store.begin_delete(CatalogItemId::new(3)).await.unwrap();
        mutation.rollback().await.unwrap();
        mutation.rollback().await.unwrap();

        assert!(store.item_exists(CatalogItemId::new(3)).await.unwrap());
        assert_eq!(store.sessions_closed(), 1);
    }

    #[tokio::test]
    async fn test_commit_after_rollback_is_rejected() {
        let store = seeded();

        let (id, mut mutation) = store.begin_insert(mug()).await.unwrap();
        mutation.rollback().await.unwrap();

        let result = mutation.commit().await;
        assert!(matches!(
            result,
            Err(StoreError::AlreadyFinalized {
                state: MutationState::RolledBack,
                ..
            })
        ));
        assert!(!store.item_exists(id).await.unwrap());
    }

    #[tokio::test]
    async fn test_drop_releases_session_and_discards_change() {
        let store = seeded();

        {
            let _mutation = store.begin_delete(CatalogItemId::new(1)).await.unwrap();
            assert_eq!(store.open_sessions(), 1);
        }

        assert_eq!(store.open_sessions(), 0);
        assert_eq!(store.mutations_abandoned(), 1);
        assert!(store.item_exists(CatalogItemId::new(1)).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_missing_item() {
        let store = seeded();
        let mut item = store
            .lookup_item(CatalogItemId::new(1))
            .await
            .unwrap()
            .unwrap();
        item.id = CatalogItemId::new(404);

        let result = store.begin_update(item).await;
        assert!(matches!(result, Err(StoreError::ItemNotFound(_))));
        assert_eq!(store.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_update_applies_on_commit() {
        let store = seeded();
        let id = CatalogItemId::new(5);
        let original = store.lookup_item(id).await.unwrap().unwrap();

        let mut changed = original.clone();
        changed.price = Price::from_cents(9999);
        let mut mutation = store.begin_update(changed.clone()).await.unwrap();

        assert_eq!(store.lookup_item(id).await.unwrap().unwrap(), original);
        mutation.commit().await.unwrap();
        assert_eq!(store.lookup_item(id).await.unwrap().unwrap(), changed);
    }

    #[tokio::test]
    async fn test_update_of_concurrently_deleted_item() {
        let store = seeded();
        let id = CatalogItemId::new(6);
        let item = store.lookup_item(id).await.unwrap().unwrap();

        let mut update = store.begin_update(item).await.unwrap();
        let mut delete = store.begin_delete(id).await.unwrap();
        delete.commit().await.unwrap();

        let result = update.commit().await;
        assert!(matches!(result, Err(StoreError::ItemNotFound(_))));
        assert!(!store.item_exists(id).await.unwrap());
        assert_eq!(store.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_delete_missing_item() {
        let store = seeded();
        let result = store.begin_delete(CatalogItemId::new(99)).await;
        assert!(matches!(result, Err(StoreError::ItemNotFound(_))));
    }

    #[tokio::test]
    async fn test_injected_commit_failure_abandons_mutation() {
        let store = seeded();
        store.set_fail_on_commit(true);

        let (id, mut mutation) = store.begin_insert(mug()).await.unwrap();
        let result = mutation.commit().await;

        assert!(matches!(result, Err(StoreError::CommitFailed { .. })));
        assert_eq!(mutation.state(), MutationState::Abandoned);
        assert!(!store.item_exists(id).await.unwrap());
        assert_eq!(store.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_receive_distinct_ids() {
        let store = seeded();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    let (id, mut mutation) = store.begin_insert(mug()).await.unwrap();
                    mutation.commit().await.unwrap();
                    id
                })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort();
        ids.dedup();

        assert_eq!(ids.len(), 8);
        assert_eq!(store.item_count().await.unwrap(), 20);
    }

    #[tokio::test]
    async fn test_session_pool_is_bounded() {
        let store = InMemoryCatalogStore::seeded(InMemoryStoreConfig { max_sessions: 1 });

        let (_, mut first) = store.begin_insert(mug()).await.unwrap();

        let blocked = tokio::time::timeout(Duration::from_millis(50), store.begin_insert(mug())).await;
        assert!(blocked.is_err());

        first.commit().await.unwrap();
        let (_, mut second) = store.begin_insert(mug()).await.unwrap();
        second.commit().await.unwrap();
        assert_eq!(store.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_empty_store_starts_at_one() {
        let store = InMemoryCatalogStore::new(InMemoryStoreConfig::default());
        let (id, mut mutation) = store.begin_insert(mug()).await.unwrap();
        mutation.rollback().await.unwrap();
        assert_eq!(id, CatalogItemId::new(1));
    }
}
