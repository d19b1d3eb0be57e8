use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};

use crate::mutation::record_finalized;
use crate::{
    CatalogBrand, CatalogBrandId, CatalogItem, CatalogItemId, CatalogStore, CatalogType,
    CatalogTypeId, MutationKind, MutationState, NewCatalogItem, PendingMutation, Price, Result,
    StoreError,
};

/// Connection settings for [`PostgresCatalogStore`].
#[derive(Debug, Clone)]
pub struct PostgresStoreConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl PostgresStoreConfig {
    /// Creates a config for the given URL with default pool settings.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: 10,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// PostgreSQL-backed catalog store.
///
/// Each pending mutation owns one pooled connection inside an open
/// transaction; sqlx rolls the transaction back if the handle is dropped.
#[derive(Clone)]
pub struct PostgresCatalogStore {
    pool: PgPool,
}

impl PostgresCatalogStore {
    /// Creates a store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a new pool using the given config.
    pub async fn connect(config: &PostgresStoreConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_item(row: PgRow) -> Result<CatalogItem> {
        let id = CatalogItemId::new(row.try_get("id")?);
        let price: Decimal = row.try_get("price")?;
        let price = Price::new(price)
            .map_err(|e| StoreError::InvalidRow(format!("item {id}: {e}")))?;

        Ok(CatalogItem {
            id,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price,
            picture_uri: row.try_get("picture_uri")?,
            catalog_brand_id: CatalogBrandId::new(row.try_get("catalog_brand_id")?),
            catalog_type_id: CatalogTypeId::new(row.try_get("catalog_type_id")?),
        })
    }

    fn row_to_brand(row: PgRow) -> Result<CatalogBrand> {
        Ok(CatalogBrand {
            id: CatalogBrandId::new(row.try_get("id")?),
            brand: row.try_get("brand")?,
        })
    }

    fn row_to_type(row: PgRow) -> Result<CatalogType> {
        Ok(CatalogType {
            id: CatalogTypeId::new(row.try_get("id")?),
            type_name: row.try_get("type_name")?,
        })
    }
}

#[async_trait]
impl CatalogStore for PostgresCatalogStore {
    type Mutation = PgPendingMutation;

    async fn lookup_brand(&self, id: CatalogBrandId) -> Result<Option<CatalogBrand>> {
        sqlx::query("SELECT id, brand FROM catalog_brands WHERE id = $1")
            .bind(id.as_i32())
            .fetch_optional(&self.pool)
            .await?
            .map(Self::row_to_brand)
            .transpose()
    }

    async fn lookup_type(&self, id: CatalogTypeId) -> Result<Option<CatalogType>> {
        sqlx::query("SELECT id, type_name FROM catalog_types WHERE id = $1")
            .bind(id.as_i32())
            .fetch_optional(&self.pool)
            .await?
            .map(Self::row_to_type)
            .transpose()
    }

    async fn lookup_item(&self, id: CatalogItemId) -> Result<Option<CatalogItem>> {
        sqlx::query(
            r#"
            SELECT id, name, description, price, picture_uri, catalog_brand_id, catalog_type_id
            FROM catalog_items
            WHERE id = $1
            "#,
        )
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await?
        .map(Self::row_to_item)
        .transpose()
    }

    async fn list_brands(&self) -> Result<Vec<CatalogBrand>> {
        let rows = sqlx::query("SELECT id, brand FROM catalog_brands ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Self::row_to_brand).collect()
    }

    async fn list_types(&self) -> Result<Vec<CatalogType>> {
        let rows = sqlx::query("SELECT id, type_name FROM catalog_types ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Self::row_to_type).collect()
    }

    async fn item_count(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM catalog_items")
            .fetch_one(&self.pool)
            .await?;
        usize::try_from(count).map_err(|e| StoreError::InvalidRow(e.to_string()))
    }

    #[tracing::instrument(skip(self, item))]
    async fn begin_insert(&self, item: NewCatalogItem) -> Result<(CatalogItemId, Self::Mutation)> {
        let mut tx = self.pool.begin().await?;

        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO catalog_items (name, description, price, picture_uri, catalog_type_id, catalog_brand_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.price.amount())
        .bind(&item.picture_uri)
        .bind(item.catalog_type_id.as_i32())
        .bind(item.catalog_brand_id.as_i32())
        .fetch_one(&mut *tx)
        .await?;

        let id = CatalogItemId::new(id);
        tracing::debug!(item_id = %id, "insert staged");
        Ok((id, PgPendingMutation::new(tx, id, MutationKind::Insert)))
    }

    #[tracing::instrument(skip(self, item), fields(item_id = %item.id))]
    async fn begin_update(&self, item: CatalogItem) -> Result<Self::Mutation> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE catalog_items
            SET name = $2,
                description = $3,
                price = $4,
                picture_uri = $5,
                catalog_brand_id = $6,
                catalog_type_id = $7
            WHERE id = $1
            "#,
        )
        .bind(item.id.as_i32())
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.price.amount())
        .bind(&item.picture_uri)
        .bind(item.catalog_brand_id.as_i32())
        .bind(item.catalog_type_id.as_i32())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(StoreError::ItemNotFound(item.id));
        }

        Ok(PgPendingMutation::new(tx, item.id, MutationKind::Update))
    }

    #[tracing::instrument(skip(self))]
    async fn begin_delete(&self, id: CatalogItemId) -> Result<Self::Mutation> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM catalog_items WHERE id = $1")
            .bind(id.as_i32())
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(StoreError::ItemNotFound(id));
        }

        Ok(PgPendingMutation::new(tx, id, MutationKind::Delete))
    }
}

/// Pending mutation of a [`PostgresCatalogStore`], backed by an open transaction.
pub struct PgPendingMutation {
    tx: Option<Transaction<'static, Postgres>>,
    item_id: CatalogItemId,
    kind: MutationKind,
    state: MutationState,
}

impl PgPendingMutation {
    fn new(tx: Transaction<'static, Postgres>, item_id: CatalogItemId, kind: MutationKind) -> Self {
        Self {
            tx: Some(tx),
            item_id,
            kind,
            state: MutationState::Staged,
        }
    }

    fn finish(&mut self, state: MutationState) {
        self.state = state;
        record_finalized(self.kind, state);
    }

    fn already_finalized(&self) -> StoreError {
        StoreError::AlreadyFinalized {
            item_id: self.item_id,
            kind: self.kind,
            state: self.state,
        }
    }
}

impl std::fmt::Debug for PgPendingMutation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgPendingMutation")
            .field("item_id", &self.item_id)
            .field("kind", &self.kind)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl PendingMutation for PgPendingMutation {
    fn kind(&self) -> MutationKind {
        self.kind
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
        let Some(tx) = self.tx.take() else {
            return Err(self.already_finalized());
        };

        if let Err(e) = tx.commit().await {
            self.finish(MutationState::Abandoned);
            return Err(e.into());
        }
        self.finish(MutationState::Committed);
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        if self.state == MutationState::RolledBack {
            return Ok(());
        }
        if !self.state.can_finalize() {
            return Err(self.already_finalized());
        }
        let Some(tx) = self.tx.take() else {
            return Err(self.already_finalized());
        };

        if let Err(e) = tx.rollback().await {
            self.finish(MutationState::Abandoned);
            return Err(e.into());
        }
        self.finish(MutationState::RolledBack);
        Ok(())
    }
}

impl Drop for PgPendingMutation {
    fn drop(&mut self) {
        if !self.state.is_terminal() {
            tracing::warn!(
                item_id = %self.item_id,
                kind = %self.kind,
                "pending mutation dropped without commit or rollback, transaction will roll back"
            );
        }
    }
}
