//! Catalog write coordinator.

use std::time::{Duration, Instant};

use catalog_store::{CatalogItem, CatalogStore, CatalogStoreExt, PendingMutation, StoreError};
use common::{CatalogBrandId, CatalogItemId, CatalogTypeId};
use tokio_util::sync::CancellationToken;

use crate::error::{Result, WriteError};
use crate::outcome::{DeleteOutcome, WriteOperation};
use crate::request::{CreateCatalogItem, UpdateCatalogItem};
use crate::services::{InventoryNotification, InventoryNotifier, NotifyFailure, NotifyOutcome};

/// Tunables for [`CatalogWriteCoordinator`].
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Stock level sent to inventory for new items, and for updates that do
    /// not carry one.
    pub initial_quantity: u32,
    /// Upper bound on a single inventory notification.
    pub notify_timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            initial_quantity: 5,
            notify_timeout: Duration::from_secs(10),
        }
    }
}

/// Coordinates catalog writes with the inventory service.
///
/// Every write runs Validate → Stage → Notify → Finalize and awaits the
/// inventory outcome before finalizing:
///
/// | operation | order | on inventory failure |
/// |-----------|-------|----------------------|
/// | create | stage, notify, finalize | roll back, [`WriteError::CompensatedFailure`] |
/// | update | notify, stage, finalize | nothing staged, [`WriteError::CompensatedFailure`] |
/// | delete | notify, stage, finalize | still deleted, [`DeleteOutcome::PartialFailure`] |
///
/// Delete is deliberately asymmetric: the local row is removed even when
/// inventory does not confirm, so callers must inspect the returned
/// [`DeleteOutcome`].
pub struct CatalogWriteCoordinator<S, N>
where
    S: CatalogStore,
    N: InventoryNotifier,
{
    store: S,
    notifier: N,
    config: CoordinatorConfig,
}

impl<S, N> CatalogWriteCoordinator<S, N>
where
    S: CatalogStore,
    N: InventoryNotifier,
{
    /// Creates a new coordinator.
    pub fn new(store: S, notifier: N, config: CoordinatorConfig) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Creates a catalog item and mirrors it in inventory.
    ///
    /// The insert stays staged while inventory is notified. It is committed
    /// only on confirmation; any other outcome rolls it back and returns
    /// [`WriteError::CompensatedFailure`].
    #[tracing::instrument(
        skip(self, request, cancel),
        fields(operation = "create", item_id = tracing::field::Empty)
    )]
    pub async fn create_item(
        &self,
        request: CreateCatalogItem,
        cancel: &CancellationToken,
    ) -> Result<CatalogItem> {
        let started = begin_write(WriteOperation::Create);
        let result = self.try_create(request, cancel).await;
        end_write(WriteOperation::Create, started);
        result
    }

    /// Replaces an existing catalog item.
    ///
    /// Inventory is notified first; the local update is staged and committed
    /// only after confirmation, so a failure leaves the stored item untouched.
    #[tracing::instrument(
        skip(self, request, cancel),
        fields(operation = "update", item_id = %request.id)
    )]
    pub async fn update_item(
        &self,
        request: UpdateCatalogItem,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let started = begin_write(WriteOperation::Update);
        let result = self.try_update(request, cancel).await;
        end_write(WriteOperation::Update, started);
        result
    }

    /// Deletes a catalog item.
    ///
    /// The local delete is committed whatever inventory answers. An
    /// unconfirmed notification is reported as
    /// [`DeleteOutcome::PartialFailure`], not as an error.
    #[tracing::instrument(skip(self, cancel), fields(operation = "delete"))]
    pub async fn delete_item(
        &self,
        item_id: CatalogItemId,
        cancel: &CancellationToken,
    ) -> Result<DeleteOutcome> {
        let started = begin_write(WriteOperation::Delete);
        let result = self.try_delete(item_id, cancel).await;
        end_write(WriteOperation::Delete, started);
        result
    }

    async fn try_create(
        &self,
        request: CreateCatalogItem,
        cancel: &CancellationToken,
    ) -> Result<CatalogItem> {
        ensure_not_cancelled(cancel)?;
        request.validate()?;
        self.ensure_references(request.catalog_brand_id, request.catalog_type_id)
            .await?;

        let new_item = request.into_new_item();
        // The session pool may be saturated; cancellation applies while waiting.
        let (item_id, mut mutation) = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(WriteError::Cancelled),
            staged = self.store.begin_insert(new_item.clone()) => staged?,
        };
        tracing::Span::current().record("item_id", tracing::field::display(item_id));

        let notification = InventoryNotification::create(item_id, self.config.initial_quantity);
        match self.notify(notification, cancel).await {
            NotifyOutcome::Confirmed => {
                mutation
                    .commit()
                    .await
                    .map_err(|source| finalize_failed(WriteOperation::Create, item_id, source))?;
                tracing::info!(%item_id, "catalog item created");
                Ok(new_item.into_item(item_id))
            }
            NotifyOutcome::Failed(reason) => {
                mutation
                    .rollback()
                    .await
                    .map_err(|source| finalize_failed(WriteOperation::Create, item_id, source))?;
                Err(compensated(WriteOperation::Create, item_id, reason))
            }
        }
    }

    async fn try_update(
        &self,
        request: UpdateCatalogItem,
        cancel: &CancellationToken,
    ) -> Result<()> {
        ensure_not_cancelled(cancel)?;

        let item_id = request.id;
        if !self.store.item_exists(item_id).await? {
            return Err(WriteError::NotFound(item_id));
        }
        request.validate()?;
        self.ensure_references(request.catalog_brand_id, request.catalog_type_id)
            .await?;

        let quantity = request.quantity.unwrap_or(self.config.initial_quantity);
        let notification = InventoryNotification::update(item_id, quantity);
        if let NotifyOutcome::Failed(reason) = self.notify(notification, cancel).await {
            return Err(compensated(WriteOperation::Update, item_id, reason));
        }

        let mut mutation = self
            .store
            .begin_update(request.to_item())
            .await
            .map_err(|source| finalize_failed(WriteOperation::Update, item_id, source))?;
        mutation
            .commit()
            .await
            .map_err(|source| finalize_failed(WriteOperation::Update, item_id, source))?;

        tracing::info!(%item_id, quantity, "catalog item updated");
        Ok(())
    }

    async fn try_delete(
        &self,
        item_id: CatalogItemId,
        cancel: &CancellationToken,
    ) -> Result<DeleteOutcome> {
        ensure_not_cancelled(cancel)?;
        if !self.store.item_exists(item_id).await? {
            return Err(WriteError::NotFound(item_id));
        }

        let outcome = self
            .notify(InventoryNotification::delete(item_id), cancel)
            .await;

        let mut mutation = match self.store.begin_delete(item_id).await {
            Ok(mutation) => mutation,
            // Removed concurrently; nothing left to delete locally.
            Err(StoreError::ItemNotFound(_)) => return Err(WriteError::NotFound(item_id)),
            Err(source) => return Err(finalize_failed(WriteOperation::Delete, item_id, source)),
        };
        mutation
            .commit()
            .await
            .map_err(|source| finalize_failed(WriteOperation::Delete, item_id, source))?;

        match outcome {
            NotifyOutcome::Confirmed => {
                tracing::info!(%item_id, "catalog item deleted");
                Ok(DeleteOutcome::Confirmed)
            }
            NotifyOutcome::Failed(reason) => {
                metrics::counter!("catalog_partial_failures_total").increment(1);
                tracing::warn!(
                    %item_id,
                    reason = %reason,
                    "catalog item deleted but inventory did not confirm"
                );
                Ok(DeleteOutcome::PartialFailure(reason))
            }
        }
    }

    async fn ensure_references(
        &self,
        brand_id: CatalogBrandId,
        type_id: CatalogTypeId,
    ) -> Result<()> {
        if !self.store.brand_exists(brand_id).await? {
            return Err(WriteError::ValidationFailed(format!(
                "catalog brand {brand_id} does not exist"
            )));
        }
        if !self.store.type_exists(type_id).await? {
            return Err(WriteError::ValidationFailed(format!(
                "catalog type {type_id} does not exist"
            )));
        }
        Ok(())
    }

    /// Awaits exactly one outcome, bounded by the cancel token and the
    /// configured timeout.
    async fn notify(
        &self,
        notification: InventoryNotification,
        cancel: &CancellationToken,
    ) -> NotifyOutcome {
        let kind = notification.kind;
        let call = tokio::time::timeout(
            self.config.notify_timeout,
            self.notifier.notify(notification, cancel),
        );

        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => NotifyOutcome::Failed(NotifyFailure::Cancelled),
            result = call => result.unwrap_or(NotifyOutcome::Failed(NotifyFailure::Timeout)),
        };

        metrics::counter!(
            "inventory_notifications_total",
            "kind" => kind.as_str(),
            "outcome" => outcome.as_str()
        )
        .increment(1);
        outcome
    }
}

fn begin_write(operation: WriteOperation) -> Instant {
    metrics::counter!("catalog_writes_total", "operation" => operation.as_str()).increment(1);
    Instant::now()
}

fn end_write(operation: WriteOperation, started: Instant) {
    metrics::histogram!("catalog_write_duration_seconds", "operation" => operation.as_str())
        .record(started.elapsed().as_secs_f64());
}

fn ensure_not_cancelled(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(WriteError::Cancelled);
    }
    Ok(())
}

fn compensated(
    operation: WriteOperation,
    item_id: CatalogItemId,
    reason: NotifyFailure,
) -> WriteError {
    metrics::counter!("catalog_compensations_total", "operation" => operation.as_str())
        .increment(1);
    tracing::warn!(%operation, %item_id, reason = %reason, "inventory did not confirm, write compensated");
    WriteError::CompensatedFailure {
        operation,
        item_id,
        reason,
    }
}

fn finalize_failed(
    operation: WriteOperation,
    item_id: CatalogItemId,
    source: StoreError,
) -> WriteError {
    metrics::counter!("catalog_inconsistencies_total", "operation" => operation.as_str())
        .increment(1);
    tracing::error!(
        %operation,
        %item_id,
        error = %source,
        "failed to finalize local change after inventory outcome, services may disagree"
    );
    WriteError::FinalizeFailed {
        operation,
        item_id,
        source,
    }
}
