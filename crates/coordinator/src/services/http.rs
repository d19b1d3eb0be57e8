//! HTTP client for the inventory service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use tokio_util::sync::CancellationToken;

use super::inventory::{
    InventoryEventKind, InventoryNotification, InventoryNotifier, NotifyFailure, NotifyOutcome,
};

/// Connection settings for [`HttpInventoryNotifier`].
#[derive(Debug, Clone)]
pub struct HttpNotifierConfig {
    /// Base URL of the inventory service, e.g. `http://inventory:8080`.
    pub base_url: String,
    /// Per-request timeout enforced by the HTTP client.
    pub timeout: Duration,
}

impl HttpNotifierConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Inventory notifier talking to the inventory service over HTTP.
///
/// - create: `POST {base}/api/inventory` with the notification as JSON
/// - update: `PUT {base}/api/inventory/{id}` with the notification as JSON
/// - delete: `DELETE {base}/api/inventory/{id}`
///
/// Any 2xx response confirms the notification.
#[derive(Debug, Clone)]
pub struct HttpInventoryNotifier {
    client: Client,
    base_url: String,
}

impl HttpInventoryNotifier {
    pub fn new(config: HttpNotifierConfig) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn request(&self, notification: &InventoryNotification) -> RequestBuilder {
        let id = notification.catalog_item_id;
        match notification.kind {
            InventoryEventKind::Create => self
                .client
                .post(format!("{}/api/inventory", self.base_url))
                .json(notification),
            InventoryEventKind::Update => self
                .client
                .put(format!("{}/api/inventory/{id}", self.base_url))
                .json(notification),
            InventoryEventKind::Delete => self
                .client
                .delete(format!("{}/api/inventory/{id}", self.base_url)),
        }
    }
}

#[async_trait]
impl InventoryNotifier for HttpInventoryNotifier {
    #[tracing::instrument(
        skip(self, notification, cancel),
        fields(kind = %notification.kind, item_id = %notification.catalog_item_id)
    )]
    async fn notify(
        &self,
        notification: InventoryNotification,
        cancel: &CancellationToken,
    ) -> NotifyOutcome {
        let request = self.request(&notification);

        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return NotifyOutcome::Failed(NotifyFailure::Cancelled),
            response = request.send() => response,
        };

        match response {
            Ok(response) if response.status().is_success() => NotifyOutcome::Confirmed,
            Ok(response) => {
                let status = response.status();
                tracing::debug!(%status, "inventory returned non-success status");
                NotifyOutcome::Failed(NotifyFailure::Rejected(format!("status {status}")))
            }
            Err(e) if e.is_timeout() => NotifyOutcome::Failed(NotifyFailure::Timeout),
            Err(e) => NotifyOutcome::Failed(NotifyFailure::Transport(e.to_string())),
        }
    }
}
