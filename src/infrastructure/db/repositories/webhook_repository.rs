use crate::domain::entities::webhook::{SecretPair, Webhook};
use crate::domain::value_objects::ids::{OwnerId, WebhookId};
use crate::domain::value_objects::timestamps::Timestamp;
use crate::infrastructure::db::dto::{WebhookRow, WebhookSecretRow};
use crate::infrastructure::db::stores::webhook_secret_store::{
    WebhookSecretRepositoryError, WebhookSecretStore,
};
use crate::infrastructure::db::stores::webhook_store::{WebhookRepositoryError, WebhookStore};
use std::sync::Arc;

pub struct WebhookRepository {
    store: Arc<dyn WebhookStore>,
}

impl WebhookRepository {
    /// Build a repository that uses the given store implementation.
    pub fn new(store: Arc<dyn WebhookStore>) -> Self {
        Self { store }
    }

    /// Fetch a webhook by its ID. Returns `None` if it doesn't exist.
    pub async fn get(
        &self,
        webhook_id: WebhookId,
    ) -> Result<Option<Webhook>, WebhookRepositoryError> {
        Ok(self
            .store
            .get(webhook_id.0)
            .await?
            .map(WebhookRow::into_webhook))
    }

    /// Register a webhook and return what was actually stored.
    pub async fn insert(&self, webhook: &Webhook) -> Result<Webhook, WebhookRepositoryError> {
        let stored = self.store.insert(&WebhookRow::from_webhook(webhook)).await?;
        Ok(stored.into_webhook())
    }

    /// Ids of every webhook the owner registered; the visibility scope for management calls.
    pub async fn scope_for_owner(
        &self,
        owner_id: OwnerId,
    ) -> Result<Vec<WebhookId>, WebhookRepositoryError> {
        let ids = self.store.list_ids_by_owner(owner_id.0).await?;
        Ok(ids.into_iter().map(WebhookId).collect())
    }
}

pub struct WebhookSecretRepository {
    store: Arc<dyn WebhookSecretStore>,
}

impl WebhookSecretRepository {
    pub fn new(store: Arc<dyn WebhookSecretStore>) -> Self {
        Self { store }
    }

    pub async fn get(
        &self,
        webhook_id: WebhookId,
    ) -> Result<Option<SecretPair>, WebhookSecretRepositoryError> {
        Ok(self
            .store
            .get(webhook_id.0)
            .await?
            .map(WebhookSecretRow::into_pair))
    }

    pub async fn set(
        &self,
        webhook_id: WebhookId,
        pair: &SecretPair,
    ) -> Result<SecretPair, WebhookSecretRepositoryError> {
        let row = WebhookSecretRow {
            webhook_id: webhook_id.0,
            current_secret: pair.current.clone(),
            previous_secret: pair.previous.clone(),
            rotated_at: None,
        };
        Ok(self.store.upsert(&row).await?.into_pair())
    }

    /// Install `next` as the current secret, keeping the old one as previous.
    pub async fn rotate(
        &self,
        webhook_id: WebhookId,
        next: &str,
        now: Timestamp,
    ) -> Result<SecretPair, WebhookSecretRepositoryError> {
        let row = self.store.rotate(webhook_id.0, next, now.as_inner()).await?;
        Ok(row.into_pair())
    }
}
