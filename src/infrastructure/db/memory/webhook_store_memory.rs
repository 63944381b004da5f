use crate::infrastructure::db::dto::{WebhookRow, WebhookSecretRow};
use crate::infrastructure::db::stores::webhook_secret_store::{
    WebhookSecretRepositoryError, WebhookSecretStore,
};
use crate::infrastructure::db::stores::webhook_store::{WebhookRepositoryError, WebhookStore};
use async_trait::async_trait;
use std::collections::HashMap;
use time::OffsetDateTime;
use tokio::sync::Mutex;

/// In-process webhook registry.
#[derive(Default)]
pub struct WebhookStoreMemory {
    webhooks: Mutex<Vec<WebhookRow>>,
}

impl WebhookStoreMemory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WebhookStore for WebhookStoreMemory {
    async fn get(
        &self,
        webhook_id: uuid::Uuid,
    ) -> Result<Option<WebhookRow>, WebhookRepositoryError> {
        let webhooks = self.webhooks.lock().await;
        Ok(webhooks.iter().find(|w| w.id == webhook_id).cloned())
    }

    async fn insert(&self, row: &WebhookRow) -> Result<WebhookRow, WebhookRepositoryError> {
        let mut webhooks = self.webhooks.lock().await;
        if webhooks.iter().any(|w| w.id == row.id) {
            return Err(WebhookRepositoryError::Conflict);
        }
        webhooks.push(row.clone());
        Ok(row.clone())
    }

    async fn list_ids_by_owner(
        &self,
        owner_id: uuid::Uuid,
    ) -> Result<Vec<uuid::Uuid>, WebhookRepositoryError> {
        let webhooks = self.webhooks.lock().await;
        Ok(webhooks
            .iter()
            .filter(|w| w.owner_id == owner_id)
            .map(|w| w.id)
            .collect())
    }
}

/// In-process signing secrets keyed by webhook id.
#[derive(Default)]
pub struct WebhookSecretStoreMemory {
    secrets: Mutex<HashMap<uuid::Uuid, WebhookSecretRow>>,
}

impl WebhookSecretStoreMemory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WebhookSecretStore for WebhookSecretStoreMemory {
    async fn get(
        &self,
        webhook_id: uuid::Uuid,
    ) -> Result<Option<WebhookSecretRow>, WebhookSecretRepositoryError> {
        Ok(self.secrets.lock().await.get(&webhook_id).cloned())
    }

    async fn upsert(
        &self,
        row: &WebhookSecretRow,
    ) -> Result<WebhookSecretRow, WebhookSecretRepositoryError> {
        if row.current_secret.is_empty() {
            return Err(WebhookSecretRepositoryError::InvalidInput);
        }
        self.secrets.lock().await.insert(row.webhook_id, row.clone());
        Ok(row.clone())
    }

    async fn rotate(
        &self,
        webhook_id: uuid::Uuid,
        new_secret: &str,
        now: OffsetDateTime,
    ) -> Result<WebhookSecretRow, WebhookSecretRepositoryError> {
        if new_secret.is_empty() {
            return Err(WebhookSecretRepositoryError::InvalidInput);
        }
        let mut secrets = self.secrets.lock().await;
        let row = secrets
            .get_mut(&webhook_id)
            .ok_or(WebhookSecretRepositoryError::NotFound)?;
        let outgoing = std::mem::replace(&mut row.current_secret, new_secret.to_string());
        row.previous_secret = Some(outgoing);
        row.rotated_at = Some(now);
        Ok(row.clone())
    }
}
