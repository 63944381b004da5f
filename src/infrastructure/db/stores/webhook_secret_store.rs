use crate::infrastructure::db::database::DatabaseError;
use crate::infrastructure::db::dto::WebhookSecretRow;
use async_trait::async_trait;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookSecretRepositoryError {
    NotFound,
    InvalidInput,
    StorageUnavailable,
}

impl From<DatabaseError> for WebhookSecretRepositoryError {
    fn from(_: DatabaseError) -> Self {
        WebhookSecretRepositoryError::StorageUnavailable
    }
}

#[async_trait]
pub trait WebhookSecretStore: Send + Sync {
    /// Fetch the secret pair of a webhook. Returns `None` when none was provisioned.
    async fn get(
        &self,
        webhook_id: uuid::Uuid,
    ) -> Result<Option<WebhookSecretRow>, WebhookSecretRepositoryError>;
    /// Insert or replace the secret pair of a webhook.
    async fn upsert(
        &self,
        row: &WebhookSecretRow,
    ) -> Result<WebhookSecretRow, WebhookSecretRepositoryError>;
    /// Promote `new_secret` to current and keep the outgoing one as previous.
    async fn rotate(
        &self,
        webhook_id: uuid::Uuid,
        new_secret: &str,
        now: OffsetDateTime,
    ) -> Result<WebhookSecretRow, WebhookSecretRepositoryError>;
}
