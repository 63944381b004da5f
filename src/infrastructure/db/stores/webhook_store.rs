use crate::infrastructure::db::database::DatabaseError;
use crate::infrastructure::db::dto::WebhookRow;
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookRepositoryError {
    NotFound,
    Conflict,
    InvalidInput,
    StorageUnavailable,
}

impl From<DatabaseError> for WebhookRepositoryError {
    fn from(_: DatabaseError) -> Self {
        WebhookRepositoryError::StorageUnavailable
    }
}

/// Read side of the webhook registry, plus the insert used when seeding.
#[async_trait]
pub trait WebhookStore: Send + Sync {
    /// Fetch a webhook by its ID. Returns `None` if it doesn't exist.
    async fn get(
        &self,
        webhook_id: uuid::Uuid,
    ) -> Result<Option<WebhookRow>, WebhookRepositoryError>;
    /// Create a webhook and return exactly what was stored in the database.
    async fn insert(&self, row: &WebhookRow) -> Result<WebhookRow, WebhookRepositoryError>;
    /// IDs of every webhook belonging to `owner_id`.
    async fn list_ids_by_owner(
        &self,
        owner_id: uuid::Uuid,
    ) -> Result<Vec<uuid::Uuid>, WebhookRepositoryError>;
}
