use crate::infrastructure::db::database::DatabaseError;
use crate::infrastructure::db::dto::{DeliveryLogRow, DeliveryWindowStatsRow, WebhookVolumeRow};
use async_trait::async_trait;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryLogRepositoryError {
    InvalidInput,
    StorageUnavailable,
}

impl From<DatabaseError> for DeliveryLogRepositoryError {
    fn from(_: DatabaseError) -> Self {
        DeliveryLogRepositoryError::StorageUnavailable
    }
}

/// Append-only attempt log.
#[async_trait]
pub trait DeliveryLogStore: Send + Sync {
    async fn insert(
        &self,
        row: &DeliveryLogRow,
    ) -> Result<DeliveryLogRow, DeliveryLogRepositoryError>;
    /// Attempts for one job, oldest first.
    async fn list_by_job(
        &self,
        job_id: uuid::Uuid,
    ) -> Result<Vec<DeliveryLogRow>, DeliveryLogRepositoryError>;
    /// Totals over `scope` (optionally narrowed to one webhook) since `since`.
    async fn window_stats(
        &self,
        scope: &[uuid::Uuid],
        webhook_id: Option<uuid::Uuid>,
        since: OffsetDateTime,
    ) -> Result<DeliveryWindowStatsRow, DeliveryLogRepositoryError>;
    /// Per-webhook totals since `since`, highest volume first.
    async fn per_webhook_stats(
        &self,
        scope: &[uuid::Uuid],
        webhook_id: Option<uuid::Uuid>,
        since: OffsetDateTime,
        limit: u32,
    ) -> Result<Vec<WebhookVolumeRow>, DeliveryLogRepositoryError>;
}
