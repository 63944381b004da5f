use crate::domain::entities::delivery_log::{DeliveryLog, DeliveryWindowStats, WebhookVolume};
use crate::domain::value_objects::ids::{JobId, WebhookId};
use crate::domain::value_objects::timestamps::Timestamp;
use crate::infrastructure::db::dto::{DeliveryLogRow, WebhookVolumeRow};
use crate::infrastructure::db::stores::delivery_log_store::{
    DeliveryLogRepositoryError, DeliveryLogStore,
};
use std::sync::Arc;

pub struct DeliveryLogRepository {
    store: Arc<dyn DeliveryLogStore>,
}

impl DeliveryLogRepository {
    /// Build a repository that uses the given store implementation.
    pub fn new(store: Arc<dyn DeliveryLogStore>) -> Self {
        Self { store }
    }

    /// Append one attempt record.
    pub async fn append(
        &self,
        log: &DeliveryLog,
    ) -> Result<DeliveryLog, DeliveryLogRepositoryError> {
        let stored = self.store.insert(&DeliveryLogRow::from_log(log)).await?;
        Ok(stored.into_log())
    }

    /// Attempts for a job, oldest first.
    pub async fn list_by_job(
        &self,
        job_id: JobId,
    ) -> Result<Vec<DeliveryLog>, DeliveryLogRepositoryError> {
        let rows = self.store.list_by_job(job_id.0).await?;
        Ok(rows.into_iter().map(DeliveryLogRow::into_log).collect())
    }

    pub async fn window_stats(
        &self,
        scope: &[WebhookId],
        webhook_id: Option<WebhookId>,
        since: Timestamp,
    ) -> Result<DeliveryWindowStats, DeliveryLogRepositoryError> {
        if scope.is_empty() {
            return Ok(DeliveryWindowStats::default());
        }
        let ids: Vec<uuid::Uuid> = scope.iter().map(|id| id.0).collect();
        let row = self
            .store
            .window_stats(&ids, webhook_id.map(|id| id.0), since.as_inner())
            .await?;
        Ok(row.into_stats())
    }

    /// Busiest webhooks in the window, highest volume first.
    pub async fn top_webhooks(
        &self,
        scope: &[WebhookId],
        webhook_id: Option<WebhookId>,
        since: Timestamp,
        limit: u32,
    ) -> Result<Vec<WebhookVolume>, DeliveryLogRepositoryError> {
        if scope.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<uuid::Uuid> = scope.iter().map(|id| id.0).collect();
        let rows = self
            .store
            .per_webhook_stats(&ids, webhook_id.map(|id| id.0), since.as_inner(), limit)
            .await?;
        Ok(rows.into_iter().map(WebhookVolumeRow::into_volume).collect())
    }
}
