use crate::infrastructure::db::dto::{DeliveryLogRow, DeliveryWindowStatsRow, WebhookVolumeRow};
use crate::infrastructure::db::stores::delivery_log_store::{
    DeliveryLogRepositoryError, DeliveryLogStore,
};
use async_trait::async_trait;
use std::collections::HashMap;
use time::OffsetDateTime;
use tokio::sync::Mutex;

#[derive(Default)]
pub struct DeliveryLogStoreMemory {
    logs: Mutex<Vec<DeliveryLogRow>>,
}

impl DeliveryLogStoreMemory {
    pub fn new() -> Self {
        Self::default()
    }
}

fn in_window(
    row: &DeliveryLogRow,
    scope: &[uuid::Uuid],
    webhook_id: Option<uuid::Uuid>,
    since: OffsetDateTime,
) -> bool {
    scope.contains(&row.webhook_id)
        && webhook_id.map_or(true, |id| id == row.webhook_id)
        && row.executed_at >= since
}

#[derive(Default)]
struct Tally {
    total: i64,
    successes: i64,
    duration_sum: i64,
}

impl Tally {
    fn add(&mut self, row: &DeliveryLogRow) {
        self.total += 1;
        self.successes += i64::from(row.success);
        self.duration_sum += row.duration_ms;
    }

    fn avg(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.duration_sum as f64 / self.total as f64
        }
    }
}

#[async_trait]
impl DeliveryLogStore for DeliveryLogStoreMemory {
    async fn insert(
        &self,
        row: &DeliveryLogRow,
    ) -> Result<DeliveryLogRow, DeliveryLogRepositoryError> {
        self.logs.lock().await.push(row.clone());
        Ok(row.clone())
    }

    async fn list_by_job(
        &self,
        job_id: uuid::Uuid,
    ) -> Result<Vec<DeliveryLogRow>, DeliveryLogRepositoryError> {
        let logs = self.logs.lock().await;
        Ok(logs.iter().filter(|l| l.job_id == job_id).cloned().collect())
    }

    async fn window_stats(
        &self,
        scope: &[uuid::Uuid],
        webhook_id: Option<uuid::Uuid>,
        since: OffsetDateTime,
    ) -> Result<DeliveryWindowStatsRow, DeliveryLogRepositoryError> {
        let logs = self.logs.lock().await;
        let mut tally = Tally::default();
        for row in logs.iter().filter(|r| in_window(r, scope, webhook_id, since)) {
            tally.add(row);
        }
        Ok(DeliveryWindowStatsRow {
            total: tally.total,
            successes: tally.successes,
            avg_duration_ms: tally.avg(),
        })
    }

    async fn per_webhook_stats(
        &self,
        scope: &[uuid::Uuid],
        webhook_id: Option<uuid::Uuid>,
        since: OffsetDateTime,
        limit: u32,
    ) -> Result<Vec<WebhookVolumeRow>, DeliveryLogRepositoryError> {
        let logs = self.logs.lock().await;
        let mut per_webhook: HashMap<uuid::Uuid, Tally> = HashMap::new();
        for row in logs.iter().filter(|r| in_window(r, scope, webhook_id, since)) {
            per_webhook.entry(row.webhook_id).or_default().add(row);
        }
        let mut rows: Vec<WebhookVolumeRow> = per_webhook
            .into_iter()
            .map(|(webhook_id, tally)| WebhookVolumeRow {
                webhook_id,
                total: tally.total,
                successes: tally.successes,
                avg_duration_ms: tally.avg(),
            })
            .collect();
        rows.sort_by(|a, b| b.total.cmp(&a.total).then(a.webhook_id.cmp(&b.webhook_id)));
        rows.truncate(limit as usize);
        Ok(rows)
    }
}
