// Use case: get_metrics.

use crate::application::context::AppContext;
use crate::domain::entities::delivery_log::WebhookVolume;
use crate::domain::entities::webhook_job::JobStatus;
use crate::domain::value_objects::ids::{OwnerId, WebhookId};
use crate::domain::value_objects::timestamps::Timestamp;
use crate::domain::workflows::delivery_stats::{round2, success_rate, throughput_per_minute};
use crate::infrastructure::db::repositories::webhook_job_repository::JobFilter;

pub const WINDOW_MINUTES: u64 = 60;
pub const TOP_WEBHOOKS: u32 = 10;

/// Read-only delivery statistics over the owner's webhooks.
pub struct GetMetricsUseCase;

#[derive(Debug)]
pub enum GetMetricsError {
    Storage(String),
}

#[derive(Debug, Clone, Default)]
pub struct GetMetricsInput {
    pub webhook_id: Option<WebhookId>,
    pub status: Option<JobStatus>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WebhookBreakdown {
    pub webhook_id: WebhookId,
    pub deliveries: u64,
    pub success_rate: f64,
    pub avg_duration_ms: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobMetrics {
    pub counts: Vec<(JobStatus, u64)>,
    pub completed_last_window: u64,
    pub window_minutes: u64,
    pub throughput_per_minute: f64,
    /// Percentage of successful attempts in the window.
    pub success_rate: f64,
    pub avg_duration_ms: f64,
    pub top_webhooks: Vec<WebhookBreakdown>,
}

impl GetMetricsUseCase {
    pub async fn execute(
        ctx: &AppContext,
        owner_id: OwnerId,
        input: GetMetricsInput,
    ) -> Result<JobMetrics, GetMetricsError> {
        // Step 1: Resolve the owner's scope.
        let scope = ctx
            .repos
            .webhook
            .scope_for_owner(owner_id)
            .await
            .map_err(|e| GetMetricsError::Storage(format!("{e:?}")))?;
        let filter = JobFilter {
            scope: scope.clone(),
            webhook_id: input.webhook_id,
            status: input.status,
        };
        let since = Timestamp::now_utc().minus(time::Duration::minutes(WINDOW_MINUTES as i64));

        // Step 2: Queue-side numbers.
        let counts = ctx
            .repos
            .job
            .count_by_status(&filter)
            .await
            .map_err(|e| GetMetricsError::Storage(format!("{e:?}")))?;
        let completed = ctx
            .repos
            .job
            .count_completed_since(&filter, since)
            .await
            .map_err(|e| GetMetricsError::Storage(format!("{e:?}")))?;

        // Step 3: Attempt-side numbers from the delivery log.
        let window = ctx
            .repos
            .delivery_log
            .window_stats(&scope, input.webhook_id, since)
            .await
            .map_err(|e| GetMetricsError::Storage(format!("{e:?}")))?;
        let top = ctx
            .repos
            .delivery_log
            .top_webhooks(&scope, input.webhook_id, since, TOP_WEBHOOKS)
            .await
            .map_err(|e| GetMetricsError::Storage(format!("{e:?}")))?;

        Ok(JobMetrics {
            counts,
            completed_last_window: completed,
            window_minutes: WINDOW_MINUTES,
            throughput_per_minute: round2(throughput_per_minute(completed, WINDOW_MINUTES)),
            success_rate: round2(success_rate(window.successes, window.total) * 100.0),
            avg_duration_ms: round2(window.avg_duration_ms),
            top_webhooks: top.into_iter().map(breakdown).collect(),
        })
    }
}

fn breakdown(volume: WebhookVolume) -> WebhookBreakdown {
    WebhookBreakdown {
        webhook_id: volume.webhook_id,
        deliveries: volume.total,
        success_rate: round2(success_rate(volume.successes, volume.total) * 100.0),
        avg_duration_ms: round2(volume.avg_duration_ms),
    }
}

#[cfg(test)]
mod tests {
    use super::{GetMetricsInput, GetMetricsUseCase};
    use crate::application::context::test_support::test_context;
    use crate::domain::entities::delivery_log::DeliveryLog;
    use crate::domain::entities::webhook::Webhook;
    use crate::domain::entities::webhook_job::{JobStatus, WebhookJob};
    use crate::domain::value_objects::ids::{DeliveryLogId, JobId, OwnerId, WebhookId, WorkspaceId};
    use crate::domain::value_objects::timestamps::Timestamp;
    use std::collections::BTreeMap;

    fn webhook(owner_id: OwnerId) -> Webhook {
        Webhook {
            id: WebhookId::new(),
            owner_id,
            workspace_id: WorkspaceId::new(),
            name: "orders".to_string(),
            url: "https://example.test".to_string(),
            headers: BTreeMap::new(),
            is_active: true,
            timeout_seconds: 5,
        }
    }

    #[tokio::test]
    async fn given_no_activity_when_get_metrics_should_return_zeros() {
        let (ctx, _) = test_context();

        let metrics = GetMetricsUseCase::execute(&ctx, OwnerId::new(), GetMetricsInput::default())
            .await
            .unwrap();

        assert!(metrics.counts.iter().all(|(_, n)| *n == 0));
        assert_eq!(metrics.completed_last_window, 0);
        assert_eq!(metrics.throughput_per_minute, 0.0);
        assert_eq!(metrics.success_rate, 0.0);
        assert!(metrics.top_webhooks.is_empty());
    }

    #[tokio::test]
    async fn given_logs_and_jobs_when_get_metrics_should_aggregate_window() {
        let (ctx, _) = test_context();
        let owner = OwnerId::new();
        let hook = ctx.repos.webhook.insert(&webhook(owner)).await.unwrap();
        ctx.repos
            .job
            .insert(&WebhookJob::new_pending(hook.id, "order.created", serde_json::json!({}), 3))
            .await
            .unwrap();
        for (success, duration_ms) in [(true, 100), (true, 200), (false, 300), (true, 400)] {
            ctx.repos
                .delivery_log
                .append(&DeliveryLog {
                    id: DeliveryLogId::new(),
                    job_id: JobId::new(),
                    webhook_id: hook.id,
                    event_type: "order.created".to_string(),
                    payload: serde_json::json!({}),
                    response_status: Some(if success { 200 } else { 500 }),
                    response_body: None,
                    error_message: None,
                    success,
                    duration_ms,
                    attempt_number: 1,
                    executed_at: Timestamp::now_utc(),
                })
                .await
                .unwrap();
        }

        let metrics = GetMetricsUseCase::execute(&ctx, owner, GetMetricsInput::default())
            .await
            .unwrap();

        assert!(metrics.counts.contains(&(JobStatus::Pending, 1)));
        assert_eq!(metrics.success_rate, 75.0);
        assert_eq!(metrics.avg_duration_ms, 250.0);
        assert_eq!(metrics.top_webhooks.len(), 1);
        assert_eq!(metrics.top_webhooks[0].deliveries, 4);
    }
}
