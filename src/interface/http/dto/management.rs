use crate::application::usecases::get_metrics::{JobMetrics, WebhookBreakdown};
use crate::domain::entities::webhook_job::{JobStatus, WebhookJob};
use crate::domain::value_objects::timestamps::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Body of `POST /api/webhook-jobs`, dispatched on `action`.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ManagementRequest {
    List {
        webhook_id: Option<uuid::Uuid>,
        status: Option<JobStatus>,
        limit: Option<u32>,
    },
    Metrics {
        webhook_id: Option<uuid::Uuid>,
        status: Option<JobStatus>,
    },
    RetryNow {
        job_id: uuid::Uuid,
    },
    PurgeDead {
        older_than_days: u32,
    },
}

#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub id: String,
    pub webhook_id: String,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub status: JobStatus,
    pub retry_count: u32,
    pub max_retries: u32,
    pub next_retry_at: Option<String>,
    pub last_error: Option<String>,
    pub created_at: String,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
}

impl From<WebhookJob> for JobResponse {
    fn from(job: WebhookJob) -> Self {
        let fmt = |ts: Option<Timestamp>| ts.map(|t| t.to_rfc3339());
        Self {
            id: job.id.to_string(),
            webhook_id: job.webhook_id.to_string(),
            event_type: job.event_type,
            payload: job.payload,
            status: job.status,
            retry_count: job.retry_count,
            max_retries: job.max_retries,
            next_retry_at: fmt(job.next_retry_at),
            last_error: job.last_error,
            created_at: job.created_at.to_rfc3339(),
            started_at: fmt(job.started_at),
            completed_at: fmt(job.completed_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListJobsResponse {
    pub jobs: Vec<JobResponse>,
}

#[derive(Debug, Serialize)]
pub struct WebhookBreakdownResponse {
    pub webhook_id: String,
    pub deliveries: u64,
    pub success_rate: f64,
    pub avg_duration_ms: f64,
}

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub counts: BTreeMap<&'static str, u64>,
    pub completed_last_window: u64,
    pub window_minutes: u64,
    pub throughput_per_minute: f64,
    pub success_rate: f64,
    pub avg_duration_ms: f64,
    pub top_webhooks: Vec<WebhookBreakdownResponse>,
}

impl From<JobMetrics> for MetricsResponse {
    fn from(metrics: JobMetrics) -> Self {
        Self {
            counts: metrics
                .counts
                .iter()
                .map(|(status, n)| (status.as_str(), *n))
                .collect(),
            completed_last_window: metrics.completed_last_window,
            window_minutes: metrics.window_minutes,
            throughput_per_minute: metrics.throughput_per_minute,
            success_rate: metrics.success_rate,
            avg_duration_ms: metrics.avg_duration_ms,
            top_webhooks: metrics
                .top_webhooks
                .into_iter()
                .map(|b: WebhookBreakdown| WebhookBreakdownResponse {
                    webhook_id: b.webhook_id.to_string(),
                    deliveries: b.deliveries,
                    success_rate: b.success_rate,
                    avg_duration_ms: b.avg_duration_ms,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RetryNowResponse {
    pub outcome: &'static str,
    pub job: JobResponse,
}

#[derive(Debug, Serialize)]
pub struct PurgeDeadResponse {
    pub deleted: u64,
}

#[cfg(test)]
mod tests {
    use super::ManagementRequest;
    use crate::domain::entities::webhook_job::JobStatus;

    #[test]
    fn given_tagged_bodies_when_parsed_should_pick_matching_variant() {
        let list: ManagementRequest =
            serde_json::from_str(r#"{"action":"list","status":"dead","limit":5}"#).unwrap();
        let purge: ManagementRequest =
            serde_json::from_str(r#"{"action":"purge_dead","older_than_days":30}"#).unwrap();

        assert_eq!(
            list,
            ManagementRequest::List {
                webhook_id: None,
                status: Some(JobStatus::Dead),
                limit: Some(5),
            }
        );
        assert_eq!(purge, ManagementRequest::PurgeDead { older_than_days: 30 });
    }

    #[test]
    fn given_unknown_action_or_status_when_parsed_should_fail() {
        assert!(serde_json::from_str::<ManagementRequest>(r#"{"action":"drop_all"}"#).is_err());
        assert!(
            serde_json::from_str::<ManagementRequest>(r#"{"action":"list","status":"lost"}"#)
                .is_err()
        );
    }
}
