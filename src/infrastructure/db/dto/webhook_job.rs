use crate::domain::entities::webhook_job::{JobStatus, WebhookJob};
use crate::domain::value_objects::ids::{JobId, WebhookId};
use crate::domain::value_objects::timestamps::Timestamp;
use time::OffsetDateTime;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WebhookJobRow {
    pub id: uuid::Uuid,
    pub webhook_id: uuid::Uuid,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub status: String,
    pub retry_count: i32,
    pub max_retries: i32,
    pub next_retry_at: Option<OffsetDateTime>,
    pub last_error: Option<String>,
    pub created_at: OffsetDateTime,
    pub started_at: Option<OffsetDateTime>,
    pub completed_at: Option<OffsetDateTime>,
}

/// One `(status, count)` pair from a grouped count.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct StatusCountRow {
    pub status: String,
    pub count: i64,
}

impl WebhookJobRow {
    pub fn from_job(job: &WebhookJob) -> Self {
        Self {
            id: job.id.0,
            webhook_id: job.webhook_id.0,
            event_type: job.event_type.clone(),
            payload: job.payload.clone(),
            status: job.status.as_str().to_string(),
            retry_count: i32::try_from(job.retry_count).unwrap_or(i32::MAX),
            max_retries: i32::try_from(job.max_retries).unwrap_or(i32::MAX),
            next_retry_at: job.next_retry_at.map(|t| t.as_inner()),
            last_error: job.last_error.clone(),
            created_at: job.created_at.as_inner(),
            started_at: job.started_at.map(|t| t.as_inner()),
            completed_at: job.completed_at.map(|t| t.as_inner()),
        }
    }

    pub fn into_job(self) -> WebhookJob {
        WebhookJob {
            id: JobId(self.id),
            webhook_id: WebhookId(self.webhook_id),
            event_type: self.event_type,
            payload: self.payload,
            // the table constrains status; anything else is treated as terminal
            status: JobStatus::parse(&self.status).unwrap_or(JobStatus::Failed),
            retry_count: self.retry_count.max(0) as u32,
            max_retries: self.max_retries.max(0) as u32,
            next_retry_at: self.next_retry_at.map(Timestamp::from),
            last_error: self.last_error,
            created_at: Timestamp::from(self.created_at),
            started_at: self.started_at.map(Timestamp::from),
            completed_at: self.completed_at.map(Timestamp::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::WebhookJobRow;
    use crate::domain::entities::webhook_job::{JobStatus, WebhookJob};
    use crate::domain::value_objects::ids::WebhookId;
    use crate::domain::value_objects::timestamps::Timestamp;

    #[test]
    fn given_retrying_job_when_mapped_to_row_and_back_should_preserve_fields() {
        let mut job = WebhookJob::new_pending(
            WebhookId::new(),
            "invoice.paid",
            serde_json::json!({"amount": 42}),
            5,
        );
        job.retry_count = 2;
        job.next_retry_at = Some(Timestamp::now_utc());
        job.last_error = Some("HTTP 502".to_string());

        let row = WebhookJobRow::from_job(&job);
        assert_eq!(row.status, "pending");
        assert_eq!(row.retry_count, 2);

        let back = row.into_job();
        assert_eq!(back, job);
    }

    #[test]
    fn given_unknown_status_when_into_job_should_fall_back_to_failed() {
        let job = WebhookJob::new_pending(WebhookId::new(), "e", serde_json::Value::Null, 1);
        let mut row = WebhookJobRow::from_job(&job);
        row.status = "archived".to_string();

        assert_eq!(row.into_job().status, JobStatus::Failed);
    }
}
