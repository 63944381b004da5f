use crate::domain::value_objects::ids::{JobId, WebhookId};
use crate::domain::value_objects::timestamps::Timestamp;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Dead,
}

impl JobStatus {
    pub const ALL: [JobStatus; 5] = [
        JobStatus::Pending,
        JobStatus::Processing,
        JobStatus::Completed,
        JobStatus::Failed,
        JobStatus::Dead,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Dead => "dead",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(JobStatus::Pending),
            "processing" => Some(JobStatus::Processing),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            "dead" => Some(JobStatus::Dead),
            _ => None,
        }
    }

    /// Completed, failed and dead jobs carry a `completed_at` stamp.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Dead
        )
    }

    /// States from which an owner may force an immediate attempt.
    pub fn allows_manual_run(&self) -> bool {
        matches!(
            self,
            JobStatus::Pending | JobStatus::Failed | JobStatus::Dead
        )
    }
}

/// One queued delivery of an event payload to a single webhook.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookJob {
    pub id: JobId,
    pub webhook_id: WebhookId,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub status: JobStatus,
    pub retry_count: u32,
    pub max_retries: u32,
    pub next_retry_at: Option<Timestamp>,
    pub last_error: Option<String>,
    pub created_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
}

impl WebhookJob {
    /// Build a job as a producer would enqueue it.
    pub fn new_pending(
        webhook_id: WebhookId,
        event_type: impl Into<String>,
        payload: serde_json::Value,
        max_retries: u32,
    ) -> Self {
        Self {
            id: JobId::new(),
            webhook_id,
            event_type: event_type.into(),
            payload,
            status: JobStatus::Pending,
            retry_count: 0,
            max_retries,
            next_retry_at: None,
            last_error: None,
            created_at: Timestamp::now_utc(),
            started_at: None,
            completed_at: None,
        }
    }

    /// Ordinal of the attempt currently being made.
    pub fn attempt_number(&self) -> u32 {
        self.retry_count.saturating_add(1)
    }

    pub fn is_due(&self, now: Timestamp) -> bool {
        self.status == JobStatus::Pending && self.next_retry_at.map_or(true, |at| at <= now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    #[test]
    fn given_every_status_when_round_tripped_through_str_should_match() {
        for status in JobStatus::ALL {
            assert_eq!(JobStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(JobStatus::parse("queued"), None);
    }

    #[test]
    fn given_statuses_when_checking_manual_run_should_exclude_completed_and_processing() {
        assert!(JobStatus::Pending.allows_manual_run());
        assert!(JobStatus::Failed.allows_manual_run());
        assert!(JobStatus::Dead.allows_manual_run());
        assert!(!JobStatus::Completed.allows_manual_run());
        assert!(!JobStatus::Processing.allows_manual_run());
    }

    #[test]
    fn given_future_retry_when_checking_due_should_not_be_due() {
        let now = Timestamp::now_utc();
        let mut job =
            WebhookJob::new_pending(WebhookId::new(), "order.created", serde_json::json!({}), 3);
        assert!(job.is_due(now));

        job.next_retry_at = Some(now.plus(Duration::minutes(5)));
        assert!(!job.is_due(now));

        job.next_retry_at = Some(now.minus(Duration::seconds(1)));
        assert!(job.is_due(now));
    }

    #[test]
    fn given_retry_count_when_attempt_number_should_be_one_based() {
        let mut job = WebhookJob::new_pending(WebhookId::new(), "e", serde_json::Value::Null, 3);
        assert_eq!(job.attempt_number(), 1);
        job.retry_count = 2;
        assert_eq!(job.attempt_number(), 3);
    }
}
