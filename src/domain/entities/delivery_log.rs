use crate::domain::value_objects::ids::{DeliveryLogId, JobId, WebhookId};
use crate::domain::value_objects::timestamps::Timestamp;

/// Append-only record of a single delivery attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryLog {
    pub id: DeliveryLogId,
    pub job_id: JobId,
    pub webhook_id: WebhookId,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub response_status: Option<u16>,
    pub response_body: Option<String>,
    pub error_message: Option<String>,
    pub success: bool,
    pub duration_ms: u64,
    pub attempt_number: u32,
    pub executed_at: Timestamp,
}

/// Success/latency aggregate over a window of delivery logs.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DeliveryWindowStats {
    pub total: u64,
    pub successes: u64,
    pub avg_duration_ms: f64,
}

/// Per-webhook volume inside a window, used for the top-N breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookVolume {
    pub webhook_id: WebhookId,
    pub total: u64,
    pub successes: u64,
    pub avg_duration_ms: f64,
}
