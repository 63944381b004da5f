use crate::domain::entities::delivery_log::{DeliveryLog, DeliveryWindowStats, WebhookVolume};
use crate::domain::value_objects::ids::{DeliveryLogId, JobId, WebhookId};
use crate::domain::value_objects::timestamps::Timestamp;
use time::OffsetDateTime;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DeliveryLogRow {
    pub id: uuid::Uuid,
    pub job_id: uuid::Uuid,
    pub webhook_id: uuid::Uuid,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub response_status: Option<i32>,
    pub response_body: Option<String>,
    pub error_message: Option<String>,
    pub success: bool,
    pub duration_ms: i64,
    pub attempt_number: i32,
    pub executed_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, sqlx::FromRow)]
pub struct DeliveryWindowStatsRow {
    pub total: i64,
    pub successes: i64,
    pub avg_duration_ms: f64,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct WebhookVolumeRow {
    pub webhook_id: uuid::Uuid,
    pub total: i64,
    pub successes: i64,
    pub avg_duration_ms: f64,
}

impl DeliveryLogRow {
    pub fn from_log(log: &DeliveryLog) -> Self {
        Self {
            id: log.id.0,
            job_id: log.job_id.0,
            webhook_id: log.webhook_id.0,
            event_type: log.event_type.clone(),
            payload: log.payload.clone(),
            response_status: log.response_status.map(i32::from),
            response_body: log.response_body.clone(),
            error_message: log.error_message.clone(),
            success: log.success,
            duration_ms: i64::try_from(log.duration_ms).unwrap_or(i64::MAX),
            attempt_number: i32::try_from(log.attempt_number).unwrap_or(i32::MAX),
            executed_at: log.executed_at.as_inner(),
        }
    }

    pub fn into_log(self) -> DeliveryLog {
        DeliveryLog {
            id: DeliveryLogId(self.id),
            job_id: JobId(self.job_id),
            webhook_id: WebhookId(self.webhook_id),
            event_type: self.event_type,
            payload: self.payload,
            response_status: self.response_status.and_then(|s| u16::try_from(s).ok()),
            response_body: self.response_body,
            error_message: self.error_message,
            success: self.success,
            duration_ms: self.duration_ms.max(0) as u64,
            attempt_number: self.attempt_number.max(0) as u32,
            executed_at: Timestamp::from(self.executed_at),
        }
    }
}

impl DeliveryWindowStatsRow {
    pub fn into_stats(self) -> DeliveryWindowStats {
        DeliveryWindowStats {
            total: self.total.max(0) as u64,
            successes: self.successes.max(0) as u64,
            avg_duration_ms: self.avg_duration_ms,
        }
    }
}

impl WebhookVolumeRow {
    pub fn into_volume(self) -> WebhookVolume {
        WebhookVolume {
            webhook_id: WebhookId(self.webhook_id),
            total: self.total.max(0) as u64,
            successes: self.successes.max(0) as u64,
            avg_duration_ms: self.avg_duration_ms,
        }
    }
}
