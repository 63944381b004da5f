use crate::infrastructure::db::database::DatabaseError;
use crate::infrastructure::db::dto::{StatusCountRow, WebhookJobRow};
use async_trait::async_trait;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookJobRepositoryError {
    NotFound,
    Conflict,
    InvalidInput,
    StorageUnavailable,
}

impl From<DatabaseError> for WebhookJobRepositoryError {
    fn from(_: DatabaseError) -> Self {
        WebhookJobRepositoryError::StorageUnavailable
    }
}

/// Visibility scope plus optional filters for listing and counting jobs.
///
/// `scope` is the set of webhook ids the caller owns; an empty scope matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobQuery {
    pub scope: Vec<uuid::Uuid>,
    pub webhook_id: Option<uuid::Uuid>,
    pub status: Option<String>,
}

impl JobQuery {
    pub fn matches(&self, row: &WebhookJobRow) -> bool {
        self.scope.contains(&row.webhook_id)
            && self.webhook_id.map_or(true, |id| id == row.webhook_id)
            && self.status.as_deref().map_or(true, |s| s == row.status)
    }
}

#[async_trait]
pub trait WebhookJobStore: Send + Sync {
    /// Enqueue a job and return exactly what was stored.
    async fn insert(
        &self,
        row: &WebhookJobRow,
    ) -> Result<WebhookJobRow, WebhookJobRepositoryError>;
    /// Fetch a job by its ID. Returns `None` if it doesn't exist.
    async fn get(
        &self,
        job_id: uuid::Uuid,
    ) -> Result<Option<WebhookJobRow>, WebhookJobRepositoryError>;
    /// Atomically move up to `limit` due pending jobs to `processing`.
    ///
    /// Concurrent callers never receive the same job.
    async fn claim_batch(
        &self,
        now: OffsetDateTime,
        limit: u32,
    ) -> Result<Vec<WebhookJobRow>, WebhookJobRepositoryError>;
    /// Move one pending, failed or dead job to `processing` for an immediate attempt.
    ///
    /// Terminal jobs get a fresh retry budget. Returns `None` when the job is not eligible.
    async fn claim_for_manual_run(
        &self,
        job_id: uuid::Uuid,
        now: OffsetDateTime,
    ) -> Result<Option<WebhookJobRow>, WebhookJobRepositoryError>;
    /// `processing` -> `completed`.
    async fn mark_completed(
        &self,
        job_id: uuid::Uuid,
        now: OffsetDateTime,
    ) -> Result<WebhookJobRow, WebhookJobRepositoryError>;
    /// `processing` -> `pending` with a scheduled retry.
    async fn mark_retryable(
        &self,
        job_id: uuid::Uuid,
        retry_count: i32,
        next_retry_at: OffsetDateTime,
        last_error: &str,
    ) -> Result<WebhookJobRow, WebhookJobRepositoryError>;
    /// `processing` -> `dead` once the retry budget is exhausted.
    async fn mark_dead(
        &self,
        job_id: uuid::Uuid,
        retry_count: i32,
        last_error: &str,
        now: OffsetDateTime,
    ) -> Result<WebhookJobRow, WebhookJobRepositoryError>;
    /// `processing` -> `failed` without consuming a retry.
    async fn mark_failed_terminal(
        &self,
        job_id: uuid::Uuid,
        last_error: &str,
        now: OffsetDateTime,
    ) -> Result<WebhookJobRow, WebhookJobRepositoryError>;
    /// Most recent jobs first.
    async fn list(
        &self,
        query: &JobQuery,
        limit: u32,
    ) -> Result<Vec<WebhookJobRow>, WebhookJobRepositoryError>;
    async fn count_by_status(
        &self,
        query: &JobQuery,
    ) -> Result<Vec<StatusCountRow>, WebhookJobRepositoryError>;
    async fn count_completed_since(
        &self,
        query: &JobQuery,
        since: OffsetDateTime,
    ) -> Result<i64, WebhookJobRepositoryError>;
    /// Delete dead jobs in `scope` whose `completed_at` is older than `older_than`.
    async fn purge_dead(
        &self,
        scope: &[uuid::Uuid],
        older_than: OffsetDateTime,
    ) -> Result<u64, WebhookJobRepositoryError>;
    /// Return jobs stuck in `processing` since before `started_before` to `pending`.
    async fn reclaim_stale(
        &self,
        started_before: OffsetDateTime,
        limit: u32,
    ) -> Result<u64, WebhookJobRepositoryError>;
}
