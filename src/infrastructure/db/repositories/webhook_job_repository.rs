use crate::domain::entities::webhook_job::{JobStatus, WebhookJob};
use crate::domain::value_objects::ids::{JobId, WebhookId};
use crate::domain::value_objects::timestamps::Timestamp;
use crate::infrastructure::db::dto::WebhookJobRow;
use crate::infrastructure::db::stores::webhook_job_store::{
    JobQuery, WebhookJobRepositoryError, WebhookJobStore,
};
use std::sync::Arc;

/// Owner-visible slice of the queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFilter {
    pub scope: Vec<WebhookId>,
    pub webhook_id: Option<WebhookId>,
    pub status: Option<JobStatus>,
}

impl JobFilter {
    pub fn for_scope(scope: Vec<WebhookId>) -> Self {
        Self {
            scope,
            ..Self::default()
        }
    }

    fn to_query(&self) -> JobQuery {
        JobQuery {
            scope: self.scope.iter().map(|id| id.0).collect(),
            webhook_id: self.webhook_id.map(|id| id.0),
            status: self.status.map(|s| s.as_str().to_string()),
        }
    }
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

pub struct WebhookJobRepository {
    store: Arc<dyn WebhookJobStore>,
}

impl WebhookJobRepository {
    /// Build a repository that uses the given store implementation.
    pub fn new(store: Arc<dyn WebhookJobStore>) -> Self {
        Self { store }
    }

    /// Enqueue a job and return what was actually stored.
    pub async fn insert(&self, job: &WebhookJob) -> Result<WebhookJob, WebhookJobRepositoryError> {
        let dto = WebhookJobRow::from_job(job);
        let stored = self.store.insert(&dto).await?;
        Ok(stored.into_job())
    }

    /// Fetch a job by its ID. Returns `None` if it doesn't exist.
    pub async fn get(
        &self,
        job_id: JobId,
    ) -> Result<Option<WebhookJob>, WebhookJobRepositoryError> {
        Ok(self.store.get(job_id.0).await?.map(WebhookJobRow::into_job))
    }

    /// Claim up to `limit` due jobs for this caller.
    pub async fn claim_batch(
        &self,
        now: Timestamp,
        limit: u32,
    ) -> Result<Vec<WebhookJob>, WebhookJobRepositoryError> {
        let rows = self.store.claim_batch(now.as_inner(), limit).await?;
        Ok(rows.into_iter().map(WebhookJobRow::into_job).collect())
    }

    pub async fn claim_for_manual_run(
        &self,
        job_id: JobId,
        now: Timestamp,
    ) -> Result<Option<WebhookJob>, WebhookJobRepositoryError> {
        let row = self.store.claim_for_manual_run(job_id.0, now.as_inner()).await?;
        Ok(row.map(WebhookJobRow::into_job))
    }

    pub async fn mark_completed(
        &self,
        job_id: JobId,
        now: Timestamp,
    ) -> Result<WebhookJob, WebhookJobRepositoryError> {
        let row = self.store.mark_completed(job_id.0, now.as_inner()).await?;
        Ok(row.into_job())
    }

    pub async fn mark_retryable(
        &self,
        job_id: JobId,
        retry_count: u32,
        next_retry_at: Timestamp,
        last_error: &str,
    ) -> Result<WebhookJob, WebhookJobRepositoryError> {
        let row = self
            .store
            .mark_retryable(
                job_id.0,
                to_i32(retry_count),
                next_retry_at.as_inner(),
                last_error,
            )
            .await?;
        Ok(row.into_job())
    }

    pub async fn mark_dead(
        &self,
        job_id: JobId,
        retry_count: u32,
        last_error: &str,
        now: Timestamp,
    ) -> Result<WebhookJob, WebhookJobRepositoryError> {
        let row = self
            .store
            .mark_dead(job_id.0, to_i32(retry_count), last_error, now.as_inner())
            .await?;
        Ok(row.into_job())
    }

    pub async fn mark_failed_terminal(
        &self,
        job_id: JobId,
        last_error: &str,
        now: Timestamp,
    ) -> Result<WebhookJob, WebhookJobRepositoryError> {
        let row = self
            .store
            .mark_failed_terminal(job_id.0, last_error, now.as_inner())
            .await?;
        Ok(row.into_job())
    }

    pub async fn list(
        &self,
        filter: &JobFilter,
        limit: u32,
    ) -> Result<Vec<WebhookJob>, WebhookJobRepositoryError> {
        if filter.scope.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self.store.list(&filter.to_query(), limit).await?;
        Ok(rows.into_iter().map(WebhookJobRow::into_job).collect())
    }

    /// Count per status, always reporting every status (zero when absent).
    pub async fn count_by_status(
        &self,
        filter: &JobFilter,
    ) -> Result<Vec<(JobStatus, u64)>, WebhookJobRepositoryError> {
        let mut counts: Vec<(JobStatus, u64)> =
            JobStatus::ALL.iter().map(|status| (*status, 0)).collect();
        if filter.scope.is_empty() {
            return Ok(counts);
        }
        for row in self.store.count_by_status(&filter.to_query()).await? {
            let Some(status) = JobStatus::parse(&row.status) else {
                continue;
            };
            if let Some(slot) = counts.iter_mut().find(|(s, _)| *s == status) {
                slot.1 += row.count.max(0) as u64;
            }
        }
        Ok(counts)
    }

    pub async fn count_completed_since(
        &self,
        filter: &JobFilter,
        since: Timestamp,
    ) -> Result<u64, WebhookJobRepositoryError> {
        if filter.scope.is_empty() {
            return Ok(0);
        }
        let count = self
            .store
            .count_completed_since(&filter.to_query(), since.as_inner())
            .await?;
        Ok(count.max(0) as u64)
    }

    pub async fn purge_dead(
        &self,
        scope: &[WebhookId],
        older_than: Timestamp,
    ) -> Result<u64, WebhookJobRepositoryError> {
        if scope.is_empty() {
            return Ok(0);
        }
        let ids: Vec<uuid::Uuid> = scope.iter().map(|id| id.0).collect();
        self.store.purge_dead(&ids, older_than.as_inner()).await
    }

    pub async fn reclaim_stale(
        &self,
        started_before: Timestamp,
        limit: u32,
    ) -> Result<u64, WebhookJobRepositoryError> {
        self.store
            .reclaim_stale(started_before.as_inner(), limit)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::{JobFilter, WebhookJobRepository};
    use crate::domain::entities::webhook_job::{JobStatus, WebhookJob};
    use crate::domain::value_objects::ids::WebhookId;
    use crate::domain::value_objects::timestamps::Timestamp;
    use crate::infrastructure::db::memory::WebhookJobStoreMemory;
    use std::sync::Arc;

    fn repo() -> WebhookJobRepository {
        WebhookJobRepository::new(Arc::new(WebhookJobStoreMemory::new()))
    }

    #[tokio::test]
    async fn given_empty_scope_when_count_by_status_should_report_all_zero() {
        let repo = repo();
        repo.insert(&WebhookJob::new_pending(
            WebhookId::new(),
            "order.created",
            serde_json::json!({}),
            3,
        ))
        .await
        .unwrap();

        let counts = repo.count_by_status(&JobFilter::default()).await.unwrap();

        assert_eq!(counts.len(), JobStatus::ALL.len());
        assert!(counts.iter().all(|(_, n)| *n == 0));
    }

    #[tokio::test]
    async fn given_claimed_job_when_mark_retryable_should_be_pending_with_schedule() {
        let repo = repo();
        let webhook_id = WebhookId::new();
        let job = repo
            .insert(&WebhookJob::new_pending(
                webhook_id,
                "order.created",
                serde_json::json!({"n": 1}),
                3,
            ))
            .await
            .unwrap();
        let now = Timestamp::now_utc();
        repo.claim_batch(now, 10).await.unwrap();

        let next = now.plus(time::Duration::seconds(30));
        let updated = repo
            .mark_retryable(job.id, 1, next, "HTTP 500: boom")
            .await
            .unwrap();

        assert_eq!(updated.status, JobStatus::Pending);
        assert_eq!(updated.retry_count, 1);
        assert_eq!(updated.next_retry_at, Some(next));
        assert_eq!(updated.last_error.as_deref(), Some("HTTP 500: boom"));
        let counts = repo
            .count_by_status(&JobFilter::for_scope(vec![webhook_id]))
            .await
            .unwrap();
        assert!(counts.contains(&(JobStatus::Pending, 1)));
    }
}
