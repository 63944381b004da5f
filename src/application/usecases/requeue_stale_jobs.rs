// Use case: requeue_stale_jobs.

use crate::application::context::AppContext;
use crate::domain::value_objects::timestamps::Timestamp;
use std::time::Duration;

/// Returns jobs abandoned in `processing` (crashed worker) to `pending`.
pub struct RequeueStaleJobsUseCase;

#[derive(Debug)]
pub enum RequeueStaleJobsError {
    Storage(String),
}

impl RequeueStaleJobsUseCase {
    /// Reclaim up to `limit` jobs that started more than `stale_after` ago.
    pub async fn execute(
        ctx: &AppContext,
        stale_after: Duration,
        limit: u32,
    ) -> Result<u64, RequeueStaleJobsError> {
        // Step 1: Compute the cutoff.
        let stale_after = time::Duration::try_from(stale_after)
            .map_err(|e| RequeueStaleJobsError::Storage(e.to_string()))?;
        let cutoff = Timestamp::now_utc().minus(stale_after);

        // Step 2: Reset matching jobs without spending a retry.
        let reclaimed = ctx
            .repos
            .job
            .reclaim_stale(cutoff, limit)
            .await
            .map_err(|e| RequeueStaleJobsError::Storage(format!("{e:?}")))?;

        if reclaimed > 0 {
            tracing::warn!(reclaimed, "returned stale processing jobs to pending");
        }
        Ok(reclaimed)
    }
}

#[cfg(test)]
mod tests {
    use super::RequeueStaleJobsUseCase;
    use crate::application::context::test_support::test_context;
    use crate::domain::entities::webhook_job::{JobStatus, WebhookJob};
    use crate::domain::value_objects::ids::WebhookId;
    use crate::domain::value_objects::timestamps::Timestamp;
    use std::time::Duration;

    #[tokio::test]
    async fn given_job_processing_too_long_when_requeue_should_return_it_to_pending() {
        let (ctx, _) = test_context();
        let job = ctx
            .repos
            .job
            .insert(&WebhookJob::new_pending(
                WebhookId::new(),
                "order.created",
                serde_json::json!({}),
                3,
            ))
            .await
            .unwrap();
        let long_ago = Timestamp::now_utc().minus(time::Duration::hours(2));
        ctx.repos.job.claim_batch(long_ago, 1).await.unwrap();

        let reclaimed = RequeueStaleJobsUseCase::execute(&ctx, Duration::from_secs(60), 10)
            .await
            .unwrap();

        assert_eq!(reclaimed, 1);
        let stored = ctx.repos.job.get(job.id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Pending);
        assert_eq!(stored.retry_count, 0);
    }

    #[tokio::test]
    async fn given_fresh_claim_when_requeue_should_leave_it_alone() {
        let (ctx, _) = test_context();
        ctx.repos
            .job
            .insert(&WebhookJob::new_pending(
                WebhookId::new(),
                "order.created",
                serde_json::json!({}),
                3,
            ))
            .await
            .unwrap();
        ctx.repos.job.claim_batch(Timestamp::now_utc(), 1).await.unwrap();

        let reclaimed = RequeueStaleJobsUseCase::execute(&ctx, Duration::from_secs(60), 10)
            .await
            .unwrap();

        assert_eq!(reclaimed, 0);
    }
}
