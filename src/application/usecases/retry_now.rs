// Use case: retry_now.

use crate::application::context::AppContext;
use crate::application::usecases::execute_job::{ExecuteJobUseCase, JobOutcome};
use crate::domain::entities::webhook_job::{JobStatus, WebhookJob};
use crate::domain::value_objects::ids::{JobId, OwnerId};
use crate::domain::value_objects::timestamps::Timestamp;

/// Runs one attempt for a job right now, ignoring its backoff schedule.
///
/// Pending, failed and dead jobs are accepted; terminal ones get a fresh retry budget.
/// Completed and in-flight jobs are refused.
pub struct RetryNowUseCase;

#[derive(Debug)]
pub enum RetryNowError {
    NotFound,
    Conflict(JobStatus),
    Storage(String),
}

#[derive(Debug, Clone)]
pub struct RetryNowResult {
    pub outcome: JobOutcome,
    pub job: WebhookJob,
}

impl RetryNowUseCase {
    pub async fn execute(
        ctx: &AppContext,
        owner_id: OwnerId,
        job_id: JobId,
    ) -> Result<RetryNowResult, RetryNowError> {
        // Step 1: Load the job and make sure the caller owns its webhook.
        let job = ctx
            .repos
            .job
            .get(job_id)
            .await
            .map_err(|e| RetryNowError::Storage(format!("{e:?}")))?
            .ok_or(RetryNowError::NotFound)?;
        let webhook = ctx
            .repos
            .webhook
            .get(job.webhook_id)
            .await
            .map_err(|e| RetryNowError::Storage(format!("{e:?}")))?;
        if webhook.map_or(true, |w| w.owner_id != owner_id) {
            return Err(RetryNowError::NotFound);
        }

        // Step 2: Claim it for this caller.
        if !job.status.allows_manual_run() {
            return Err(RetryNowError::Conflict(job.status));
        }
        let Some(claimed) = ctx
            .repos
            .job
            .claim_for_manual_run(job_id, Timestamp::now_utc())
            .await
            .map_err(|e| RetryNowError::Storage(format!("{e:?}")))?
        else {
            // Lost a race with a batch worker.
            return Err(RetryNowError::Conflict(JobStatus::Processing));
        };

        // Step 3: Deliver synchronously.
        let outcome = ExecuteJobUseCase::execute(ctx, &claimed)
            .await
            .map_err(|e| RetryNowError::Storage(format!("{e:?}")))?;

        // Step 4: Return the job as it is now.
        let job = ctx
            .repos
            .job
            .get(job_id)
            .await
            .map_err(|e| RetryNowError::Storage(format!("{e:?}")))?
            .ok_or(RetryNowError::NotFound)?;

        tracing::info!(job_id = %job_id, outcome = outcome.as_str(), "manual retry finished");
        Ok(RetryNowResult { outcome, job })
    }
}

#[cfg(test)]
mod tests {
    use super::{RetryNowError, RetryNowUseCase};
    use crate::application::context::test_support::test_context;
    use crate::domain::entities::webhook::Webhook;
    use crate::domain::entities::webhook_job::{JobStatus, WebhookJob};
    use crate::domain::value_objects::ids::{JobId, OwnerId, WebhookId, WorkspaceId};
    use std::collections::BTreeMap;

    fn webhook(owner_id: OwnerId) -> Webhook {
        Webhook {
            id: WebhookId::new(),
            owner_id,
            workspace_id: WorkspaceId::new(),
            name: "orders".to_string(),
            url: "http://127.0.0.1:1/hook".to_string(),
            headers: BTreeMap::new(),
            is_active: true,
            timeout_seconds: 2,
        }
    }

    #[tokio::test]
    async fn given_unknown_job_when_retry_now_should_return_not_found() {
        let (ctx, _) = test_context();

        let result = RetryNowUseCase::execute(&ctx, OwnerId::new(), JobId::new()).await;

        assert!(matches!(result, Err(RetryNowError::NotFound)));
    }

    #[tokio::test]
    async fn given_job_of_other_owner_when_retry_now_should_hide_it() {
        let (ctx, _) = test_context();
        let hook = ctx.repos.webhook.insert(&webhook(OwnerId::new())).await.unwrap();
        let job = ctx
            .repos
            .job
            .insert(&WebhookJob::new_pending(hook.id, "order.created", serde_json::json!({}), 3))
            .await
            .unwrap();

        let result = RetryNowUseCase::execute(&ctx, OwnerId::new(), job.id).await;

        assert!(matches!(result, Err(RetryNowError::NotFound)));
    }

    #[tokio::test]
    async fn given_pending_job_when_retry_now_should_attempt_immediately() {
        let (ctx, _) = test_context();
        let owner = OwnerId::new();
        let hook = ctx.repos.webhook.insert(&webhook(owner)).await.unwrap();
        let job = ctx
            .repos
            .job
            .insert(&WebhookJob::new_pending(hook.id, "order.created", serde_json::json!({}), 3))
            .await
            .unwrap();

        let result = RetryNowUseCase::execute(&ctx, owner, job.id).await.unwrap();

        assert_eq!(result.job.status, JobStatus::Pending);
        assert_eq!(result.job.retry_count, 1);
        let logs = ctx.repos.delivery_log.list_by_job(job.id).await.unwrap();
        assert_eq!(logs.len(), 1);
    }
}
