// Use case: purge_dead.

use crate::application::context::AppContext;
use crate::domain::value_objects::ids::OwnerId;
use crate::domain::value_objects::timestamps::Timestamp;

/// Upper bound on `older_than_days`; larger values are clamped to it.
pub const MAX_PURGE_DAYS: u32 = 36_500;

/// Deletes an owner's dead-lettered jobs older than a number of days.
pub struct PurgeDeadUseCase;

#[derive(Debug)]
pub enum PurgeDeadError {
    Storage(String),
}

impl PurgeDeadUseCase {
    /// Returns how many jobs were removed.
    pub async fn execute(
        ctx: &AppContext,
        owner_id: OwnerId,
        older_than_days: u32,
    ) -> Result<u64, PurgeDeadError> {
        // Step 1: Resolve the owner's scope.
        let scope = ctx
            .repos
            .webhook
            .scope_for_owner(owner_id)
            .await
            .map_err(|e| PurgeDeadError::Storage(format!("{e:?}")))?;

        // Step 2: Delete dead jobs that died before the cutoff.
        let days = older_than_days.min(MAX_PURGE_DAYS);
        let cutoff = Timestamp::now_utc().minus(time::Duration::days(i64::from(days)));
        let deleted = ctx
            .repos
            .job
            .purge_dead(&scope, cutoff)
            .await
            .map_err(|e| PurgeDeadError::Storage(format!("{e:?}")))?;

        tracing::info!(owner_id = %owner_id, older_than_days, deleted, "purged dead jobs");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::PurgeDeadUseCase;
    use crate::application::context::AppContext;
    use crate::application::context::test_support::test_context;
    use crate::domain::entities::webhook::Webhook;
    use crate::domain::entities::webhook_job::WebhookJob;
    use crate::domain::value_objects::ids::{JobId, OwnerId, WebhookId, WorkspaceId};
    use crate::domain::value_objects::timestamps::Timestamp;
    use std::collections::BTreeMap;

    async fn seed_dead_jobs(ctx: &AppContext, owners: &[OwnerId]) -> Vec<JobId> {
        let mut ids = Vec::new();
        for owner_id in owners.iter().copied() {
            let hook = ctx
                .repos
                .webhook
                .insert(&Webhook {
                    id: WebhookId::new(),
                    owner_id,
                    workspace_id: WorkspaceId::new(),
                    name: "orders".to_string(),
                    url: "https://example.test".to_string(),
                    headers: BTreeMap::new(),
                    is_active: true,
                    timeout_seconds: 5,
                })
                .await
                .unwrap();
            let job = ctx
                .repos
                .job
                .insert(&WebhookJob::new_pending(
                    hook.id,
                    "order.created",
                    serde_json::json!({}),
                    1,
                ))
                .await
                .unwrap();
            ctx.repos.job.claim_batch(Timestamp::now_utc(), 1).await.unwrap();
            ctx.repos
                .job
                .mark_dead(job.id, 1, "HTTP 500", Timestamp::now_utc())
                .await
                .unwrap();
            ids.push(job.id);
        }
        ids
    }

    #[tokio::test]
    async fn given_dead_jobs_of_two_owners_when_purge_should_only_delete_callers() {
        let (ctx, _) = test_context();
        let owner = OwnerId::new();
        let ids = seed_dead_jobs(&ctx, &[owner, OwnerId::new()]).await;

        let deleted = PurgeDeadUseCase::execute(&ctx, owner, 0).await.unwrap();

        assert_eq!(deleted, 1);
        assert!(ctx.repos.job.get(ids[0]).await.unwrap().is_none());
        assert!(ctx.repos.job.get(ids[1]).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn given_largest_day_count_when_purge_should_delete_nothing_without_panicking() {
        let (ctx, _) = test_context();
        let owner = OwnerId::new();
        let ids = seed_dead_jobs(&ctx, &[owner]).await;

        let deleted = PurgeDeadUseCase::execute(&ctx, owner, u32::MAX).await.unwrap();

        assert_eq!(deleted, 0);
        assert!(ctx.repos.job.get(ids[0]).await.unwrap().is_some());
    }
}
