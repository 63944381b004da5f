// Use case: list_jobs.

use crate::application::context::AppContext;
use crate::domain::entities::webhook_job::{JobStatus, WebhookJob};
use crate::domain::value_objects::ids::{OwnerId, WebhookId};
use crate::infrastructure::db::repositories::webhook_job_repository::JobFilter;

pub const DEFAULT_LIST_LIMIT: u32 = 50;
pub const MAX_LIST_LIMIT: u32 = 500;

/// Lists an owner's most recent jobs.
pub struct ListJobsUseCase;

#[derive(Debug)]
pub enum ListJobsError {
    Storage(String),
}

#[derive(Debug, Clone, Default)]
pub struct ListJobsInput {
    pub webhook_id: Option<WebhookId>,
    pub status: Option<JobStatus>,
    pub limit: Option<u32>,
}

impl ListJobsUseCase {
    /// Jobs on the owner's webhooks, newest first.
    pub async fn execute(
        ctx: &AppContext,
        owner_id: OwnerId,
        input: ListJobsInput,
    ) -> Result<Vec<WebhookJob>, ListJobsError> {
        // Step 1: Resolve which webhooks the owner may see.
        let scope = ctx
            .repos
            .webhook
            .scope_for_owner(owner_id)
            .await
            .map_err(|e| ListJobsError::Storage(format!("{e:?}")))?;

        // Step 2: Query within that scope.
        let limit = input
            .limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT);
        let filter = JobFilter {
            scope,
            webhook_id: input.webhook_id,
            status: input.status,
        };
        ctx.repos
            .job
            .list(&filter, limit)
            .await
            .map_err(|e| ListJobsError::Storage(format!("{e:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::{ListJobsInput, ListJobsUseCase};
    use crate::application::context::test_support::test_context;
    use crate::domain::entities::webhook::Webhook;
    use crate::domain::entities::webhook_job::{JobStatus, WebhookJob};
    use crate::domain::value_objects::ids::{OwnerId, WebhookId, WorkspaceId};
    use std::collections::BTreeMap;

    fn webhook(owner_id: OwnerId) -> Webhook {
        Webhook {
            id: WebhookId::new(),
            owner_id,
            workspace_id: WorkspaceId::new(),
            name: "orders".to_string(),
            url: "https://example.test".to_string(),
            headers: BTreeMap::new(),
            is_active: true,
            timeout_seconds: 5,
        }
    }

    #[tokio::test]
    async fn given_jobs_of_two_owners_when_list_should_only_return_callers_jobs() {
        let (ctx, _) = test_context();
        let owner = OwnerId::new();
        let mine = ctx.repos.webhook.insert(&webhook(owner)).await.unwrap();
        let theirs = ctx.repos.webhook.insert(&webhook(OwnerId::new())).await.unwrap();
        for hook in [&mine, &mine, &theirs] {
            ctx.repos
                .job
                .insert(&WebhookJob::new_pending(
                    hook.id,
                    "order.created",
                    serde_json::json!({}),
                    3,
                ))
                .await
                .unwrap();
        }

        let jobs = ListJobsUseCase::execute(&ctx, owner, ListJobsInput::default())
            .await
            .unwrap();

        assert_eq!(jobs.len(), 2);
        assert!(jobs.iter().all(|j| j.webhook_id == mine.id));
    }

    #[tokio::test]
    async fn given_foreign_webhook_filter_when_list_should_return_nothing() {
        let (ctx, _) = test_context();
        let owner = OwnerId::new();
        ctx.repos.webhook.insert(&webhook(owner)).await.unwrap();
        let theirs = ctx.repos.webhook.insert(&webhook(OwnerId::new())).await.unwrap();
        ctx.repos
            .job
            .insert(&WebhookJob::new_pending(theirs.id, "order.created", serde_json::json!({}), 3))
            .await
            .unwrap();

        let jobs = ListJobsUseCase::execute(
            &ctx,
            owner,
            ListJobsInput {
                webhook_id: Some(theirs.id),
                status: Some(JobStatus::Pending),
                limit: Some(10_000),
            },
        )
        .await
        .unwrap();

        assert!(jobs.is_empty());
    }
}
