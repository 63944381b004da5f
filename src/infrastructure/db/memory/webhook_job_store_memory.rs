use crate::infrastructure::db::dto::{StatusCountRow, WebhookJobRow};
use crate::infrastructure::db::stores::webhook_job_store::{
    JobQuery, WebhookJobRepositoryError, WebhookJobStore,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use time::OffsetDateTime;
use tokio::sync::Mutex;

/// In-process job queue. One lock guards every transition, so claims are atomic.
#[derive(Default)]
pub struct WebhookJobStoreMemory {
    jobs: Mutex<HashMap<uuid::Uuid, WebhookJobRow>>,
}

impl WebhookJobStoreMemory {
    pub fn new() -> Self {
        Self::default()
    }

    async fn transition<F>(
        &self,
        job_id: uuid::Uuid,
        apply: F,
    ) -> Result<WebhookJobRow, WebhookJobRepositoryError>
    where
        F: FnOnce(&mut WebhookJobRow) + Send,
    {
        let mut jobs = self.jobs.lock().await;
        let row = jobs
            .get_mut(&job_id)
            .filter(|row| row.status == "processing")
            .ok_or(WebhookJobRepositoryError::Conflict)?;
        apply(row);
        Ok(row.clone())
    }
}

fn due_key(row: &WebhookJobRow) -> OffsetDateTime {
    row.next_retry_at.unwrap_or(row.created_at)
}

#[async_trait]
impl WebhookJobStore for WebhookJobStoreMemory {
    async fn insert(
        &self,
        row: &WebhookJobRow,
    ) -> Result<WebhookJobRow, WebhookJobRepositoryError> {
        let mut jobs = self.jobs.lock().await;
        if jobs.contains_key(&row.id) {
            return Err(WebhookJobRepositoryError::Conflict);
        }
        jobs.insert(row.id, row.clone());
        Ok(row.clone())
    }

    async fn get(
        &self,
        job_id: uuid::Uuid,
    ) -> Result<Option<WebhookJobRow>, WebhookJobRepositoryError> {
        Ok(self.jobs.lock().await.get(&job_id).cloned())
    }

    async fn claim_batch(
        &self,
        now: OffsetDateTime,
        limit: u32,
    ) -> Result<Vec<WebhookJobRow>, WebhookJobRepositoryError> {
        let mut jobs = self.jobs.lock().await;

        // Step 1: Collect due pending jobs, oldest due time first.
        let mut due: Vec<(OffsetDateTime, uuid::Uuid)> = jobs
            .values()
            .filter(|row| {
                row.status == "pending" && row.next_retry_at.map_or(true, |at| at <= now)
            })
            .map(|row| (due_key(row), row.id))
            .collect();
        due.sort();
        due.truncate(limit as usize);

        // Step 2: Reserve them before the lock is released.
        let mut claimed = Vec::with_capacity(due.len());
        for (_, id) in due {
            if let Some(row) = jobs.get_mut(&id) {
                row.status = "processing".to_string();
                row.started_at = Some(now);
                row.next_retry_at = None;
                claimed.push(row.clone());
            }
        }
        Ok(claimed)
    }

    async fn claim_for_manual_run(
        &self,
        job_id: uuid::Uuid,
        now: OffsetDateTime,
    ) -> Result<Option<WebhookJobRow>, WebhookJobRepositoryError> {
        let mut jobs = self.jobs.lock().await;
        let Some(row) = jobs.get_mut(&job_id) else {
            return Ok(None);
        };
        let terminal = matches!(row.status.as_str(), "failed" | "dead");
        if !terminal && row.status != "pending" {
            return Ok(None);
        }
        if terminal {
            row.retry_count = 0;
            row.last_error = None;
        }
        row.status = "processing".to_string();
        row.started_at = Some(now);
        row.next_retry_at = None;
        row.completed_at = None;
        Ok(Some(row.clone()))
    }

    async fn mark_completed(
        &self,
        job_id: uuid::Uuid,
        now: OffsetDateTime,
    ) -> Result<WebhookJobRow, WebhookJobRepositoryError> {
        self.transition(job_id, |row| {
            row.status = "completed".to_string();
            row.completed_at = Some(now);
            row.next_retry_at = None;
            row.last_error = None;
        })
        .await
    }

    async fn mark_retryable(
        &self,
        job_id: uuid::Uuid,
        retry_count: i32,
        next_retry_at: OffsetDateTime,
        last_error: &str,
    ) -> Result<WebhookJobRow, WebhookJobRepositoryError> {
        let last_error = last_error.to_string();
        self.transition(job_id, move |row| {
            row.status = "pending".to_string();
            row.retry_count = retry_count;
            row.next_retry_at = Some(next_retry_at);
            row.last_error = Some(last_error);
            row.completed_at = None;
        })
        .await
    }

    async fn mark_dead(
        &self,
        job_id: uuid::Uuid,
        retry_count: i32,
        last_error: &str,
        now: OffsetDateTime,
    ) -> Result<WebhookJobRow, WebhookJobRepositoryError> {
        let last_error = last_error.to_string();
        self.transition(job_id, move |row| {
            row.status = "dead".to_string();
            row.retry_count = retry_count;
            row.last_error = Some(last_error);
            row.next_retry_at = None;
            row.completed_at = Some(now);
        })
        .await
    }

    async fn mark_failed_terminal(
        &self,
        job_id: uuid::Uuid,
        last_error: &str,
        now: OffsetDateTime,
    ) -> Result<WebhookJobRow, WebhookJobRepositoryError> {
        let last_error = last_error.to_string();
        self.transition(job_id, move |row| {
            row.status = "failed".to_string();
            row.last_error = Some(last_error);
            row.next_retry_at = None;
            row.completed_at = Some(now);
        })
        .await
    }

    async fn list(
        &self,
        query: &JobQuery,
        limit: u32,
    ) -> Result<Vec<WebhookJobRow>, WebhookJobRepositoryError> {
        let jobs = self.jobs.lock().await;
        let mut rows: Vec<WebhookJobRow> =
            jobs.values().filter(|row| query.matches(row)).cloned().collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn count_by_status(
        &self,
        query: &JobQuery,
    ) -> Result<Vec<StatusCountRow>, WebhookJobRepositoryError> {
        let jobs = self.jobs.lock().await;
        let mut counts: BTreeMap<String, i64> = BTreeMap::new();
        for row in jobs.values().filter(|row| query.matches(row)) {
            *counts.entry(row.status.clone()).or_default() += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(status, count)| StatusCountRow { status, count })
            .collect())
    }

    async fn count_completed_since(
        &self,
        query: &JobQuery,
        since: OffsetDateTime,
    ) -> Result<i64, WebhookJobRepositoryError> {
        let jobs = self.jobs.lock().await;
        let count = jobs
            .values()
            .filter(|row| query.matches(row))
            .filter(|row| row.status == "completed")
            .filter(|row| row.completed_at.is_some_and(|at| at >= since))
            .count();
        Ok(count as i64)
    }

    async fn purge_dead(
        &self,
        scope: &[uuid::Uuid],
        older_than: OffsetDateTime,
    ) -> Result<u64, WebhookJobRepositoryError> {
        let mut jobs = self.jobs.lock().await;
        let before = jobs.len();
        jobs.retain(|_, row| {
            !(row.status == "dead"
                && scope.contains(&row.webhook_id)
                && row.completed_at.is_some_and(|at| at <= older_than))
        });
        Ok((before - jobs.len()) as u64)
    }

    async fn reclaim_stale(
        &self,
        started_before: OffsetDateTime,
        limit: u32,
    ) -> Result<u64, WebhookJobRepositoryError> {
        let mut jobs = self.jobs.lock().await;
        let mut reclaimed = 0u64;
        for row in jobs.values_mut() {
            if reclaimed >= u64::from(limit) {
                break;
            }
            if row.status == "processing" && row.started_at.is_some_and(|at| at < started_before)
            {
                row.status = "pending".to_string();
                row.started_at = None;
                reclaimed += 1;
            }
        }
        Ok(reclaimed)
    }
}
