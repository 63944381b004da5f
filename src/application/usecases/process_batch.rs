// Use case: process_batch.

use crate::application::context::AppContext;
use crate::application::usecases::execute_job::{ExecuteJobUseCase, JobOutcome};
use crate::application::usecases::requeue_stale_jobs::RequeueStaleJobsUseCase;
use crate::domain::value_objects::timestamps::Timestamp;
use metrics::counter;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Claims a batch of due jobs and runs them through a bounded pool.
pub struct ProcessBatchUseCase;

/// Tally of one batch. `errored` counts attempts that could not record their outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub claimed: usize,
    pub completed: usize,
    pub retried: usize,
    pub dead: usize,
    pub failed: usize,
    pub errored: usize,
}

impl BatchSummary {
    fn record(&mut self, outcome: JobOutcome) {
        match outcome {
            JobOutcome::Completed => self.completed += 1,
            JobOutcome::Retried => self.retried += 1,
            JobOutcome::Dead => self.dead += 1,
            JobOutcome::Failed => self.failed += 1,
        }
    }
}

impl ProcessBatchUseCase {
    /// Claim up to `limit` jobs and return once every claimed job finished its attempt.
    pub async fn execute(ctx: Arc<AppContext>, limit: u32) -> BatchSummary {
        let mut summary = BatchSummary::default();
        if limit == 0 {
            return summary;
        }

        // Step 1: Hand stuck jobs back to the queue first, when enabled.
        if let Some(stale_after) = ctx.worker.stale_after {
            if let Err(e) = RequeueStaleJobsUseCase::execute(&ctx, stale_after, limit).await {
                tracing::warn!(error = ?e, "stale job reclaim failed");
            }
        }

        // Step 2: Claim due jobs.
        let jobs = match ctx.repos.job.claim_batch(Timestamp::now_utc(), limit).await {
            Ok(jobs) => jobs,
            Err(e) => {
                tracing::error!(error = ?e, limit, "claim failed");
                return summary;
            }
        };
        summary.claimed = jobs.len();
        if jobs.is_empty() {
            return summary;
        }
        counter!("webhook_jobs_claimed_total").increment(jobs.len() as u64);

        // Step 3: Run every job with at most K in flight.
        let permits = ctx.worker.concurrency.max(1).min(jobs.len());
        let semaphore = Arc::new(Semaphore::new(permits));
        let mut set = JoinSet::new();
        for job in jobs {
            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                summary.errored += 1;
                continue;
            };
            let ctx = Arc::clone(&ctx);
            set.spawn(async move {
                let _permit = permit;
                let job_id = job.id;
                (job_id, ExecuteJobUseCase::execute(&ctx, &job).await)
            });
        }

        // Step 4: Wait for all of them; one failure never stops the others.
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((_, Ok(outcome))) => summary.record(outcome),
                Ok((job_id, Err(e))) => {
                    summary.errored += 1;
                    tracing::error!(job_id = %job_id, error = ?e, "job outcome not recorded");
                }
                Err(e) => {
                    summary.errored += 1;
                    tracing::error!(error = %e, "delivery task aborted");
                }
            }
        }

        tracing::info!(
            claimed = summary.claimed,
            completed = summary.completed,
            retried = summary.retried,
            dead = summary.dead,
            failed = summary.failed,
            errored = summary.errored,
            "batch finished"
        );
        summary
    }
}
