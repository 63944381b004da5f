// Use case: execute_job.

use crate::application::context::AppContext;
use crate::application::shared::outbound_request::{Signatures, build_headers, truncate_chars};
use crate::domain::entities::delivery_log::DeliveryLog;
use crate::domain::entities::webhook::Webhook;
use crate::domain::entities::webhook_job::WebhookJob;
use crate::domain::services::delivery_error::DeliveryError;
use crate::domain::value_objects::ids::DeliveryLogId;
use crate::domain::value_objects::timestamps::Timestamp;
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Characters of a failing response body kept in `last_error`.
const ERROR_EXCERPT_CHARS: usize = 256;

/// Delivers one claimed job and moves it to its next state.
pub struct ExecuteJobUseCase;

#[derive(Debug)]
pub enum ExecuteJobError {
    Storage(String),
}

/// Where a job ended up after one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Completed,
    Retried,
    Dead,
    Failed,
}

impl JobOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobOutcome::Completed => "completed",
            JobOutcome::Retried => "retried",
            JobOutcome::Dead => "dead",
            JobOutcome::Failed => "failed",
        }
    }
}

struct Attempt {
    response_status: Option<u16>,
    response_body: Option<String>,
    /// Set when the status arrived but reading the body failed.
    body_error: Option<String>,
    error: Option<DeliveryError>,
}

impl Attempt {
    fn skipped(error: DeliveryError) -> Self {
        Self {
            response_status: None,
            response_body: None,
            body_error: None,
            error: Some(error),
        }
    }

    fn log_message(&self) -> Option<String> {
        let body_error = self
            .body_error
            .as_ref()
            .map(|e| format!("response body read failed: {e}"));
        match (&self.error, body_error) {
            (Some(err), Some(body)) => Some(format!("{}; {body}", err.message)),
            (Some(err), None) => Some(err.message.clone()),
            (None, body) => body,
        }
    }
}

/// Buffer at most `limit` bytes of a receiver's body; anything past it is never read.
async fn read_capped(mut resp: reqwest::Response, limit: usize) -> (String, Option<String>) {
    let mut body: Vec<u8> = Vec::with_capacity(limit.min(4096));
    let mut read_error = None;
    while body.len() < limit {
        match resp.chunk().await {
            Ok(Some(chunk)) => {
                let room = limit - body.len();
                body.extend_from_slice(&chunk[..chunk.len().min(room)]);
            }
            Ok(None) => break,
            Err(e) => {
                read_error = Some(e.to_string());
                break;
            }
        }
    }
    (String::from_utf8_lossy(&body).into_owned(), read_error)
}

impl ExecuteJobUseCase {
    /// Run one delivery attempt for a job the caller has claimed.
    ///
    /// Writes exactly one delivery log row whatever happens to the HTTP call.
    pub async fn execute(
        ctx: &AppContext,
        job: &WebhookJob,
    ) -> Result<JobOutcome, ExecuteJobError> {
        let started = Instant::now();
        let now = Timestamp::now_utc();

        // Step 1: Resolve the target webhook.
        let webhook = match ctx.repos.webhook.get(job.webhook_id).await {
            Ok(Some(webhook)) if webhook.is_active => Ok(webhook),
            Ok(Some(_)) => Err(DeliveryError::webhook_inactive()),
            Ok(None) => Err(DeliveryError::webhook_not_found()),
            Err(e) => Err(DeliveryError::registry(format!("{e:?}"))),
        };

        // Step 2: Deliver when the webhook is usable.
        let attempt = match &webhook {
            Ok(webhook) => Self::deliver(ctx, webhook, job).await,
            Err(err) => Attempt::skipped(err.clone()),
        };
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        // Step 3: Append the attempt to the delivery log.
        Self::append_log(ctx, job, &attempt, duration_ms, now).await;

        // Step 4: Transition the job.
        let outcome = match &attempt.error {
            None => {
                ctx.repos
                    .job
                    .mark_completed(job.id, Timestamp::now_utc())
                    .await
                    .map_err(|e| ExecuteJobError::Storage(format!("{e:?}")))?;
                JobOutcome::Completed
            }
            Some(err) => Self::on_failure(ctx, job, webhook.as_ref().ok(), err).await?,
        };

        // Step 5: Record the attempt.
        counter!("webhook_deliveries_total", "outcome" => outcome.as_str()).increment(1);
        histogram!("webhook_delivery_duration_ms").record(duration_ms as f64);
        tracing::info!(
            job_id = %job.id,
            webhook_id = %job.webhook_id,
            attempt = job.attempt_number(),
            status = attempt.response_status.unwrap_or(0),
            duration_ms,
            outcome = outcome.as_str(),
            error = attempt.error.as_ref().map(|e| e.kind.as_str()).unwrap_or(""),
            "delivery attempt finished"
        );

        Ok(outcome)
    }

    async fn deliver(ctx: &AppContext, webhook: &Webhook, job: &WebhookJob) -> Attempt {
        // Step 1: Serialize once; these bytes are both signed and sent.
        let body = job.payload.to_string().into_bytes();

        // Step 2: Sign with whatever secrets the webhook has.
        let signatures = match ctx.repos.secret.get(webhook.id).await {
            Ok(Some(pair)) => Signatures::for_body(&pair, &body, webhook),
            Ok(None) => {
                tracing::warn!(webhook_id = %webhook.id, "no signing secret, sending unsigned");
                Signatures::default()
            }
            Err(e) => {
                tracing::warn!(
                    webhook_id = %webhook.id,
                    error = ?e,
                    "secret lookup failed, sending unsigned"
                );
                Signatures::default()
            }
        };

        // Step 3: Send with the tighter of the webhook and platform timeouts.
        let timeout = Duration::from_secs(u64::from(webhook.timeout_seconds.max(1)))
            .min(ctx.delivery.timeout_ceiling);
        let headers = build_headers(
            webhook,
            job,
            &ctx.delivery.user_agent,
            Timestamp::now_utc().as_inner().unix_timestamp(),
            &signatures,
        );
        let response = ctx
            .http
            .post(&webhook.url)
            .headers(headers)
            .body(body)
            .timeout(timeout)
            .send()
            .await;

        // Step 4: Classify.
        match response {
            Ok(resp) => {
                let status = resp.status().as_u16();
                let (text, body_error) =
                    read_capped(resp, ctx.delivery.response_body_limit).await;
                if let Some(e) = &body_error {
                    tracing::warn!(
                        job_id = %job.id,
                        status,
                        error = %e,
                        "response body read failed"
                    );
                }
                let response_body = if text.is_empty() {
                    None
                } else {
                    Some(truncate_chars(&text, ctx.delivery.response_body_limit))
                };
                let error = if (200..=299).contains(&status) {
                    None
                } else {
                    Some(DeliveryError::http_status(
                        status,
                        &truncate_chars(&text, ERROR_EXCERPT_CHARS),
                    ))
                };
                Attempt {
                    response_status: Some(status),
                    response_body,
                    body_error,
                    error,
                }
            }
            Err(e) if e.is_timeout() => {
                let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
                Attempt::skipped(DeliveryError::timeout(millis))
            }
            Err(e) => Attempt::skipped(DeliveryError::transport(e.to_string())),
        }
    }

    async fn append_log(
        ctx: &AppContext,
        job: &WebhookJob,
        attempt: &Attempt,
        duration_ms: u64,
        now: Timestamp,
    ) {
        let log = DeliveryLog {
            id: DeliveryLogId::new(),
            job_id: job.id,
            webhook_id: job.webhook_id,
            event_type: job.event_type.clone(),
            payload: job.payload.clone(),
            response_status: attempt.response_status,
            response_body: attempt.response_body.clone(),
            error_message: attempt.log_message(),
            success: attempt.error.is_none(),
            duration_ms,
            attempt_number: job.attempt_number(),
            executed_at: now,
        };
        if let Err(e) = ctx.repos.delivery_log.append(&log).await {
            tracing::error!(job_id = %job.id, error = ?e, "failed to append delivery log");
        }
    }

    async fn on_failure(
        ctx: &AppContext,
        job: &WebhookJob,
        webhook: Option<&Webhook>,
        err: &DeliveryError,
    ) -> Result<JobOutcome, ExecuteJobError> {
        let now = Timestamp::now_utc();

        // Step 1: Configuration problems end the job without spending a retry.
        if !err.retryable {
            ctx.repos
                .job
                .mark_failed_terminal(job.id, &err.message, now)
                .await
                .map_err(|e| ExecuteJobError::Storage(format!("{e:?}")))?;
            return Ok(JobOutcome::Failed);
        }

        // Step 2: Out of budget: dead-letter and tell the owner.
        let retry_count = job.retry_count.saturating_add(1);
        if retry_count >= job.max_retries {
            let dead = ctx
                .repos
                .job
                .mark_dead(job.id, retry_count.min(job.max_retries), &err.message, now)
                .await
                .map_err(|e| ExecuteJobError::Storage(format!("{e:?}")))?;
            match webhook {
                Some(webhook) => Self::spawn_notification(ctx, webhook.clone(), dead),
                None => tracing::warn!(
                    job_id = %job.id,
                    "dead job has no resolvable webhook to notify"
                ),
            }
            return Ok(JobOutcome::Dead);
        }

        // Step 3: Otherwise schedule the next attempt.
        let next_retry_at = now.plus(ctx.backoff.delay(retry_count));
        ctx.repos
            .job
            .mark_retryable(job.id, retry_count, next_retry_at, &err.message)
            .await
            .map_err(|e| ExecuteJobError::Storage(format!("{e:?}")))?;
        Ok(JobOutcome::Retried)
    }

    /// Fire-and-forget: the batch never waits on the notification endpoint.
    fn spawn_notification(ctx: &AppContext, webhook: Webhook, job: WebhookJob) {
        let notifier = Arc::clone(&ctx.notifier);
        let timeout = ctx.delivery.notify_timeout;
        tokio::spawn(async move {
            let sent =
                tokio::time::timeout(timeout, notifier.notify_permanent_failure(&webhook, &job))
                    .await;
            match sent {
                Ok(Ok(())) => {
                    counter!(
                        "webhook_failure_notifications_total",
                        "result" => "sent"
                    )
                    .increment(1);
                }
                Ok(Err(e)) => {
                    counter!(
                        "webhook_failure_notifications_total",
                        "result" => "error"
                    )
                    .increment(1);
                    tracing::warn!(
                        job_id = %job.id,
                        error = %e,
                        "failure notification not delivered"
                    );
                }
                Err(_) => {
                    counter!(
                        "webhook_failure_notifications_total",
                        "result" => "timeout"
                    )
                    .increment(1);
                    tracing::warn!(job_id = %job.id, "failure notification timed out");
                }
            }
        });
    }
}
