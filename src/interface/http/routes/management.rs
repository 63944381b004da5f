// HTTP routes: owner-facing job management.

use crate::application::usecases::get_metrics::{GetMetricsInput, GetMetricsUseCase};
use crate::application::usecases::list_jobs::{ListJobsInput, ListJobsUseCase};
use crate::application::usecases::purge_dead::PurgeDeadUseCase;
use crate::application::usecases::retry_now::{RetryNowError, RetryNowUseCase};
use crate::domain::value_objects::ids::{JobId, OwnerId, WebhookId};
use crate::interface::http::auth::owner_auth_middleware;
use crate::interface::http::dto::management::{
    JobResponse, ListJobsResponse, ManagementRequest, MetricsResponse, PurgeDeadResponse,
    RetryNowResponse,
};
use crate::interface::http::problem::{
    WHK_JOB_CONFLICT, WHK_JOB_NOT_FOUND, WHK_REQUEST_MALFORMED, WHK_STORAGE_DB_ERROR, problem,
};
use crate::interface::http::state::AppState;
use crate::interface::http::trace::TraceId;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::post;

const PATH: &str = "/api/webhook-jobs";

/// Builds the management route, guarded by owner API keys.
pub fn router(state: AppState) -> axum::Router<AppState> {
    axum::Router::new()
        .route(PATH, post(manage))
        .route_layer(middleware::from_fn_with_state(state, owner_auth_middleware))
}

fn storage_problem(detail: String, trace_id: Option<String>) -> Response {
    tracing::error!(detail = %detail, "management storage failure");
    problem(
        StatusCode::SERVICE_UNAVAILABLE,
        WHK_STORAGE_DB_ERROR,
        Some("storage unavailable".to_string()),
        Some(PATH.to_string()),
        trace_id,
    )
}

/// One handler, one arm per action.
async fn manage(
    State(state): State<AppState>,
    Extension(owner_id): Extension<OwnerId>,
    Extension(trace_id): Extension<TraceId>,
    payload: Result<Json<ManagementRequest>, JsonRejection>,
) -> Response {
    let trace_id = Some(trace_id.0);
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return problem(
                StatusCode::BAD_REQUEST,
                WHK_REQUEST_MALFORMED,
                Some(rejection.body_text()),
                Some(PATH.to_string()),
                trace_id,
            );
        }
    };

    match request {
        ManagementRequest::List {
            webhook_id,
            status,
            limit,
        } => {
            let input = ListJobsInput {
                webhook_id: webhook_id.map(WebhookId),
                status,
                limit,
            };
            match ListJobsUseCase::execute(&state.ctx, owner_id, input).await {
                Ok(jobs) => Json(ListJobsResponse {
                    jobs: jobs.into_iter().map(JobResponse::from).collect(),
                })
                .into_response(),
                Err(e) => storage_problem(format!("{e:?}"), trace_id),
            }
        }
        ManagementRequest::Metrics { webhook_id, status } => {
            let input = GetMetricsInput {
                webhook_id: webhook_id.map(WebhookId),
                status,
            };
            match GetMetricsUseCase::execute(&state.ctx, owner_id, input).await {
                Ok(metrics) => Json(MetricsResponse::from(metrics)).into_response(),
                Err(e) => storage_problem(format!("{e:?}"), trace_id),
            }
        }
        ManagementRequest::RetryNow { job_id } => {
            match RetryNowUseCase::execute(&state.ctx, owner_id, JobId(job_id)).await {
                Ok(result) => Json(RetryNowResponse {
                    outcome: result.outcome.as_str(),
                    job: JobResponse::from(result.job),
                })
                .into_response(),
                Err(RetryNowError::NotFound) => problem(
                    StatusCode::NOT_FOUND,
                    WHK_JOB_NOT_FOUND,
                    Some("job not found".to_string()),
                    Some(PATH.to_string()),
                    trace_id,
                ),
                Err(RetryNowError::Conflict(status)) => problem(
                    StatusCode::CONFLICT,
                    WHK_JOB_CONFLICT,
                    Some(format!("job is {} and cannot be retried now", status.as_str())),
                    Some(PATH.to_string()),
                    trace_id,
                ),
                Err(RetryNowError::Storage(detail)) => storage_problem(detail, trace_id),
            }
        }
        ManagementRequest::PurgeDead { older_than_days } => {
            match PurgeDeadUseCase::execute(&state.ctx, owner_id, older_than_days).await {
                Ok(deleted) => Json(PurgeDeadResponse { deleted }).into_response(),
                Err(e) => storage_problem(format!("{e:?}"), trace_id),
            }
        }
    }
}
