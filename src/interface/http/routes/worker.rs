// HTTP routes: internal batch trigger.

use crate::application::usecases::process_batch::ProcessBatchUseCase;
use crate::interface::http::auth::worker_auth_middleware;
use crate::interface::http::dto::batch::ProcessBatchRequest;
use crate::interface::http::problem::{WHK_REQUEST_MALFORMED, problem};
use crate::interface::http::state::AppState;
use crate::interface::http::trace::TraceId;
use axum::Json;
use axum::body::Bytes;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::post;

const PATH: &str = "/internal/process-batch";

/// Builds the batch trigger route, guarded by the worker secret.
pub fn router(state: AppState) -> axum::Router<AppState> {
    axum::Router::new()
        .route(PATH, post(process_batch))
        .route_layer(middleware::from_fn_with_state(state, worker_auth_middleware))
}

/// Runs one batch and answers with its summary once every claimed job is done.
async fn process_batch(
    State(state): State<AppState>,
    Extension(trace_id): Extension<TraceId>,
    body: Bytes,
) -> Response {
    // Step 1: An empty body means "use the configured batch size".
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        ProcessBatchRequest::default()
    } else {
        match serde_json::from_slice::<ProcessBatchRequest>(&body) {
            Ok(request) => request,
            Err(e) => {
                return problem(
                    StatusCode::BAD_REQUEST,
                    WHK_REQUEST_MALFORMED,
                    Some(e.to_string()),
                    Some(PATH.to_string()),
                    Some(trace_id.0),
                );
            }
        }
    };

    // Step 2: Run the batch.
    let limit = request.limit.unwrap_or(state.ctx.worker.batch_size);
    let summary = ProcessBatchUseCase::execute(state.ctx.clone(), limit).await;

    (StatusCode::OK, Json(summary)).into_response()
}
