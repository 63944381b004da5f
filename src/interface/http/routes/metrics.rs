use crate::interface::http::problem::{WHK_METRICS_DISABLED, problem};
use crate::interface::http::state::AppState;
use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;

/// Builds the Prometheus scrape route.
pub fn router() -> Router<AppState> {
    Router::new().route("/metrics", get(metrics))
}

async fn metrics(State(state): State<AppState>) -> Response {
    let Some(handle) = state.metrics.as_ref() else {
        return problem(
            StatusCode::NOT_FOUND,
            WHK_METRICS_DISABLED,
            Some("metrics exporter is disabled".to_string()),
            Some("/metrics".to_string()),
            None,
        );
    };

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    )
        .into_response()
}
