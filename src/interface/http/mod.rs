pub mod auth;
pub mod dto;
pub mod problem;
pub mod routes;
pub mod state;
pub mod trace;

use axum::{Router, middleware};

use crate::interface::http::state::AppState;
use crate::interface::http::trace::{request_log_middleware, trace_id_middleware};

/// Full HTTP surface: health checks, metrics, batch trigger and management API.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .merge(routes::ready::router())
        .merge(routes::metrics::router())
        .merge(routes::worker::router(state.clone()))
        .merge(routes::management::router(state.clone()))
        .layer(middleware::from_fn(request_log_middleware))
        .layer(middleware::from_fn(trace_id_middleware))
        .with_state(state)
}
