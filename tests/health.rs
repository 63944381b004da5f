mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use hookrelay::interface::http;
use hookrelay::interface::http::state::AppState;
use tower::util::ServiceExt;

#[tokio::test]
async fn given_memory_storage_when_health_checked_should_be_live_and_ready() {
    let (ctx, _) = common::context(2);
    let app = http::app(AppState::new(ctx, "worker-secret", None));

    for uri in ["/health", "/ready"] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        assert!(response.headers().contains_key("x-request-id"));
    }
}
