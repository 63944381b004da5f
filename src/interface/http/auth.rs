use crate::application::shared::api_key_helpers::{bearer_token, hash_api_key};
use crate::interface::http::problem::{WHK_AUTH_INVALID_CREDENTIALS, WHK_INTERNAL, problem};
use crate::interface::http::state::AppState;
use crate::interface::http::trace::TraceId;
use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode, header};
use axum::middleware::Next;
use axum::response::Response;
use subtle::ConstantTimeEq;

fn unauthorized(detail: &str, path: &str, trace_id: Option<String>) -> Response {
    problem(
        StatusCode::UNAUTHORIZED,
        WHK_AUTH_INVALID_CREDENTIALS,
        Some(detail.to_string()),
        Some(path.to_string()),
        trace_id,
    )
}

/// Resolves the API key (Bearer token) to its owner and injects the `OwnerId`.
pub async fn owner_auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let trace_id = req.extensions().get::<TraceId>().map(|t| t.0.clone());
    let path = req.uri().path().to_string();

    // Step 1: Extract the Bearer token from the Authorization header.
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let Some(raw) = bearer_token(header_value) else {
        return Err(unauthorized("missing bearer token", &path, trace_id));
    };

    // Step 2: Only the hash is stored; look the owner up by it.
    let hash = hash_api_key(raw);
    let owner = state
        .ctx
        .repos
        .api_key
        .owner_for_hash(&hash)
        .await
        .map_err(|_| {
            problem(
                StatusCode::INTERNAL_SERVER_ERROR,
                WHK_INTERNAL,
                Some("failed to verify api key".to_string()),
                Some(path.clone()),
                trace_id.clone(),
            )
        })?;

    // Step 3: Reject unknown or revoked keys; otherwise attach the owner for handlers.
    let Some(owner_id) = owner else {
        return Err(unauthorized("invalid api key", &path, trace_id));
    };
    req.extensions_mut().insert(owner_id);
    Ok(next.run(req).await)
}

/// Guards internal endpoints with the shared worker secret.
pub async fn worker_auth_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let trace_id = req.extensions().get::<TraceId>().map(|t| t.0.clone());
    let path = req.uri().path().to_string();

    let presented = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .unwrap_or("");
    let expected = state.worker_secret.as_bytes();
    let matches: bool = presented.as_bytes().ct_eq(expected).into();
    if expected.is_empty() || !matches {
        tracing::warn!(path = %path, "rejected worker trigger");
        return Err(unauthorized("invalid worker secret", &path, trace_id));
    }

    Ok(next.run(req).await)
}
