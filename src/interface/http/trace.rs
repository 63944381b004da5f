use axum::extract::MatchedPath;
use axum::http::{HeaderName, HeaderValue, Method, Request};
use axum::middleware::Next;
use axum::response::Response;
use metrics::{counter, histogram};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Per-request trace id, taken from `x-request-id` or generated.
#[derive(Debug, Clone)]
pub struct TraceId(pub String);

/// Attaches a [`TraceId`] to the request and echoes it on the response.
pub async fn trace_id_middleware(mut req: Request<axum::body::Body>, next: Next) -> Response {
    let trace_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty() && v.len() <= 128)
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    req.extensions_mut().insert(TraceId(trace_id.clone()));

    let mut response = next.run(req).await;

    if let Ok(value) = HeaderValue::from_str(&trace_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    response
}

fn method_label(method: &Method) -> &'static str {
    match *method {
        Method::GET => "GET",
        Method::POST => "POST",
        Method::HEAD => "HEAD",
        _ => "OTHER",
    }
}

fn status_class(status: u16) -> &'static str {
    match status {
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    }
}

/// Structured access log plus request counters, labelled by route template.
pub async fn request_log_middleware(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = method_label(req.method());
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let trace_id = req.extensions().get::<TraceId>().map(|t| t.0.clone());
    let start = std::time::Instant::now();

    let response = next.run(req).await;

    let latency_ms = start.elapsed().as_millis() as u64;
    let status = response.status().as_u16();
    let class = status_class(status);
    counter!("http_requests_total", "method" => method, "status" => class).increment(1);
    histogram!("http_request_duration_ms", "method" => method, "status" => class)
        .record(latency_ms as f64);
    tracing::info!(
        trace_id = trace_id.as_deref().unwrap_or(""),
        method,
        route = %route,
        status,
        latency_ms,
        "http_request"
    );

    response
}
