use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryErrorKind {
    WebhookNotFound,
    WebhookInactive,
    HttpStatus,
    Timeout,
    Transport,
    Registry,
}

impl DeliveryErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryErrorKind::WebhookNotFound => "webhook_not_found",
            DeliveryErrorKind::WebhookInactive => "webhook_inactive",
            DeliveryErrorKind::HttpStatus => "http_status",
            DeliveryErrorKind::Timeout => "timeout",
            DeliveryErrorKind::Transport => "transport",
            DeliveryErrorKind::Registry => "registry",
        }
    }
}

/// Why a delivery attempt did not succeed. Retry decisions read `retryable` only.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct DeliveryError {
    pub kind: DeliveryErrorKind,
    pub message: String,
    pub retryable: bool,
}

impl DeliveryError {
    pub fn webhook_not_found() -> Self {
        Self {
            kind: DeliveryErrorKind::WebhookNotFound,
            message: "webhook not found".to_string(),
            retryable: false,
        }
    }

    pub fn webhook_inactive() -> Self {
        Self {
            kind: DeliveryErrorKind::WebhookInactive,
            message: "webhook inactive".to_string(),
            retryable: false,
        }
    }

    pub fn http_status(status: u16, body_excerpt: &str) -> Self {
        let message = if body_excerpt.is_empty() {
            format!("HTTP {status}")
        } else {
            format!("HTTP {status}: {body_excerpt}")
        };
        Self {
            kind: DeliveryErrorKind::HttpStatus,
            message,
            retryable: true,
        }
    }

    pub fn timeout(millis: u64) -> Self {
        Self {
            kind: DeliveryErrorKind::Timeout,
            message: format!("request timed out after {millis}ms"),
            retryable: true,
        }
    }

    pub fn transport(detail: impl Into<String>) -> Self {
        Self {
            kind: DeliveryErrorKind::Transport,
            message: detail.into(),
            retryable: true,
        }
    }

    pub fn registry(detail: impl Into<String>) -> Self {
        Self {
            kind: DeliveryErrorKind::Registry,
            message: format!("webhook lookup failed: {}", detail.into()),
            retryable: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_missing_or_inactive_webhook_when_classified_should_not_be_retryable() {
        assert!(!DeliveryError::webhook_not_found().retryable);
        assert!(!DeliveryError::webhook_inactive().retryable);
        assert_eq!(DeliveryError::webhook_inactive().to_string(), "webhook inactive");
    }

    #[test]
    fn given_http_status_when_classified_should_include_status_and_excerpt() {
        let err = DeliveryError::http_status(503, "upstream down");
        assert!(err.retryable);
        assert_eq!(err.kind, DeliveryErrorKind::HttpStatus);
        assert_eq!(err.message, "HTTP 503: upstream down");
        assert_eq!(DeliveryError::http_status(500, "").message, "HTTP 500");
    }
}
