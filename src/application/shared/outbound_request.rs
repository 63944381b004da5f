use crate::domain::entities::webhook::{SecretPair, Webhook};
use crate::domain::entities::webhook_job::WebhookJob;
use crate::domain::services::signing::sign;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};

pub const HEADER_WEBHOOK_ID: &str = "x-webhook-id";
pub const HEADER_DELIVERY: &str = "x-webhook-delivery";
pub const HEADER_EVENT: &str = "x-webhook-event";
pub const HEADER_TIMESTAMP: &str = "x-webhook-timestamp";
pub const HEADER_ATTEMPT: &str = "x-webhook-attempt";
pub const HEADER_SIGNATURE: &str = "x-webhook-signature";
pub const HEADER_SIGNATURE_PREVIOUS: &str = "x-webhook-signature-previous";

/// Signature header values for one body. Either may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signatures {
    pub current: Option<String>,
    pub previous: Option<String>,
}

impl Signatures {
    /// Sign with both secrets. A secret that cannot sign is skipped with a warning.
    pub fn for_body(pair: &SecretPair, body: &[u8], webhook: &Webhook) -> Self {
        let attempt = |secret: &str, which: &'static str| match sign(secret, body) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(webhook_id = %webhook.id, which, error = %err, "signing skipped");
                None
            }
        };
        Self {
            current: attempt(&pair.current, "current"),
            previous: pair
                .previous
                .as_deref()
                .and_then(|secret| attempt(secret, "previous")),
        }
    }
}

/// Outbound headers: the webhook's custom headers first, then identifying headers on top.
///
/// `HeaderMap` keys are case-insensitive, so a custom `X-Webhook-Id` or `content-type`
/// is always replaced by ours.
pub fn build_headers(
    webhook: &Webhook,
    job: &WebhookJob,
    user_agent: &str,
    unix_seconds: i64,
    signatures: &Signatures,
) -> HeaderMap {
    let mut headers = HeaderMap::new();

    for (name, value) in &webhook.headers {
        let parsed = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        );
        match parsed {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => {
                tracing::warn!(
                    webhook_id = %webhook.id,
                    header = %name,
                    "invalid custom header skipped"
                );
            }
        }
    }

    let mut set = |name: &'static str, value: String| {
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(HeaderName::from_static(name), value);
        }
    };
    set(HEADER_WEBHOOK_ID, webhook.id.to_string());
    set(HEADER_DELIVERY, job.id.to_string());
    set(HEADER_EVENT, job.event_type.clone());
    set(HEADER_TIMESTAMP, unix_seconds.to_string());
    set(HEADER_ATTEMPT, job.attempt_number().to_string());
    if let Some(value) = &signatures.current {
        set(HEADER_SIGNATURE, value.clone());
    }
    if let Some(value) = &signatures.previous {
        set(HEADER_SIGNATURE_PREVIOUS, value.clone());
    }

    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(value) = HeaderValue::from_str(user_agent) {
        headers.insert(USER_AGENT, value);
    }
    headers
}

/// Cut `text` to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
