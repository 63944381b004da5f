//! HMAC-SHA256 request signing.
//!
//! Signatures cover the exact body bytes that go on the wire and are rendered
//! as `sha256=<lowercase hex>`.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_PREFIX: &str = "sha256=";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SigningError {
    #[error("signing secret is empty")]
    EmptySecret,
    #[error("invalid signing key: {0}")]
    InvalidKey(String),
}

/// Sign `body` with `secret` and return the header value.
pub fn sign(secret: &str, body: &[u8]) -> Result<String, SigningError> {
    if secret.is_empty() {
        return Err(SigningError::EmptySecret);
    }
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .map_err(|e| SigningError::InvalidKey(e.to_string()))?;
    mac.update(body);
    Ok(format!(
        "{SIGNATURE_PREFIX}{}",
        hex::encode(mac.finalize().into_bytes())
    ))
}

/// Check a received header value against `secret` in constant time.
pub fn verify(secret: &str, body: &[u8], header_value: &str) -> bool {
    let Ok(expected) = sign(secret, body) else {
        return false;
    };
    expected.as_bytes().ct_eq(header_value.trim().as_bytes()).into()
}
