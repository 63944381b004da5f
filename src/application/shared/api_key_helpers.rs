use sha2::{Digest, Sha256};

/// Issue a new raw key and the hash that gets stored.
pub fn generate_api_key() -> (String, String) {
    let raw = format!("hkr_{}", uuid::Uuid::new_v4().simple());
    let hash = hash_api_key(&raw);
    (raw, hash)
}

/// Lowercase hex sha256 of the raw key; the only form persisted.
pub fn hash_api_key(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}

/// Extract the token from an `Authorization: Bearer <token>` value.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    let token = header_value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() { None } else { Some(token) }
}

#[cfg(test)]
mod tests {
    use super::{bearer_token, generate_api_key, hash_api_key};

    #[test]
    fn given_generated_key_when_hashed_should_match_stored_hash() {
        let (raw, hash) = generate_api_key();

        assert!(raw.starts_with("hkr_"));
        assert_eq!(hash_api_key(&raw), hash);
        assert_eq!(hash.len(), 64);
    }

    #[test]
    fn given_authorization_values_when_bearer_token_should_only_accept_bearer_scheme() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("Bearer   "), None);
        assert_eq!(bearer_token("Basic abc"), None);
    }
}
