use crate::infrastructure::db::database::DatabaseError;
use crate::infrastructure::db::dto::ApiKeyRow;
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeyRepositoryError {
    Conflict,
    StorageUnavailable,
}

impl From<DatabaseError> for ApiKeyRepositoryError {
    fn from(_: DatabaseError) -> Self {
        ApiKeyRepositoryError::StorageUnavailable
    }
}

#[async_trait]
pub trait ApiKeyStore: Send + Sync {
    /// Create an API key and return exactly what was stored in the database.
    async fn insert(&self, row: &ApiKeyRow) -> Result<ApiKeyRow, ApiKeyRepositoryError>;
    /// Fetch a non-revoked key by its sha256 hash (used for auth).
    async fn get_active_by_hash(
        &self,
        key_hash: &str,
    ) -> Result<Option<ApiKeyRow>, ApiKeyRepositoryError>;
}
