use crate::domain::value_objects::ids::OwnerId;
use crate::infrastructure::db::dto::ApiKeyRow;
use crate::infrastructure::db::stores::api_key_store::{ApiKeyRepositoryError, ApiKeyStore};
use std::sync::Arc;

pub struct ApiKeyRepository {
    store: Arc<dyn ApiKeyStore>,
}

impl ApiKeyRepository {
    /// Build a repository that uses the given store implementation.
    pub fn new(store: Arc<dyn ApiKeyStore>) -> Self {
        Self { store }
    }

    /// Store the hash of a freshly issued key for `owner_id`.
    pub async fn insert(
        &self,
        owner_id: OwnerId,
        key_hash: &str,
    ) -> Result<ApiKeyRow, ApiKeyRepositoryError> {
        self.store.insert(&ApiKeyRow::new(owner_id, key_hash)).await
    }

    /// Resolve the owner behind a key hash. Revoked keys resolve to `None`.
    pub async fn owner_for_hash(
        &self,
        key_hash: &str,
    ) -> Result<Option<OwnerId>, ApiKeyRepositoryError> {
        let row = self.store.get_active_by_hash(key_hash).await?;
        Ok(row.map(|r| OwnerId(r.owner_id)))
    }
}
