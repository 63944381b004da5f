use crate::infrastructure::db::dto::ApiKeyRow;
use crate::infrastructure::db::stores::api_key_store::{ApiKeyRepositoryError, ApiKeyStore};
use async_trait::async_trait;
use tokio::sync::Mutex;

#[derive(Default)]
pub struct ApiKeyStoreMemory {
    keys: Mutex<Vec<ApiKeyRow>>,
}

impl ApiKeyStoreMemory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ApiKeyStore for ApiKeyStoreMemory {
    async fn insert(&self, row: &ApiKeyRow) -> Result<ApiKeyRow, ApiKeyRepositoryError> {
        let mut keys = self.keys.lock().await;
        if keys.iter().any(|k| k.key_hash == row.key_hash) {
            return Err(ApiKeyRepositoryError::Conflict);
        }
        keys.push(row.clone());
        Ok(row.clone())
    }

    async fn get_active_by_hash(
        &self,
        key_hash: &str,
    ) -> Result<Option<ApiKeyRow>, ApiKeyRepositoryError> {
        let keys = self.keys.lock().await;
        Ok(keys
            .iter()
            .find(|k| k.key_hash == key_hash && k.is_active())
            .cloned())
    }
}
