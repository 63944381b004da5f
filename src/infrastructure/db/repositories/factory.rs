use std::sync::Arc;

use crate::infrastructure::db::database::{Database, DatabaseError};
use crate::infrastructure::db::memory::{
    ApiKeyStoreMemory, DeliveryLogStoreMemory, WebhookJobStoreMemory, WebhookSecretStoreMemory,
    WebhookStoreMemory,
};
use crate::infrastructure::db::postgres::PostgresDatabase;
use crate::infrastructure::db::postgres::api_key_store_postgres::ApiKeyStorePostgres;
use crate::infrastructure::db::postgres::delivery_log_store_postgres::DeliveryLogStorePostgres;
use crate::infrastructure::db::postgres::webhook_job_store_postgres::WebhookJobStorePostgres;
use crate::infrastructure::db::postgres::webhook_secret_store_postgres::WebhookSecretStorePostgres;
use crate::infrastructure::db::postgres::webhook_store_postgres::WebhookStorePostgres;
use crate::infrastructure::db::repositories::api_key_repository::ApiKeyRepository;
use crate::infrastructure::db::repositories::delivery_log_repository::DeliveryLogRepository;
use crate::infrastructure::db::repositories::webhook_job_repository::WebhookJobRepository;
use crate::infrastructure::db::repositories::webhook_repository::{
    WebhookRepository, WebhookSecretRepository,
};

#[derive(Clone)]
pub struct Repositories {
    pub db: Option<Arc<PostgresDatabase>>,
    pub job: Arc<WebhookJobRepository>,
    pub webhook: Arc<WebhookRepository>,
    pub secret: Arc<WebhookSecretRepository>,
    pub delivery_log: Arc<DeliveryLogRepository>,
    pub api_key: Arc<ApiKeyRepository>,
}

impl Repositories {
    /// Build all repositories backed by Postgres stores.
    pub fn postgres(db: Arc<PostgresDatabase>) -> Self {
        let job_store = Arc::new(WebhookJobStorePostgres::new(db.clone()));
        let webhook_store = Arc::new(WebhookStorePostgres::new(db.clone()));
        let secret_store = Arc::new(WebhookSecretStorePostgres::new(db.clone()));
        let log_store = Arc::new(DeliveryLogStorePostgres::new(db.clone()));
        let api_key_store = Arc::new(ApiKeyStorePostgres::new(db.clone()));

        Self {
            db: Some(db),
            job: Arc::new(WebhookJobRepository::new(job_store)),
            webhook: Arc::new(WebhookRepository::new(webhook_store)),
            secret: Arc::new(WebhookSecretRepository::new(secret_store)),
            delivery_log: Arc::new(DeliveryLogRepository::new(log_store)),
            api_key: Arc::new(ApiKeyRepository::new(api_key_store)),
        }
    }

    /// Build all repositories over fresh in-process stores.
    pub fn memory() -> Self {
        Self {
            db: None,
            job: Arc::new(WebhookJobRepository::new(Arc::new(
                WebhookJobStoreMemory::new(),
            ))),
            webhook: Arc::new(WebhookRepository::new(Arc::new(WebhookStoreMemory::new()))),
            secret: Arc::new(WebhookSecretRepository::new(Arc::new(
                WebhookSecretStoreMemory::new(),
            ))),
            delivery_log: Arc::new(DeliveryLogRepository::new(Arc::new(
                DeliveryLogStoreMemory::new(),
            ))),
            api_key: Arc::new(ApiKeyRepository::new(Arc::new(ApiKeyStoreMemory::new()))),
        }
    }

    /// Check the backing database answers. In-process stores are always ready.
    pub async fn ping(&self) -> Result<(), DatabaseError> {
        let Some(db) = self.db.as_ref() else {
            return Ok(());
        };
        db.execute("SELECT 1").await.map(|_| ())
    }
}
