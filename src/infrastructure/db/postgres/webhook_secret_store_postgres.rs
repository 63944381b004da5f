use crate::infrastructure::db::database::DatabaseError;
use crate::infrastructure::db::dto::WebhookSecretRow;
use crate::infrastructure::db::postgres::PostgresDatabase;
use crate::infrastructure::db::stores::webhook_secret_store::{
    WebhookSecretRepositoryError, WebhookSecretStore,
};
use async_trait::async_trait;
use sqlx::PgConnection;
use time::OffsetDateTime;

#[derive(Clone)]
pub struct WebhookSecretStorePostgres {
    db: std::sync::Arc<PostgresDatabase>,
}

impl WebhookSecretStorePostgres {
    /// Build a Postgres-backed secret store.
    pub fn new(db: std::sync::Arc<PostgresDatabase>) -> Self {
        Self { db }
    }

    async fn get_impl_conn(
        conn: &mut PgConnection,
        webhook_id: uuid::Uuid,
    ) -> Result<Option<WebhookSecretRow>, WebhookSecretRepositoryError> {
        let row = sqlx::query_as::<_, WebhookSecretRow>(
            "SELECT webhook_id, current_secret, previous_secret, rotated_at
            FROM webhook_secrets
            WHERE webhook_id = $1",
        )
        .bind(webhook_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|_| WebhookSecretRepositoryError::StorageUnavailable)?;

        Ok(row)
    }

    async fn upsert_impl_conn(
        conn: &mut PgConnection,
        row: &WebhookSecretRow,
    ) -> Result<WebhookSecretRow, WebhookSecretRepositoryError> {
        let stored = sqlx::query_as::<_, WebhookSecretRow>(
            "INSERT INTO webhook_secrets (webhook_id, current_secret, previous_secret, rotated_at)
            VALUES ($1,$2,$3,$4)
            ON CONFLICT (webhook_id) DO UPDATE SET
                current_secret = EXCLUDED.current_secret,
                previous_secret = EXCLUDED.previous_secret,
                rotated_at = EXCLUDED.rotated_at
            RETURNING webhook_id, current_secret, previous_secret, rotated_at",
        )
        .bind(row.webhook_id)
        .bind(&row.current_secret)
        .bind(&row.previous_secret)
        .bind(row.rotated_at)
        .fetch_one(&mut *conn)
        .await
        .map_err(|_| WebhookSecretRepositoryError::StorageUnavailable)?;

        Ok(stored)
    }
}

#[async_trait]
impl WebhookSecretStore for WebhookSecretStorePostgres {
    async fn get(
        &self,
        webhook_id: uuid::Uuid,
    ) -> Result<Option<WebhookSecretRow>, WebhookSecretRepositoryError> {
        self.db
            .with_conn(move |conn| Box::pin(Self::get_impl_conn(conn, webhook_id)))
            .await
    }

    async fn upsert(
        &self,
        row: &WebhookSecretRow,
    ) -> Result<WebhookSecretRow, WebhookSecretRepositoryError> {
        if row.current_secret.is_empty() {
            return Err(WebhookSecretRepositoryError::InvalidInput);
        }
        let row = row.clone();
        self.db
            .with_conn(move |conn| {
                let row = row;
                Box::pin(async move { Self::upsert_impl_conn(conn, &row).await })
            })
            .await
    }

    async fn rotate(
        &self,
        webhook_id: uuid::Uuid,
        new_secret: &str,
        now: OffsetDateTime,
    ) -> Result<WebhookSecretRow, WebhookSecretRepositoryError> {
        if new_secret.is_empty() {
            return Err(WebhookSecretRepositoryError::InvalidInput);
        }
        let new_secret = new_secret.to_string();

        // Step 1: Shift current into previous.
        let rotated = self
            .db
            .with_tx(move |tx| {
                Box::pin(async move {
                    sqlx::query_as::<_, WebhookSecretRow>(
                        "UPDATE webhook_secrets
                        SET previous_secret = current_secret,
                            current_secret = $2,
                            rotated_at = $3
                        WHERE webhook_id = $1
                        RETURNING webhook_id, current_secret, previous_secret, rotated_at",
                    )
                    .bind(webhook_id)
                    .bind(new_secret)
                    .bind(now)
                    .fetch_optional(&mut **tx)
                    .await
                    .map_err(|e| DatabaseError::Query(e.to_string()))
                })
            })
            .await?;

        // Step 2: Nothing to rotate when the webhook never had a secret.
        rotated.ok_or(WebhookSecretRepositoryError::NotFound)
    }
}
