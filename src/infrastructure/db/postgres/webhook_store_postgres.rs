use crate::infrastructure::db::dto::WebhookRow;
use crate::infrastructure::db::postgres::PostgresDatabase;
use crate::infrastructure::db::stores::webhook_store::{WebhookRepositoryError, WebhookStore};
use async_trait::async_trait;
use sqlx::PgConnection;

#[derive(Clone)]
pub struct WebhookStorePostgres {
    db: std::sync::Arc<PostgresDatabase>,
}

impl WebhookStorePostgres {
    /// Build a Postgres-backed webhook store.
    pub fn new(db: std::sync::Arc<PostgresDatabase>) -> Self {
        Self { db }
    }

    async fn get_impl_conn(
        conn: &mut PgConnection,
        webhook_id: uuid::Uuid,
    ) -> Result<Option<WebhookRow>, WebhookRepositoryError> {
        let row = sqlx::query_as::<_, WebhookRow>(
            "SELECT
                id,
                owner_id,
                workspace_id,
                name,
                url,
                headers,
                is_active,
                timeout_seconds
            FROM webhooks
            WHERE id = $1",
        )
        .bind(webhook_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|_| WebhookRepositoryError::StorageUnavailable)?;

        Ok(row)
    }

    async fn insert_impl_conn(
        conn: &mut PgConnection,
        row: &WebhookRow,
    ) -> Result<WebhookRow, WebhookRepositoryError> {
        let stored = sqlx::query_as::<_, WebhookRow>(
            "INSERT INTO webhooks (
                id,
                owner_id,
                workspace_id,
                name,
                url,
                headers,
                is_active,
                timeout_seconds
            )
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
            RETURNING
                id,
                owner_id,
                workspace_id,
                name,
                url,
                headers,
                is_active,
                timeout_seconds",
        )
        .bind(row.id)
        .bind(row.owner_id)
        .bind(row.workspace_id)
        .bind(&row.name)
        .bind(&row.url)
        .bind(&row.headers)
        .bind(row.is_active)
        .bind(row.timeout_seconds)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                WebhookRepositoryError::Conflict
            }
            _ => WebhookRepositoryError::StorageUnavailable,
        })?;

        Ok(stored)
    }

    async fn list_ids_by_owner_impl_conn(
        conn: &mut PgConnection,
        owner_id: uuid::Uuid,
    ) -> Result<Vec<uuid::Uuid>, WebhookRepositoryError> {
        let ids = sqlx::query_scalar::<_, uuid::Uuid>(
            "SELECT id FROM webhooks WHERE owner_id = $1 ORDER BY created_at ASC",
        )
        .bind(owner_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|_| WebhookRepositoryError::StorageUnavailable)?;

        Ok(ids)
    }
}

#[async_trait]
impl WebhookStore for WebhookStorePostgres {
    async fn get(
        &self,
        webhook_id: uuid::Uuid,
    ) -> Result<Option<WebhookRow>, WebhookRepositoryError> {
        self.db
            .with_conn(move |conn| Box::pin(Self::get_impl_conn(conn, webhook_id)))
            .await
    }

    async fn insert(&self, row: &WebhookRow) -> Result<WebhookRow, WebhookRepositoryError> {
        let row = row.clone();
        self.db
            .with_conn(move |conn| {
                let row = row;
                Box::pin(async move { Self::insert_impl_conn(conn, &row).await })
            })
            .await
    }

    async fn list_ids_by_owner(
        &self,
        owner_id: uuid::Uuid,
    ) -> Result<Vec<uuid::Uuid>, WebhookRepositoryError> {
        self.db
            .with_conn(move |conn| Box::pin(Self::list_ids_by_owner_impl_conn(conn, owner_id)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::WebhookStorePostgres;
    use crate::infrastructure::db::dto::WebhookRow;
    use crate::infrastructure::db::postgres::PostgresDatabase;
    use crate::infrastructure::db::stores::webhook_store::WebhookStore;
    use sqlx::types::Json;
    use std::collections::BTreeMap;

    fn test_db_url() -> Option<String> {
        std::env::var("DATABASE_URL").ok()
    }

    async fn setup_store() -> Option<WebhookStorePostgres> {
        let url = test_db_url()?;
        let db = std::sync::Arc::new(PostgresDatabase::connect(&url, 2).await.ok()?);
        db.migrate().await.ok()?;
        Some(WebhookStorePostgres::new(db))
    }

    fn sample_row(owner_id: uuid::Uuid) -> WebhookRow {
        let mut headers = BTreeMap::new();
        headers.insert("X-Team".to_string(), "billing".to_string());
        WebhookRow {
            id: uuid::Uuid::new_v4(),
            owner_id,
            workspace_id: uuid::Uuid::new_v4(),
            name: "billing".to_string(),
            url: "https://example.test/hook".to_string(),
            headers: Json(headers),
            is_active: true,
            timeout_seconds: 10,
        }
    }

    #[tokio::test]
    async fn given_inserted_webhook_when_get_should_return_headers() {
        let Some(store) = setup_store().await else {
            return;
        };
        let row = store.insert(&sample_row(uuid::Uuid::new_v4())).await.unwrap();

        let fetched = store.get(row.id).await.unwrap().unwrap();

        assert_eq!(fetched.headers.0.get("X-Team").map(String::as_str), Some("billing"));
    }

    #[tokio::test]
    async fn given_owner_with_webhooks_when_list_ids_should_return_only_theirs() {
        let Some(store) = setup_store().await else {
            return;
        };
        let owner = uuid::Uuid::new_v4();
        let a = store.insert(&sample_row(owner)).await.unwrap();
        let b = store.insert(&sample_row(owner)).await.unwrap();
        store.insert(&sample_row(uuid::Uuid::new_v4())).await.unwrap();

        let ids = store.list_ids_by_owner(owner).await.unwrap();

        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&a.id) && ids.contains(&b.id));
    }
}
