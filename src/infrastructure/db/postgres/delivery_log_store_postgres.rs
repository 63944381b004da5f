use crate::infrastructure::db::dto::{DeliveryLogRow, DeliveryWindowStatsRow, WebhookVolumeRow};
use crate::infrastructure::db::postgres::PostgresDatabase;
use crate::infrastructure::db::stores::delivery_log_store::{
    DeliveryLogRepositoryError, DeliveryLogStore,
};
use async_trait::async_trait;
use sqlx::PgConnection;
use time::OffsetDateTime;

#[derive(Clone)]
pub struct DeliveryLogStorePostgres {
    db: std::sync::Arc<PostgresDatabase>,
}

impl DeliveryLogStorePostgres {
    /// Build a Postgres-backed delivery log store.
    pub fn new(db: std::sync::Arc<PostgresDatabase>) -> Self {
        Self { db }
    }

    async fn insert_impl_conn(
        conn: &mut PgConnection,
        row: &DeliveryLogRow,
    ) -> Result<DeliveryLogRow, DeliveryLogRepositoryError> {
        let stored = sqlx::query_as::<_, DeliveryLogRow>(
            "INSERT INTO webhook_delivery_logs (
                id,
                job_id,
                webhook_id,
                event_type,
                payload,
                response_status,
                response_body,
                error_message,
                success,
                duration_ms,
                attempt_number,
                executed_at
            )
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12)
            RETURNING
                id,
                job_id,
                webhook_id,
                event_type,
                payload,
                response_status,
                response_body,
                error_message,
                success,
                duration_ms,
                attempt_number,
                executed_at",
        )
        .bind(row.id)
        .bind(row.job_id)
        .bind(row.webhook_id)
        .bind(&row.event_type)
        .bind(&row.payload)
        .bind(row.response_status)
        .bind(&row.response_body)
        .bind(&row.error_message)
        .bind(row.success)
        .bind(row.duration_ms)
        .bind(row.attempt_number)
        .bind(row.executed_at)
        .fetch_one(&mut *conn)
        .await
        .map_err(|_| DeliveryLogRepositoryError::StorageUnavailable)?;

        Ok(stored)
    }

    async fn list_by_job_impl_conn(
        conn: &mut PgConnection,
        job_id: uuid::Uuid,
    ) -> Result<Vec<DeliveryLogRow>, DeliveryLogRepositoryError> {
        let rows = sqlx::query_as::<_, DeliveryLogRow>(
            "SELECT
                id,
                job_id,
                webhook_id,
                event_type,
                payload,
                response_status,
                response_body,
                error_message,
                success,
                duration_ms,
                attempt_number,
                executed_at
            FROM webhook_delivery_logs
            WHERE job_id = $1
            ORDER BY executed_at ASC",
        )
        .bind(job_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|_| DeliveryLogRepositoryError::StorageUnavailable)?;

        Ok(rows)
    }

    async fn window_stats_impl_conn(
        conn: &mut PgConnection,
        scope: Vec<uuid::Uuid>,
        webhook_id: Option<uuid::Uuid>,
        since: OffsetDateTime,
    ) -> Result<DeliveryWindowStatsRow, DeliveryLogRepositoryError> {
        let stats = sqlx::query_as::<_, DeliveryWindowStatsRow>(
            "SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE success) AS successes,
                COALESCE(AVG(duration_ms), 0)::float8 AS avg_duration_ms
            FROM webhook_delivery_logs
            WHERE webhook_id = ANY($1)
              AND ($2::uuid IS NULL OR webhook_id = $2)
              AND executed_at >= $3",
        )
        .bind(&scope)
        .bind(webhook_id)
        .bind(since)
        .fetch_one(&mut *conn)
        .await
        .map_err(|_| DeliveryLogRepositoryError::StorageUnavailable)?;

        Ok(stats)
    }

    async fn per_webhook_stats_impl_conn(
        conn: &mut PgConnection,
        scope: Vec<uuid::Uuid>,
        webhook_id: Option<uuid::Uuid>,
        since: OffsetDateTime,
        limit: u32,
    ) -> Result<Vec<WebhookVolumeRow>, DeliveryLogRepositoryError> {
        let rows = sqlx::query_as::<_, WebhookVolumeRow>(
            "SELECT
                webhook_id,
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE success) AS successes,
                COALESCE(AVG(duration_ms), 0)::float8 AS avg_duration_ms
            FROM webhook_delivery_logs
            WHERE webhook_id = ANY($1)
              AND ($2::uuid IS NULL OR webhook_id = $2)
              AND executed_at >= $3
            GROUP BY webhook_id
            ORDER BY total DESC, webhook_id ASC
            LIMIT $4",
        )
        .bind(&scope)
        .bind(webhook_id)
        .bind(since)
        .bind(i64::from(limit))
        .fetch_all(&mut *conn)
        .await
        .map_err(|_| DeliveryLogRepositoryError::StorageUnavailable)?;

        Ok(rows)
    }
}

#[async_trait]
impl DeliveryLogStore for DeliveryLogStorePostgres {
    async fn insert(
        &self,
        row: &DeliveryLogRow,
    ) -> Result<DeliveryLogRow, DeliveryLogRepositoryError> {
        let row = row.clone();
        self.db
            .with_conn(move |conn| {
                let row = row;
                Box::pin(async move { Self::insert_impl_conn(conn, &row).await })
            })
            .await
    }

    async fn list_by_job(
        &self,
        job_id: uuid::Uuid,
    ) -> Result<Vec<DeliveryLogRow>, DeliveryLogRepositoryError> {
        self.db
            .with_conn(move |conn| Box::pin(Self::list_by_job_impl_conn(conn, job_id)))
            .await
    }

    async fn window_stats(
        &self,
        scope: &[uuid::Uuid],
        webhook_id: Option<uuid::Uuid>,
        since: OffsetDateTime,
    ) -> Result<DeliveryWindowStatsRow, DeliveryLogRepositoryError> {
        let scope = scope.to_vec();
        self.db
            .with_conn(move |conn| {
                Box::pin(Self::window_stats_impl_conn(conn, scope, webhook_id, since))
            })
            .await
    }

    async fn per_webhook_stats(
        &self,
        scope: &[uuid::Uuid],
        webhook_id: Option<uuid::Uuid>,
        since: OffsetDateTime,
        limit: u32,
    ) -> Result<Vec<WebhookVolumeRow>, DeliveryLogRepositoryError> {
        let scope = scope.to_vec();
        self.db
            .with_conn(move |conn| {
                Box::pin(Self::per_webhook_stats_impl_conn(
                    conn, scope, webhook_id, since, limit,
                ))
            })
            .await
    }
}
