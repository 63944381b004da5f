use crate::infrastructure::db::dto::{StatusCountRow, WebhookJobRow};
use crate::infrastructure::db::postgres::PostgresDatabase;
use crate::infrastructure::db::stores::webhook_job_store::{
    JobQuery, WebhookJobRepositoryError, WebhookJobStore,
};
use async_trait::async_trait;
use sqlx::PgConnection;
use time::OffsetDateTime;

const JOB_COLUMNS: &str = "
    id,
    webhook_id,
    event_type,
    payload,
    status,
    retry_count,
    max_retries,
    next_retry_at,
    last_error,
    created_at,
    started_at,
    completed_at";

#[derive(Clone)]
pub struct WebhookJobStorePostgres {
    db: std::sync::Arc<PostgresDatabase>,
}

impl WebhookJobStorePostgres {
    /// Build a Postgres-backed webhook job store.
    pub fn new(db: std::sync::Arc<PostgresDatabase>) -> Self {
        Self { db }
    }

    async fn insert_impl_conn(
        conn: &mut PgConnection,
        row: &WebhookJobRow,
    ) -> Result<WebhookJobRow, WebhookJobRepositoryError> {
        let sql = format!(
            "INSERT INTO webhook_jobs ({JOB_COLUMNS})
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12)
            RETURNING {JOB_COLUMNS}"
        );
        sqlx::query_as::<_, WebhookJobRow>(&sql)
            .bind(row.id)
            .bind(row.webhook_id)
            .bind(&row.event_type)
            .bind(&row.payload)
            .bind(&row.status)
            .bind(row.retry_count)
            .bind(row.max_retries)
            .bind(row.next_retry_at)
            .bind(&row.last_error)
            .bind(row.created_at)
            .bind(row.started_at)
            .bind(row.completed_at)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    WebhookJobRepositoryError::Conflict
                }
                _ => WebhookJobRepositoryError::StorageUnavailable,
            })
    }

    async fn get_impl_conn(
        conn: &mut PgConnection,
        job_id: uuid::Uuid,
    ) -> Result<Option<WebhookJobRow>, WebhookJobRepositoryError> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM webhook_jobs WHERE id = $1");
        sqlx::query_as::<_, WebhookJobRow>(&sql)
            .bind(job_id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|_| WebhookJobRepositoryError::StorageUnavailable)
    }

    async fn claim_batch_impl_conn(
        conn: &mut PgConnection,
        now: OffsetDateTime,
        limit: u32,
    ) -> Result<Vec<WebhookJobRow>, WebhookJobRepositoryError> {
        // Step 1: Lock due rows, skipping any another claimant already holds.
        // Step 2: Flip them to processing in the same statement.
        let sql = format!(
            "WITH due AS (
                SELECT id
                FROM webhook_jobs
                WHERE status = 'pending'
                  AND (next_retry_at IS NULL OR next_retry_at <= $1)
                ORDER BY COALESCE(next_retry_at, created_at) ASC
                LIMIT $2
                FOR UPDATE SKIP LOCKED
            )
            UPDATE webhook_jobs
            SET status = 'processing',
                started_at = $1,
                next_retry_at = NULL
            WHERE id IN (SELECT id FROM due)
            RETURNING {JOB_COLUMNS}"
        );
        sqlx::query_as::<_, WebhookJobRow>(&sql)
            .bind(now)
            .bind(i64::from(limit))
            .fetch_all(&mut *conn)
            .await
            .map_err(|_| WebhookJobRepositoryError::StorageUnavailable)
    }

    async fn claim_for_manual_run_impl_conn(
        conn: &mut PgConnection,
        job_id: uuid::Uuid,
        now: OffsetDateTime,
    ) -> Result<Option<WebhookJobRow>, WebhookJobRepositoryError> {
        let sql = format!(
            "UPDATE webhook_jobs
            SET status = 'processing',
                started_at = $2,
                retry_count = CASE WHEN status IN ('failed', 'dead') THEN 0 ELSE retry_count END,
                last_error = CASE WHEN status IN ('failed', 'dead') THEN NULL ELSE last_error END,
                next_retry_at = NULL,
                completed_at = NULL
            WHERE id = $1
              AND status IN ('pending', 'failed', 'dead')
            RETURNING {JOB_COLUMNS}"
        );
        sqlx::query_as::<_, WebhookJobRow>(&sql)
            .bind(job_id)
            .bind(now)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|_| WebhookJobRepositoryError::StorageUnavailable)
    }

    async fn mark_completed_impl_conn(
        conn: &mut PgConnection,
        job_id: uuid::Uuid,
        now: OffsetDateTime,
    ) -> Result<WebhookJobRow, WebhookJobRepositoryError> {
        let sql = format!(
            "UPDATE webhook_jobs
            SET status = 'completed',
                completed_at = $2,
                next_retry_at = NULL,
                last_error = NULL
            WHERE id = $1 AND status = 'processing'
            RETURNING {JOB_COLUMNS}"
        );
        let stored = sqlx::query_as::<_, WebhookJobRow>(&sql)
            .bind(job_id)
            .bind(now)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|_| WebhookJobRepositoryError::StorageUnavailable)?;

        stored.ok_or(WebhookJobRepositoryError::Conflict)
    }

    async fn mark_retryable_impl_conn(
        conn: &mut PgConnection,
        job_id: uuid::Uuid,
        retry_count: i32,
        next_retry_at: OffsetDateTime,
        last_error: String,
    ) -> Result<WebhookJobRow, WebhookJobRepositoryError> {
        let sql = format!(
            "UPDATE webhook_jobs
            SET status = 'pending',
                retry_count = $2,
                next_retry_at = $3,
                last_error = $4,
                completed_at = NULL
            WHERE id = $1 AND status = 'processing'
            RETURNING {JOB_COLUMNS}"
        );
        let stored = sqlx::query_as::<_, WebhookJobRow>(&sql)
            .bind(job_id)
            .bind(retry_count)
            .bind(next_retry_at)
            .bind(last_error)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|_| WebhookJobRepositoryError::StorageUnavailable)?;

        stored.ok_or(WebhookJobRepositoryError::Conflict)
    }

    async fn mark_dead_impl_conn(
        conn: &mut PgConnection,
        job_id: uuid::Uuid,
        retry_count: i32,
        last_error: String,
        now: OffsetDateTime,
    ) -> Result<WebhookJobRow, WebhookJobRepositoryError> {
        let sql = format!(
            "UPDATE webhook_jobs
            SET status = 'dead',
                retry_count = $2,
                last_error = $3,
                next_retry_at = NULL,
                completed_at = $4
            WHERE id = $1 AND status = 'processing'
            RETURNING {JOB_COLUMNS}"
        );
        let stored = sqlx::query_as::<_, WebhookJobRow>(&sql)
            .bind(job_id)
            .bind(retry_count)
            .bind(last_error)
            .bind(now)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|_| WebhookJobRepositoryError::StorageUnavailable)?;

        stored.ok_or(WebhookJobRepositoryError::Conflict)
    }

    async fn mark_failed_terminal_impl_conn(
        conn: &mut PgConnection,
        job_id: uuid::Uuid,
        last_error: String,
        now: OffsetDateTime,
    ) -> Result<WebhookJobRow, WebhookJobRepositoryError> {
        let sql = format!(
            "UPDATE webhook_jobs
            SET status = 'failed',
                last_error = $2,
                next_retry_at = NULL,
                completed_at = $3
            WHERE id = $1 AND status = 'processing'
            RETURNING {JOB_COLUMNS}"
        );
        let stored = sqlx::query_as::<_, WebhookJobRow>(&sql)
            .bind(job_id)
            .bind(last_error)
            .bind(now)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|_| WebhookJobRepositoryError::StorageUnavailable)?;

        stored.ok_or(WebhookJobRepositoryError::Conflict)
    }

    async fn list_impl_conn(
        conn: &mut PgConnection,
        query: JobQuery,
        limit: u32,
    ) -> Result<Vec<WebhookJobRow>, WebhookJobRepositoryError> {
        let sql = format!(
            "SELECT {JOB_COLUMNS}
            FROM webhook_jobs
            WHERE webhook_id = ANY($1)
              AND ($2::uuid IS NULL OR webhook_id = $2)
              AND ($3::text IS NULL OR status = $3)
            ORDER BY created_at DESC
            LIMIT $4"
        );
        sqlx::query_as::<_, WebhookJobRow>(&sql)
            .bind(&query.scope)
            .bind(query.webhook_id)
            .bind(&query.status)
            .bind(i64::from(limit))
            .fetch_all(&mut *conn)
            .await
            .map_err(|_| WebhookJobRepositoryError::StorageUnavailable)
    }

    async fn count_by_status_impl_conn(
        conn: &mut PgConnection,
        query: JobQuery,
    ) -> Result<Vec<StatusCountRow>, WebhookJobRepositoryError> {
        sqlx::query_as::<_, StatusCountRow>(
            "SELECT status, COUNT(*) AS count
            FROM webhook_jobs
            WHERE webhook_id = ANY($1)
              AND ($2::uuid IS NULL OR webhook_id = $2)
              AND ($3::text IS NULL OR status = $3)
            GROUP BY status",
        )
        .bind(&query.scope)
        .bind(query.webhook_id)
        .bind(&query.status)
        .fetch_all(&mut *conn)
        .await
        .map_err(|_| WebhookJobRepositoryError::StorageUnavailable)
    }

    async fn count_completed_since_impl_conn(
        conn: &mut PgConnection,
        query: JobQuery,
        since: OffsetDateTime,
    ) -> Result<i64, WebhookJobRepositoryError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)
            FROM webhook_jobs
            WHERE webhook_id = ANY($1)
              AND ($2::uuid IS NULL OR webhook_id = $2)
              AND ($3::text IS NULL OR status = $3)
              AND status = 'completed'
              AND completed_at >= $4",
        )
        .bind(&query.scope)
        .bind(query.webhook_id)
        .bind(&query.status)
        .bind(since)
        .fetch_one(&mut *conn)
        .await
        .map_err(|_| WebhookJobRepositoryError::StorageUnavailable)
    }

    async fn purge_dead_impl_conn(
        conn: &mut PgConnection,
        scope: Vec<uuid::Uuid>,
        older_than: OffsetDateTime,
    ) -> Result<u64, WebhookJobRepositoryError> {
        let result = sqlx::query(
            "DELETE FROM webhook_jobs
            WHERE status = 'dead'
              AND webhook_id = ANY($1)
              AND completed_at <= $2",
        )
        .bind(&scope)
        .bind(older_than)
        .execute(&mut *conn)
        .await
        .map_err(|_| WebhookJobRepositoryError::StorageUnavailable)?;

        Ok(result.rows_affected())
    }

    async fn reclaim_stale_impl_conn(
        conn: &mut PgConnection,
        started_before: OffsetDateTime,
        limit: u32,
    ) -> Result<u64, WebhookJobRepositoryError> {
        let result = sqlx::query(
            "WITH stale AS (
                SELECT id
                FROM webhook_jobs
                WHERE status = 'processing'
                  AND started_at < $1
                ORDER BY started_at ASC
                LIMIT $2
                FOR UPDATE SKIP LOCKED
            )
            UPDATE webhook_jobs
            SET status = 'pending',
                started_at = NULL
            WHERE id IN (SELECT id FROM stale)",
        )
        .bind(started_before)
        .bind(i64::from(limit))
        .execute(&mut *conn)
        .await
        .map_err(|_| WebhookJobRepositoryError::StorageUnavailable)?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl WebhookJobStore for WebhookJobStorePostgres {
    async fn insert(
        &self,
        row: &WebhookJobRow,
    ) -> Result<WebhookJobRow, WebhookJobRepositoryError> {
        let row = row.clone();
        self.db
            .with_conn(move |conn| {
                let row = row;
                Box::pin(async move { Self::insert_impl_conn(conn, &row).await })
            })
            .await
    }

    async fn get(
        &self,
        job_id: uuid::Uuid,
    ) -> Result<Option<WebhookJobRow>, WebhookJobRepositoryError> {
        self.db
            .with_conn(move |conn| Box::pin(Self::get_impl_conn(conn, job_id)))
            .await
    }

    async fn claim_batch(
        &self,
        now: OffsetDateTime,
        limit: u32,
    ) -> Result<Vec<WebhookJobRow>, WebhookJobRepositoryError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.db
            .with_conn(move |conn| Box::pin(Self::claim_batch_impl_conn(conn, now, limit)))
            .await
    }

    async fn claim_for_manual_run(
        &self,
        job_id: uuid::Uuid,
        now: OffsetDateTime,
    ) -> Result<Option<WebhookJobRow>, WebhookJobRepositoryError> {
        self.db
            .with_conn(move |conn| {
                Box::pin(Self::claim_for_manual_run_impl_conn(conn, job_id, now))
            })
            .await
    }

    async fn mark_completed(
        &self,
        job_id: uuid::Uuid,
        now: OffsetDateTime,
    ) -> Result<WebhookJobRow, WebhookJobRepositoryError> {
        self.db
            .with_conn(move |conn| Box::pin(Self::mark_completed_impl_conn(conn, job_id, now)))
            .await
    }

    async fn mark_retryable(
        &self,
        job_id: uuid::Uuid,
        retry_count: i32,
        next_retry_at: OffsetDateTime,
        last_error: &str,
    ) -> Result<WebhookJobRow, WebhookJobRepositoryError> {
        let last_error = last_error.to_string();
        self.db
            .with_conn(move |conn| {
                Box::pin(Self::mark_retryable_impl_conn(
                    conn,
                    job_id,
                    retry_count,
                    next_retry_at,
                    last_error,
                ))
            })
            .await
    }

    async fn mark_dead(
        &self,
        job_id: uuid::Uuid,
        retry_count: i32,
        last_error: &str,
        now: OffsetDateTime,
    ) -> Result<WebhookJobRow, WebhookJobRepositoryError> {
        let last_error = last_error.to_string();
        self.db
            .with_conn(move |conn| {
                Box::pin(Self::mark_dead_impl_conn(
                    conn,
                    job_id,
                    retry_count,
                    last_error,
                    now,
                ))
            })
            .await
    }

    async fn mark_failed_terminal(
        &self,
        job_id: uuid::Uuid,
        last_error: &str,
        now: OffsetDateTime,
    ) -> Result<WebhookJobRow, WebhookJobRepositoryError> {
        let last_error = last_error.to_string();
        self.db
            .with_conn(move |conn| {
                Box::pin(Self::mark_failed_terminal_impl_conn(
                    conn, job_id, last_error, now,
                ))
            })
            .await
    }

    async fn list(
        &self,
        query: &JobQuery,
        limit: u32,
    ) -> Result<Vec<WebhookJobRow>, WebhookJobRepositoryError> {
        let query = query.clone();
        self.db
            .with_conn(move |conn| Box::pin(Self::list_impl_conn(conn, query, limit)))
            .await
    }

    async fn count_by_status(
        &self,
        query: &JobQuery,
    ) -> Result<Vec<StatusCountRow>, WebhookJobRepositoryError> {
        let query = query.clone();
        self.db
            .with_conn(move |conn| Box::pin(Self::count_by_status_impl_conn(conn, query)))
            .await
    }

    async fn count_completed_since(
        &self,
        query: &JobQuery,
        since: OffsetDateTime,
    ) -> Result<i64, WebhookJobRepositoryError> {
        let query = query.clone();
        self.db
            .with_conn(move |conn| {
                Box::pin(Self::count_completed_since_impl_conn(conn, query, since))
            })
            .await
    }

    async fn purge_dead(
        &self,
        scope: &[uuid::Uuid],
        older_than: OffsetDateTime,
    ) -> Result<u64, WebhookJobRepositoryError> {
        if scope.is_empty() {
            return Ok(0);
        }
        let scope = scope.to_vec();
        self.db
            .with_conn(move |conn| Box::pin(Self::purge_dead_impl_conn(conn, scope, older_than)))
            .await
    }

    async fn reclaim_stale(
        &self,
        started_before: OffsetDateTime,
        limit: u32,
    ) -> Result<u64, WebhookJobRepositoryError> {
        self.db
            .with_conn(move |conn| {
                Box::pin(Self::reclaim_stale_impl_conn(conn, started_before, limit))
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::WebhookJobStorePostgres;
    use crate::domain::entities::webhook_job::WebhookJob;
    use crate::domain::value_objects::ids::WebhookId;
    use crate::infrastructure::db::dto::WebhookJobRow;
    use crate::infrastructure::db::postgres::PostgresDatabase;
    use crate::infrastructure::db::stores::webhook_job_store::{
        JobQuery, WebhookJobRepositoryError, WebhookJobStore,
    };
    use std::collections::HashSet;
    use std::sync::Arc;
    use time::{Duration, OffsetDateTime};

    fn test_db_url() -> Option<String> {
        std::env::var("DATABASE_URL").ok()
    }

    async fn setup_store() -> Option<WebhookJobStorePostgres> {
        let url = test_db_url()?;
        let db = Arc::new(PostgresDatabase::connect(&url, 5).await.ok()?);
        db.migrate().await.ok()?;
        Some(WebhookJobStorePostgres::new(db))
    }

    fn sample_row(webhook_id: uuid::Uuid) -> WebhookJobRow {
        let job = WebhookJob::new_pending(
            WebhookId(webhook_id),
            "order.created",
            serde_json::json!({"order": 7}),
            3,
        );
        WebhookJobRow::from_job(&job)
    }

    #[tokio::test]
    async fn given_new_job_when_insert_should_return_stored_row() {
        let Some(store) = setup_store().await else {
            return;
        };
        let row = sample_row(uuid::Uuid::new_v4());

        let stored = store.insert(&row).await.unwrap();

        assert_eq!(stored.id, row.id);
        assert_eq!(stored.status, "pending");
        assert_eq!(stored.payload, row.payload);
    }

    #[tokio::test]
    async fn given_concurrent_claimers_when_claim_batch_should_never_share_a_job() {
        let Some(store) = setup_store().await else {
            return;
        };
        let webhook_id = uuid::Uuid::new_v4();
        let mut inserted = HashSet::new();
        for _ in 0..20 {
            let row = store.insert(&sample_row(webhook_id)).await.unwrap();
            inserted.insert(row.id);
        }

        let store = Arc::new(store);
        let now = OffsetDateTime::now_utc();
        let a = {
            let store = store.clone();
            tokio::spawn(async move { store.claim_batch(now, 1000).await.unwrap() })
        };
        let b = {
            let store = store.clone();
            tokio::spawn(async move { store.claim_batch(now, 1000).await.unwrap() })
        };
        let (a, b) = (a.await.unwrap(), b.await.unwrap());

        let ours = |rows: &[WebhookJobRow]| -> HashSet<uuid::Uuid> {
            rows.iter()
                .map(|r| r.id)
                .filter(|id| inserted.contains(id))
                .collect()
        };
        let (ours_a, ours_b) = (ours(&a), ours(&b));
        assert!(ours_a.is_disjoint(&ours_b));
        assert!(a.iter().chain(b.iter()).all(|r| r.status == "processing"));
    }

    #[tokio::test]
    async fn given_due_retry_when_claim_batch_should_clear_next_retry_at() {
        let Some(store) = setup_store().await else {
            return;
        };
        let mut row = sample_row(uuid::Uuid::new_v4());
        row.retry_count = 1;
        row.next_retry_at = Some(OffsetDateTime::now_utc() - Duration::seconds(1));
        let row = store.insert(&row).await.unwrap();

        let claimed = store.claim_batch(OffsetDateTime::now_utc(), 1000).await.unwrap();

        let ours = claimed.iter().find(|r| r.id == row.id).unwrap();
        assert_eq!(ours.status, "processing");
        assert_eq!(ours.retry_count, 1);
        assert_eq!(ours.next_retry_at, None);
    }

    #[tokio::test]
    async fn given_job_not_processing_when_mark_completed_should_conflict() {
        let Some(store) = setup_store().await else {
            return;
        };
        let row = store.insert(&sample_row(uuid::Uuid::new_v4())).await.unwrap();

        let result = store.mark_completed(row.id, OffsetDateTime::now_utc()).await;

        assert!(matches!(result, Err(WebhookJobRepositoryError::Conflict)));
    }

    #[tokio::test]
    async fn given_dead_job_when_claim_for_manual_run_should_reset_retry_budget() {
        let Some(store) = setup_store().await else {
            return;
        };
        let mut row = sample_row(uuid::Uuid::new_v4());
        row.status = "dead".to_string();
        row.retry_count = 3;
        row.last_error = Some("HTTP 500".to_string());
        row.completed_at = Some(OffsetDateTime::now_utc());
        let row = store.insert(&row).await.unwrap();

        let claimed = store
            .claim_for_manual_run(row.id, OffsetDateTime::now_utc())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(claimed.status, "processing");
        assert_eq!(claimed.retry_count, 0);
        assert_eq!(claimed.completed_at, None);
        assert_eq!(claimed.last_error, None);
    }

    #[tokio::test]
    async fn given_old_dead_jobs_when_purge_dead_should_only_delete_scoped_rows() {
        let Some(store) = setup_store().await else {
            return;
        };
        let mine = uuid::Uuid::new_v4();
        let theirs = uuid::Uuid::new_v4();
        let old = OffsetDateTime::now_utc() - Duration::days(40);
        for webhook_id in [mine, theirs] {
            let mut row = sample_row(webhook_id);
            row.status = "dead".to_string();
            row.completed_at = Some(old);
            store.insert(&row).await.unwrap();
        }

        let deleted = store
            .purge_dead(&[mine], OffsetDateTime::now_utc() - Duration::days(30))
            .await
            .unwrap();

        assert_eq!(deleted, 1);
        let remaining = store
            .list(
                &JobQuery {
                    scope: vec![theirs],
                    ..JobQuery::default()
                },
                10,
            )
            .await
            .unwrap();
        assert_eq!(remaining.len(), 1);
    }
}
