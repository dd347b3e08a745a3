use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::instrument;
use uuid::Uuid;

use crate::store::{CaptureStore, StoreError, StoreResult};
use crate::types::{CaptureId, CapturedBody, NewWebhook, Webhook, WebhookListItem};

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(2);
const STATEMENT_TIMEOUT: Duration = Duration::from_secs(5);
const IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// A CaptureStore backed by the `webhooks` table in PostgreSQL.
#[derive(Clone)]
pub struct PgCaptureStore {
    pool: PgPool,
}

impl PgCaptureStore {
    /// Connect a new pool to the database at `url`.
    pub async fn new(url: &str, max_connections: u32) -> StoreResult<Self> {
        let statement_ms = STATEMENT_TIMEOUT.as_millis();
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .idle_timeout(IDLE_TIMEOUT)
            .test_before_acquire(true)
            .after_connect(move |conn, _meta| {
                Box::pin(async move {
                    // SET doesn't accept bind parameters.
                    sqlx::query(&format!("SET statement_timeout = '{statement_ms}ms'"))
                        .execute(&mut *conn)
                        .await?;
                    Ok(())
                })
            })
            .connect(url)
            .await
            .map_err(|error| StoreError::ConnectionError { error })?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool, used by tests with `sqlx::test`.
    pub fn new_from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn query_error(command: &str) -> impl FnOnce(sqlx::Error) -> StoreError + '_ {
    move |error| StoreError::QueryError {
        command: command.to_owned(),
        error,
    }
}

#[async_trait]
impl CaptureStore for PgCaptureStore {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: CaptureId) -> StoreResult<Option<Webhook>> {
        sqlx::query_as::<_, Webhook>(
            r#"
SELECT
    id, method, pathname, ip, content_type, content_length, headers, body, created_at
FROM
    webhooks
WHERE
    id = $1
LIMIT 1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error("SELECT"))
    }

    #[instrument(skip(self))]
    async fn find_many(
        &self,
        limit: u32,
        cursor: Option<CaptureId>,
    ) -> StoreResult<Vec<WebhookListItem>> {
        sqlx::query_as::<_, WebhookListItem>(
            r#"
SELECT
    id, method, pathname, created_at
FROM
    webhooks
WHERE
    $1::uuid IS NULL OR id < $1
ORDER BY
    id DESC
LIMIT $2
            "#,
        )
        .bind(cursor)
        .bind(i64::from(limit) + 1)
        .fetch_all(&self.pool)
        .await
        .map_err(query_error("SELECT"))
    }

    #[instrument(skip_all, fields(ids = ids.len()))]
    async fn fetch_bodies(&self, ids: &[CaptureId]) -> StoreResult<Vec<CapturedBody>> {
        let ids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();

        sqlx::query_as::<_, CapturedBody>(
            r#"
SELECT
    id, body
FROM
    webhooks
WHERE
    id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(query_error("SELECT"))
    }

    #[instrument(skip_all, fields(method = %webhook.method, pathname = %webhook.pathname))]
    async fn create(&self, webhook: NewWebhook) -> StoreResult<Webhook> {
        sqlx::query_as::<_, Webhook>(
            r#"
INSERT INTO webhooks
    (id, method, pathname, ip, content_type, content_length, headers, body, created_at)
VALUES
    ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
RETURNING
    id, method, pathname, ip, content_type, content_length, headers, body, created_at
            "#,
        )
        .bind(CaptureId::now())
        .bind(&webhook.method)
        .bind(&webhook.pathname)
        .bind(&webhook.ip)
        .bind(&webhook.content_type)
        .bind(webhook.content_length)
        .bind(sqlx::types::Json(&webhook.headers))
        .bind(&webhook.body)
        .fetch_one(&self.pool)
        .await
        .map_err(query_error("INSERT"))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: CaptureId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM webhooks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(query_error("DELETE"))?;

        Ok(result.rows_affected() > 0)
    }
}
