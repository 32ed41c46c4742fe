//! PostgreSQL implementation of WebhookEventRepository.
//!
//! `event_id` is the primary key; a concurrent delivery of the same event
//! loses the insert race and reports `SaveResult::AlreadyExists`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::foundation::DomainError;
use crate::ports::{SaveResult, WebhookEventRecord, WebhookEventRepository, WebhookOutcome};

use super::db_error;

pub struct PostgresWebhookEventRepository {
    pool: PgPool,
}

impl PostgresWebhookEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WebhookEventRow {
    event_id: String,
    event_type: String,
    processed_at: DateTime<Utc>,
    outcome: String,
    note: Option<String>,
    payload: serde_json::Value,
}

impl TryFrom<WebhookEventRow> for WebhookEventRecord {
    type Error = DomainError;

    fn try_from(row: WebhookEventRow) -> Result<Self, Self::Error> {
        let outcome = WebhookOutcome::parse(&row.outcome).ok_or_else(|| {
            DomainError::database(format!("Invalid webhook outcome: {}", row.outcome))
        })?;
        Ok(WebhookEventRecord {
            event_id: row.event_id,
            event_type: row.event_type,
            processed_at: row.processed_at,
            outcome,
            note: row.note,
            payload: row.payload,
        })
    }
}

#[async_trait]
impl WebhookEventRepository for PostgresWebhookEventRepository {
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, DomainError> {
        let row: Option<WebhookEventRow> = sqlx::query_as(
            r#"
            SELECT event_id, event_type, processed_at, outcome, note, payload
            FROM webhook_events
            WHERE event_id = $1
            "#,
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to fetch webhook event", e))?;

        row.map(WebhookEventRecord::try_from).transpose()
    }

    async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO webhook_events (event_id, event_type, processed_at, outcome, note, payload)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (event_id) DO NOTHING
            "#,
        )
        .bind(&record.event_id)
        .bind(&record.event_type)
        .bind(record.processed_at)
        .bind(record.outcome.as_str())
        .bind(&record.note)
        .bind(&record.payload)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to save webhook event", e))?;

        Ok(if result.rows_affected() == 0 {
            SaveResult::AlreadyExists
        } else {
            SaveResult::Inserted
        })
    }

    async fn delete_before(&self, timestamp: DateTime<Utc>) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM webhook_events WHERE processed_at < $1")
            .bind(timestamp)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to purge webhook events", e))?;

        Ok(result.rows_affected())
    }
}
