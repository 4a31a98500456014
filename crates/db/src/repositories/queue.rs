use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row};
use tokio::time::Instant;
use uuid::Uuid;

use concierge_core::collaborators::{
    CollaboratorError, MessageId, MessageQueue, ReceiptHandle, ReceivedMessage,
};

use super::RepositoryError;
use crate::DbPool;

const POLL_STEP: Duration = Duration::from_millis(100);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueDepth {
    pub visible: u64,
    pub in_flight: u64,
}

/// Request queue stored in the `request_queue` table.
///
/// Receiving a message stamps it with a fresh receipt handle and pushes its
/// `visible_at` past the visibility timeout in a single statement, so two
/// consumers never hold the same message at once. Deleting requires the most
/// recent receipt handle.
#[derive(Clone)]
pub struct SqlMessageQueue {
    pool: DbPool,
    visibility_timeout: Duration,
}

impl SqlMessageQueue {
    pub fn new(pool: DbPool, visibility_timeout: Duration) -> Self {
        Self { pool, visibility_timeout }
    }

    pub async fn enqueue(&self, body: &str) -> Result<MessageId, RepositoryError> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO request_queue (id, body, receipt_handle, receive_count, visible_at, enqueued_at)
             VALUES (?, ?, NULL, 0, ?, ?)",
        )
        .bind(&id)
        .bind(body)
        .bind(now.timestamp_millis())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(MessageId(id))
    }

    pub async fn try_claim(&self) -> Result<Option<ReceivedMessage>, RepositoryError> {
        let now_ms = Utc::now().timestamp_millis();
        let timeout_ms = i64::try_from(self.visibility_timeout.as_millis()).unwrap_or(i64::MAX);
        let receipt_handle = Uuid::new_v4().to_string();

        let row = sqlx::query(
            "UPDATE request_queue
             SET receipt_handle = ?,
                 receive_count = receive_count + 1,
                 visible_at = ?
             WHERE id = (
                SELECT id FROM request_queue
                WHERE visible_at <= ?
                ORDER BY visible_at ASC, rowid ASC
                LIMIT 1
             )
             RETURNING id, body, receive_count",
        )
        .bind(&receipt_handle)
        .bind(now_ms.saturating_add(timeout_ms))
        .bind(now_ms)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| message_from_row(row, receipt_handle)).transpose()
    }

    pub async fn remove(&self, receipt_handle: &ReceiptHandle) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM request_queue WHERE receipt_handle = ?")
            .bind(&receipt_handle.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn depth(&self) -> Result<QueueDepth, RepositoryError> {
        let now_ms = Utc::now().timestamp_millis();
        let row = sqlx::query(
            "SELECT
                COALESCE(SUM(CASE WHEN visible_at <= ? THEN 1 ELSE 0 END), 0) AS visible,
                COALESCE(SUM(CASE WHEN visible_at > ? THEN 1 ELSE 0 END), 0) AS in_flight
             FROM request_queue",
        )
        .bind(now_ms)
        .bind(now_ms)
        .fetch_one(&self.pool)
        .await?;

        Ok(QueueDepth {
            visible: parse_count("visible", row.try_get("visible")?)?,
            in_flight: parse_count("in_flight", row.try_get("in_flight")?)?,
        })
    }
}

#[async_trait]
impl MessageQueue for SqlMessageQueue {
    async fn send(&self, body: String) -> Result<MessageId, CollaboratorError> {
        Ok(self.enqueue(&body).await?)
    }

    async fn receive(&self, wait: Duration) -> Result<Option<ReceivedMessage>, CollaboratorError> {
        let deadline = Instant::now() + wait;
        loop {
            if let Some(message) = self.try_claim().await? {
                return Ok(Some(message));
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(POLL_STEP.min(deadline - now)).await;
        }
    }

    async fn delete(&self, receipt_handle: &ReceiptHandle) -> Result<(), CollaboratorError> {
        if self.remove(receipt_handle).await? {
            Ok(())
        } else {
            Err(CollaboratorError::NotFound(format!(
                "receipt handle `{}` is stale or unknown",
                receipt_handle.0
            )))
        }
    }
}

fn message_from_row(
    row: SqliteRow,
    receipt_handle: String,
) -> Result<ReceivedMessage, RepositoryError> {
    let receive_count = row.try_get::<i64, _>("receive_count")?;
    Ok(ReceivedMessage {
        message_id: MessageId(row.try_get("id")?),
        receipt_handle: ReceiptHandle(receipt_handle),
        body: row.try_get("body")?,
        receive_count: u32::try_from(receive_count).map_err(|_| {
            RepositoryError::Decode(format!("invalid receive_count: {receive_count}"))
        })?,
    })
}

fn parse_count(column: &str, value: i64) -> Result<u64, RepositoryError> {
    u64::try_from(value).map_err(|_| {
        RepositoryError::Decode(format!("invalid value for `{column}` (expected count): {value}"))
    })
}
