//! Postgres-backed durable queue (`sourcing_queue` table).
//!
//! Producers append rows; the external worker claims them with
//! `FOR UPDATE SKIP LOCKED` and deletes them on acknowledgement. A claim older
//! than the visibility timeout can be claimed again, which gives at-least-once
//! delivery when a worker dies mid-job.

use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{QueueError, QueueMessage};

#[derive(Debug, Clone)]
pub struct PgQueue {
    pool: PgPool,
    queue_name: String,
}

/// A message handed to a worker by [`PgQueue::claim_next`].
#[derive(Debug, Clone)]
pub struct ClaimedMessage {
    pub id: i64,
    pub message: QueueMessage,
    pub enqueued_at: DateTime<Utc>,
    /// Number of times this row has been claimed, including this claim.
    pub attempts: i32,
}

#[derive(sqlx::FromRow)]
struct ClaimedRow {
    id: i64,
    payload: serde_json::Value,
    enqueued_at: DateTime<Utc>,
    attempts: i32,
}

impl PgQueue {
    #[must_use]
    pub fn new(pool: PgPool, queue_name: impl Into<String>) -> Self {
        Self {
            pool,
            queue_name: queue_name.into(),
        }
    }

    #[must_use]
    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    /// Appends one message and returns its row id.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Database`] if the insert fails.
    pub async fn send(&self, message: &QueueMessage) -> Result<i64, QueueError> {
        let payload = serde_json::to_value(message)?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO sourcing_queue (queue_name, payload) \
             VALUES ($1, $2) \
             RETURNING id",
        )
        .bind(&self.queue_name)
        .bind(payload)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    /// Claims the oldest message that is unclaimed or whose claim has expired.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Database`] if the claim fails, or
    /// [`QueueError::Json`] if the stored payload is not a valid envelope.
    pub async fn claim_next(
        &self,
        visibility_timeout: Duration,
    ) -> Result<Option<ClaimedMessage>, QueueError> {
        let row = sqlx::query_as::<_, ClaimedRow>(
            "UPDATE sourcing_queue \
             SET claimed_at = NOW(), attempts = attempts + 1 \
             WHERE id = ( \
                 SELECT id FROM sourcing_queue \
                 WHERE queue_name = $1 \
                   AND (claimed_at IS NULL \
                        OR claimed_at < NOW() - make_interval(secs => $2::float8)) \
                 ORDER BY id \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING id, payload, enqueued_at, attempts",
        )
        .bind(&self.queue_name)
        .bind(visibility_timeout.as_secs_f64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| -> Result<ClaimedMessage, QueueError> {
            Ok(ClaimedMessage {
                id: r.id,
                message: serde_json::from_value(r.payload)?,
                enqueued_at: r.enqueued_at,
                attempts: r.attempts,
            })
        })
        .transpose()
    }

    /// Deletes a processed message. Returns `false` if it was already gone.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Database`] if the delete fails.
    pub async fn acknowledge(&self, id: i64) -> Result<bool, QueueError> {
        let result = sqlx::query("DELETE FROM sourcing_queue WHERE id = $1 AND queue_name = $2")
            .bind(id)
            .bind(&self.queue_name)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Number of messages not yet acknowledged, claimed or not.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Database`] if the query fails.
    pub async fn pending_count(&self) -> Result<i64, QueueError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sourcing_queue WHERE queue_name = $1")
                .bind(&self.queue_name)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
