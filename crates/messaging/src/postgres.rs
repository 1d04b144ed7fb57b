use std::time::Duration;

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::memory::DEFAULT_VISIBILITY_TIMEOUT;
use crate::{MessageQueue, QueueError, ReceivedMessage, Result};

/// How often an empty queue is polled while a receive is waiting.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Queue backed by the `queue_messages` table.
///
/// Receivers claim rows with `FOR UPDATE SKIP LOCKED`, so several consumers
/// can poll the same queue without handing out a message twice.
#[derive(Clone)]
pub struct PostgresQueue {
    pool: PgPool,
    visibility_timeout: Duration,
}

impl PostgresQueue {
    pub fn new(pool: PgPool) -> Self {
        Self::with_visibility_timeout(pool, DEFAULT_VISIBILITY_TIMEOUT)
    }

    pub fn with_visibility_timeout(pool: PgPool, visibility_timeout: Duration) -> Self {
        Self {
            pool,
            visibility_timeout,
        }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn claim(&self, queue: &str, max_messages: usize) -> Result<Vec<ReceivedMessage>> {
        // One token per claim; the row ID keeps receipts unique within it.
        let token = Uuid::new_v4().to_string();

        let rows = sqlx::query(
            r#"
            UPDATE queue_messages
            SET receipt = $3 || ':' || id::text,
                visible_at = NOW() + make_interval(secs => $4),
                receive_count = receive_count + 1
            WHERE id IN (
                SELECT id FROM queue_messages
                WHERE queue = $1 AND visible_at <= NOW()
                ORDER BY id
                LIMIT $2
                FOR UPDATE SKIP LOCKED
            )
            RETURNING id, body, receipt, receive_count
            "#,
        )
        .bind(queue)
        .bind(max_messages as i64)
        .bind(&token)
        .bind(self.visibility_timeout.as_secs_f64())
        .fetch_all(&self.pool)
        .await?;

        let mut claimed = rows
            .into_iter()
            .map(|row| {
                let id: i64 = row.try_get("id")?;
                let receive_count: i32 = row.try_get("receive_count")?;
                Ok((
                    id,
                    ReceivedMessage {
                        receipt: row.try_get("receipt")?,
                        body: row.try_get("body")?,
                        receive_count: receive_count.max(0) as u32,
                    },
                ))
            })
            .collect::<std::result::Result<Vec<_>, sqlx::Error>>()?;

        claimed.sort_by_key(|(id, _)| *id);
        Ok(claimed.into_iter().map(|(_, message)| message).collect())
    }
}

#[async_trait]
impl MessageQueue for PostgresQueue {
    async fn send(&self, queue: &str, body: String) -> Result<()> {
        sqlx::query("INSERT INTO queue_messages (queue, body) VALUES ($1, $2)")
            .bind(queue)
            .bind(body)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn receive(
        &self,
        queue: &str,
        max_messages: usize,
        wait: Duration,
    ) -> Result<Vec<ReceivedMessage>> {
        if max_messages == 0 {
            return Ok(Vec::new());
        }
        let deadline = tokio::time::Instant::now() + wait;

        loop {
            let claimed = self.claim(queue, max_messages).await?;
            let now = tokio::time::Instant::now();
            if !claimed.is_empty() || now >= deadline {
                return Ok(claimed);
            }
            tokio::time::sleep(POLL_INTERVAL.min(deadline - now)).await;
        }
    }

    async fn delete(&self, queue: &str, receipt: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM queue_messages WHERE queue = $1 AND receipt = $2")
            .bind(queue)
            .bind(receipt)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(QueueError::ReceiptNotFound {
                queue: queue.to_string(),
                receipt: receipt.to_string(),
            });
        }
        Ok(())
    }
}
