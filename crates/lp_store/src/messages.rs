//! Opaque-envelope message store and conversation index queries.
//!
//! Callers pass the verified user id asserted by the external
//! authentication service; no identity verification happens here.
//! Ciphertext columns are persisted and returned without inspection.
//!
//! Concurrency: sends are independent row insertions.  The read
//! transition is a single conditional UPDATE, so of two concurrent
//! `mark_read` calls on one message exactly one succeeds and the other
//! observes not-found.  Nothing is retried internally.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use lp_proto::api::{ConversationSummary, SendMessageRequest, SendReceipt};
use lp_proto::envelope::{MessageEnvelope, MessageId, UserId};

use crate::error::StoreError;
use crate::models::MessageRow;

/// Cap on the counterpart-less recent feed.
const RECENT_LIMIT: i64 = 100;

const ENVELOPE_COLUMNS: &str =
    "id, sender_id, receiver_id, encrypted_content, encrypted_key, iv, created_at, read_at";

/// Message store handle.  Cheap to clone (the pool is Arc internally).
#[derive(Clone)]
pub struct MessageStore {
    pool: SqlitePool,
}

impl MessageStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist an encrypted envelope.  Self-sends and missing fields are
    /// rejected before anything touches the database.
    pub async fn send(
        &self,
        sender_id: UserId,
        req: &SendMessageRequest,
    ) -> Result<SendReceipt, StoreError> {
        req.validate(sender_id).map_err(StoreError::Validation)?;

        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO messages (sender_id, receiver_id, encrypted_content, encrypted_key, iv, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(sender_id)
        .bind(req.receiver_id)
        .bind(&req.encrypted_content)
        .bind(&req.encrypted_key)
        .bind(&req.iv)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        let message_id = result.last_insert_rowid();
        tracing::debug!(message_id, sender_id, receiver_id = req.receiver_id, "envelope stored");
        Ok(SendReceipt { message_id, created_at })
    }

    /// All envelopes between `user_id` and `counterpart_id` (either
    /// direction), ascending by creation time.
    pub async fn conversation_with(
        &self,
        user_id: UserId,
        counterpart_id: UserId,
    ) -> Result<Vec<MessageEnvelope>, StoreError> {
        let rows: Vec<MessageRow> = sqlx::query_as(&format!(
            "SELECT {ENVELOPE_COLUMNS} FROM messages \
             WHERE (sender_id = ?1 AND receiver_id = ?2) OR (sender_id = ?2 AND receiver_id = ?1) \
             ORDER BY created_at ASC, id ASC"
        ))
        .bind(user_id)
        .bind(counterpart_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// The most recent envelopes involving `user_id` across all
    /// counterparts, newest first, capped at 100.
    pub async fn recent(&self, user_id: UserId) -> Result<Vec<MessageEnvelope>, StoreError> {
        let rows: Vec<MessageRow> = sqlx::query_as(&format!(
            "SELECT {ENVELOPE_COLUMNS} FROM messages \
             WHERE sender_id = ?1 OR receiver_id = ?1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT ?2"
        ))
        .bind(user_id)
        .bind(RECENT_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// One-way read transition.  The UPDATE only matches while `read_at`
    /// is still NULL and the caller is the receiver, so the statement is
    /// itself the concurrency guard; no read-then-write.
    pub async fn mark_read(
        &self,
        message_id: MessageId,
        receiver_id: UserId,
    ) -> Result<DateTime<Utc>, StoreError> {
        let read_at = Utc::now();
        let result = sqlx::query(
            "UPDATE messages SET read_at = ?1 \
             WHERE id = ?2 AND receiver_id = ?3 AND read_at IS NULL",
        )
        .bind(read_at)
        .bind(message_id)
        .bind(receiver_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!(
                "message {message_id} (missing, not addressed to caller, or already read)"
            )));
        }
        tracing::debug!(message_id, receiver_id, "envelope marked read");
        Ok(read_at)
    }

    /// Count of envelopes addressed to `user_id` not yet marked read.
    pub async fn unread_count(&self, user_id: UserId) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM messages WHERE receiver_id = ?1 AND read_at IS NULL",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Hard delete, sender only.
    pub async fn delete(&self, message_id: MessageId, sender_id: UserId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM messages WHERE id = ?1 AND sender_id = ?2")
            .bind(message_id)
            .bind(sender_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!(
                "message {message_id} (missing or not sent by caller)"
            )));
        }
        tracing::debug!(message_id, sender_id, "envelope deleted");
        Ok(())
    }

    /// Conversation index: one row per counterpart with the last-activity
    /// time and the caller's unread count, most recent conversation first.
    /// Ties break by ascending counterpart id so the listing is
    /// deterministic.
    pub async fn list_conversations(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ConversationSummary>, StoreError> {
        let rows: Vec<(i64, DateTime<Utc>, i64)> = sqlx::query_as(
            "SELECT CASE WHEN sender_id = ?1 THEN receiver_id ELSE sender_id END AS counterpart_id, \
                    MAX(created_at) AS last_message_at, \
                    SUM(CASE WHEN receiver_id = ?1 AND read_at IS NULL THEN 1 ELSE 0 END) AS unread_count \
             FROM messages \
             WHERE sender_id = ?1 OR receiver_id = ?1 \
             GROUP BY counterpart_id \
             ORDER BY last_message_at DESC, counterpart_id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(counterpart_id, last_message_at, unread_count)| ConversationSummary {
                counterpart_id,
                last_message_at,
                unread_count,
            })
            .collect())
    }
}
