//! Database row models — these map to/from SQL rows.

use chrono::{DateTime, Utc};

use lp_proto::envelope::MessageEnvelope;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MessageRow {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub encrypted_content: String,
    pub encrypted_key: String,
    pub iv: String,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl From<MessageRow> for MessageEnvelope {
    fn from(row: MessageRow) -> Self {
        Self {
            id: row.id,
            sender_id: row.sender_id,
            receiver_id: row.receiver_id,
            encrypted_content: row.encrypted_content,
            encrypted_key: row.encrypted_key,
            iv: row.iv,
            created_at: row.created_at,
            read_at: row.read_at,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PublicKeyRow {
    pub user_id: i64,
    /// The JWK as stored, serialised JSON.
    pub key_json: String,
    pub updated_at: DateTime<Utc>,
}
