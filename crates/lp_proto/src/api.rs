//! API request/response types shared between clients and services.
//! These map directly to JSON bodies on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lp_crypto::keypair::PublicKeyJwk;

use crate::envelope::{MessageId, UserId};

// ── Messaging ────────────────────────────────────────────────────────────────

/// Body of a send call.  The three ciphertext fields come straight out of
/// the hybrid cipher; the service stores them without inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub receiver_id: UserId,
    pub encrypted_content: String,
    pub encrypted_key: String,
    pub iv: String,
}

impl SendMessageRequest {
    /// Field-presence and self-send validation, run by the service before
    /// anything touches storage.  The error names every offending field.
    pub fn validate(&self, sender_id: UserId) -> Result<(), String> {
        let mut missing = Vec::new();
        if self.receiver_id <= 0 {
            missing.push("receiver_id");
        }
        if self.encrypted_content.is_empty() {
            missing.push("encrypted_content");
        }
        if self.encrypted_key.is_empty() {
            missing.push("encrypted_key");
        }
        if self.iv.is_empty() {
            missing.push("iv");
        }
        if !missing.is_empty() {
            return Err(format!("missing required fields: {}", missing.join(", ")));
        }
        if sender_id == self.receiver_id {
            return Err("cannot send a message to yourself".to_owned());
        }
        Ok(())
    }
}

/// Returned by a successful send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendReceipt {
    pub message_id: MessageId,
    pub created_at: DateTime<Utc>,
}

// ── Key directory ────────────────────────────────────────────────────────────

/// Directory entry for one user's published key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyRecord {
    pub user_id: UserId,
    pub public_key: PublicKeyJwk,
    pub updated_at: DateTime<Utc>,
}

// ── Conversation index ───────────────────────────────────────────────────────

/// One row of the conversation listing: a counterpart, the time of the
/// most recent envelope either way, and the caller's unread count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub counterpart_id: UserId,
    pub last_message_at: DateTime<Utc>,
    pub unread_count: i64,
}
