//! The stored message unit — what the relay sees.
//!
//! The relay/storage layer sees only:
//!   - sender_id / receiver_id  (needed for routing and authorization)
//!   - created_at / read_at     (needed for ordering and unread counts)
//!   - three opaque base64 fields (ciphertext, wrapped key, nonce)
//!
//! It CANNOT see plaintext, and it never holds key material that would
//! let it decrypt.  Envelopes are immutable after creation except for the
//! one-way `read_at` transition and sender-initiated hard deletion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Verified user identity, asserted by the external authentication
/// service on every call.  Never generated inside this workspace.
pub type UserId = i64;

/// Message identifier assigned by the store on insert.
pub type MessageId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEnvelope {
    pub id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    /// AES-256-GCM ciphertext + tag, base64.  Opaque to the server.
    pub encrypted_content: String,
    /// RSA-OAEP-wrapped per-message key, base64.  Opaque to the server.
    pub encrypted_key: String,
    /// 96-bit AEAD nonce, base64.
    pub iv: String,
    pub created_at: DateTime<Utc>,
    /// Set once when the receiver marks the message read; never cleared.
    pub read_at: Option<DateTime<Utc>>,
}

impl MessageEnvelope {
    /// The other participant from `user`'s perspective.
    pub fn counterpart(&self, user: UserId) -> UserId {
        if self.sender_id == user {
            self.receiver_id
        } else {
            self.sender_id
        }
    }

    pub fn is_outgoing(&self, user: UserId) -> bool {
        self.sender_id == user
    }
}
