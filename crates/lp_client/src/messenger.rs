//! High-level send and read flow for one device.
//!
//! Sending: resolve the recipient's published key, seal the plaintext with
//! the hybrid cipher, submit the envelope, and cache the plaintext echo
//! under the returned message id.
//!
//! Reading: every envelope degrades independently.  One undecryptable
//! envelope (tampering, wrong key, wiped echo) becomes an explicit marker
//! for that single item and never hides the rest of the conversation.

use tokio::sync::Mutex;

use lp_crypto::hybrid;
use lp_proto::api::{SendMessageRequest, SendReceipt};
use lp_proto::envelope::{MessageEnvelope, UserId};

use crate::echo::EchoStore;
use crate::error::ClientError;
use crate::key_store::LocalKeyStore;
use crate::remote::{Directory, Mailbox};

/// Rendered body of one envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    /// Inbound ciphertext opened with the local private key.
    Clear(String),
    /// Own message recovered from the local echo cache.
    Echo(String),
    /// Own message whose echo was wiped (e.g. after logout); the sender
    /// cannot decrypt ciphertext wrapped for the recipient.
    EchoMissing,
    /// Decryption failed; carries the reason.  Security-relevant: this is
    /// surfaced, never replaced with best-effort plaintext.
    Undecryptable(String),
}

#[derive(Debug, Clone)]
pub struct DecryptedMessage {
    pub envelope: MessageEnvelope,
    pub body: MessageBody,
}

/// One device's messaging frontend.  The directory and mailbox are
/// injected so tests run against in-process fakes.
pub struct Messenger<D, M> {
    key_store: LocalKeyStore,
    echo: Mutex<EchoStore>,
    directory: D,
    mailbox: M,
}

impl<D: Directory, M: Mailbox> Messenger<D, M> {
    pub fn new(key_store: LocalKeyStore, echo: EchoStore, directory: D, mailbox: M) -> Self {
        Self {
            key_store,
            echo: Mutex::new(echo),
            directory,
            mailbox,
        }
    }

    /// Seal `plaintext` for `receiver_id` and submit it.
    ///
    /// Fails with [`ClientError::RecipientKeyMissing`] when the recipient
    /// has not published a key; nothing is sent in that case.
    pub async fn send(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
        plaintext: &str,
    ) -> Result<SendReceipt, ClientError> {
        let jwk = self
            .directory
            .fetch_key(receiver_id)
            .await?
            .ok_or(ClientError::RecipientKeyMissing(receiver_id))?;
        let recipient_key = jwk.to_public_key()?;

        let sealed = hybrid::encrypt(plaintext.as_bytes(), &recipient_key)?;
        let req = SendMessageRequest {
            receiver_id,
            encrypted_content: sealed.encrypted_content,
            encrypted_key: sealed.encrypted_key,
            iv: sealed.iv,
        };

        let receipt = self.mailbox.submit(sender_id, &req).await?;
        self.echo
            .lock()
            .await
            .insert(receipt.message_id, plaintext.to_owned())?;

        tracing::debug!(message_id = receipt.message_id, receiver_id, "message sent");
        Ok(receipt)
    }

    /// Decrypt a batch of envelopes for rendering, as `user_id`.
    ///
    /// Own messages resolve from the echo cache; inbound ones decrypt with
    /// the device's private key.  Failures are isolated per envelope.
    pub async fn read_conversation(
        &self,
        user_id: UserId,
        envelopes: Vec<MessageEnvelope>,
    ) -> Result<Vec<DecryptedMessage>, ClientError> {
        let private = self.key_store.load(user_id)?;
        let echo = self.echo.lock().await;

        let mut out = Vec::with_capacity(envelopes.len());
        for envelope in envelopes {
            let body = if envelope.is_outgoing(user_id) {
                match echo.get(envelope.id) {
                    Some(text) => MessageBody::Echo(text.to_owned()),
                    None => MessageBody::EchoMissing,
                }
            } else {
                match private.as_ref() {
                    None => MessageBody::Undecryptable("no private key on this device".to_owned()),
                    Some(key) => match hybrid::decrypt(
                        &envelope.encrypted_content,
                        &envelope.encrypted_key,
                        &envelope.iv,
                        key,
                    ) {
                        Ok(plaintext) => match std::str::from_utf8(&plaintext) {
                            Ok(text) => MessageBody::Clear(text.to_owned()),
                            Err(_) => {
                                MessageBody::Undecryptable("payload is not valid UTF-8".to_owned())
                            }
                        },
                        Err(e) => {
                            tracing::warn!(
                                message_id = envelope.id,
                                error = %e,
                                "envelope failed to decrypt"
                            );
                            MessageBody::Undecryptable(e.to_string())
                        }
                    },
                }
            };
            out.push(DecryptedMessage { envelope, body });
        }
        Ok(out)
    }

    /// Logout wipe: private keys and plaintext echoes both leave the
    /// device.  Server-side ciphertext is untouched.
    pub async fn clear_device(&self) -> Result<(), ClientError> {
        self.key_store.clear()?;
        self.echo.lock().await.clear()
    }
}
