//! Sender-side plaintext echo cache.
//!
//! The envelope wraps the message key for the RECIPIENT only, so the
//! sender cannot decrypt their own ciphertext.  This store keeps a local
//! plaintext copy of each sent message, keyed by message id, so the
//! sender can still render their half of a conversation.
//!
//! Known limitation: the cache is scoped to the device and wiped on
//! logout, after which the sender's own history is unreadable.  The
//! deeper fix would wrap a second copy of the message key under the
//! sender's public key, at the cost of a wire-format change.
//!
//! Persisted as one JSON document, loaded eagerly and rewritten on every
//! change.  Volumes here are one entry per sent message, so that is fine.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use lp_proto::envelope::MessageId;

use crate::error::ClientError;

#[derive(Debug)]
pub struct EchoStore {
    path: PathBuf,
    entries: HashMap<MessageId, String>,
}

impl EchoStore {
    /// Load the cache document at `path`, or start empty.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            serde_json::from_str(&fs::read_to_string(&path)?)?
        } else {
            HashMap::new()
        };
        Ok(Self { path, entries })
    }

    /// Remember the plaintext of a message this device just sent.
    pub fn insert(&mut self, message_id: MessageId, plaintext: String) -> Result<(), ClientError> {
        self.entries.insert(message_id, plaintext);
        self.persist()
    }

    pub fn get(&self, message_id: MessageId) -> Option<&str> {
        self.entries.get(&message_id).map(String::as_str)
    }

    /// Drop one entry (e.g. after the sender deletes the message).
    pub fn remove(&mut self, message_id: MessageId) -> Result<(), ClientError> {
        if self.entries.remove(&message_id).is_some() {
            self.persist()?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Logout wipe: forget every cached plaintext and delete the document.
    pub fn clear(&mut self) -> Result<(), ClientError> {
        self.entries.clear();
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    fn persist(&self) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec(&self.entries)?)?;
        Ok(())
    }
}
