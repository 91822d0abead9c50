//! Client-side views of the server collaborators.
//!
//! HTTP plumbing and authentication headers are an external concern; the
//! device-side code only needs these round trips.  Tests wire the traits
//! straight onto in-process stores.

use async_trait::async_trait;

use lp_crypto::keypair::PublicKeyJwk;
use lp_proto::api::{SendMessageRequest, SendReceipt};
use lp_proto::envelope::UserId;

use crate::error::ClientError;

/// Key-directory round trips.
#[async_trait]
pub trait Directory: Send + Sync {
    /// `Ok(None)` when the user has not published a key yet.
    async fn fetch_key(&self, user_id: UserId) -> Result<Option<PublicKeyJwk>, ClientError>;

    async fn publish_key(&self, user_id: UserId, key: &PublicKeyJwk) -> Result<(), ClientError>;
}

/// Envelope submission round trip.
#[async_trait]
pub trait Mailbox: Send + Sync {
    async fn submit(
        &self,
        sender_id: UserId,
        req: &SendMessageRequest,
    ) -> Result<SendReceipt, ClientError>;
}
