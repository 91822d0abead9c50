use thiserror::Error;

use lp_crypto::CryptoError;
use lp_proto::envelope::UserId;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("No public key published for user {0}")]
    RecipientKeyMissing(UserId),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialisation error: {0}")]
    Serialisation(#[from] serde_json::Error),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Transport error: {0}")]
    Transport(String),
}
