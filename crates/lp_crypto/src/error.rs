use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    #[error("Invalid key material: {0}")]
    InvalidKey(String),

    #[error("Encryption failed")]
    Encrypt,

    #[error("Decryption failed (authentication tag mismatch, possible tampering)")]
    Decrypt,

    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    #[error("Serialisation error: {0}")]
    Serialisation(#[from] serde_json::Error),
}
