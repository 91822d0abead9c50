use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Invalid key material: {0}")]
    InvalidKey(#[from] lp_crypto::CryptoError),

    #[error("Serialisation error: {0}")]
    Serialisation(#[from] serde_json::Error),
}
