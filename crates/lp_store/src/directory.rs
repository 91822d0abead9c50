//! Public-key directory.
//!
//! A minimal PKI: one JWK per user, last-writer-wins, no history.  Public
//! keys are public by design, so any verified caller may fetch any user's
//! key.  Absence is a normal outcome (the user has not generated keys
//! yet), never an error.
//!
//! Removing a key does not retroactively affect envelopes already sealed
//! under it; those stay decryptable by the private-key holder.

use chrono::Utc;
use sqlx::SqlitePool;

use lp_crypto::keypair::PublicKeyJwk;
use lp_proto::api::PublicKeyRecord;
use lp_proto::envelope::UserId;

use crate::error::StoreError;
use crate::models::PublicKeyRow;

/// Directory handle.  Cheap to clone.
#[derive(Clone)]
pub struct KeyDirectory {
    pool: SqlitePool,
}

impl KeyDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Idempotent upsert.  Overwrites any prior key and refreshes the
    /// timestamp.  The JWK is parsed first so malformed material never
    /// reaches storage.
    pub async fn put(&self, user_id: UserId, key: &PublicKeyJwk) -> Result<(), StoreError> {
        key.to_public_key()?;
        let key_json = serde_json::to_string(key)?;

        sqlx::query(
            "INSERT INTO public_keys (user_id, key_json, updated_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT(user_id) DO UPDATE SET \
                 key_json = excluded.key_json, \
                 updated_at = excluded.updated_at",
        )
        .bind(user_id)
        .bind(key_json)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        tracing::debug!(user_id, "public key stored");
        Ok(())
    }

    /// `Ok(None)` when the user has not published a key.
    pub async fn get(&self, user_id: UserId) -> Result<Option<PublicKeyRecord>, StoreError> {
        let row: Option<PublicKeyRow> =
            sqlx::query_as("SELECT user_id, key_json, updated_at FROM public_keys WHERE user_id = ?1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some(row) => {
                let public_key: PublicKeyJwk = serde_json::from_str(&row.key_json)?;
                Ok(Some(PublicKeyRecord {
                    user_id: row.user_id,
                    public_key,
                    updated_at: row.updated_at,
                }))
            }
            None => Ok(None),
        }
    }

    /// Existence probe.
    pub async fn has_key(&self, user_id: UserId) -> Result<bool, StoreError> {
        Ok(self.get(user_id).await?.is_some())
    }

    /// Administrative removal.  Returns whether a key was present.
    pub async fn delete(&self, user_id: UserId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM public_keys WHERE user_id = ?1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Administrative listing of user ids holding a stored key.
    pub async fn list(&self) -> Result<Vec<UserId>, StoreError> {
        let ids: Vec<i64> = sqlx::query_scalar("SELECT user_id FROM public_keys ORDER BY user_id ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }
}
