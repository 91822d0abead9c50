//! Database bootstrap over SQLite via sqlx.

use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool};

use crate::error::StoreError;

/// Open (or create) the database at `db_path` and run pending migrations.
///
/// WAL journal mode and foreign-key enforcement are configured at
/// connection time, NOT inside a migration: SQLite refuses to change
/// `journal_mode` inside a transaction and sqlx wraps every migration in
/// one.
pub async fn open(db_path: &Path) -> Result<SqlitePool, StoreError> {
    let opts = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true);

    let pool = SqlitePool::connect_with(opts).await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| StoreError::Migration(e.to_string()))?;

    tracing::debug!(path = %db_path.display(), "database open, migrations applied");
    Ok(pool)
}

#[cfg(test)]
pub(crate) mod testutil {
    use std::path::PathBuf;

    use sqlx::SqlitePool;
    use uuid::Uuid;

    /// Per-test database file; WAL sidecars land next to it under /tmp.
    pub async fn test_pool() -> SqlitePool {
        let path = PathBuf::from(format!("/tmp/lp-store-test-{}.db", Uuid::new_v4()));
        super::open(&path).await.expect("open test store")
    }
}

#[cfg(test)]
mod tests {
    use super::testutil::test_pool;

    #[tokio::test]
    async fn schema_rejects_self_send_rows() {
        let pool = test_pool().await;

        let result = sqlx::query(
            "INSERT INTO messages (sender_id, receiver_id, encrypted_content, encrypted_key, iv, created_at) \
             VALUES (1, 1, 'c', 'k', 'i', '2026-01-01 00:00:00')",
        )
        .execute(&pool)
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn migrations_are_idempotent_per_database() {
        let pool = test_pool().await;
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
