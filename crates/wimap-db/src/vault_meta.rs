//! Key-value metadata for the credential vault.
//!
//! Holds the key-derivation salt and the encrypted verification token.

use crate::error::Result;
use sqlx::{Pool, Sqlite};

/// One metadata entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaEntry {
    /// Stored bytes (plaintext or ciphertext)
    pub value: Vec<u8>,
    /// Nonce when `value` is encrypted
    pub nonce: Option<Vec<u8>>,
}

/// Insert or replace a metadata entry.
pub async fn set_meta(
    pool: &Pool<Sqlite>,
    key: &str,
    value: &[u8],
    nonce: Option<&[u8]>,
) -> Result<()> {
    sqlx::query(
        r"
        INSERT INTO vault_meta (key, value, nonce, updated_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            nonce = excluded.nonce,
            updated_at = excluded.updated_at
        ",
    )
    .bind(key)
    .bind(value)
    .bind(nonce)
    .bind(chrono::Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Fetch a metadata entry.
pub async fn get_meta(pool: &Pool<Sqlite>, key: &str) -> Result<Option<MetaEntry>> {
    let row: Option<(Vec<u8>, Option<Vec<u8>>)> =
        sqlx::query_as("SELECT value, nonce FROM vault_meta WHERE key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await?;

    Ok(row.map(|(value, nonce)| MetaEntry { value, nonce }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    #[tokio::test]
    async fn test_set_and_get() {
        let db = Database::in_memory().await.expect("create database");
        db.run_migrations().await.expect("run migrations");

        assert_eq!(get_meta(db.pool(), "salt").await.expect("get"), None);

        set_meta(db.pool(), "salt", &[1, 2, 3], None)
            .await
            .expect("set salt");
        set_meta(db.pool(), "token", &[4, 5], Some(&[6; 12]))
            .await
            .expect("set token");

        let salt = get_meta(db.pool(), "salt").await.expect("get").expect("salt");
        assert_eq!(salt.value, vec![1, 2, 3]);
        assert_eq!(salt.nonce, None);

        let token = get_meta(db.pool(), "token").await.expect("get").expect("token");
        assert_eq!(token.nonce, Some(vec![6; 12]));
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let db = Database::in_memory().await.expect("create database");
        db.run_migrations().await.expect("run migrations");

        set_meta(db.pool(), "salt", &[1], None).await.expect("set");
        set_meta(db.pool(), "salt", &[2], None).await.expect("set again");

        let salt = get_meta(db.pool(), "salt").await.expect("get").expect("salt");
        assert_eq!(salt.value, vec![2]);
    }
}
