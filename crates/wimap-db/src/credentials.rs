//! Credential rows for the encrypted vault.
//!
//! Each row holds one working credential for one access point, already
//! encrypted by the caller. Several rows may exist per BSSID; listings are
//! ordered by most recent success first.

use crate::error::{DatabaseError, Result};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sqlx::{Pool, Sqlite};

/// A stored, encrypted credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRow {
    /// Row identifier
    pub id: String,
    /// Access point the credential unlocked (normalized BSSID text)
    pub bssid: String,
    /// Ciphertext including the authentication tag
    pub ciphertext: Vec<u8>,
    /// Nonce used for this encryption
    pub nonce: Vec<u8>,
    /// Number of successful connections recorded
    pub success_count: i64,
    /// When the credential was first stored
    pub created_at: DateTime<Utc>,
    /// When the credential last worked
    pub updated_at: DateTime<Utc>,
}

type RawRow = (String, String, Vec<u8>, Vec<u8>, i64, String, String);

// Fixed-width so text ordering matches time ordering.
fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::Decode(format!("invalid {column} '{value}': {e}")))
}

fn decode_row(row: RawRow) -> Result<CredentialRow> {
    let (id, bssid, ciphertext, nonce, success_count, created_at, updated_at) = row;
    Ok(CredentialRow {
        created_at: parse_timestamp("created_at", &created_at)?,
        updated_at: parse_timestamp("updated_at", &updated_at)?,
        id,
        bssid,
        ciphertext,
        nonce,
        success_count,
    })
}

/// Insert a new credential row and return it.
pub async fn insert_credential(
    pool: &Pool<Sqlite>,
    bssid: &str,
    ciphertext: Vec<u8>,
    nonce: Vec<u8>,
) -> Result<CredentialRow> {
    let id = uuid::Uuid::new_v4().to_string();
    let now = Utc::now().trunc_subsecs(6);

    sqlx::query(
        "INSERT INTO credentials (id, bssid, ciphertext, nonce, success_count, created_at, updated_at)
         VALUES (?, ?, ?, ?, 1, ?, ?)",
    )
    .bind(&id)
    .bind(bssid)
    .bind(&ciphertext)
    .bind(&nonce)
    .bind(format_timestamp(now))
    .bind(format_timestamp(now))
    .execute(pool)
    .await?;

    Ok(CredentialRow {
        id,
        bssid: bssid.to_string(),
        ciphertext,
        nonce,
        success_count: 1,
        created_at: now,
        updated_at: now,
    })
}

/// Record another success for an existing row, moving it to the front of
/// its BSSID's listing.
pub async fn touch_credential(pool: &Pool<Sqlite>, id: &str) -> Result<()> {
    let result = sqlx::query(
        "UPDATE credentials SET success_count = success_count + 1, updated_at = ? WHERE id = ?",
    )
    .bind(format_timestamp(Utc::now()))
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFoundWithMessage(format!(
            "Credential '{id}' not found"
        )));
    }

    Ok(())
}

/// List credentials for one BSSID, most recent success first.
pub async fn list_credentials(pool: &Pool<Sqlite>, bssid: &str) -> Result<Vec<CredentialRow>> {
    let rows = sqlx::query_as::<_, RawRow>(
        "SELECT id, bssid, ciphertext, nonce, success_count, created_at, updated_at
         FROM credentials
         WHERE bssid = ?
         ORDER BY updated_at DESC, rowid DESC",
    )
    .bind(bssid)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(decode_row).collect()
}

/// Distinct BSSIDs with at least one stored credential.
pub async fn list_bssids(pool: &Pool<Sqlite>) -> Result<Vec<String>> {
    let bssids =
        sqlx::query_scalar::<_, String>("SELECT DISTINCT bssid FROM credentials ORDER BY bssid")
            .fetch_all(pool)
            .await?;
    Ok(bssids)
}

/// Delete every credential stored for a BSSID. Returns the number removed.
pub async fn delete_credentials(pool: &Pool<Sqlite>, bssid: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM credentials WHERE bssid = ?")
        .bind(bssid)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
