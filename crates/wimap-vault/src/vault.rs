//! The credential vault: a password-derived key over a `SQLite` database.
//!
//! The vault can be in one of two states:
//! - **Locked**: the value has been consumed by [`CredentialVault::lock`];
//!   no key remains in memory
//! - **Unlocked**: key derived and held in memory, database open
//!
//! The Argon2id salt lives in `vault_meta` next to an encrypted verification
//! token used to reject a wrong password at unlock time.

use crate::cipher::{encrypt_string, EncryptedField};
use crate::error::{Result, VaultError};
use crate::kdf::{self, KdfParams};
use std::path::{Path, PathBuf};
use wimap_core::{Bssid, Credential};
use wimap_db::{credentials, vault_meta, Database};
use zeroize::Zeroizing;

const SALT_KEY: &str = "salt";
const VERIFICATION_KEY: &str = "verification";

/// Plaintext of the verification token.
const VERIFICATION_TOKEN: &str = "WIMAP_VAULT_V1";

/// Unlocked credential vault.
#[derive(Debug)]
pub struct CredentialVault {
    db: Database,
    key: Zeroizing<[u8; 32]>,
    db_path: PathBuf,
}

impl CredentialVault {
    /// Create a new vault at `db_path`.
    ///
    /// # Errors
    /// Returns `VaultError::InvalidData` if a vault already exists there, or
    /// a database/key-derivation error.
    pub async fn create(
        password: &str,
        db_path: impl AsRef<Path>,
        params: KdfParams,
    ) -> Result<Self> {
        let db_path = db_path.as_ref();
        let db = Database::new(db_path).await?;
        db.run_migrations().await?;

        if vault_meta::get_meta(db.pool(), SALT_KEY).await?.is_some() {
            return Err(VaultError::InvalidData(format!(
                "vault already exists at {}",
                db_path.display()
            )));
        }

        tracing::info!("Creating new credential vault at {}", db_path.display());

        let salt = kdf::generate_salt();
        let key = kdf::derive_key(password, &salt, params)?;

        let token = encrypt_string(VERIFICATION_TOKEN, &key)?;
        vault_meta::set_meta(
            db.pool(),
            VERIFICATION_KEY,
            token.ciphertext(),
            Some(token.nonce().as_slice()),
        )
        .await?;
        vault_meta::set_meta(db.pool(), SALT_KEY, &salt, None).await?;

        tracing::info!("Credential vault created");

        Ok(Self {
            db,
            key,
            db_path: db_path.to_path_buf(),
        })
    }

    /// Unlock an existing vault.
    ///
    /// # Errors
    /// - `VaultError::VaultNotFound` if there is no vault at `db_path`
    /// - `VaultError::InvalidPassword` if the password is wrong
    pub async fn unlock(
        password: &str,
        db_path: impl AsRef<Path>,
        params: KdfParams,
    ) -> Result<Self> {
        let db_path = db_path.as_ref();
        if !db_path.exists() {
            return Err(VaultError::VaultNotFound(db_path.display().to_string()));
        }

        let db = Database::new(db_path).await?;
        db.run_migrations().await?;

        let salt = vault_meta::get_meta(db.pool(), SALT_KEY)
            .await?
            .ok_or_else(|| VaultError::VaultNotFound(db_path.display().to_string()))?;
        if salt.value.len() != kdf::SALT_LENGTH {
            return Err(VaultError::InvalidData(format!(
                "invalid salt: expected {} bytes, got {}",
                kdf::SALT_LENGTH,
                salt.value.len()
            )));
        }

        tracing::info!("Unlocking credential vault at {}", db_path.display());

        let key = kdf::derive_key(password, &salt.value, params)?;
        Self::verify_password(&db, &key).await.map_err(|_| {
            tracing::warn!("Failed to verify vault key - incorrect password");
            VaultError::InvalidPassword
        })?;

        tracing::info!("Credential vault unlocked");

        Ok(Self {
            db,
            key,
            db_path: db_path.to_path_buf(),
        })
    }

    /// Unlock the vault at `db_path`, creating it first if absent.
    pub async fn open_or_create(
        password: &str,
        db_path: impl AsRef<Path>,
        params: KdfParams,
    ) -> Result<Self> {
        match Self::unlock(password, db_path.as_ref(), params).await {
            Err(VaultError::VaultNotFound(_)) => Self::create(password, db_path, params).await,
            other => other,
        }
    }

    /// Lock the vault, zeroizing the key and closing the database.
    pub async fn lock(self) {
        tracing::info!("Locking credential vault");
        self.db.close().await;
        // Key is zeroized on drop
    }

    /// Path of the vault database.
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Record that `credential` worked for `bssid`.
    ///
    /// A credential already stored for the BSSID has its success count
    /// bumped and moves to the front; a new one is inserted.
    pub async fn store_credential(&self, bssid: &Bssid, credential: &Credential) -> Result<()> {
        for row in credentials::list_credentials(self.db.pool(), bssid.as_str()).await? {
            if self.decrypt_row(&row)?.as_ref() == Some(credential) {
                credentials::touch_credential(self.db.pool(), &row.id).await?;
                tracing::debug!("Refreshed stored credential for {}", bssid);
                return Ok(());
            }
        }

        let (ciphertext, nonce) = EncryptedField::encrypt(credential, &self.key)?.into_parts();
        credentials::insert_credential(self.db.pool(), bssid.as_str(), ciphertext, nonce.to_vec())
            .await?;
        tracing::info!("Stored new credential for {}", bssid);
        Ok(())
    }

    /// Credentials that worked for `bssid`, most recent success first.
    ///
    /// Rows that fail to decrypt are skipped.
    pub async fn credentials(&self, bssid: &Bssid) -> Result<Vec<Credential>> {
        let rows = credentials::list_credentials(self.db.pool(), bssid.as_str()).await?;
        let mut found = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(credential) = self.decrypt_row(row)? {
                found.push(credential);
            }
        }
        Ok(found)
    }

    /// Access points with at least one stored credential.
    pub async fn known_bssids(&self) -> Result<Vec<Bssid>> {
        let rows = credentials::list_bssids(self.db.pool()).await?;
        Ok(rows
            .into_iter()
            .filter_map(|raw| Bssid::new(&raw).ok())
            .collect())
    }

    /// Remove every stored credential for `bssid`.
    pub async fn forget(&self, bssid: &Bssid) -> Result<u64> {
        let removed = credentials::delete_credentials(self.db.pool(), bssid.as_str()).await?;
        tracing::info!("Forgot {} credentials for {}", removed, bssid);
        Ok(removed)
    }

    fn decrypt_row(&self, row: &wimap_db::CredentialRow) -> Result<Option<Credential>> {
        let field = EncryptedField::<Credential>::from_stored(row.ciphertext.clone(), &row.nonce)?;
        match field.decrypt(&self.key) {
            Ok(credential) => Ok(Some(credential)),
            Err(e) => {
                tracing::warn!("Skipping unreadable credential row {}: {}", row.id, e);
                Ok(None)
            }
        }
    }

    async fn verify_password(db: &Database, key: &[u8; 32]) -> Result<()> {
        let entry = vault_meta::get_meta(db.pool(), VERIFICATION_KEY)
            .await?
            .ok_or(VaultError::InvalidPassword)?;
        let nonce = entry.nonce.ok_or(VaultError::InvalidPassword)?;

        let token = EncryptedField::<String>::from_stored(entry.value, &nonce)?.decrypt(key)?;
        if token != VERIFICATION_TOKEN {
            return Err(VaultError::InvalidPassword);
        }
        Ok(())
    }
}
