//! Credential store port used by the connection engine.
//!
//! `get` returns credentials that previously worked for an access point,
//! most recent success first; `put` records a new success.

use crate::error::Result;
use crate::vault::CredentialVault;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use wimap_core::{Bssid, Credential};

/// Persistent record of working credentials.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Credentials known to work for `bssid`, most recent first.
    async fn get(&self, bssid: &Bssid) -> Result<Vec<Credential>>;

    /// Record that `credential` worked for `bssid`.
    async fn put(&self, bssid: &Bssid, credential: &Credential) -> Result<()>;
}

/// Non-persistent store, used when the vault is disabled.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    entries: Mutex<HashMap<Bssid, Vec<Credential>>>,
}

impl MemoryCredentialStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self, bssid: &Bssid) -> Result<Vec<Credential>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(bssid).cloned().unwrap_or_default())
    }

    async fn put(&self, bssid: &Bssid, credential: &Credential) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let list = entries.entry(bssid.clone()).or_default();
        list.retain(|existing| existing != credential);
        list.insert(0, credential.clone());
        Ok(())
    }
}

/// Store backed by the encrypted [`CredentialVault`].
#[derive(Debug)]
pub struct VaultCredentialStore {
    vault: CredentialVault,
}

impl VaultCredentialStore {
    /// Wrap an unlocked vault.
    #[must_use]
    pub fn new(vault: CredentialVault) -> Self {
        Self { vault }
    }

    /// The underlying vault.
    #[must_use]
    pub fn vault(&self) -> &CredentialVault {
        &self.vault
    }

    /// Lock the vault, consuming the store.
    pub async fn lock(self) {
        self.vault.lock().await;
    }
}

#[async_trait]
impl CredentialStore for VaultCredentialStore {
    async fn get(&self, bssid: &Bssid) -> Result<Vec<Credential>> {
        self.vault.credentials(bssid).await
    }

    async fn put(&self, bssid: &Bssid, credential: &Credential) -> Result<()> {
        self.vault.store_credential(bssid, credential).await
    }
}
