//! Field-level encryption using ChaCha20-Poly1305 AEAD.
//!
//! Each encrypted value carries its own random 96-bit nonce and
//! authentication tag, so rows can be decrypted independently.

use crate::error::{Result, VaultError};
use chacha20poly1305::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    ChaCha20Poly1305, Nonce,
};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

/// Length of the nonce in bytes (96 bits for ChaCha20-Poly1305).
pub const NONCE_LENGTH: usize = 12;

/// Encrypted value with ciphertext and nonce.
///
/// `T` is the plaintext type; it is serialized to JSON before encryption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedField<T> {
    ciphertext: Vec<u8>,
    nonce: [u8; NONCE_LENGTH],
    #[serde(skip)]
    _phantom: PhantomData<T>,
}

impl<T> EncryptedField<T>
where
    T: Serialize + for<'de> Deserialize<'de>,
{
    /// Rebuild a field loaded from storage.
    #[must_use]
    pub fn from_raw(ciphertext: Vec<u8>, nonce: [u8; NONCE_LENGTH]) -> Self {
        Self {
            ciphertext,
            nonce,
            _phantom: PhantomData,
        }
    }

    /// Rebuild a field from stored bytes, checking the nonce length.
    pub fn from_stored(ciphertext: Vec<u8>, nonce: &[u8]) -> Result<Self> {
        let nonce: [u8; NONCE_LENGTH] = nonce.try_into().map_err(|_| {
            VaultError::InvalidData(format!(
                "invalid nonce: expected {NONCE_LENGTH} bytes, got {}",
                nonce.len()
            ))
        })?;
        Ok(Self::from_raw(ciphertext, nonce))
    }

    /// Encrypt a value using the provided key.
    ///
    /// # Errors
    /// Returns `VaultError::Encryption` if encryption or serialization fails.
    pub fn encrypt(value: &T, key: &[u8; 32]) -> Result<Self> {
        let plaintext = zeroize::Zeroizing::new(
            serde_json::to_vec(value)
                .map_err(|e| VaultError::Encryption(format!("serialization failed: {e}")))?,
        );

        let nonce_bytes = ChaCha20Poly1305::generate_nonce(&mut OsRng);
        let mut nonce = [0u8; NONCE_LENGTH];
        nonce.copy_from_slice(nonce_bytes.as_slice());

        let cipher = ChaCha20Poly1305::new(key.into());
        let ciphertext = cipher
            .encrypt(&nonce_bytes, plaintext.as_ref())
            .map_err(|e| VaultError::Encryption(format!("encryption failed: {e}")))?;

        Ok(Self::from_raw(ciphertext, nonce))
    }

    /// Decrypt the field using the provided key.
    ///
    /// # Errors
    /// Returns `VaultError::Decryption` if the key is wrong, the data was
    /// tampered with, or the plaintext does not deserialize.
    pub fn decrypt(&self, key: &[u8; 32]) -> Result<T> {
        let cipher = ChaCha20Poly1305::new(key.into());

        let plaintext = zeroize::Zeroizing::new(
            cipher
                .decrypt(Nonce::from_slice(&self.nonce), self.ciphertext.as_ref())
                .map_err(|e| VaultError::Decryption(format!("decryption failed: {e}")))?,
        );

        serde_json::from_slice(&plaintext)
            .map_err(|e| VaultError::Decryption(format!("deserialization failed: {e}")))
    }

    /// Get the nonce.
    #[must_use]
    pub fn nonce(&self) -> &[u8; NONCE_LENGTH] {
        &self.nonce
    }

    /// Get the ciphertext.
    #[must_use]
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Split into ciphertext and nonce for storage.
    #[must_use]
    pub fn into_parts(self) -> (Vec<u8>, [u8; NONCE_LENGTH]) {
        (self.ciphertext, self.nonce)
    }
}

/// Encrypt a string value.
pub fn encrypt_string(value: &str, key: &[u8; 32]) -> Result<EncryptedField<String>> {
    EncryptedField::encrypt(&value.to_string(), key)
}
