//! WiMap Vault - encrypted credential storage
//!
//! Remembers which credentials unlocked which access points, encrypted
//! with ChaCha20-Poly1305 under an Argon2id-derived key.
//!
//! # Security Model
//!
//! - Master password → Argon2id (64 MB memory by default) → 256-bit key
//! - ChaCha20-Poly1305 AEAD for every stored credential
//! - Keys are zeroized from memory when the vault is locked
//! - Credentials are never logged or included in error messages
//!
//! # Example
//!
//! ```ignore
//! use wimap_vault::{CredentialVault, KdfParams};
//!
//! let vault = CredentialVault::open_or_create("password", "/path/to/vault.db", KdfParams::default()).await?;
//! vault.store_credential(&bssid, &credential).await?;
//! vault.lock().await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod cipher;
pub mod error;
pub mod kdf;
pub mod store;
pub mod vault;

pub use cipher::{encrypt_string, EncryptedField};
pub use error::{Result, VaultError};
pub use kdf::KdfParams;
pub use store::{CredentialStore, MemoryCredentialStore, VaultCredentialStore};
pub use vault::CredentialVault;
