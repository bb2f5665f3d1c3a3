//! Key Derivation Function (KDF) using Argon2id.
//!
//! # Security Parameters
//!
//! - Algorithm: Argon2id (hybrid mode)
//! - Memory cost: configurable, 64 MB by default
//! - Time cost: configurable, 2 iterations by default
//! - Parallelism: 1 thread
//! - Output: 32 bytes (256 bits)

use crate::error::{Result, VaultError};
use argon2::{Algorithm, Argon2, ParamsBuilder, Version};
use rand::{rngs::OsRng, RngCore};
use wimap_core::VaultConfig;
use zeroize::Zeroizing;

/// Length of the derived key in bytes (256 bits).
pub const KEY_LENGTH: usize = 32;

/// Length of the salt in bytes.
pub const SALT_LENGTH: usize = 32;

/// Argon2id parallelism (threads).
const PARALLELISM: u32 = 1;

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory cost in KB
    pub memory_kb: u32,
    /// Time cost (iterations)
    pub iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::from(&VaultConfig::default())
    }
}

impl From<&VaultConfig> for KdfParams {
    fn from(config: &VaultConfig) -> Self {
        Self {
            memory_kb: config.argon2_memory_kb,
            iterations: config.argon2_iterations,
        }
    }
}

/// Generate a random salt for key derivation.
#[must_use]
pub fn generate_salt() -> [u8; SALT_LENGTH] {
    let mut salt = [0u8; SALT_LENGTH];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Derive a 256-bit encryption key from a password using Argon2id.
///
/// # Errors
/// Returns `VaultError::KeyDerivation` if the salt has the wrong length or
/// the parameters are rejected by Argon2.
pub fn derive_key(
    password: &str,
    salt: &[u8],
    params: KdfParams,
) -> Result<Zeroizing<[u8; KEY_LENGTH]>> {
    if salt.len() != SALT_LENGTH {
        return Err(VaultError::KeyDerivation(format!(
            "invalid salt length: expected {SALT_LENGTH} bytes, got {}",
            salt.len()
        )));
    }

    let argon_params = ParamsBuilder::new()
        .m_cost(params.memory_kb)
        .t_cost(params.iterations)
        .p_cost(PARALLELISM)
        .output_len(KEY_LENGTH)
        .build()
        .map_err(|e| VaultError::KeyDerivation(format!("failed to build parameters: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params);

    let mut key = Zeroizing::new([0u8; KEY_LENGTH]);
    argon2
        .hash_password_into(password.as_bytes(), salt, key.as_mut())
        .map_err(|e| VaultError::KeyDerivation(format!("key derivation failed: {e}")))?;

    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAST: KdfParams = KdfParams {
        memory_kb: 1024,
        iterations: 1,
    };

    #[test]
    fn test_generate_salt() {
        let salt1 = generate_salt();
        let salt2 = generate_salt();

        assert_ne!(salt1, salt2);
        assert_eq!(salt1.len(), SALT_LENGTH);
    }

    #[test]
    fn test_derive_key_deterministic() {
        let salt = generate_salt();

        let key1 = derive_key("test_password", &salt, FAST).expect("derive key 1");
        let key2 = derive_key("test_password", &salt, FAST).expect("derive key 2");

        assert_eq!(key1.as_ref(), key2.as_ref());
    }

    #[test]
    fn test_derive_key_different_passwords() {
        let salt = generate_salt();

        let key1 = derive_key("password1", &salt, FAST).expect("derive key 1");
        let key2 = derive_key("password2", &salt, FAST).expect("derive key 2");

        assert_ne!(key1.as_ref(), key2.as_ref());
    }

    #[test]
    fn test_params_change_key() {
        let salt = generate_salt();
        let slower = KdfParams {
            iterations: 2,
            ..FAST
        };

        let key1 = derive_key("password", &salt, FAST).expect("derive key 1");
        let key2 = derive_key("password", &salt, slower).expect("derive key 2");

        assert_ne!(key1.as_ref(), key2.as_ref());
    }

    #[test]
    fn test_derive_key_invalid_salt_length() {
        let result = derive_key("password", &[0u8; 16], FAST);

        match result {
            Err(VaultError::KeyDerivation(msg)) => {
                assert!(msg.contains("invalid salt length"));
            }
            _ => panic!("expected KeyDerivation error"),
        }
    }

    #[test]
    fn test_rejects_zero_iterations() {
        let params = KdfParams {
            iterations: 0,
            ..FAST
        };
        let result = derive_key("password", &generate_salt(), params);
        assert!(matches!(result, Err(VaultError::KeyDerivation(_))));
    }

    #[test]
    fn test_default_params_follow_config() {
        assert_eq!(
            KdfParams::default(),
            KdfParams {
                memory_kb: 65_536,
                iterations: 2
            }
        );
    }
}
