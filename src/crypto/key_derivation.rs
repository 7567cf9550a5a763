//! Key derivation using PBKDF2-HMAC-SHA256
//!
//! Derives encryption keys from passwords. The derived key is a pure function
//! of (password, salt, iterations) and is never stored; the same inputs always
//! reproduce it, which is what lets a later session decrypt earlier files.

use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::key::{KeyMaterial, KEY_SIZE};
use crate::error::{VaultError, VaultResult};

/// Lowest accepted iteration count
pub const MIN_ITERATIONS: u32 = 100_000;

/// Deployment-wide salt used when configuration does not supply one
pub const DEFAULT_SALT: &str = "docvault_salt_v1";

/// Parameters for key derivation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyDerivationParams {
    /// Deployment-wide salt
    pub salt: String,
    /// PBKDF2 iteration count (default: 100,000)
    pub iterations: u32,
}

impl Default for KeyDerivationParams {
    fn default() -> Self {
        Self {
            salt: DEFAULT_SALT.to_string(),
            iterations: MIN_ITERATIONS,
        }
    }
}

impl KeyDerivationParams {
    /// Create params with specific values
    pub fn with_values(salt: impl Into<String>, iterations: u32) -> Self {
        Self {
            salt: salt.into(),
            iterations,
        }
    }

    /// Check the params are usable
    pub fn validate(&self) -> VaultResult<()> {
        if self.salt.is_empty() {
            return Err(VaultError::Config("Key derivation salt is empty".to_string()));
        }
        if self.iterations < MIN_ITERATIONS {
            return Err(VaultError::Config(format!(
                "Key derivation needs at least {} iterations, got {}",
                MIN_ITERATIONS, self.iterations
            )));
        }
        Ok(())
    }
}

/// Derive an encryption key from a password
pub fn derive_key(password: &str, params: &KeyDerivationParams) -> VaultResult<KeyMaterial> {
    if password.is_empty() {
        return Err(VaultError::Config("Password is empty".to_string()));
    }
    params.validate()?;

    let mut key = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha256>(
        password.as_bytes(),
        params.salt.as_bytes(),
        params.iterations,
        &mut key,
    );

    Ok(KeyMaterial::from_bytes(key))
}
