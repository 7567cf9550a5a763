//! Key material and operator key generation
//!
//! Keys travel as URL-safe base64 (with padding) of the 32 raw bytes. The raw
//! bytes are only reachable inside the crate.

use std::fmt;

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::OsRng;
use base64::{engine::general_purpose::URL_SAFE, Engine};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::secure_memory::SecureString;
use crate::error::{VaultError, VaultResult};

/// Size of an AES-256 key in bytes
pub const KEY_SIZE: usize = 32;

/// A 32-byte secret for AES-256-GCM
///
/// Never compared, serialized or printed.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial {
    bytes: [u8; KEY_SIZE],
}

impl KeyMaterial {
    /// Fresh key from the OS CSPRNG
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Parse a key from its portable text encoding
    pub fn from_encoded(encoded: &str) -> VaultResult<Self> {
        let encoded = encoded.trim();
        if encoded.is_empty() {
            return Err(VaultError::Config("Encryption key is empty".to_string()));
        }

        let mut decoded = URL_SAFE
            .decode(encoded)
            .map_err(|_| VaultError::Config("Invalid encryption key encoding".to_string()))?;

        if decoded.len() != KEY_SIZE {
            let len = decoded.len();
            decoded.zeroize();
            return Err(VaultError::Config(format!(
                "Invalid encryption key length: expected {} bytes, got {}",
                KEY_SIZE, len
            )));
        }

        let mut bytes = [0u8; KEY_SIZE];
        bytes.copy_from_slice(&decoded);
        decoded.zeroize();
        Ok(Self { bytes })
    }

    pub(crate) fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    fn encode(&self) -> SecureString {
        SecureString::new(URL_SAFE.encode(self.bytes))
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyMaterial([REDACTED])")
    }
}

/// Generate a new random key in its portable text encoding
///
/// This is the only way key bytes leave the crate. The caller prints it once
/// for the operator to store, e.g. as `ENCRYPTION_KEY=<key>`.
pub fn generate_key() -> SecureString {
    KeyMaterial::generate().encode()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_key_is_portable() {
        let key = generate_key();
        assert_eq!(key.len(), 44);
        let parsed = KeyMaterial::from_encoded(&key).unwrap();
        assert_eq!(parsed.encode().as_str(), key.as_str());
    }

    #[test]
    fn test_generated_keys_differ() {
        let a = KeyMaterial::generate();
        let b = KeyMaterial::generate();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        let key = generate_key();
        let padded = format!("  {}\n", key.as_str());
        assert!(KeyMaterial::from_encoded(&padded).is_ok());
    }

    #[test]
    fn test_empty_key_rejected() {
        let err = KeyMaterial::from_encoded("   ").unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_bad_encoding_rejected() {
        let err = KeyMaterial::from_encoded("not a key!!").unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_wrong_length_rejected() {
        let short = URL_SAFE.encode([7u8; 16]);
        let err = KeyMaterial::from_encoded(&short).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("expected 32 bytes, got 16"));
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = KeyMaterial::from_bytes([0x41; KEY_SIZE]);
        let debug = format!("{:?}", key);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("65"));
        assert!(!debug.contains("QUFB"));
    }
}
