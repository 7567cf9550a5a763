//! Cryptographic functions for docvault
//!
//! Provides AES-256-GCM encryption with PBKDF2-HMAC-SHA256 key derivation
//! for at-rest encryption of documents.

pub mod encryption;
pub mod key;
pub mod key_derivation;
pub mod secure_memory;

pub use encryption::{decrypt, decrypt_token, encrypt, encrypt_token, ENVELOPE_OVERHEAD};
pub use key::{generate_key, KeyMaterial, KEY_SIZE};
pub use key_derivation::{derive_key, KeyDerivationParams, DEFAULT_SALT, MIN_ITERATIONS};
pub use secure_memory::{SecureBytes, SecureString};
