//! AES-256-GCM encryption/decryption
//!
//! Provides authenticated encryption for documents at rest. Each call draws a
//! fresh random nonce and produces a self-describing envelope:
//!
//! ```text
//! "DVLT" | version (1) | nonce (12) | ciphertext | tag (16)
//! ```
//!
//! The 5-byte header is bound as associated data. On disk and in
//! [`encrypt_token`] output the envelope is URL-safe base64.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng, Payload},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::URL_SAFE, Engine};

use super::key::KeyMaterial;
use super::secure_memory::SecureBytes;
use crate::error::{VaultError, VaultResult};

/// Format marker at the start of every envelope
pub const MAGIC: &[u8; 4] = b"DVLT";

/// Current envelope format version
pub const FORMAT_VERSION: u8 = 1;

/// Size of the AES-GCM nonce in bytes (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Size of the GCM authentication tag in bytes
pub const TAG_SIZE: usize = 16;

const HEADER_SIZE: usize = MAGIC.len() + 1;

/// Fixed number of bytes an envelope adds to the plaintext
pub const ENVELOPE_OVERHEAD: usize = HEADER_SIZE + NONCE_SIZE + TAG_SIZE;

fn header() -> [u8; HEADER_SIZE] {
    let mut header = [0u8; HEADER_SIZE];
    header[..MAGIC.len()].copy_from_slice(MAGIC);
    header[MAGIC.len()] = FORMAT_VERSION;
    header
}

fn cipher(key: &KeyMaterial) -> VaultResult<Aes256Gcm> {
    Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::Encryption(format!("Failed to create cipher: {}", e)))
}

/// Encrypt plaintext into a binary envelope
pub fn encrypt(plaintext: &[u8], key: &KeyMaterial) -> VaultResult<Vec<u8>> {
    let cipher = cipher(key)?;
    let header = header();

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let sealed = cipher
        .encrypt(
            nonce,
            Payload {
                msg: plaintext,
                aad: &header,
            },
        )
        .map_err(|e| VaultError::Encryption(format!("Encryption failed: {}", e)))?;

    let mut envelope = Vec::with_capacity(HEADER_SIZE + NONCE_SIZE + sealed.len());
    envelope.extend_from_slice(&header);
    envelope.extend_from_slice(&nonce_bytes);
    envelope.extend_from_slice(&sealed);
    Ok(envelope)
}

/// Decrypt a binary envelope
///
/// Every failure, structural or cryptographic, is
/// [`VaultError::TamperOrKeyMismatch`].
pub fn decrypt(envelope: &[u8], key: &KeyMaterial) -> VaultResult<SecureBytes> {
    if envelope.len() < ENVELOPE_OVERHEAD {
        return Err(VaultError::TamperOrKeyMismatch);
    }

    let (header, rest) = envelope.split_at(HEADER_SIZE);
    if &header[..MAGIC.len()] != MAGIC || header[MAGIC.len()] != FORMAT_VERSION {
        return Err(VaultError::TamperOrKeyMismatch);
    }

    let (nonce_bytes, sealed) = rest.split_at(NONCE_SIZE);
    let nonce = Nonce::from_slice(nonce_bytes);

    let plaintext = cipher(key)?
        .decrypt(
            nonce,
            Payload {
                msg: sealed,
                aad: header,
            },
        )
        .map_err(|_| VaultError::TamperOrKeyMismatch)?;

    Ok(SecureBytes::new(plaintext))
}

/// Encrypt into the portable text token
pub fn encrypt_token(plaintext: &[u8], key: &KeyMaterial) -> VaultResult<String> {
    encrypt(plaintext, key).map(|envelope| URL_SAFE.encode(envelope))
}

/// Decrypt a portable text token
pub fn decrypt_token(token: &str, key: &KeyMaterial) -> VaultResult<SecureBytes> {
    let envelope = URL_SAFE
        .decode(token.trim())
        .map_err(|_| VaultError::TamperOrKeyMismatch)?;
    decrypt(&envelope, key)
}
