//! docvault - Encryption at rest for documents entering a retrieval pipeline
//!
//! Documents are encrypted with AES-256-GCM under a key that is either
//! supplied directly or derived from a password with PBKDF2-HMAC-SHA256.
//! Decryption only ever produces in-memory values, so plaintext never lands
//! back on disk on its way into splitting and embedding.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Layered encryption settings (file, environment, explicit)
//! - `crypto`: Keys, key derivation, the AEAD envelope, secret wrappers
//! - `error`: Custom error types
//! - `manager`: The encryption manager, batch engine and key rotation
//! - `storage`: Atomic writes and directory scans
//! - `cli`: Operator command handlers
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use docvault::config::EncryptionConfig;
//! use docvault::manager::{build_manager, BatchOptions};
//!
//! let config = EncryptionConfig::from_env()?;
//! let manager = build_manager(&config)?;
//! let report = manager.decrypt_directory_in_memory(Path::new("data/encrypted"), &BatchOptions::default())?;
//! for (name, text) in &report.succeeded {
//!     println!("{}: {} bytes", name, text.len());
//! }
//! # Ok::<(), docvault::VaultError>(())
//! ```

pub mod cli;
pub mod config;
pub mod crypto;
pub mod error;
pub mod logging;
pub mod manager;
pub mod storage;

pub use crypto::generate_key;
pub use error::{VaultError, VaultResult};
pub use manager::{EncryptionManager, EncryptionMode};
