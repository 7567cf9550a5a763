//! Custom error types for docvault
//!
//! This module defines the error hierarchy for the encryption subsystem using
//! thiserror for ergonomic error definitions.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for docvault operations
#[derive(Error, Debug)]
pub enum VaultError {
    /// Operation requested while disabled, or malformed key/password input
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authentication failed on decrypt.
    ///
    /// Wrong key, corrupted bytes and input that was never encrypted all
    /// land here with the same message.
    #[error("Decryption failed: invalid key or corrupted data")]
    TamperOrKeyMismatch,

    /// Filesystem errors, with the path that failed
    #[error("I/O error on {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Authenticated plaintext was requested as text but is not UTF-8
    #[error("Decrypted data is not valid UTF-8")]
    Encoding,

    /// Encrypt-side AEAD failure
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// A directory operation finished with at least one failed file
    #[error("Batch finished with {failed} failed file(s) and {succeeded} succeeded")]
    PartialBatchFailure { succeeded: usize, failed: usize },
}

impl VaultError {
    /// Wrap an I/O error with the path it occurred on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Stable label for log fields and summaries
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "configuration",
            Self::TamperOrKeyMismatch => "tamper_or_key_mismatch",
            Self::Io { .. } => "io",
            Self::Encoding => "encoding",
            Self::Encryption(_) => "encryption",
            Self::PartialBatchFailure { .. } => "partial_batch_failure",
        }
    }

    /// Check if this is an authentication failure
    pub fn is_tamper(&self) -> bool {
        matches!(self, Self::TamperOrKeyMismatch)
    }

    /// Check if this is a configuration error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Result type alias for docvault operations
pub type VaultResult<T> = Result<T, VaultError>;
