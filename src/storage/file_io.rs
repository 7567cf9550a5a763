//! File I/O utilities with atomic writes
//!
//! Provides safe file operations that won't leave partial output on failure.
//! Only ciphertext is ever handed to [`write_atomic`].

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::crypto::SecureBytes;
use crate::error::{VaultError, VaultResult};

/// Suffix of in-progress temp files; directory scans skip these
pub const TEMP_SUFFIX: &str = ".tmp";

/// Read a whole file into zeroizing memory
pub fn read_secure<P: AsRef<Path>>(path: P) -> VaultResult<SecureBytes> {
    let path = path.as_ref();
    fs::read(path)
        .map(SecureBytes::new)
        .map_err(|e| VaultError::io(path, e))
}

/// Write bytes to a file atomically (write to temp, then rename)
///
/// The target is either completely written or not touched at all. Every
/// call gets its own temp file, so concurrent writers to one target never
/// share an inode; the last rename wins.
pub fn write_atomic<P: AsRef<Path>>(path: P, data: &[u8]) -> VaultResult<()> {
    let path = path.as_ref();

    // Same directory as the target, so the rename stays on one filesystem
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            fs::create_dir_all(parent).map_err(|e| VaultError::io(parent, e))?;
            parent
        }
        None => Path::new("."),
    };

    let prefix = format!(
        ".{}.",
        path.file_name().unwrap_or_default().to_string_lossy()
    );
    let mut temp = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(dir)
        .map_err(|e| VaultError::io(dir, e))?;
    let temp_path = temp.path().to_path_buf();

    // Dropping `temp` on any error below removes it
    temp.write_all(data)
        .and_then(|()| temp.as_file().sync_all())
        .map_err(|e| VaultError::io(&temp_path, e))?;

    temp.persist(path)
        .map(|_| ())
        .map_err(|e| VaultError::io(path, e.error))
}

/// Whether a directory entry name belongs in a batch scan
pub fn is_candidate_name(name: &str) -> bool {
    !name.starts_with('.') && !name.ends_with(TEMP_SUFFIX)
}
