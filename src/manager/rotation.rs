//! Key rotation
//!
//! Re-encrypts ciphertext under a new manager one file at a time. Each file
//! is replaced atomically, so an interrupted run leaves every file readable
//! by either the old or the new key, and running again finishes the job.

use std::path::Path;

use super::batch::{self, BatchOptions, BatchReport};
use super::EncryptionManager;
use crate::error::{VaultError, VaultResult};
use crate::storage;

/// What happened to one file during rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationOutcome {
    /// Decrypted under the old key and rewritten under the new one
    Rotated,
    /// Already readable under the new key; left as is
    AlreadyCurrent,
}

/// Rotate one encrypted file in place
pub fn rotate_file(
    old: &EncryptionManager,
    new: &EncryptionManager,
    path: &Path,
) -> VaultResult<RotationOutcome> {
    match old.decrypt_file_bytes_in_memory(path) {
        Ok(plaintext) => {
            let token = new.encrypt_bytes(&plaintext)?;
            storage::write_atomic(path, token.as_bytes())?;
            Ok(RotationOutcome::Rotated)
        }
        Err(VaultError::TamperOrKeyMismatch) => new
            .decrypt_file_bytes_in_memory(path)
            .map(|_| RotationOutcome::AlreadyCurrent),
        Err(e) => Err(e),
    }
}

/// Rotate every matching file in `dir` from `old` to `new`
pub fn rotate_directory(
    old: &EncryptionManager,
    new: &EncryptionManager,
    dir: &Path,
    options: &BatchOptions,
) -> VaultResult<BatchReport<RotationOutcome>> {
    if !old.is_enabled() || !new.is_enabled() {
        return Err(VaultError::Config(
            "Key rotation needs both the old and the new key".to_string(),
        ));
    }

    let files = storage::list_files(dir, &options.filter)?;
    let report = batch::run_batch("rotate_directory", files, options, |path| {
        rotate_file(old, new, path)
    });

    let rotated = report
        .succeeded
        .values()
        .filter(|o| **o == RotationOutcome::Rotated)
        .count();
    tracing::info!(
        rotated,
        already_current = report.succeeded.len() - rotated,
        "Key rotation finished for {}",
        dir.display()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::generate_key;
    use std::fs;
    use tempfile::TempDir;

    fn managers() -> (EncryptionManager, EncryptionManager) {
        (
            EncryptionManager::with_key(&generate_key()).unwrap(),
            EncryptionManager::with_key(&generate_key()).unwrap(),
        )
    }

    fn write_encrypted(manager: &EncryptionManager, dir: &Path, name: &str, text: &str) {
        fs::write(dir.join(name), manager.encrypt_text(text).unwrap()).unwrap();
    }

    #[test]
    fn test_rotate_directory() {
        let temp_dir = TempDir::new().unwrap();
        let (old, new) = managers();
        for i in 0..3 {
            write_encrypted(&old, temp_dir.path(), &format!("r{}.txt", i), &format!("record {}", i));
        }

        let report = rotate_directory(&old, &new, temp_dir.path(), &BatchOptions::default())
            .unwrap();
        assert_eq!(report.succeeded.len(), 3);
        assert!(report
            .succeeded
            .values()
            .all(|o| *o == RotationOutcome::Rotated));

        let path = temp_dir.path().join("r1.txt");
        assert!(old.decrypt_file_in_memory(&path).unwrap_err().is_tamper());
        assert_eq!(new.decrypt_file_in_memory(&path).unwrap().as_str(), "record 1");
    }

    #[test]
    fn test_resume_after_partial_rotation() {
        let temp_dir = TempDir::new().unwrap();
        let (old, new) = managers();
        write_encrypted(&old, temp_dir.path(), "pending.txt", "old");
        write_encrypted(&new, temp_dir.path(), "done.txt", "new");

        let report = rotate_directory(&old, &new, temp_dir.path(), &BatchOptions::default())
            .unwrap();
        assert_eq!(report.succeeded["pending.txt"], RotationOutcome::Rotated);
        assert_eq!(report.succeeded["done.txt"], RotationOutcome::AlreadyCurrent);
        assert!(report.failed.is_empty());
    }

    #[test]
    fn test_foreign_file_fails_and_is_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let (old, new) = managers();
        let (stranger, _) = managers();
        write_encrypted(&old, temp_dir.path(), "ours.txt", "ours");
        write_encrypted(&stranger, temp_dir.path(), "theirs.txt", "theirs");
        let before = fs::read(temp_dir.path().join("theirs.txt")).unwrap();

        let report = rotate_directory(&old, &new, temp_dir.path(), &BatchOptions::default())
            .unwrap();
        assert_eq!(report.succeeded.len(), 1);
        assert!(report.failed["theirs.txt"].is_tamper());
        assert_eq!(fs::read(temp_dir.path().join("theirs.txt")).unwrap(), before);
    }

    #[test]
    fn test_disabled_manager_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let (old, _) = managers();
        let err = rotate_directory(
            &old,
            &EncryptionManager::disabled(),
            temp_dir.path(),
            &BatchOptions::default(),
        )
        .unwrap_err();
        assert!(err.is_config());
    }
}
