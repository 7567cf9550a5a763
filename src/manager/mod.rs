//! Encryption manager
//!
//! Holds the resolved mode for a session and exposes text-, file- and
//! directory-level operations. Decrypted content only ever comes back as an
//! in-memory value; no path in this module writes it anywhere.

pub mod batch;
pub mod factory;
pub mod rotation;

pub use batch::{BatchOptions, BatchReport, CancellationToken};
pub use factory::{build_manager, manager_from_env, resolve_mode};
pub use rotation::{rotate_directory, rotate_file, RotationOutcome};

use std::fs;
use std::path::{Path, PathBuf};

use crate::crypto::{
    decrypt_token, encrypt_token, KeyDerivationParams, KeyMaterial, SecureBytes, SecureString,
};
use crate::error::{VaultError, VaultResult};
use crate::storage;

/// How a manager was initialised; fixed for its lifetime
#[derive(Debug)]
pub enum EncryptionMode {
    /// No key or password; every crypto call fails
    Disabled,
    /// Key supplied directly
    Key(KeyMaterial),
    /// Key derived from a password
    Password(KeyMaterial),
}

impl EncryptionMode {
    /// Short name for status output and logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Key(_) => "key",
            Self::Password(_) => "password",
        }
    }
}

/// Process-scoped encryption manager
///
/// Immutable after construction and safe to share across threads.
#[derive(Debug)]
pub struct EncryptionManager {
    mode: EncryptionMode,
}

impl EncryptionManager {
    /// Create a manager: explicit key, then password, then disabled
    pub fn new(
        key: Option<&str>,
        password: Option<&str>,
        params: &KeyDerivationParams,
    ) -> VaultResult<Self> {
        resolve_mode(key, password, params).map(Self::from_mode)
    }

    /// Create a manager with an encoded key
    pub fn with_key(key: &str) -> VaultResult<Self> {
        Self::new(Some(key), None, &KeyDerivationParams::default())
    }

    /// Create a manager with a password-derived key
    pub fn with_password(password: &str, params: &KeyDerivationParams) -> VaultResult<Self> {
        Self::new(None, Some(password), params)
    }

    /// Create a manager with encryption disabled
    pub fn disabled() -> Self {
        Self::from_mode(EncryptionMode::Disabled)
    }

    pub(crate) fn from_mode(mode: EncryptionMode) -> Self {
        Self { mode }
    }

    /// The resolved mode
    pub fn mode(&self) -> &EncryptionMode {
        &self.mode
    }

    /// Whether encrypt/decrypt calls can succeed
    pub fn is_enabled(&self) -> bool {
        !matches!(self.mode, EncryptionMode::Disabled)
    }

    fn key(&self) -> VaultResult<&KeyMaterial> {
        match &self.mode {
            EncryptionMode::Key(key) | EncryptionMode::Password(key) => Ok(key),
            EncryptionMode::Disabled => {
                Err(VaultError::Config("Encryption not enabled".to_string()))
            }
        }
    }

    /// Encrypt arbitrary bytes into a text token
    pub fn encrypt_bytes(&self, plaintext: &[u8]) -> VaultResult<String> {
        encrypt_token(plaintext, self.key()?)
    }

    /// Decrypt a text token into bytes
    pub fn decrypt_bytes(&self, ciphertext: &str) -> VaultResult<SecureBytes> {
        decrypt_token(ciphertext, self.key()?)
    }

    /// Encrypt text into a text token
    pub fn encrypt_text(&self, plaintext: &str) -> VaultResult<String> {
        self.encrypt_bytes(plaintext.as_bytes())
    }

    /// Decrypt a text token into text
    pub fn decrypt_text(&self, ciphertext: &str) -> VaultResult<SecureString> {
        self.decrypt_bytes(ciphertext)?
            .into_secure_string()
            .map_err(|_| VaultError::Encoding)
    }

    /// Encrypt one file into `output`
    ///
    /// The input is read whole and left untouched; the output is replaced
    /// atomically.
    pub fn encrypt_file(&self, input: &Path, output: &Path) -> VaultResult<()> {
        let key = self.key()?;

        if is_same_file(input, output) {
            return Err(VaultError::Config(format!(
                "Refusing to encrypt {} onto itself",
                input.display()
            )));
        }

        let plaintext = storage::read_secure(input)?;
        let token = encrypt_token(&plaintext, key)?;
        storage::write_atomic(output, token.as_bytes())?;

        tracing::debug!(input = %input.display(), output = %output.display(), "File encrypted");
        Ok(())
    }

    /// Read an encrypted file and decrypt it in memory as bytes
    pub fn decrypt_file_bytes_in_memory(&self, path: &Path) -> VaultResult<SecureBytes> {
        let key = self.key()?;
        let raw = storage::read_secure(path)?;
        // Not text means not a token
        let token = std::str::from_utf8(&raw).map_err(|_| VaultError::TamperOrKeyMismatch)?;
        let plaintext = decrypt_token(token, key)?;

        tracing::debug!(path = %path.display(), "File decrypted in memory");
        Ok(plaintext)
    }

    /// Read an encrypted file and decrypt it in memory as text
    pub fn decrypt_file_in_memory(&self, path: &Path) -> VaultResult<SecureString> {
        self.decrypt_file_bytes_in_memory(path)?
            .into_secure_string()
            .map_err(|_| VaultError::Encoding)
    }

    /// Encrypt every matching file in `input_dir` into `output_dir`
    ///
    /// Each file keeps its name. Per-file failures land in the report; only
    /// problems with the directories themselves fail the whole call.
    pub fn encrypt_directory(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        options: &BatchOptions,
    ) -> VaultResult<BatchReport<PathBuf>> {
        self.key()?;

        if is_same_file(input_dir, output_dir) {
            return Err(VaultError::Config(format!(
                "Output directory {} is the input directory",
                output_dir.display()
            )));
        }

        let files = storage::list_files(input_dir, &options.filter)?;
        fs::create_dir_all(output_dir).map_err(|e| VaultError::io(output_dir, e))?;

        let report = batch::run_batch("encrypt_directory", files, options, |path| {
            let target = output_dir.join(path.file_name().unwrap_or_default());
            self.encrypt_file(path, &target).map(|()| target)
        });

        tracing::info!(
            "Encrypted {} files from {} to {}",
            report.succeeded.len(),
            input_dir.display(),
            output_dir.display()
        );
        Ok(report)
    }

    /// Decrypt every matching file in `input_dir`, keeping results in memory
    pub fn decrypt_directory_in_memory(
        &self,
        input_dir: &Path,
        options: &BatchOptions,
    ) -> VaultResult<BatchReport<SecureString>> {
        self.key()?;

        let files = storage::list_files(input_dir, &options.filter)?;
        let report = batch::run_batch("decrypt_directory", files, options, |path| {
            self.decrypt_file_in_memory(path)
        });

        tracing::info!(
            "Decrypted {} files in memory from {}",
            report.succeeded.len(),
            input_dir.display()
        );
        Ok(report)
    }
}

/// Both paths exist and resolve to the same place
fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::generate_key;
    use crate::storage::FileFilter;
    use tempfile::TempDir;

    fn key_manager() -> EncryptionManager {
        EncryptionManager::with_key(&generate_key()).unwrap()
    }

    #[test]
    fn test_text_round_trip() {
        let manager = key_manager();
        let ciphertext = manager.encrypt_text("Patient ID: 001").unwrap();
        assert_ne!(ciphertext, "Patient ID: 001");
        assert_eq!(
            manager.decrypt_text(&ciphertext).unwrap().as_str(),
            "Patient ID: 001"
        );
    }

    #[test]
    fn test_disabled_rejects_everything() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("note.txt");
        fs::write(&file, "plain").unwrap();

        let manager = EncryptionManager::disabled();
        assert!(!manager.is_enabled());
        assert!(manager.encrypt_text("x").unwrap_err().is_config());
        assert!(manager.decrypt_text("x").unwrap_err().is_config());
        assert!(manager
            .encrypt_file(&file, &temp_dir.path().join("out.txt"))
            .unwrap_err()
            .is_config());
        assert!(manager.decrypt_file_in_memory(&file).unwrap_err().is_config());
        assert!(manager
            .encrypt_directory(temp_dir.path(), &temp_dir.path().join("out"), &BatchOptions::default())
            .unwrap_err()
            .is_config());
        assert!(manager
            .decrypt_directory_in_memory(temp_dir.path(), &BatchOptions::default())
            .unwrap_err()
            .is_config());
        assert!(!temp_dir.path().join("out.txt").exists());
        assert!(!temp_dir.path().join("out").exists());
    }

    #[test]
    fn test_decrypt_non_utf8_text_is_encoding_error() {
        let manager = key_manager();
        let token = manager.encrypt_bytes(&[0xff, 0x00, 0xfe]).unwrap();
        assert!(matches!(
            manager.decrypt_text(&token).unwrap_err(),
            VaultError::Encoding
        ));
        assert_eq!(manager.decrypt_bytes(&token).unwrap().as_bytes(), &[0xff, 0x00, 0xfe]);
    }

    #[test]
    fn test_file_round_trip_leaves_input_alone() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("patient_001.txt");
        let output = temp_dir.path().join("enc").join("patient_001.txt");
        fs::write(&input, "Diagnosis: hypertension").unwrap();

        let manager = key_manager();
        manager.encrypt_file(&input, &output).unwrap();

        assert_eq!(fs::read_to_string(&input).unwrap(), "Diagnosis: hypertension");
        let on_disk = fs::read_to_string(&output).unwrap();
        assert!(!on_disk.contains("hypertension"));
        assert_eq!(
            manager.decrypt_file_in_memory(&output).unwrap().as_str(),
            "Diagnosis: hypertension"
        );
    }

    #[test]
    fn test_encrypt_file_onto_itself_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("note.txt");
        fs::write(&input, "keep me").unwrap();

        let err = key_manager().encrypt_file(&input, &input).unwrap_err();
        assert!(err.is_config());
        assert_eq!(fs::read_to_string(&input).unwrap(), "keep me");
    }

    #[test]
    fn test_plaintext_file_fails_as_tamper() {
        let temp_dir = TempDir::new().unwrap();
        let text = temp_dir.path().join("plain.txt");
        let binary = temp_dir.path().join("blob.bin");
        fs::write(&text, "Patient ID: 001\nNot encrypted").unwrap();
        fs::write(&binary, [0u8, 159, 146, 150]).unwrap();

        let manager = key_manager();
        assert!(manager.decrypt_file_in_memory(&text).unwrap_err().is_tamper());
        assert!(manager.decrypt_file_in_memory(&binary).unwrap_err().is_tamper());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = key_manager()
            .decrypt_file_in_memory(&temp_dir.path().join("missing.txt"))
            .unwrap_err();
        assert_eq!(err.category(), "io");
    }

    #[test]
    fn test_directory_round_trip_with_filter() {
        let temp_dir = TempDir::new().unwrap();
        let plain = temp_dir.path().join("plain");
        let enc = temp_dir.path().join("enc");
        fs::create_dir(&plain).unwrap();
        for i in 0..4 {
            fs::write(plain.join(format!("doc_{}.txt", i)), format!("record {}", i)).unwrap();
        }
        fs::write(plain.join("notes.md"), "not picked up").unwrap();

        let manager = key_manager();
        let options = BatchOptions::default().with_filter(FileFilter::from_extension(Some("txt")));

        let report = manager.encrypt_directory(&plain, &enc, &options).unwrap();
        assert_eq!(report.succeeded.len(), 4);
        assert_eq!(report.succeeded["doc_2.txt"], enc.join("doc_2.txt"));
        assert!(!enc.join("notes.md").exists());

        let decrypted = manager
            .decrypt_directory_in_memory(&enc, &BatchOptions::default())
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(decrypted.len(), 4);
        assert_eq!(decrypted["doc_3.txt"].as_str(), "record 3");
    }

    #[test]
    fn test_encrypt_directory_into_itself_rejected() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.txt"), "a").unwrap();

        let err = key_manager()
            .encrypt_directory(temp_dir.path(), temp_dir.path(), &BatchOptions::default())
            .unwrap_err();
        assert!(err.is_config());
        assert_eq!(fs::read_to_string(temp_dir.path().join("a.txt")).unwrap(), "a");
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(EncryptionManager::disabled().mode().name(), "disabled");
        assert_eq!(key_manager().mode().name(), "key");
    }
}
