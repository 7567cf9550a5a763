//! Encryption settings for docvault
//!
//! Resolves key, password and derivation parameters from three layers,
//! lowest precedence first:
//!
//! 1. An optional JSON settings file
//! 2. Environment variables (`ENCRYPTION_KEY`, `ENCRYPTION_PASSWORD`, ...)
//! 3. Explicit values from the caller or the command line
//!
//! An explicit key or password replaces the whole secret pair from the lower
//! layers, so `--password` on the command line hides `ENCRYPTION_KEY`.

use std::path::Path;

use serde::Deserialize;

use crate::crypto::{KeyDerivationParams, SecureString, DEFAULT_SALT, MIN_ITERATIONS};
use crate::error::{VaultError, VaultResult};

/// Environment variable holding an encoded key
pub const ENV_KEY: &str = "ENCRYPTION_KEY";
/// Environment variable holding a password
pub const ENV_PASSWORD: &str = "ENCRYPTION_PASSWORD";
/// Environment variable overriding the deployment salt
pub const ENV_SALT: &str = "ENCRYPTION_SALT";
/// Environment variable overriding the PBKDF2 iteration count
pub const ENV_ITERATIONS: &str = "ENCRYPTION_KDF_ITERATIONS";
/// Environment variable overriding the batch worker count
pub const ENV_WORKERS: &str = "DOCVAULT_WORKERS";

/// Encryption configuration, before the mode is resolved
#[derive(Debug, Clone, Deserialize)]
pub struct EncryptionConfig {
    /// Encoded key (URL-safe base64 of 32 bytes)
    #[serde(default)]
    pub key: Option<SecureString>,

    /// Password for key derivation
    #[serde(default)]
    pub password: Option<SecureString>,

    /// Deployment-wide derivation salt
    #[serde(default = "default_salt")]
    pub salt: String,

    /// PBKDF2 iteration count
    #[serde(default = "default_iterations")]
    pub iterations: u32,

    /// Worker threads for directory operations
    #[serde(default)]
    pub workers: Option<usize>,
}

fn default_salt() -> String {
    DEFAULT_SALT.to_string()
}

fn default_iterations() -> u32 {
    MIN_ITERATIONS
}

impl Default for EncryptionConfig {
    fn default() -> Self {
        Self {
            key: None,
            password: None,
            salt: default_salt(),
            iterations: default_iterations(),
            workers: None,
        }
    }
}

/// Blank secrets count as absent
fn non_blank(value: Option<SecureString>) -> Option<SecureString> {
    value.filter(|v| !v.trim().is_empty())
}

impl EncryptionConfig {
    /// Config with an explicit key
    pub fn with_key(key: impl Into<SecureString>) -> Self {
        Self {
            key: Some(key.into()),
            ..Default::default()
        }
    }

    /// Config with an explicit password
    pub fn with_password(password: impl Into<SecureString>) -> Self {
        Self {
            password: Some(password.into()),
            ..Default::default()
        }
    }

    /// Key derivation parameters for password mode
    pub fn kdf_params(&self) -> KeyDerivationParams {
        KeyDerivationParams::with_values(self.salt.clone(), self.iterations)
    }

    /// Load settings from a JSON file
    pub fn load_file(path: &Path) -> VaultResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| VaultError::io(path, e))?;

        let mut config: EncryptionConfig = serde_json::from_str(&contents)
            .map_err(|e| VaultError::Config(format!("Failed to parse settings file: {}", e)))?;

        config.key = non_blank(config.key.take());
        config.password = non_blank(config.password.take());
        Ok(config)
    }

    /// Read from the process environment
    pub fn from_env() -> VaultResult<Self> {
        Self::default().apply_lookup(|name| std::env::var(name).ok())
    }

    /// Read from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> VaultResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::default().apply_lookup(lookup)
    }

    /// Layer variables from `lookup` over this config
    pub fn apply_lookup<F>(mut self, lookup: F) -> VaultResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let key = non_blank(lookup(ENV_KEY).map(SecureString::new));
        let password = non_blank(lookup(ENV_PASSWORD).map(SecureString::new));
        if key.is_some() || password.is_some() {
            self.key = key;
            self.password = password;
        }

        if let Some(salt) = lookup(ENV_SALT).filter(|s| !s.is_empty()) {
            self.salt = salt;
        }

        if let Some(raw) = lookup(ENV_ITERATIONS) {
            self.iterations = raw.trim().parse().map_err(|_| {
                VaultError::Config(format!("{} is not a valid number: {:?}", ENV_ITERATIONS, raw))
            })?;
        }

        if let Some(raw) = lookup(ENV_WORKERS) {
            let workers: usize = raw.trim().parse().map_err(|_| {
                VaultError::Config(format!("{} is not a valid number: {:?}", ENV_WORKERS, raw))
            })?;
            self.workers = Some(workers);
        }

        Ok(self)
    }

    /// Layer explicit secrets over this config
    ///
    /// Either one being present replaces both; explicit blanks are kept so
    /// the factory rejects them.
    pub fn with_explicit(
        mut self,
        key: Option<SecureString>,
        password: Option<SecureString>,
    ) -> Self {
        if key.is_some() || password.is_some() {
            self.key = key;
            self.password = password;
        }
        self
    }

    /// Full resolution: optional file, then environment, then explicit values
    pub fn resolve(
        file: Option<&Path>,
        key: Option<SecureString>,
        password: Option<SecureString>,
    ) -> VaultResult<Self> {
        let base = match file {
            Some(path) => Self::load_file(path)?,
            None => Self::default(),
        };

        Ok(base
            .apply_lookup(|name| std::env::var(name).ok())?
            .with_explicit(key, password))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = EncryptionConfig::default();
        assert!(config.key.is_none() && config.password.is_none());
        assert_eq!(config.salt, DEFAULT_SALT);
        assert_eq!(config.iterations, MIN_ITERATIONS);
    }

    #[test]
    fn test_env_key_and_password() {
        let config = EncryptionConfig::from_lookup(lookup_from(&[
            (ENV_KEY, "some-key"),
            (ENV_PASSWORD, "some-password"),
        ]))
        .unwrap();
        assert_eq!(config.key.as_deref(), Some("some-key"));
        assert_eq!(config.password.as_deref(), Some("some-password"));
    }

    #[test]
    fn test_blank_env_values_are_absent() {
        let config = EncryptionConfig::from_lookup(lookup_from(&[
            (ENV_KEY, ""),
            (ENV_PASSWORD, "   "),
        ]))
        .unwrap();
        assert!(config.key.is_none() && config.password.is_none());
    }

    #[test]
    fn test_env_kdf_overrides() {
        let config = EncryptionConfig::from_lookup(lookup_from(&[
            (ENV_SALT, "clinic-7"),
            (ENV_ITERATIONS, "250000"),
            (ENV_WORKERS, "3"),
        ]))
        .unwrap();
        assert_eq!(config.kdf_params(), KeyDerivationParams::with_values("clinic-7", 250_000));
        assert_eq!(config.workers, Some(3));
    }

    #[test]
    fn test_bad_iterations_rejected() {
        let err =
            EncryptionConfig::from_lookup(lookup_from(&[(ENV_ITERATIONS, "lots")])).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_explicit_password_hides_env_key() {
        let config = EncryptionConfig::from_lookup(lookup_from(&[(ENV_KEY, "env-key")]))
            .unwrap()
            .with_explicit(None, Some(SecureString::new("cli-password")));
        assert!(config.key.is_none());
        assert_eq!(config.password.as_deref(), Some("cli-password"));
    }

    #[test]
    fn test_no_explicit_values_keeps_env() {
        let config = EncryptionConfig::from_lookup(lookup_from(&[(ENV_PASSWORD, "env-pass")]))
            .unwrap()
            .with_explicit(None, None);
        assert_eq!(config.password.as_deref(), Some("env-pass"));
    }

    #[test]
    fn test_env_overrides_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("docvault.json");
        std::fs::write(
            &path,
            r#"{"password": "file-pass", "salt": "file-salt", "iterations": 120000}"#,
        )
        .unwrap();

        let config = EncryptionConfig::load_file(&path)
            .unwrap()
            .apply_lookup(lookup_from(&[(ENV_KEY, "env-key")]))
            .unwrap();
        assert_eq!(config.key.as_deref(), Some("env-key"));
        assert!(config.password.is_none());
        assert_eq!(config.salt, "file-salt");
        assert_eq!(config.iterations, 120_000);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("docvault.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(EncryptionConfig::load_file(&path).unwrap_err().is_config());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = EncryptionConfig::with_password("correct horse battery");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("correct horse"));
    }
}
