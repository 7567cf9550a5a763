//! Manager construction
//!
//! The one place that turns optional key/password input into an
//! [`EncryptionMode`]. Build the manager once at process start and pass it by
//! reference to everything that needs it.

use super::{EncryptionManager, EncryptionMode};
use crate::config::EncryptionConfig;
use crate::crypto::{derive_key, KeyDerivationParams, KeyMaterial};
use crate::error::VaultResult;

/// Resolve the mode: explicit key, then password, then disabled
pub fn resolve_mode(
    key: Option<&str>,
    password: Option<&str>,
    params: &KeyDerivationParams,
) -> VaultResult<EncryptionMode> {
    match (key, password) {
        (Some(key), password) => {
            if password.is_some() {
                tracing::warn!("Both key and password configured; using the key");
            }
            let key = KeyMaterial::from_encoded(key)?;
            tracing::info!("Encryption initialized with provided key");
            Ok(EncryptionMode::Key(key))
        }
        (None, Some(password)) => {
            let key = derive_key(password, params)?;
            tracing::info!(
                iterations = params.iterations,
                "Encryption initialized with password-derived key"
            );
            Ok(EncryptionMode::Password(key))
        }
        (None, None) => {
            tracing::warn!("No encryption key or password provided. Encryption disabled.");
            Ok(EncryptionMode::Disabled)
        }
    }
}

/// Build a manager from resolved configuration
pub fn build_manager(config: &EncryptionConfig) -> VaultResult<EncryptionManager> {
    let mode = resolve_mode(
        config.key.as_deref(),
        config.password.as_deref(),
        &config.kdf_params(),
    )?;
    Ok(EncryptionManager::from_mode(mode))
}

/// Build a manager from the process environment alone
pub fn manager_from_env() -> VaultResult<EncryptionManager> {
    build_manager(&EncryptionConfig::from_env()?)
}
