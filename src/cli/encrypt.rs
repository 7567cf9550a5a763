//! Encryption CLI commands
//!
//! Operator commands for key generation, encryption, in-memory verification
//! and key rotation. Nothing here prints decrypted content.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Subcommand;

use crate::config::EncryptionConfig;
use crate::crypto::{generate_key, SecureString};
use crate::error::{VaultError, VaultResult};
use crate::manager::{rotate_directory, BatchOptions, EncryptionManager, EncryptionMode};
use crate::storage::FileFilter;

/// Encryption management commands
#[derive(Subcommand)]
pub enum EncryptCommands {
    /// Generate a new random encryption key
    #[command(alias = "generate-key")]
    Keygen {
        /// Print only the key, for scripts
        #[arg(long)]
        raw: bool,
    },

    /// Show the resolved encryption mode
    Status,

    /// Encrypt a file, or every file in a directory
    Encrypt {
        /// Plaintext file or directory
        input: PathBuf,
        /// Output file or directory (never the input)
        output: PathBuf,
        /// Only pick up files with this extension, e.g. txt
        #[arg(long)]
        ext: Option<String>,
    },

    /// Decrypt in memory and report which files are readable
    Verify {
        /// Encrypted file or directory
        path: PathBuf,
        /// Only pick up files with this extension, e.g. txt
        #[arg(long)]
        ext: Option<String>,
    },

    /// Re-encrypt a directory in place under a new key or password
    Rotate {
        /// Directory of encrypted files
        dir: PathBuf,
        /// New encoded key
        #[arg(
            long,
            conflicts_with = "new_password",
            required_unless_present = "new_password",
            allow_hyphen_values = true
        )]
        new_key: Option<String>,
        /// New password (derived with the configured salt and iterations)
        #[arg(long, allow_hyphen_values = true)]
        new_password: Option<String>,
        /// Only pick up files with this extension, e.g. txt
        #[arg(long)]
        ext: Option<String>,
    },
}

/// Handle encryption commands
pub fn handle_encrypt_command(
    manager: &EncryptionManager,
    config: &EncryptionConfig,
    options: BatchOptions,
    cmd: EncryptCommands,
) -> VaultResult<()> {
    match cmd {
        EncryptCommands::Keygen { raw } => print_new_key(raw),
        EncryptCommands::Status => show_status(manager, config),
        EncryptCommands::Encrypt { input, output, ext } => {
            let options = options.with_filter(FileFilter::from_extension(ext.as_deref()));
            encrypt(manager, input, output, &options)
        }
        EncryptCommands::Verify { path, ext } => {
            let options = options.with_filter(FileFilter::from_extension(ext.as_deref()));
            verify(manager, path, &options)
        }
        EncryptCommands::Rotate {
            dir,
            new_key,
            new_password,
            ext,
        } => {
            let options = options.with_filter(FileFilter::from_extension(ext.as_deref()));
            let new_password = new_password.map(SecureString::new);
            let new_manager = EncryptionManager::new(
                new_key.as_deref(),
                new_password.as_deref(),
                &config.kdf_params(),
            )?;
            rotate(manager, &new_manager, dir, &options)
        }
    }
}

/// Print a fresh key; the only place key material is shown
pub fn print_new_key(raw: bool) -> VaultResult<()> {
    let key = generate_key();

    if raw {
        println!("{}", key.as_str());
        return Ok(());
    }

    println!("Generated a new encryption key.");
    println!("Store it securely (e.g. in your deployment .env); it is not saved anywhere.");
    println!();
    println!("ENCRYPTION_KEY={}", key.as_str());
    Ok(())
}

/// Show encryption status
fn show_status(manager: &EncryptionManager, config: &EncryptionConfig) -> VaultResult<()> {
    println!("Encryption Status");
    println!("=================");
    println!();

    match manager.mode() {
        EncryptionMode::Disabled => {
            println!("Status: DISABLED");
            println!();
            println!("Set ENCRYPTION_KEY or ENCRYPTION_PASSWORD to enable encryption.");
            println!("Run 'docvault keygen' to create a key.");
        }
        EncryptionMode::Key(_) => {
            println!("Status: ENABLED");
            println!("Source: encryption key");
        }
        EncryptionMode::Password(_) => {
            println!("Status: ENABLED");
            println!("Source: password");
            println!();
            println!("Key Derivation Parameters:");
            println!("  Algorithm: PBKDF2-HMAC-SHA256");
            println!("  Iterations: {}", config.iterations);
        }
    }

    Ok(())
}

fn encrypt(
    manager: &EncryptionManager,
    input: PathBuf,
    output: PathBuf,
    options: &BatchOptions,
) -> VaultResult<()> {
    if !input.is_dir() {
        manager.encrypt_file(&input, &output)?;
        println!("Encrypted {} -> {}", input.display(), output.display());
        return Ok(());
    }

    let report = manager.encrypt_directory(&input, &output, options)?;
    for name in report.succeeded.keys() {
        println!("OK    {}", name);
    }
    print_failures(&report.failed, &report.skipped);
    println!();
    println!(
        "Encrypted {} of {} files into {}",
        report.succeeded.len(),
        report.total(),
        output.display()
    );

    report.into_result().map(|_| ())
}

fn verify(manager: &EncryptionManager, path: PathBuf, options: &BatchOptions) -> VaultResult<()> {
    if !path.is_dir() {
        let plaintext = manager.decrypt_file_bytes_in_memory(&path)?;
        println!("OK    {} ({} bytes)", path.display(), plaintext.len());
        return Ok(());
    }

    let report = manager.decrypt_directory_in_memory(&path, options)?;
    for (name, plaintext) in &report.succeeded {
        println!("OK    {} ({} bytes)", name, plaintext.len());
    }
    print_failures(&report.failed, &report.skipped);
    println!();
    println!(
        "Verified {} of {} files in {}",
        report.succeeded.len(),
        report.total(),
        path.display()
    );

    report.into_result().map(|_| ())
}

fn rotate(
    old: &EncryptionManager,
    new: &EncryptionManager,
    dir: PathBuf,
    options: &BatchOptions,
) -> VaultResult<()> {
    let report = rotate_directory(old, new, &dir, options)?;
    for (name, outcome) in &report.succeeded {
        println!("OK    {} ({:?})", name, outcome);
    }
    print_failures(&report.failed, &report.skipped);
    println!();
    println!(
        "Rotated {} of {} files in {}",
        report.succeeded.len(),
        report.total(),
        dir.display()
    );

    report.into_result().map(|_| ())
}

fn print_failures(failed: &BTreeMap<String, VaultError>, skipped: &[String]) {
    for (name, err) in failed {
        println!("FAIL  {}: {}", name, err);
    }
    for name in skipped {
        println!("SKIP  {}", name);
    }
}

/// Prompt for a password (hidden input)
pub fn prompt_password(prompt: &str) -> VaultResult<SecureString> {
    rpassword::prompt_password(prompt)
        .map(SecureString::new)
        .map_err(|e| VaultError::Config(format!("Failed to read password: {}", e)))
}
