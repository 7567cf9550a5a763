use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use docvault::cli::{handle_encrypt_command, print_new_key, prompt_password, EncryptCommands};
use docvault::config::EncryptionConfig;
use docvault::crypto::SecureString;
use docvault::logging::init_logging;
use docvault::manager::{build_manager, BatchOptions};

#[derive(Parser)]
#[command(
    name = "docvault",
    version,
    about = "Encryption at rest for documents entering a retrieval pipeline",
    long_about = "docvault encrypts documents with AES-256-GCM before they are \
                  ingested, and verifies or rotates encrypted corpora. Decrypted \
                  content is only ever held in memory."
)]
struct Cli {
    /// Encoded encryption key (overrides ENCRYPTION_KEY)
    #[arg(long, global = true, allow_hyphen_values = true)]
    key: Option<String>,

    /// Password for key derivation (overrides ENCRYPTION_PASSWORD)
    #[arg(
        long,
        global = true,
        conflicts_with = "ask_password",
        allow_hyphen_values = true
    )]
    password: Option<String>,

    /// Prompt for the password with hidden input
    #[arg(long, global = true)]
    ask_password: bool,

    /// Deployment-wide salt for key derivation
    #[arg(long, global = true)]
    salt: Option<String>,

    /// PBKDF2 iteration count (at least 100000)
    #[arg(long, global = true)]
    iterations: Option<u32>,

    /// JSON settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Worker threads for directory operations
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// Log level when DOCVAULT_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: EncryptCommands,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_json)?;

    // Key generation needs no configuration
    if let EncryptCommands::Keygen { raw } = cli.command {
        print_new_key(raw)?;
        return Ok(());
    }

    let password = if cli.ask_password {
        Some(prompt_password("Encryption password: ")?)
    } else {
        cli.password.map(SecureString::new)
    };

    let mut config = EncryptionConfig::resolve(
        cli.config.as_deref(),
        cli.key.map(SecureString::new),
        password,
    )?;
    if let Some(salt) = cli.salt {
        config.salt = salt;
    }
    if let Some(iterations) = cli.iterations {
        config.iterations = iterations;
    }
    if let Some(workers) = cli.workers {
        config.workers = Some(workers);
    }

    // One manager for the whole run
    let manager = build_manager(&config)?;

    let mut options = BatchOptions::default();
    if let Some(workers) = config.workers {
        options = options.with_workers(workers);
    }

    handle_encrypt_command(&manager, &config, options, cli.command)?;
    Ok(())
}
