//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the encryption manager.

pub mod encrypt;

pub use encrypt::{handle_encrypt_command, print_new_key, prompt_password, EncryptCommands};
