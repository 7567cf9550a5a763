//! Configuration module for docvault
//!
//! Layered resolution of encryption settings from a settings file, the
//! environment and explicit caller values.

pub mod settings;

pub use settings::EncryptionConfig;
