//! Error types for vault operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while opening or watching a vault.
#[derive(Error, Debug)]
pub enum VaultError {
    /// The vault root does not exist or is not a directory.
    #[error("vault root is not a directory: {0}")]
    NotADirectory(PathBuf),

    /// IO error during vault operations.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// File system watching error.
    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),
}

/// Result type for vault operations.
pub type Result<T> = std::result::Result<T, VaultError>;
