//! Trellis Vault — filesystem host for the hierarchy index

pub mod error;
pub mod frontmatter;
pub mod vault;
pub mod watcher;

pub use error::{Result, VaultError};
pub use vault::Vault;
pub use watcher::VaultWatcher;
