//! Vaultlift Vault Library
//!
//! The document store the pipelines read from and write to: a directory of
//! markdown notes and attachments. Paths are vault-relative and `/`-separated
//! on every platform.

pub mod fs;
pub mod traits;

pub use fs::FsVault;
pub use traits::{DocumentStore, VaultError, VaultResult};
